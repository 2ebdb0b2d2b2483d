//! Dedalus 图片生成 Provider
//!
//! images/generations 接口，返回 b64_json 或 url。
//! 两个模型分工：高保真模型只用于主风格参考图，场景插图走快而便宜的模型。
//! b64 数据解码后落盘到媒体存储，URL 响应原样透传。不缓存、不重试。

use crate::config::ImageConfig;
use crate::error::ProviderError;
use crate::media::MediaStore;
use crate::providers::traits::{ImageProvider, ProviderResult, StyleReference};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// images/generations 响应中的单张图片
#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
    url: Option<String>,
    revised_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

/// Dedalus Provider
pub struct DedalusProvider {
    config: ImageConfig,
    client: Client,
    media: Arc<MediaStore>,
}

impl DedalusProvider {
    pub fn new(config: ImageConfig, media: Arc<MediaStore>) -> Self {
        // 图片生成普遍在 10-60 秒量级，总超时 2 分钟
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            config,
            client,
            media,
        }
    }

    fn generations_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if base.ends_with("/v1") {
            format!("{}/images/generations", base)
        } else {
            format!("{}/v1/images/generations", base)
        }
    }

    /// 调用 images/generations，返回首张图片数据
    async fn call_images_api(
        &self,
        prompt: &str,
        model: &str,
        style_ref: Option<&StyleReference>,
    ) -> ProviderResult<ImageData> {
        let mut payload = json!({
            "prompt": prompt,
            "model": model,
            "size": self.config.size,
            "quality": self.config.quality,
            "n": 1,
            "response_format": "b64_json",
        });

        // 带主参考图的条件生成；上游只回了 URL 时没有可传的数据，退化为独立生成
        if let Some(b64) = style_ref.and_then(|r| r.image_b64.as_deref()) {
            payload["image"] = json!(b64);
        }

        let response = self
            .client
            .post(self.generations_url())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                "[IMAGE] 上游返回 {} (model={}): {}",
                status,
                model,
                body.chars().take(300).collect::<String>()
            );
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body.chars().take(300).collect(),
            });
        }

        let body: ImagesResponse = response.json().await?;
        let image = body
            .data
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        if let Some(revised) = &image.revised_prompt {
            tracing::debug!(
                "[IMAGE] revised prompt: {}",
                revised.chars().take(100).collect::<String>()
            );
        }
        Ok(image)
    }

    /// 把响应图片落盘并返回公开 URL；上游直接给 URL 时原样透传
    async fn store_image(&self, image: ImageData) -> ProviderResult<(String, Option<String>)> {
        if let Some(b64) = image.b64_json {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&b64)
                .map_err(crate::error::MediaError::from)?;
            let url = self
                .media
                .save_image(&bytes, &self.config.output_format)
                .await?;
            return Ok((url, Some(b64)));
        }
        if let Some(url) = image.url {
            return Ok((url, None));
        }
        Err(ProviderError::InvalidResponse(
            "响应既无 b64_json 也无 url".to_string(),
        ))
    }
}

#[async_trait]
impl ImageProvider for DedalusProvider {
    async fn generate_style_image(
        &self,
        prompt: &str,
        style: &str,
    ) -> ProviderResult<StyleReference> {
        let style_prompt = format!(
            "Character and style reference sheet for a children's storybook about \"{}\". \
             {} illustration style, consistent character design, soft colors, no text.",
            prompt, style
        );

        tracing::info!("[IMAGE] 生成主风格参考图 (model={})", self.config.style_model);
        let image = self
            .call_images_api(&style_prompt, &self.config.style_model, None)
            .await?;
        let (url, image_b64) = self.store_image(image).await?;
        Ok(StyleReference { url, image_b64 })
    }

    async fn generate_scene_image(
        &self,
        scene_text: &str,
        style: &str,
        style_ref: Option<&StyleReference>,
    ) -> ProviderResult<String> {
        let prompt = format!(
            "{} Children's storybook illustration, {} style, warm and friendly, no text.",
            scene_text, style
        );

        let image = self
            .call_images_api(&prompt, &self.config.scene_model, style_ref)
            .await?;
        let (url, _) = self.store_image(image).await?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> (DedalusProvider, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(MediaStore::new(dir.path()).unwrap());
        (DedalusProvider::new(ImageConfig::default(), media), dir)
    }

    #[test]
    fn test_generations_url_appends_v1() {
        let (p, _dir) = provider();
        assert_eq!(
            p.generations_url(),
            "https://api.dedaluslabs.ai/v1/images/generations"
        );
    }

    #[test]
    fn test_generations_url_keeps_existing_v1() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(MediaStore::new(dir.path()).unwrap());
        let config = ImageConfig {
            base_url: "http://localhost:9000/v1/".to_string(),
            ..Default::default()
        };
        let p = DedalusProvider::new(config, media);
        assert_eq!(
            p.generations_url(),
            "http://localhost:9000/v1/images/generations"
        );
    }

    #[tokio::test]
    async fn test_store_image_saves_b64() {
        let (p, _dir) = provider();
        let b64 = base64::engine::general_purpose::STANDARD.encode(b"png-bytes");
        let image = ImageData {
            b64_json: Some(b64.clone()),
            url: None,
            revised_prompt: None,
        };
        let (url, kept) = p.store_image(image).await.unwrap();
        assert!(url.starts_with("/media/image_"));
        assert_eq!(kept, Some(b64));
    }

    #[tokio::test]
    async fn test_store_image_passes_through_url() {
        let (p, _dir) = provider();
        let image = ImageData {
            b64_json: None,
            url: Some("https://cdn.example.com/x.webp".to_string()),
            revised_prompt: None,
        };
        let (url, kept) = p.store_image(image).await.unwrap();
        assert_eq!(url, "https://cdn.example.com/x.webp");
        assert!(kept.is_none());
    }

    #[tokio::test]
    async fn test_store_image_rejects_empty() {
        let (p, _dir) = provider();
        let image = ImageData {
            b64_json: None,
            url: None,
            revised_prompt: None,
        };
        assert!(matches!(
            p.store_image(image).await,
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
