//! ElevenLabs 语音合成 Provider
//!
//! text-to-speech 接口，返回 MP3 字节流，落盘后返回 `/media/` URL。
//! 语音名通过固定映射表解析为 voice_id，未知名称回落到 default。
//! 单场景单次阻塞调用，不重试、不缓存。

use crate::config::SpeechConfig;
use crate::error::ProviderError;
use crate::media::MediaStore;
use crate::providers::traits::{ProviderResult, SpeechProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// default 对应的 voice_id，映射表和回落逻辑共用同一常量
const DEFAULT_VOICE_ID: &str = "XJ2fW4ybq7HouelYYGcL";

/// 语音名 → ElevenLabs voice_id
///
/// 免费档只能使用 premade 语音，不支持 library（自定义/付费）语音。
const VOICE_IDS: &[(&str, &str)] = &[
    ("default", DEFAULT_VOICE_ID),
    ("rachel", "21m00Tcm4TlvDq8ikWAM"),
];

/// 解析语音名，未知名称回落到 default
pub fn resolve_voice_id(voice: &str) -> &'static str {
    let lookup = voice.trim().to_lowercase();
    VOICE_IDS
        .iter()
        .find(|(name, _)| *name == lookup)
        .map(|(_, id)| *id)
        .unwrap_or(DEFAULT_VOICE_ID)
}

/// ElevenLabs Provider
pub struct ElevenLabsProvider {
    config: SpeechConfig,
    client: Client,
    media: Arc<MediaStore>,
}

impl ElevenLabsProvider {
    pub fn new(config: SpeechConfig, media: Arc<MediaStore>) -> Self {
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

    fn tts_url(&self, voice_id: &str) -> String {
        format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.config.base_url.trim_end_matches('/'),
            voice_id,
            self.config.output_format
        )
    }

    /// 把上游错误响应映射为带可读信息的 ProviderError
    ///
    /// ElevenLabs 的错误体常见形如 `{"detail": {"status": "...", "message": "..."}}`，
    /// 额度不足时给出明确提示而不是裸状态码。
    fn map_api_error(status: u16, body: &str) -> ProviderError {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                let detail = &v["detail"];
                let status_tag = detail["status"].as_str().unwrap_or_default().to_string();
                let msg = detail["message"].as_str().map(|s| s.to_string());
                if status_tag == "quota_exceeded" {
                    Some(format!(
                        "ElevenLabs 额度不足: {}",
                        msg.unwrap_or_else(|| "quota exceeded".to_string())
                    ))
                } else {
                    msg
                }
            })
            .unwrap_or_else(|| body.chars().take(300).collect());

        ProviderError::Api { status, message }
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabsProvider {
    async fn synthesize(&self, text: &str, voice: &str) -> ProviderResult<String> {
        let voice_id = resolve_voice_id(voice);
        let payload = json!({
            "text": text,
            "model_id": self.config.model_id,
            "voice_settings": {
                // 低 stability 让讲故事更有表现力，style 增加叙事起伏
                "stability": 0.4,
                "similarity_boost": 0.7,
                "style": 0.45,
            },
        });

        tracing::debug!(
            "[AUDIO] 合成旁白 (voice={}): {}",
            voice_id,
            text.chars().take(40).collect::<String>()
        );

        let response = self
            .client
            .post(self.tts_url(voice_id))
            .header("xi-api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("[AUDIO] 上游返回 {}: {}", status, body);
            return Err(Self::map_api_error(status.as_u16(), &body));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        let url = self.media.save_audio(&bytes, "mp3").await?;
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_voice_id_known() {
        assert_eq!(resolve_voice_id("default"), "XJ2fW4ybq7HouelYYGcL");
        assert_eq!(resolve_voice_id("rachel"), "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(resolve_voice_id("Rachel "), "21m00Tcm4TlvDq8ikWAM");
    }

    #[test]
    fn test_resolve_voice_id_unknown_falls_back() {
        assert_eq!(resolve_voice_id("morgan-freeman"), DEFAULT_VOICE_ID);
        assert_eq!(resolve_voice_id(""), DEFAULT_VOICE_ID);
    }

    #[test]
    fn test_default_table_entry_matches_fallback() {
        // 映射表里的 default 条目和回落常量必须是同一个 id
        assert_eq!(resolve_voice_id("default"), DEFAULT_VOICE_ID);
    }

    #[test]
    fn test_tts_url() {
        let dir = tempfile::tempdir().unwrap();
        let media = Arc::new(MediaStore::new(dir.path()).unwrap());
        let p = ElevenLabsProvider::new(SpeechConfig::default(), media);
        assert_eq!(
            p.tts_url("abc123"),
            "https://api.elevenlabs.io/v1/text-to-speech/abc123?output_format=mp3_44100_128"
        );
    }

    #[test]
    fn test_map_api_error_quota() {
        let body = r#"{"detail": {"status": "quota_exceeded", "message": "not enough credits"}}"#;
        let err = ElevenLabsProvider::map_api_error(402, body);
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 402);
                assert!(message.contains("额度不足"));
                assert!(message.contains("not enough credits"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_map_api_error_plain_body() {
        let err = ElevenLabsProvider::map_api_error(500, "internal error");
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "internal error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
