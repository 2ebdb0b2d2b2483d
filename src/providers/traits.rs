//! Provider Trait 定义
//!
//! 统一的生成器接口，管道只依赖这些 trait，
//! 测试时用 Mock 实现替换真实 API 调用。

use crate::error::ProviderError;
use async_trait::async_trait;

/// Provider 结果类型别名
pub type ProviderResult<T> = Result<T, ProviderError>;

/// 主风格参考图
///
/// 开启风格一致性时先用高保真模型生成一次，
/// 之后每个场景的图片调用都以它为条件。
#[derive(Debug, Clone, PartialEq)]
pub struct StyleReference {
    /// 参考图的公开 URL
    pub url: String,
    /// base64 图片数据；上游只返回 URL 时为 None，
    /// 此时场景调用无法携带参考图，退化为独立生成
    pub image_b64: Option<String>,
}

/// 文本生成 Trait
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// 生成完整故事并切分为 `num_scenes` 段场景文本
    ///
    /// 单次阻塞调用，不重试；返回的场景数保证等于 `num_scenes`
    async fn generate_story(
        &self,
        prompt: &str,
        style: &str,
        num_scenes: usize,
    ) -> ProviderResult<Vec<String>>;
}

/// 图片生成 Trait
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// 生成主风格参考图（高保真模型），每次请求最多调用一次
    async fn generate_style_image(
        &self,
        prompt: &str,
        style: &str,
    ) -> ProviderResult<StyleReference>;

    /// 为单个场景生成插图，返回可访问 URL
    ///
    /// `style_ref` 存在时以主参考图为条件生成，保证跨场景视觉一致
    async fn generate_scene_image(
        &self,
        scene_text: &str,
        style: &str,
        style_ref: Option<&StyleReference>,
    ) -> ProviderResult<String>;
}

/// 语音合成 Trait
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// 为场景文本生成旁白音频，返回可访问 URL
    async fn synthesize(&self, text: &str, voice: &str) -> ProviderResult<String>;
}
