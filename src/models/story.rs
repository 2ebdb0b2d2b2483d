//! 故事数据模型
//!
//! `Story` 是一次请求内的有序场景序列；场景由文本生成器创建（仅 text），
//! 图片/音频生成完成后原地补全。请求结束即丢弃，没有持久化。

use serde::{Deserialize, Serialize};

/// 单次请求允许的最大场景数
pub const MAX_SCENES: usize = 8;

/// 场景数默认值
pub const DEFAULT_NUM_IMAGES: usize = 4;

/// 一个叙事场景
///
/// `image_url` / `audio_url` 在生成完成前为 `None`；
/// 单项生成失败时保持 `None` 发出（降级，而非丢弃整个场景）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// 场景序号（0 起始）。scene 事件可能乱序到达，
    /// 消费端必须按此序号排版，而不是按到达顺序。
    pub index: usize,
    pub text: String,
    pub image_url: Option<String>,
    pub audio_url: Option<String>,
}

impl Scene {
    /// 创建仅含文本的场景
    pub fn text_only(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            image_url: None,
            audio_url: None,
        }
    }

    /// 场景是否有任何可用媒体
    pub fn has_media(&self) -> bool {
        self.image_url.is_some() || self.audio_url.is_some()
    }
}

/// 完整故事（有序场景序列）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Story {
    pub scenes: Vec<Scene>,
}

impl Story {
    /// 从场景文本序列构建故事
    pub fn from_texts(texts: Vec<String>) -> Self {
        Self {
            scenes: texts
                .into_iter()
                .enumerate()
                .map(|(index, text)| Scene::text_only(index, text))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

/// 故事生成请求
///
/// 接受后不可变。一次请求对应一个独立的事件流。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRequest {
    pub prompt: String,
    pub style: String,
    pub voice: String,
    pub num_images: usize,
    /// 是否先生成主风格参考图，用于跨场景视觉一致性
    pub use_style_consistency: bool,
}

impl StoryRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            style: "fantasy".to_string(),
            voice: "default".to_string(),
            num_images: DEFAULT_NUM_IMAGES,
            use_style_consistency: false,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_num_images(mut self, num_images: usize) -> Self {
        self.num_images = num_images;
        self
    }

    pub fn with_style_consistency(mut self, enabled: bool) -> Self {
        self.use_style_consistency = enabled;
        self
    }

    /// 规范化请求参数
    ///
    /// - `num_images` 收敛到 1..=MAX_SCENES
    /// - 空的 style/voice 回落到默认值
    pub fn normalized(mut self) -> Self {
        self.num_images = self.num_images.clamp(1, MAX_SCENES);
        if self.style.trim().is_empty() {
            self.style = "fantasy".to_string();
        }
        if self.voice.trim().is_empty() {
            self.voice = "default".to_string();
        }
        self
    }
}
