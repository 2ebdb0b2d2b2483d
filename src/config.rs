//! 进程配置
//!
//! 启动时从环境变量一次性加载，之后不可变。
//! API Key、Base URL 等在构造各 Provider 时注入，
//! 请求处理过程中不读取任何全局可变状态。

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;

/// 文本生成配置（K2 Think，OpenAI 兼容 chat completions）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// 是否在切分场景前做一次润色增强（第二次外部调用）
    pub enhance: bool,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.k2think.ai".to_string(),
            model: "MBZUAI-IFM/K2-Think-v2".to_string(),
            enhance: false,
        }
    }
}

/// 图片生成配置（Dedalus images/generations）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub api_key: String,
    pub base_url: String,
    /// 每场景插图使用的模型（快且便宜）
    pub scene_model: String,
    /// 主风格参考图使用的模型（高保真）
    pub style_model: String,
    pub size: String,
    pub quality: String,
    pub output_format: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.dedaluslabs.ai".to_string(),
            scene_model: "openai/dall-e-3".to_string(),
            style_model: "openai/gpt-image-1".to_string(),
            size: "1024x1024".to_string(),
            quality: "standard".to_string(),
            output_format: "webp".to_string(),
        }
    }
}

/// 语音合成配置（ElevenLabs TTS）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    pub api_key: String,
    pub base_url: String,
    pub model_id: String,
    pub output_format: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.elevenlabs.io".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
        }
    }
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// 生成的媒体文件目录，经 /media/ 静态服务暴露
    pub data_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            data_dir: "data".to_string(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub text: TextConfig,
    pub image: ImageConfig,
    pub speech: SpeechConfig,
    pub server: ServerConfig,
    /// 同时执行的场景生成任务上限
    pub scene_concurrency: usize,
}

/// 场景并发数默认值
pub const DEFAULT_SCENE_CONCURRENCY: usize = 4;

impl AppConfig {
    /// 从环境变量加载配置
    ///
    /// 必需变量缺失时立即失败（fail-fast），不会延迟到请求处理阶段：
    /// - `K2THINK_API_KEY`
    /// - `DEDALUS_API_KEY`
    /// - `ELEVENLABS_API_KEY`
    ///
    /// 可选变量：
    /// - `K2THINK_BASE_URL` / `DEDALUS_BASE_URL` / `ELEVENLABS_BASE_URL`
    /// - `VIVIDSTORY_BIND`（默认 `0.0.0.0:8000`）
    /// - `VIVIDSTORY_DATA_DIR`（默认 `data`）
    /// - `VIVIDSTORY_SCENE_CONCURRENCY`（默认 4）
    /// - `VIVIDSTORY_ENHANCE`（`1`/`true` 开启润色增强）
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = AppConfig {
            scene_concurrency: DEFAULT_SCENE_CONCURRENCY,
            ..Default::default()
        };

        config.text.api_key = require_env("K2THINK_API_KEY")?;
        config.image.api_key = require_env("DEDALUS_API_KEY")?;
        config.speech.api_key = require_env("ELEVENLABS_API_KEY")?;

        if let Some(url) = optional_env("K2THINK_BASE_URL") {
            config.text.base_url = url;
        }
        if let Some(url) = optional_env("DEDALUS_BASE_URL") {
            config.image.base_url = url;
        }
        if let Some(url) = optional_env("ELEVENLABS_BASE_URL") {
            config.speech.base_url = url;
        }
        if let Some(addr) = optional_env("VIVIDSTORY_BIND") {
            config.server.bind_addr = addr;
        }
        if let Some(dir) = optional_env("VIVIDSTORY_DATA_DIR") {
            config.server.data_dir = dir;
        }
        if let Some(value) = optional_env("VIVIDSTORY_SCENE_CONCURRENCY") {
            let parsed: usize =
                value
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "VIVIDSTORY_SCENE_CONCURRENCY",
                        value: value.clone(),
                    })?;
            if parsed == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "VIVIDSTORY_SCENE_CONCURRENCY",
                    value,
                });
            }
            config.scene_concurrency = parsed;
        }
        if let Some(value) = optional_env("VIVIDSTORY_ENHANCE") {
            config.text.enhance = matches!(value.as_str(), "1" | "true" | "TRUE" | "yes");
        }

        Ok(config)
    }
}

fn require_env(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingKey(key)),
    }
}

fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
