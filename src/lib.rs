//! VividStory 核心库
//!
//! AI 故事书流式生成服务：
//! - `providers`: 外部 AI 服务封装（文本 / 图片 / 语音）
//! - `stream`: 流事件类型与生成管道
//! - `server`: HTTP 服务与 SSE 端点
//! - `media`: 临时媒体文件存储
//!
//! # 数据流
//!
//! ```text
//! StoryRequest ──> [TextProvider] ──> Story(仅文本) ──> story 事件
//!                        │
//!                        ├──> 每个场景并发 [ImageProvider] + [SpeechProvider]
//!                        │         （Semaphore 限制并发数）
//!                        ▼
//!                  scene 事件（按完成顺序） ──> complete 事件
//! ```

pub mod config;
pub mod error;
pub mod media;
pub mod models;
pub mod providers;
pub mod server;
pub mod stream;

pub use config::AppConfig;
pub use error::{ConfigError, MediaError, ProviderError};
pub use stream::{StoryPipeline, StoryStreamEvent};
