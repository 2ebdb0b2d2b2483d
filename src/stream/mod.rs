//! 流式生成层
//!
//! - `events`: 对外事件类型定义（`StoryStreamEvent`）与 SSE 编码
//! - `pipeline`: 生成管道（文本 → 扇出 → 事件流）
//!
//! # 架构设计
//!
//! ```text
//! StoryRequest ──> [StoryPipeline] ──> StoryStreamEvent ──> SSE 响应体
//! ```
//!
//! 事件顺序约定：`story` 永远第一个，`complete`/`error` 永远最后且只有一个，
//! `scene` 事件按完成顺序到达，自带 index。

pub mod events;
pub mod pipeline;

pub use events::StoryStreamEvent;
pub use pipeline::StoryPipeline;
