//! HTTP 处理器

pub mod story_api;

pub use story_api::{health, root, stream_story};
