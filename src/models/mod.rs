//! 数据模型

pub mod story;

pub use story::{Scene, Story, StoryRequest, DEFAULT_NUM_IMAGES, MAX_SCENES};
