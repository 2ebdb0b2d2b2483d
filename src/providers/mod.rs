//! 外部 AI 服务封装
//!
//! 每个 Provider 都是无状态的请求/响应包装器：核心不关心上游具体 wire 格式，
//! 只把它们当作"异步调用进、媒体或文本出、或失败"。
//! 核心不做重试，上游失败原样上抛，由管道决定整体失败还是单场景降级。

pub mod dedalus;
pub mod elevenlabs;
pub mod k2think;
pub mod traits;

pub use dedalus::DedalusProvider;
pub use elevenlabs::ElevenLabsProvider;
pub use k2think::K2ThinkProvider;
pub use traits::{ImageProvider, ProviderResult, SpeechProvider, StyleReference, TextProvider};
