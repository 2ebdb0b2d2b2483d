//! 错误类型定义

use thiserror::Error;

/// Provider 调用错误
///
/// 核心不做重试，所有上游失败原样向上传播；
/// 由管道决定是整体失败还是单场景降级。
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP 请求失败（连接、超时等）
    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    /// 上游 API 返回错误状态码
    #[error("上游 API 错误 ({status}): {message}")]
    Api { status: u16, message: String },

    /// 响应格式不符合预期
    #[error("无效的 API 响应: {0}")]
    InvalidResponse(String),

    /// 响应中没有可用内容
    #[error("API 响应为空")]
    EmptyResponse,

    /// 媒体文件保存失败
    #[error("媒体存储错误: {0}")]
    Media(#[from] MediaError),
}

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 必需的环境变量未设置
    #[error("环境变量未设置: {0}")]
    MissingKey(&'static str),

    /// 配置值无法解析
    #[error("配置值无效: {key}={value}")]
    InvalidValue { key: &'static str, value: String },
}

/// 媒体存储错误
#[derive(Debug, Error)]
pub enum MediaError {
    /// 文件读写失败
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// base64 图片数据解码失败
    #[error("base64 解码失败: {0}")]
    Decode(#[from] base64::DecodeError),
}
