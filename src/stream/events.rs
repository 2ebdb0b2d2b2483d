//! 流事件类型
//!
//! 客户端在一条长连接上收到的离散事件单元。
//! JSON 载荷带 `kind` 判别字段，同时 SSE 帧的 `event:` 行也用同名事件名，
//! 两种客户端（EventSource 按事件名订阅 / fetch 逐行解析）都能消费。

use crate::models::{Scene, Story};
use serde::{Deserialize, Serialize};

/// 故事流事件
///
/// 顺序不变量：
/// - `story` 先于所有 `scene`
/// - `complete` 或 `error` 永远是最后一个事件，且每个流最多一个
/// - `scene` 可能乱序到达，载荷自带 `index`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoryStreamEvent {
    /// 完整故事（仅文本），文本生成成功后立即发出
    Story { story: Story },
    /// 单个场景生成完成（图片/音频就绪，失败项为 null）
    Scene { scene: Scene },
    /// 全部场景处理完毕，流正常结束
    Complete,
    /// 致命错误（文本生成失败等），流异常结束
    Error { message: String },
}

impl StoryStreamEvent {
    /// 事件判别名
    pub fn kind(&self) -> &'static str {
        match self {
            StoryStreamEvent::Story { .. } => "story",
            StoryStreamEvent::Scene { .. } => "scene",
            StoryStreamEvent::Complete => "complete",
            StoryStreamEvent::Error { .. } => "error",
        }
    }

    /// 是否为终止事件
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StoryStreamEvent::Complete | StoryStreamEvent::Error { .. }
        )
    }

    /// 编码为一个 SSE 帧
    ///
    /// 格式：`event: <kind>\ndata: <json>\n\n`
    pub fn to_sse(&self) -> String {
        let data = serde_json::to_string(self).unwrap_or_else(|e| {
            // 序列化失败只可能是内部类型缺陷，降级为 error 载荷而不是断流
            tracing::error!("[SSE] 事件序列化失败: {}", e);
            serialization_error_payload(&e.to_string())
        });
        format!("event: {}\ndata: {}\n\n", self.kind(), data)
    }
}

/// 构建序列化失败时的兜底 error 载荷
///
/// 经 `json!` 生成，错误文本里的引号等字符保证被正确转义。
fn serialization_error_payload(message: &str) -> String {
    serde_json::json!({
        "kind": "error",
        "message": format!("event serialization failed: {message}"),
    })
    .to_string()
}
