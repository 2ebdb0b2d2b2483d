//! 故事流端点
//!
//! `GET /api/stream-story` 把管道事件流编码为 SSE 响应。
//! 使用 async 流式响应体，每个事件产出即刷出，不缓冲整个故事。
//! 客户端断开时响应体被丢弃，管道随之放弃剩余工作。

use crate::models::{StoryRequest, DEFAULT_NUM_IMAGES};
use crate::server::AppState;
use crate::stream::StoryStreamEvent;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::Deserialize;
use std::convert::Infallible;

/// stream-story 查询参数
#[derive(Debug, Deserialize)]
pub struct StreamStoryParams {
    pub prompt: String,
    pub style: Option<String>,
    pub voice: Option<String>,
    pub num_images: Option<usize>,
    pub use_style_consistency: Option<bool>,
}

impl StreamStoryParams {
    fn into_request(self) -> StoryRequest {
        StoryRequest::new(self.prompt)
            .with_style(self.style.unwrap_or_default())
            .with_voice(self.voice.unwrap_or_default())
            .with_num_images(self.num_images.unwrap_or(DEFAULT_NUM_IMAGES))
            .with_style_consistency(self.use_style_consistency.unwrap_or(false))
            .normalized()
    }
}

/// `GET /api/stream-story`
pub async fn stream_story(
    State(state): State<AppState>,
    Query(params): Query<StreamStoryParams>,
) -> Response {
    if params.prompt.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": {"message": "prompt must not be empty"}})),
        )
            .into_response();
    }

    let request = params.into_request();
    tracing::info!(
        "[SERVER] stream-story: prompt={}, num_images={}",
        request.prompt.chars().take(60).collect::<String>(),
        request.num_images
    );

    let events = state.pipeline.run(request);
    let body_stream = events.map(|event: StoryStreamEvent| {
        Ok::<axum::body::Bytes, Infallible>(axum::body::Bytes::from(event.to_sse()))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(Body::from_stream(body_stream))
        .unwrap_or_else(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": {"message": "Failed to build stream response"}})),
            )
                .into_response()
        })
}

/// `GET /`
pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({"message": "VividStory API is running"}))
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MAX_SCENES;

    #[test]
    fn test_params_into_request_defaults() {
        let params = StreamStoryParams {
            prompt: "a brave rabbit".to_string(),
            style: None,
            voice: None,
            num_images: None,
            use_style_consistency: None,
        };
        let request = params.into_request();
        assert_eq!(request.prompt, "a brave rabbit");
        assert_eq!(request.style, "fantasy");
        assert_eq!(request.voice, "default");
        assert_eq!(request.num_images, DEFAULT_NUM_IMAGES);
        assert!(!request.use_style_consistency);
    }

    #[test]
    fn test_params_into_request_clamps() {
        let params = StreamStoryParams {
            prompt: "x".to_string(),
            style: Some("watercolor".to_string()),
            voice: Some("rachel".to_string()),
            num_images: Some(99),
            use_style_consistency: Some(true),
        };
        let request = params.into_request();
        assert_eq!(request.style, "watercolor");
        assert_eq!(request.voice, "rachel");
        assert_eq!(request.num_images, MAX_SCENES);
        assert!(request.use_style_consistency);
    }

    #[test]
    fn test_query_string_parsing() {
        let params: StreamStoryParams = serde_urlencoded::from_str(
            "prompt=a+brave+rabbit&num_images=3&use_style_consistency=false",
        )
        .unwrap();
        assert_eq!(params.prompt, "a brave rabbit");
        assert_eq!(params.num_images, Some(3));
        assert_eq!(params.use_style_consistency, Some(false));
        assert!(params.style.is_none());
    }
}
