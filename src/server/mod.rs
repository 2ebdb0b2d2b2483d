//! HTTP 服务
//!
//! 路由：
//! - `GET /api/stream-story`: SSE 故事生成流
//! - `GET /` / `GET /health`: 存活检查
//! - `GET /media/*`: 生成的媒体文件静态服务
//!
//! CORS 全放开（本服务面向本地/演示前端）。

pub mod handlers;

use crate::config::AppConfig;
use crate::media::MediaStore;
use crate::providers::{DedalusProvider, ElevenLabsProvider, K2ThinkProvider};
use crate::stream::StoryPipeline;
use axum::routing::get;
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

/// 应用状态
///
/// 进程启动时构建一次，之后只读；请求之间没有共享可变状态。
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<StoryPipeline>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// 从配置构建全部组件
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let media = Arc::new(MediaStore::new(&config.server.data_dir)?);

        let text = Arc::new(K2ThinkProvider::new(config.text.clone()));
        let image = Arc::new(DedalusProvider::new(config.image.clone(), media.clone()));
        let speech = Arc::new(ElevenLabsProvider::new(config.speech.clone(), media));

        let pipeline = Arc::new(StoryPipeline::new(
            text,
            image,
            speech,
            config.scene_concurrency,
        ));

        Ok(Self {
            pipeline,
            config: Arc::new(config),
        })
    }
}

/// 构建路由
pub fn build_router(state: AppState, media_dir: &Path) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/stream-story", get(handlers::stream_story))
        .nest_service("/media", ServeDir::new(media_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 启动服务，阻塞直到监听失败
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let bind_addr = config.server.bind_addr.clone();
    let data_dir = config.server.data_dir.clone();
    let state = AppState::from_config(config)?;
    let app = build_router(state, Path::new(&data_dir));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("[SERVER] 监听 {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
