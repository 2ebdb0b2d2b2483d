//! VividStory 服务入口

use vividstory_lib::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("[SERVER] 配置加载失败: {}", e);
        anyhow::anyhow!(e)
    })?;

    tracing::info!(
        "[SERVER] 启动 VividStory: data_dir={}, scene_concurrency={}",
        config.server.data_dir,
        config.scene_concurrency
    );

    vividstory_lib::server::run(config).await
}
