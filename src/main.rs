//! Wren - 任务型对话智能体
//!
//! 入口：初始化日志、加载配置、装配 NLU / 数据服务 / 会话存储，
//! 启动 HTTP 服务。

use std::sync::Arc;

use anyhow::Context;
use wren::config::{load_config, AppConfig};
use wren::dialogue::{DialogueAgent, SessionStore};
use wren::nlu::{NluClient, OpenAiNlu};
use wren::services::{OpenWeatherClient, StockProvider, TwelveDataClient, WeatherProvider};
use wren::web::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wren::observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("config load failed, using defaults: {e}");
        AppConfig::default()
    });

    let nlu: Arc<dyn NluClient> = Arc::new(OpenAiNlu::new(
        cfg.llm.base_url.as_deref(),
        &cfg.llm.model,
        cfg.llm.api_key.as_deref(),
    ));
    let weather: Arc<dyn WeatherProvider> = Arc::new(OpenWeatherClient::new(
        &cfg.providers.openweather,
        cfg.providers.timeout_secs,
    ));
    let stocks: Arc<dyn StockProvider> = Arc::new(TwelveDataClient::new(
        &cfg.providers.twelvedata,
        cfg.providers.timeout_secs,
    ));

    // 会话存储由这里显式构造并注入，生存期与进程一致
    let store = Arc::new(SessionStore::new());
    let agent = DialogueAgent::new(store, nlu, weather, stocks);

    let app = create_router(Arc::new(AppState { agent }));
    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("wren listening on {addr}");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
