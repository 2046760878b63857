use std::sync::Arc;

mod analysis;
mod app;
mod config;
mod db;
mod error;
mod meals;
mod planner;
mod state;
mod storage;
mod targets;
mod templates;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "mealplanner=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let serve_config = config.clone();
    let state = AppState::init(config).await?;
    let autosave = state.autosave.clone();

    app::serve(app::build_app(state), &serve_config).await?;

    // flush targets still waiting for their settle window
    match Arc::try_unwrap(autosave) {
        Ok(autosave) => autosave.shutdown().await,
        Err(_) => tracing::warn!("target autosave still shared at exit; pending edits may be lost"),
    }
    Ok(())
}
