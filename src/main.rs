use anyhow::Context;

mod app;
mod auth;
mod config;
mod state;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "authsvc=debug,axum=info,tower_http=info".to_string());
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

    let app_state = AppState::init().context("load configuration")?;
    tracing::info!(
        reset_ttl_hours = app_state.config.auth.reset_ttl_hours,
        session_token_len = app_state.config.auth.session_token_len,
        "auth service ready"
    );

    let app = app::build_app(app_state.clone());
    app::serve(app, &app_state).await
}
