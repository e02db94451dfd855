use std::sync::Arc;

mod app;
mod auth;
mod config;
mod db;
mod error;
mod response;
mod state;
mod store;
#[cfg(test)]
mod testing;
mod users;

use crate::{auth::mailer::LogMailer, config::AppConfig, state::AppState, store::PgUserStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "bootcamp_api=debug,axum=info,tower_http=info".to_string());
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
    let pool = db::connect(&config).await?;
    db::migrate(&pool).await?;

    if config.reset.public_base_url.is_none() {
        tracing::warn!("PUBLIC_BASE_URL not set; reset links use the request Host header");
    }

    let state = AppState::from_parts(
        Arc::new(PgUserStore::new(pool)),
        config,
        Arc::new(LogMailer),
    );

    app::serve(app::build_app(state)).await
}
