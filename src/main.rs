use std::sync::Arc;

use anyhow::Context;

use helpdesk_api::config;
use helpdesk_api::store::PgStore;
use helpdesk_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "helpdesk_api=info,tower_http=info".into()),
        )
        .init();

    let cfg = config::config();

    let store = PgStore::connect()
        .await
        .context("failed to connect to the database")?;
    let state = AppState::with_defaults(Arc::new(store));

    let bind_addr = format!("0.0.0.0:{}", cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("helpdesk api listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .await
        .context("server error")?;
    Ok(())
}
