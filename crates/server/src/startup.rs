use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_with_format;
use configs::AppConfig;
use dotenvy::dotenv;
use service::accounts::{AccountsRepository, AccountsService, InMemoryAccountsRepository};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{self, ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Fresh in-memory ledger wired with the configured transfer minimum
pub fn build_state(cfg: &AppConfig) -> ServerState {
    let repo: Arc<dyn AccountsRepository> = Arc::new(InMemoryAccountsRepository::new());
    let accounts = AccountsService::new(repo).with_min_transfer_amount(cfg.ledger.min_transfer_amount);
    ServerState { accounts }
}

pub fn build_app(state: ServerState) -> Router {
    service::observability::register();
    routes::build_router(state, build_cors())
}

/// Public entry: load config, initialise logging, then serve
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_or_env()?;
    init_logging_with_format(&cfg.log.format);
    run_with_config(cfg).await
}

/// Serve until the listener fails; logging is left to the caller
pub async fn run_with_config(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(build_state(&cfg));

    let addr: SocketAddr = cfg.server.bind_addr().parse()?;
    info!(%addr, min_transfer_amount = %cfg.ledger.min_transfer_amount, "starting ledger server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
