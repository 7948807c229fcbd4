use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod auth;
mod cache;
mod config;
mod db;
mod models;
mod services;
mod utils;

use crate::cache::{RedisClient, RedisWalletLedger};
use crate::config::AppConfig;
use crate::db::Database;
use crate::services::adapters::{PostgresPortfolioStore, PostgresStockCatalog, PostgresTransactionJournal};
use crate::services::matching::{EngineFacade, MatchingEngine, TransactionJournalPort};

/// Shared application state (§2 component 8): the Engine Façade fronts the
/// in-memory Matching Engine; `journal` is kept alongside it so the
/// read-only `/getStockTransactions` and `/getWalletTransactions` handlers
/// can query Postgres directly without round-tripping through the engine.
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub facade: Arc<EngineFacade>,
    pub journal: Arc<dyn TransactionJournalPort>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matching_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = AppConfig::load()?;

    tracing::info!("Starting matching engine backend v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.environment);

    let db = Database::connect(&config.database_url).await?;
    tracing::info!("Database connected");

    let redis = RedisClient::from_url(&config.redis_url).await?;
    tracing::info!("Redis connected at {}", config.redis_url);

    let wallet = Arc::new(RedisWalletLedger::new(redis));
    let portfolio = Arc::new(PostgresPortfolioStore::new(db.pool.clone()));
    let journal: Arc<dyn TransactionJournalPort> =
        Arc::new(PostgresTransactionJournal::new(db.pool.clone()));
    let catalog = Arc::new(PostgresStockCatalog::new(db.pool.clone()));

    let engine = Arc::new(MatchingEngine::new(wallet, portfolio, journal.clone(), catalog));
    let facade = Arc::new(EngineFacade::new(engine));
    tracing::info!("Matching engine and façade initialized");

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        facade,
        journal,
    });

    let app = Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api/v1", api::routes::create_router(state.clone()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}
