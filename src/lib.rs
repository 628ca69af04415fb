pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod redis_client;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{CachedSeatInventory, RedisSelectionStore};
use crate::config::{AppConfig, Config, InventoryBackend, LogFormat, SelectionConfig};
use crate::redis_client::{CacheBackend, RedisClient};
use crate::services::inventory::{HttpSeatInventory, InventoryError, PgSeatInventory, SeatInventory};
use crate::services::selection::{SelectionService, SelectionStore};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to connect to database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to run migrations: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("failed to connect to redis: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("failed to build seat inventory client: {0}")]
    Inventory(#[from] InventoryError),
}

// Shared state для всего приложения
pub struct AppState {
    pub selection: SelectionService,
}

impl AppState {
    /// Поднимает источник мест по конфигурации, кеш схем и хранилище выбора в Redis.
    pub async fn new(config: &Config) -> Result<Arc<Self>, StartupError> {
        let redis: Arc<dyn CacheBackend> = Arc::new(RedisClient::new(&config.redis.url).await?);
        info!("Redis connected");

        let source: Arc<dyn SeatInventory> = match config.inventory.backend {
            InventoryBackend::Postgres => {
                let db = database::Database::connect(&config.database).await?;
                db.run_migrations().await?;
                info!("Database connected, seat layouts served from Postgres");
                Arc::new(PgSeatInventory::new(db))
            }
            InventoryBackend::Http => {
                info!(base_url = %config.inventory.base_url, "Seat layouts served from booking API");
                Arc::new(HttpSeatInventory::from_config(&config.inventory, &config.circuit_breaker)?)
            }
        };

        let inventory = Arc::new(CachedSeatInventory::new(
            source,
            redis.clone(),
            config.inventory.cache_ttl_seconds,
        ));
        let store = Arc::new(RedisSelectionStore::new(redis, config.selection.ttl_seconds));

        Ok(Self::with_backends(inventory, store, &config.selection))
    }

    pub fn with_backends(
        inventory: Arc<dyn SeatInventory>,
        store: Arc<dyn SelectionStore>,
        settings: &SelectionConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            selection: SelectionService::new(inventory, store, settings),
        })
    }
}

/// Полный роутер приложения: служебные маршруты и API под `/api`.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Cinema Seating API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .route("/ready", get(controllers::health::readiness))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_new(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
