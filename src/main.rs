mod config;
mod db;
mod error;
mod game;
mod models;
mod routes;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Utc};
use config::Config;
use dashmap::DashMap;
use db::{GridStore, MemoryStore, PgStore};
use game::{CategorySelector, GridState};
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// How often the idle-game sweep runs
pub const GAME_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across all handlers
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn GridStore>,
    pub selector: Arc<dyn CategorySelector>,
    /// Live boards keyed by game_id. Each board has its own lock so a slow
    /// answer submission only blocks its own game.
    pub games: DashMap<Uuid, Arc<Mutex<GridState>>>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn GridStore>) -> Self {
        let selector = config.game.selection_policy.selector();
        Self {
            config,
            store,
            selector,
            games: DashMap::new(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geogrid_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting GeoGrid backend server...");

    let config = Config::from_env()?;
    tracing::info!(
        "Configuration loaded (category selection: {})",
        config.game.selection_policy
    );

    let store = open_store(&config).await?;
    tracing::info!("Using {} store", store.backend());

    let state = Arc::new(AppState::new(config.clone(), store));

    // Spawn background task to drop abandoned games
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        game_cleanup_task(cleanup_state).await;
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::create_routes()
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Postgres when DATABASE_URL is set, otherwise the in-memory store
async fn open_store(config: &Config) -> Result<Arc<dyn GridStore>> {
    if let Some(url) = &config.database.url {
        let pool = db::create_pool(url, config.database.max_connections).await?;
        tracing::info!("Connected to database");

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations completed");

        return Ok(Arc::new(PgStore::new(pool)));
    }

    tracing::warn!("DATABASE_URL not set, answer statistics will not survive a restart");
    let store = match &config.game.seed_path {
        Some(path) => match MemoryStore::load(path).await {
            Ok(store) => {
                tracing::info!("Seed data loaded from {}", path);
                store
            }
            Err(e) => {
                tracing::warn!("Failed to load seed data: {:#}. Starting empty.", e);
                MemoryStore::new()
            }
        },
        None => MemoryStore::new(),
    };
    Ok(Arc::new(store))
}

/// Background task that periodically removes games nobody has touched
/// within the idle timeout
async fn game_cleanup_task(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(GAME_CLEANUP_INTERVAL);

    loop {
        interval.tick().await;
        let removed = remove_idle_games(&state, Utc::now());
        if removed > 0 {
            tracing::info!("Removed {} idle games", removed);
        }
    }
}

/// Drop games idle since before `now - idle_timeout`. Games whose lock is
/// held are in use and skipped.
fn remove_idle_games(state: &AppState, now: DateTime<Utc>) -> usize {
    let timeout = state.config.idle_timeout();

    let stale: Vec<Uuid> = state
        .games
        .iter()
        .filter(|entry| match entry.value().try_lock() {
            Ok(grid) => now - grid.last_activity() > timeout,
            Err(_) => false,
        })
        .map(|entry| *entry.key())
        .collect();

    for game_id in &stale {
        state.games.remove(game_id);
        tracing::debug!("Removed idle game {}", game_id);
    }
    stale.len()
}
