//! HTTP route assembly and server bootstrap.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::router::{BudgetTracker, ModelCatalog, ModelRouter, ProfileRegistry, SharedRouter};
use crate::storage::{writer, ConfigStore, SqliteStore, UsageLedger};

use super::{ai, budget};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub router: SharedRouter,
}

/// Build the API router for a given state. Separated from [`serve`] so tests
/// can drive the app without a socket.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/ai", ai::routes())
        .nest("/api/budget", budget::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server: open the store, assemble the router, listen.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let store = Arc::new(SqliteStore::open(&config.db_path()).await?);

    // Budget state: saved config wins, env defaults otherwise.
    let budget_state = match store.load_budget_config().await? {
        Some(saved) => {
            tracing::info!("Loaded budget configuration from store");
            BudgetTracker::from_config(&saved)
        }
        None => BudgetTracker::new(
            config.default_daily_limit,
            config.default_monthly_limit,
            Utc::now(),
        ),
    };

    let catalog = match &config.catalog_path {
        Some(path) => ModelCatalog::load(path)?,
        None => ModelCatalog::builtin(),
    };

    let model_stats = store.load_model_stats().await?;

    let persist = writer::spawn(
        Arc::clone(&store) as Arc<dyn ConfigStore>,
        Arc::clone(&store) as Arc<dyn UsageLedger>,
    );
    let router = Arc::new(ModelRouter::new(
        catalog,
        ProfileRegistry::builtin(),
        budget_state,
        persist,
    ));

    // Fold stored performance metrics into the capability estimates.
    for (model_id, metrics) in model_stats {
        router.update_model_stats(&model_id, &metrics).await;
    }

    // Initial lazy reset so windows from a previous period don't survive a
    // restart. Persists through the writer if anything changed.
    router.budget_status().await;

    let state = Arc::new(AppState {
        config: config.clone(),
        router,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("automonet routing API listening on {}", addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
