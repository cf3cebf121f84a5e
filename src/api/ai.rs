//! API endpoints for model selection, usage reporting and the stats feed.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::router::{
    Model, ModelUsage, PerformanceMetrics, RouterError, SelectionResult, TokenCount,
};

use super::routes::AppState;

/// Create the AI routing API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/select", post(select_model))
        .route("/usage", post(track_usage))
        .route("/usage/stats", get(usage_stats))
        .route("/models", get(list_models))
        .route("/models/:id/stats", post(update_model_stats))
}

/// Request to select a model for a task.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    /// Task type name, e.g. "proposal_generation".
    pub task_type: String,
    /// Defaults to 500 input / 1500 output tokens when omitted.
    #[serde(default)]
    pub token_estimate: TokenCount,
    #[serde(default)]
    pub force_high_quality: bool,
}

/// POST /api/ai/select
/// Pick the best model for a task under budget and quality constraints.
async fn select_model(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<SelectionResult>, (StatusCode, String)> {
    state
        .router
        .select_model_named(&req.task_type, req.token_estimate, req.force_high_quality)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Report of actual consumption for a completed task.
#[derive(Debug, Deserialize)]
pub struct TrackUsageRequest {
    pub model_id: String,
    pub tokens_used: TokenCount,
    pub cost: f64,
}

#[derive(Debug, Serialize)]
pub struct TrackUsageResponse {
    pub success: bool,
}

/// POST /api/ai/usage
/// Record actual token usage and cost for a completed task.
async fn track_usage(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrackUsageRequest>,
) -> Json<TrackUsageResponse> {
    let success = state
        .router
        .track_usage(&req.model_id, req.tokens_used, req.cost)
        .await;
    Json(TrackUsageResponse { success })
}

/// GET /api/ai/usage/stats
/// Per-model usage totals since startup.
async fn usage_stats(State(state): State<Arc<AppState>>) -> Json<HashMap<String, ModelUsage>> {
    Json(state.router.usage_statistics().await)
}

/// GET /api/ai/models
/// The current catalog, including adapted capability estimates.
async fn list_models(State(state): State<Arc<AppState>>) -> Json<Vec<Model>> {
    Json(state.router.models().await)
}

/// POST /api/ai/models/:id/stats
/// Intake for the external model-stats feed; folds measured performance into
/// the capability estimates.
async fn update_model_stats(
    State(state): State<Arc<AppState>>,
    Path(model_id): Path<String>,
    Json(metrics): Json<PerformanceMetrics>,
) -> StatusCode {
    state.router.update_model_stats(&model_id, &metrics).await;
    StatusCode::ACCEPTED
}

fn error_response(err: RouterError) -> (StatusCode, String) {
    let status = match err {
        RouterError::UnknownTaskType(_) => StatusCode::BAD_REQUEST,
        // Valid request, but the current budget/quality state cannot meet it.
        RouterError::NoViableModel => StatusCode::CONFLICT,
    };
    (status, err.to_string())
}
