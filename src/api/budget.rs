//! API endpoints for budget status and limit management.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};
use serde::Deserialize;

use crate::router::BudgetStatus;

use super::routes::AppState;

/// Create the budget API routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(budget_status))
        .route("/limits", put(update_limits))
}

/// GET /api/budget
/// Current per-window status (runs the lazy reset check first).
async fn budget_status(State(state): State<Arc<AppState>>) -> Json<BudgetStatus> {
    Json(state.router.budget_status().await)
}

/// Request to replace both budget limits.
#[derive(Debug, Deserialize)]
pub struct UpdateLimitsRequest {
    pub daily_limit: f64,
    pub monthly_limit: f64,
}

/// PUT /api/budget/limits
/// Update both window limits and persist the configuration.
async fn update_limits(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateLimitsRequest>,
) -> Result<Json<BudgetStatus>, (StatusCode, String)> {
    if req.daily_limit <= 0.0 || req.monthly_limit <= 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "budget limits must be positive".to_string(),
        ));
    }
    state
        .router
        .update_budget_limits(req.daily_limit, req.monthly_limit)
        .await;
    Ok(Json(state.router.budget_status().await))
}
