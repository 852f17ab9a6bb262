// handlers/protected/dashboard.rs - GET /api/dashboard/{overview,stats,revenue,expenses,reports/*}

use axum::extract::{Extension, State};
use serde_json::Value;

use crate::auth::Principal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Also served as `/stats`
pub async fn overview_get(State(state): State<AppState>, Extension(principal): Extension<Principal>) -> ApiResult<Value> {
    let overview = state.dashboard.overview(&principal).await?;
    Ok(ApiResponse::success(overview))
}

pub async fn revenue_get(State(state): State<AppState>, Extension(principal): Extension<Principal>) -> ApiResult<Value> {
    Ok(ApiResponse::success(state.dashboard.revenue(&principal).await?))
}

pub async fn expenses_get(State(state): State<AppState>, Extension(principal): Extension<Principal>) -> ApiResult<Value> {
    Ok(ApiResponse::success(state.dashboard.expenses(&principal).await?))
}

pub async fn occupancy_report_get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Value> {
    Ok(ApiResponse::success(state.dashboard.occupancy_report(&principal).await?))
}

pub async fn maintenance_report_get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Value> {
    Ok(ApiResponse::success(state.dashboard.maintenance_report(&principal).await?))
}

pub async fn payment_report_get(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Value> {
    Ok(ApiResponse::success(state.dashboard.payment_report(&principal).await?))
}
