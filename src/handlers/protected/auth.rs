// handlers/protected/auth.rs - the caller's own account
//
// GET/PUT /api/auth/profile, PUT /api/auth/change-password, POST /api/auth/logout

use axum::extract::{Extension, State};
use serde_json::{json, Value};

use crate::api::{format, JsonBody};
use crate::auth::Principal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

pub async fn profile_get(State(state): State<AppState>, Extension(principal): Extension<Principal>) -> ApiResult<Value> {
    let user = state.auth.profile(&principal).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// Only contact fields change here; role and activation are admin-only
pub async fn profile_put(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    let user = state.auth.update_profile(&principal, &body).await?;
    Ok(ApiResponse::success(json!({
        "message": "Profile updated successfully",
        "user": user,
    })))
}

pub async fn change_password_put(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    state.auth.change_password(&principal, &body).await?;
    Ok(ApiResponse::success(format::message_body("Password changed successfully")))
}

/// Tokens are stateless; the client discards its copy
pub async fn logout_post(State(state): State<AppState>, Extension(principal): Extension<Principal>) -> ApiResult<Value> {
    state.auth.logout(&principal);
    Ok(ApiResponse::success(format::message_body("Logout successful")))
}
