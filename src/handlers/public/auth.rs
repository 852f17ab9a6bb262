// handlers/public/auth.rs - token acquisition
//
// POST /api/auth/register, POST /api/auth/login, POST /api/auth/forgot-password

use axum::extract::State;
use serde_json::{json, Value};

use crate::api::{format, JsonBody};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Creates an account (never ADMIN) and returns it with a token
pub async fn register_post(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult<Value> {
    let session = state.auth.register(&body).await?;
    Ok(ApiResponse::created(json!({
        "message": "User registered successfully",
        "user": session.user,
        "token": session.token,
    })))
}

pub async fn login_post(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult<Value> {
    let session = state.auth.login(&body).await?;
    Ok(ApiResponse::success(json!({
        "message": "Login successful",
        "user": session.user,
        "token": session.token,
    })))
}

pub async fn forgot_password_post(State(state): State<AppState>, JsonBody(body): JsonBody) -> ApiResult<Value> {
    let message = state.auth.forgot_password(&body).await?;
    Ok(ApiResponse::success(format::message_body(message)))
}
