// handlers/protected/users.rs - /api/users (admin writes; managers and landlords read their tenants)

use axum::extract::{Extension, Path, State};
use serde_json::Value;

use super::resource;
use crate::api::{JsonBody, QueryParams};
use crate::auth::Principal;
use crate::middleware::ApiResult;
use crate::state::AppState;
use crate::types::ResourceType;

const RESOURCE: ResourceType = ResourceType::User;

pub async fn list(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    QueryParams(query): QueryParams,
) -> ApiResult<Value> {
    resource::list(&state, &principal, RESOURCE, &query).await
}

pub async fn show(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    resource::show(&state, &principal, RESOURCE, &id).await
}

pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    resource::create(&state, &principal, RESOURCE, &body).await
}

pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    resource::update(&state, &principal, RESOURCE, &id, &body).await
}

pub async fn status(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Value> {
    resource::status(&state, &principal, RESOURCE, &id, &body).await
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    resource::delete(&state, &principal, RESOURCE, &id).await
}
