// handlers/protected/resource.rs - bodies shared by the per-resource handlers

use serde_json::Value;

use crate::api::format;
use crate::auth::Principal;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::{Operation, ResourceType};

pub async fn list(state: &AppState, principal: &Principal, resource: ResourceType, query: &Value) -> ApiResult<Value> {
    let page = state.resources.list(principal, resource, query).await?;
    Ok(ApiResponse::success(format::page_body(page)))
}

pub async fn show(state: &AppState, principal: &Principal, resource: ResourceType, id: &str) -> ApiResult<Value> {
    let record = state.resources.get(principal, resource, id).await?;
    Ok(ApiResponse::success(format::record_body(resource, record)))
}

pub async fn create(state: &AppState, principal: &Principal, resource: ResourceType, body: &Value) -> ApiResult<Value> {
    let record = state.resources.create(principal, resource, body).await?;
    Ok(ApiResponse::created(format::mutation_body(resource, Operation::Create, record)))
}

pub async fn update(
    state: &AppState,
    principal: &Principal,
    resource: ResourceType,
    id: &str,
    body: &Value,
) -> ApiResult<Value> {
    let record = state.resources.update(principal, resource, id, body).await?;
    Ok(ApiResponse::success(format::mutation_body(resource, Operation::Update, record)))
}

pub async fn delete(state: &AppState, principal: &Principal, resource: ResourceType, id: &str) -> ApiResult<Value> {
    state.resources.delete(principal, resource, id).await?;
    Ok(ApiResponse::success(format::message_body(format::mutation_message(
        resource,
        Operation::Delete,
    ))))
}

pub async fn status(
    state: &AppState,
    principal: &Principal,
    resource: ResourceType,
    id: &str,
    body: &Value,
) -> ApiResult<Value> {
    let record = state.resources.transition_status(principal, resource, id, body).await?;
    Ok(ApiResponse::success(format::mutation_body(resource, Operation::StatusTransition, record)))
}
