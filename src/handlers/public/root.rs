// handlers/public/root.rs - GET / and GET /health

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "Estate API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Property management API with role-scoped access control",
        "endpoints": {
            "auth": "/api/auth/* (register, login, forgot-password public; the rest protected)",
            "users": "/api/users[/:id] (protected)",
            "properties": "/api/properties[/search|/:id] (protected)",
            "leases": "/api/leases[/:id] (protected)",
            "maintenance": "/api/maintenance[/:id] (protected)",
            "payments": "/api/payments[/:id] (protected)",
            "dashboard": "/api/dashboard/overview (protected)",
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let timestamp = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "OK",
                "timestamp": timestamp,
                "environment": state.config.environment,
                "store": state.store.name(),
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "DEGRADED",
                    "timestamp": timestamp,
                    "error": "Database temporarily unavailable",
                })),
            )
        }
    }
}
