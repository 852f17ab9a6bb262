use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Public
        .route("/", get(public::root::root))
        .route("/health", get(public::root::health))
        .merge(auth_public_routes())
        // Protected
        .merge(protected_routes(state.clone()))
        .fallback(route_not_found)
        // Global middleware
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(cors_layer(&config.security.cors_origins));

    let router = if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register_post))
        .route("/api/auth/login", post(auth::login_post))
        .route("/api/auth/forgot-password", post(auth::forgot_password_post))
}

/// Every route here requires a Bearer token. `route_layer` keeps unknown
/// paths out of the middleware so they still fall through to the 404 handler.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(property_routes())
        .merge(lease_routes())
        .merge(maintenance_routes())
        .merge(payment_routes())
        .merge(dashboard_routes())
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn auth_routes() -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/profile", get(auth::profile_get).put(auth::profile_put))
        .route("/api/auth/change-password", put(auth::change_password_put))
        .route("/api/auth/logout", post(auth::logout_post))
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/:id", get(users::show).put(users::update).delete(users::delete))
        .route("/api/users/:id/status", patch(users::status))
}

fn property_routes() -> Router<AppState> {
    use protected::properties;

    Router::new()
        .route("/api/properties", get(properties::list).post(properties::create))
        .route("/api/properties/search", get(properties::search))
        .route(
            "/api/properties/:id",
            get(properties::show).put(properties::update).delete(properties::delete),
        )
        .route("/api/properties/:id/status", patch(properties::status))
}

fn lease_routes() -> Router<AppState> {
    use protected::leases;

    Router::new()
        .route("/api/leases", get(leases::list).post(leases::create))
        .route("/api/leases/:id", get(leases::show).put(leases::update).delete(leases::delete))
        .route("/api/leases/:id/status", patch(leases::status))
}

fn maintenance_routes() -> Router<AppState> {
    use protected::maintenance;

    Router::new()
        .route("/api/maintenance", get(maintenance::list).post(maintenance::create))
        .route("/api/maintenance/:id", get(maintenance::show).put(maintenance::update))
        .route("/api/maintenance/:id/status", patch(maintenance::status))
        .route("/api/maintenance/:id/assign", patch(maintenance::assign))
}

fn payment_routes() -> Router<AppState> {
    use protected::payments;

    Router::new()
        .route("/api/payments", get(payments::list).post(payments::create))
        .route("/api/payments/:id", get(payments::show).put(payments::update))
        .route("/api/payments/:id/status", patch(payments::status))
        .route("/api/payments/:id/process", post(payments::process))
}

fn dashboard_routes() -> Router<AppState> {
    use protected::dashboard;

    Router::new()
        .route("/api/dashboard/overview", get(dashboard::overview_get))
        .route("/api/dashboard/stats", get(dashboard::overview_get))
        .route("/api/dashboard/revenue", get(dashboard::revenue_get))
        .route("/api/dashboard/expenses", get(dashboard::expenses_get))
        .route("/api/dashboard/reports/occupancy", get(dashboard::occupancy_report_get))
        .route("/api/dashboard/reports/maintenance", get(dashboard::maintenance_report_get))
        .route("/api/dashboard/reports/payments", get(dashboard::payment_report_get))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}
