use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::auth::bearer_token;
use crate::error::ApiError;
use crate::state::AppState;

/// Verifies the bearer token and attaches the [`Principal`](crate::auth::Principal) as an extension
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok());

    let principal = bearer_token(header)
        .and_then(|token| state.tokens.authenticate(token))
        .map_err(|err| {
            tracing::debug!("Rejected {} {}: {}", request.method(), request.uri().path(), err);
            ApiError::from(err)
        })?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
