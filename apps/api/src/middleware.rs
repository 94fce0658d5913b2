use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;
use warden_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Authenticates the bearer credential and stores the resulting `AuthContext`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let Some(token) = extract_bearer(request.headers()).map(str::to_owned) else {
        debug!("request without bearer credential");
        return Err(AppError::Unauthenticated.into());
    };

    let context = state
        .request_authenticator
        .authenticate(token.as_str())
        .await?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
