mod types;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;
use warden_core::AppError;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. }
            | AppError::EscalationDenied(_)
            | AppError::CrossTenantViolation(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = match self.0 {
            AppError::Forbidden { required } => ErrorResponse::missing_permissions(required),
            AppError::EscalationDenied(_) | AppError::CrossTenantViolation(_) => {
                ErrorResponse::new("forbidden".to_owned())
            }
            AppError::Internal(message) => {
                error!(%message, "request failed with internal error");
                ErrorResponse::new("internal error".to_owned())
            }
            other => ErrorResponse::new(other.to_string()),
        };

        (status, Json(payload)).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use serde_json::{Value, json};
    use warden_core::AppError;

    use super::ApiError;

    async fn render(error: AppError) -> (StatusCode, Value) {
        let response = ApiError(error).into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_else(|error| panic!("failed to read body: {error}"));
        let body = serde_json::from_slice(&body)
            .unwrap_or_else(|error| panic!("body is not json: {error}"));
        (status, body)
    }

    #[tokio::test]
    async fn statuses_follow_error_kind() {
        let cases = [
            (AppError::Validation("bad".to_owned()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("role".to_owned()), StatusCode::NOT_FOUND),
            (AppError::Conflict("slug".to_owned()), StatusCode::CONFLICT),
            (AppError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (
                AppError::EscalationDenied("superuser".to_owned()),
                StatusCode::FORBIDDEN,
            ),
            (
                AppError::CrossTenantViolation("tenant".to_owned()),
                StatusCode::FORBIDDEN,
            ),
            (AppError::Internal("db".to_owned()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            let (status, _) = render(error).await;
            assert_eq!(status, expected);
        }
    }

    #[tokio::test]
    async fn forbidden_body_lists_missing_keys() {
        let (status, body) = render(AppError::missing_permission("erp.invoices.approve")).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body,
            json!({
                "message": "forbidden",
                "required_permissions": ["erp.invoices.approve"],
            })
        );
    }

    #[tokio::test]
    async fn forbidden_subtypes_and_internal_errors_hide_detail() {
        let (_, escalation) = render(AppError::EscalationDenied("role superuser".to_owned())).await;
        let (_, internal) = render(AppError::Internal("connection refused".to_owned())).await;

        assert_eq!(escalation, json!({ "message": "forbidden" }));
        assert_eq!(internal, json!({ "message": "internal error" }));
    }
}
