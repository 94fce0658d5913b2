use serde::Serialize;
use ts_rs::TS;

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
    /// Permission keys the caller is missing, present on plain permission denials only.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    required_permissions: Option<Vec<String>>,
}

impl ErrorResponse {
    pub(super) fn new(message: String) -> Self {
        Self {
            message,
            required_permissions: None,
        }
    }

    pub(super) fn missing_permissions(required_permissions: Vec<String>) -> Self {
        Self {
            message: "forbidden".to_owned(),
            required_permissions: Some(required_permissions),
        }
    }
}
