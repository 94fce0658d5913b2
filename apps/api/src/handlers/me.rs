use axum::Json;
use axum::extract::Extension;
use warden_application::AuthContext;

use crate::dto::MeResponse;

pub async fn me_handler(Extension(context): Extension<AuthContext>) -> Json<MeResponse> {
    Json(MeResponse::from(&context))
}
