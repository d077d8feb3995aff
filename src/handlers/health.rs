use axum::Json;

use crate::types::user::OkResponse;

/// GET /api/health
pub async fn health() -> Json<OkResponse> {
    Json(OkResponse::YES)
}
