use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::db::Visitor;
use crate::middleware::auth::CurrentUser;
use crate::middleware::json::ApiJson;
use crate::service::validation::{validate_new_visitor, validate_visitor_patch};
use crate::types::visitor::{CreatedVisitor, VisitorPayload};
use crate::{DeskError, router::DeskState};

/// GET /api/visitors -> newest first, limited to the caller's scope.
pub async fn list_visitors(
    State(state): State<DeskState>,
    user: CurrentUser,
) -> Result<Json<Vec<Visitor>>, DeskError> {
    Ok(Json(state.storage.list_visitors(user.scope()).await?))
}

/// GET /api/visitors/{id}
pub async fn get_visitor(
    State(state): State<DeskState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Visitor>, DeskError> {
    state
        .storage
        .get_visitor(id, user.scope())
        .await?
        .map(Json)
        .ok_or(DeskError::NotFound("Visitor"))
}

/// POST /api/visitors -> stores the visitor, then sends the welcome SMS and
/// email. Notification failures are reported on the body, never as errors.
pub async fn create_visitor(
    State(state): State<DeskState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<VisitorPayload>,
) -> Result<(StatusCode, Json<CreatedVisitor>), DeskError> {
    let new = validate_new_visitor(&payload)?;
    let visitor = state.storage.create_visitor(new, user.id).await?;
    info!(visitor_id = visitor.row.id, by = user.id, "visitor registered");

    let mut created = CreatedVisitor::new(visitor);
    state.notifier.welcome(&mut created).await;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/visitors/{id}
pub async fn update_visitor(
    State(state): State<DeskState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<VisitorPayload>,
) -> Result<Json<Visitor>, DeskError> {
    let patch = validate_visitor_patch(&payload)?;
    let visitor = state
        .storage
        .update_visitor(id, patch, user.scope())
        .await?
        .ok_or(DeskError::NotFound("Visitor"))?;
    Ok(Json(visitor))
}

/// DELETE /api/visitors/{id}
pub async fn delete_visitor(
    State(state): State<DeskState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, DeskError> {
    if !state.storage.soft_delete_visitor(id, user.scope()).await? {
        return Err(DeskError::NotFound("Visitor"));
    }
    info!(visitor_id = id, by = user.0.id, "visitor deleted");
    Ok(StatusCode::NO_CONTENT)
}
