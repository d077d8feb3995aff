use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::db::models::{Contact, NewContact};
use crate::middleware::auth::CurrentUser;
use crate::middleware::json::ApiJson;
use crate::service::validation::{validate_contact, validate_contact_patch};
use crate::types::visitor::ContactPayload;
use crate::{DeskError, router::DeskState};

/// POST /api/visitors/{id}/contacts
pub async fn add_contact(
    State(state): State<DeskState>,
    user: CurrentUser,
    Path(visitor_id): Path<i64>,
    ApiJson(payload): ApiJson<ContactPayload>,
) -> Result<(StatusCode, Json<Contact>), DeskError> {
    let contact = validate_contact(&payload)?;
    let stored = state
        .storage
        .add_contact(visitor_id, contact, user.scope())
        .await?
        .ok_or(DeskError::NotFound("Visitor"))?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// PUT /api/contacts/{id} -> partial update, validated against the stored row.
pub async fn update_contact(
    State(state): State<DeskState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<ContactPayload>,
) -> Result<Json<Contact>, DeskError> {
    let scope = user.scope();
    let current = state
        .storage
        .get_contact(id, scope)
        .await?
        .ok_or(DeskError::NotFound("Contact"))?;
    let current = NewContact {
        kind: current.kind,
        value: current.value,
        label: current.label,
    };
    let patch = validate_contact_patch(&payload, &current)?;
    let updated = state
        .storage
        .update_contact(id, patch, scope)
        .await?
        .ok_or(DeskError::NotFound("Contact"))?;
    Ok(Json(updated))
}

/// DELETE /api/contacts/{id}
pub async fn delete_contact(
    State(state): State<DeskState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, DeskError> {
    if !state.storage.soft_delete_contact(id, user.scope()).await? {
        return Err(DeskError::NotFound("Contact"));
    }
    Ok(StatusCode::NO_CONTENT)
}
