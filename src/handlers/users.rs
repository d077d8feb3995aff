use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;

use crate::db::models::UserSummary;
use crate::db::{Role, User};
use crate::middleware::auth::AdminUser;
use crate::middleware::json::ApiJson;
use crate::service::passwords::hash_password;
use crate::service::validation::{validate_password, validate_role, validate_username};
use crate::types::user::{CreateUserRequest, OkResponse, RoleRequest, SetPasswordRequest};
use crate::{DeskError, router::DeskState};

/// GET /api/users
pub async fn list_users(
    State(state): State<DeskState>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserSummary>>, DeskError> {
    Ok(Json(state.storage.list_users().await?))
}

/// POST /api/users -> 201 with the new account; `role` defaults to `user`.
pub async fn create_user(
    State(state): State<DeskState>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), DeskError> {
    let username = validate_username(req.username.as_deref())?;
    let password = validate_password(req.password.as_deref())?;
    let role = match req.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(raw) => validate_role(Some(raw))?,
        None => Role::User,
    };

    if state.storage.username_taken(&username).await? {
        return Err(DeskError::Conflict("Username already exists".to_string()));
    }
    let hash = hash_password(password).await?;
    let user = state.storage.create_user(&username, &hash, role).await?;
    info!(by = admin.id, user_id = user.id, %username, %role, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/{id}/role
pub async fn set_role(
    State(state): State<DeskState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<RoleRequest>,
) -> Result<Json<User>, DeskError> {
    let role = validate_role(req.role.as_deref())?;
    if id == admin.id {
        return Err(DeskError::BadRequest("You cannot change your own role".to_string()));
    }
    let user = state
        .storage
        .set_role(id, role)
        .await?
        .ok_or(DeskError::NotFound("User"))?;
    info!(by = admin.id, user_id = id, %role, "role changed");
    Ok(Json(user))
}

/// POST /api/users/{id}/password -> admin reset, no current password needed.
pub async fn set_password(
    State(state): State<DeskState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<SetPasswordRequest>,
) -> Result<Json<OkResponse>, DeskError> {
    let password = validate_password(req.password.as_deref())?;
    let hash = hash_password(password).await?;
    if !state.storage.set_password(id, &hash).await? {
        return Err(DeskError::NotFound("User"));
    }
    info!(by = admin.id, user_id = id, "password reset");
    Ok(Json(OkResponse::YES))
}

/// DELETE /api/users/{id} -> soft delete; the account's visitors are kept.
pub async fn delete_user(
    State(state): State<DeskState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, DeskError> {
    if id == admin.id {
        return Err(DeskError::BadRequest("You cannot delete your own account".to_string()));
    }
    if !state.storage.soft_delete_user(id).await? {
        return Err(DeskError::NotFound("User"));
    }
    info!(by = admin.id, user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
