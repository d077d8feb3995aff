use axum::{Json, extract::State};
use axum_extra::extract::cookie::PrivateCookieJar;
use tracing::{info, warn};

use crate::db::User;
use crate::middleware::auth::CurrentUser;
use crate::middleware::json::ApiJson;
use crate::middleware::session::{end_session, start_session};
use crate::service::passwords::{hash_password, verify_password};
use crate::service::validation::PASSWORD_MIN;
use crate::types::user::{ChangePasswordRequest, LoginRequest, LoginResponse, OkResponse};
use crate::{DeskError, router::DeskState};

/// POST /api/login -> verifies the password and starts a cookie session.
pub async fn login(
    State(state): State<DeskState>,
    jar: PrivateCookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<(PrivateCookieJar, Json<LoginResponse>), DeskError> {
    let (Some(username), Some(password)) = (
        req.username.filter(|u| !u.is_empty()),
        req.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(DeskError::BadRequest("Missing credentials".to_string()));
    };

    let Some(creds) = state.storage.get_user_credentials(&username).await? else {
        info!(%username, "login for unknown user");
        return Err(DeskError::InvalidCredentials);
    };
    if !verify_password(&password, &creds.password_hash).await? {
        warn!(%username, "login with wrong password");
        return Err(DeskError::InvalidCredentials);
    }

    info!(user_id = creds.id, %username, "user signed in");
    let jar = start_session(jar, creds.id, state.session);
    Ok((
        jar,
        Json(LoginResponse {
            id: creds.id,
            username: creds.username,
            role: creds.role,
        }),
    ))
}

/// POST /api/logout
pub async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, Json<OkResponse>) {
    (end_session(jar), Json(OkResponse::YES))
}

/// GET /api/me -> the signed-in user, or `null`.
pub async fn me(user: Option<CurrentUser>) -> Json<Option<User>> {
    Json(user.map(|CurrentUser(u)| u))
}

/// POST /api/change-password
pub async fn change_password(
    State(state): State<DeskState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> Result<Json<OkResponse>, DeskError> {
    let (Some(current), Some(new)) = (
        req.current_password.filter(|p| !p.is_empty()),
        req.new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(DeskError::BadRequestKey {
            message: "Current password and new password are required".to_string(),
            key: "profile.fillAllFields",
        });
    };
    if new.chars().count() < PASSWORD_MIN {
        return Err(DeskError::BadRequestKey {
            message: format!("New password must be at least {PASSWORD_MIN} characters long"),
            key: "profile.passwordTooShort",
        });
    }

    let hash = state
        .storage
        .get_password_hash(user.id)
        .await?
        .ok_or(DeskError::Unauthorized)?;
    if !verify_password(&current, &hash).await? {
        return Err(DeskError::WrongPassword);
    }

    let hash = hash_password(&new).await?;
    state.storage.set_password(user.id, &hash).await?;
    info!(user_id = user.id, "password changed");
    Ok(Json(OkResponse::YES))
}
