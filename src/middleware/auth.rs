use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Key, PrivateCookieJar};

use crate::db::{Scope, User};
use crate::error::DeskError;
use crate::middleware::session::session_user_id;
use crate::router::DeskState;

/// Load the live user behind the request's session cookie, if any.
async fn resolve_user(parts: &mut Parts, state: &DeskState) -> Result<Option<User>, DeskError> {
    let jar = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
        Ok(jar) => jar,
        Err(never) => match never {},
    };
    let Some(id) = session_user_id(&jar, state.session) else {
        return Ok(None);
    };
    state.storage.get_user(id).await
}

/// Signed-in user. Rejects with 401 when the session is missing, expired or
/// belongs to a deleted account.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn scope(&self) -> Scope {
        Scope::for_user(&self.0)
    }
}

impl FromRequestParts<DeskState> for CurrentUser {
    type Rejection = DeskError;

    async fn from_request_parts(parts: &mut Parts, state: &DeskState) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or(DeskError::Unauthorized)
    }
}

impl OptionalFromRequestParts<DeskState> for CurrentUser {
    type Rejection = DeskError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &DeskState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(resolve_user(parts, state).await?.map(CurrentUser))
    }
}

/// Signed-in user with the admin role; 403 for everyone else.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<DeskState> for AdminUser {
    type Rejection = DeskError;

    async fn from_request_parts(parts: &mut Parts, state: &DeskState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) =
            <CurrentUser as FromRequestParts<DeskState>>::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(DeskError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}
