use axum::Json;
use axum::extract::{FromRequest, Request};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::de::DeserializeOwned;

use crate::error::DeskError;

/// `Json<T>` whose rejections use the crate's error body instead of axum's
/// plain-text responses.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = DeskError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> DeskError {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            DeskError::BadRequest("Expected a JSON request body".to_string())
        }
        other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => DeskError::PayloadTooLarge,
        other => DeskError::BadRequest(other.body_text()),
    }
}
