use axum::{
    Json,
    extract::{
        Multipart, Path, State,
        multipart::{Field, MultipartError},
    },
    http::StatusCode,
};
use tracing::info;

use crate::db::models::{NewPhoto, NewVoice, Photo, Voice};
use crate::middleware::auth::CurrentUser;
use crate::service::uploads::{StoredFile, save_upload};
use crate::{DeskError, router::DeskState};

pub const MAX_PHOTOS_PER_UPLOAD: usize = 10;

fn multipart_error(err: MultipartError) -> DeskError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DeskError::PayloadTooLarge
    } else {
        DeskError::BadRequest(err.body_text())
    }
}

async fn store_field(state: &DeskState, field: Field<'_>) -> Result<StoredFile, DeskError> {
    let original = field.file_name().map(str::to_owned);
    let bytes = field.bytes().await.map_err(multipart_error)?;
    save_upload(&state.config.basic.uploads_dir, original.as_deref(), &bytes).await
}

/// POST /api/visitors/{id}/photos -> multipart field `photos`, up to ten files.
pub async fn upload_photos(
    State(state): State<DeskState>,
    user: CurrentUser,
    Path(visitor_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<Photo>>), DeskError> {
    let scope = user.scope();
    if !state.storage.visitor_visible(visitor_id, scope).await? {
        return Err(DeskError::NotFound("Visitor"));
    }

    let mut photos = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("photos") {
            continue;
        }
        if photos.len() == MAX_PHOTOS_PER_UPLOAD {
            return Err(DeskError::BadRequest(format!(
                "At most {MAX_PHOTOS_PER_UPLOAD} photos per upload"
            )));
        }
        let original_name = field.file_name().map(str::to_owned);
        let stored = store_field(&state, field).await?;
        photos.push(NewPhoto {
            filename: stored.filename,
            url: stored.url,
            original_name,
        });
    }

    let created = state
        .storage
        .add_photos(visitor_id, photos, scope)
        .await?
        .ok_or(DeskError::NotFound("Visitor"))?;
    info!(visitor_id, count = created.len(), "photos uploaded");
    Ok((StatusCode::CREATED, Json(created)))
}

/// Browser recordings report a fractional duration; zero or garbage means unknown.
fn parse_duration_ms(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .map(|ms| ms as i64)
        .filter(|ms| *ms > 0)
}

/// POST /api/visitors/{id}/voice -> multipart field `voice` plus optional
/// `durationMs`.
pub async fn upload_voice(
    State(state): State<DeskState>,
    user: CurrentUser,
    Path(visitor_id): Path<i64>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Voice>), DeskError> {
    let scope = user.scope();
    if !state.storage.visitor_visible(visitor_id, scope).await? {
        return Err(DeskError::NotFound("Visitor"));
    }

    let mut voice = None;
    let mut duration_ms = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("voice") if voice.is_none() => {
                let mime_type = field.content_type().map(str::to_owned);
                let stored = store_field(&state, field).await?;
                voice = Some((stored, mime_type));
            }
            Some("durationMs") => {
                let raw = field.text().await.map_err(multipart_error)?;
                duration_ms = parse_duration_ms(&raw);
            }
            _ => {}
        }
    }

    let Some((stored, mime_type)) = voice else {
        return Err(DeskError::BadRequest("No voice file uploaded".to_string()));
    };
    let new = NewVoice {
        filename: stored.filename,
        url: stored.url,
        mime_type,
        duration_ms,
    };
    let created = state
        .storage
        .add_voice(visitor_id, new, scope)
        .await?
        .ok_or(DeskError::NotFound("Visitor"))?;
    info!(visitor_id, voice_id = created.id, "voice note uploaded");
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/photos/{id} -> soft delete; the file stays on disk.
pub async fn delete_photo(
    State(state): State<DeskState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, DeskError> {
    let scope = user.scope();
    let photo = state
        .storage
        .get_photo(id, scope)
        .await?
        .ok_or(DeskError::NotFound("Photo"))?;
    state.storage.soft_delete_photo(photo.id, scope).await?;
    info!(photo_id = photo.id, filename = %photo.filename, "photo removed");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/voices/{id}
pub async fn delete_voice(
    State(state): State<DeskState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, DeskError> {
    if !state.storage.soft_delete_voice(id, user.scope()).await? {
        return Err(DeskError::NotFound("Voice"));
    }
    Ok(StatusCode::NO_CONTENT)
}
