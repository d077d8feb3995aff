use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::{delete, get, post, put},
};
use axum_extra::extract::cookie::Key;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::warn;

use crate::config::Config;
use crate::db::Storage;
use crate::handlers::{auth, contacts, health, media, notify, users, visitors};
use crate::middleware::session::SessionSettings;
use crate::service::notifier::Notifier;

const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct DeskState {
    pub storage: Storage,
    pub notifier: Notifier,
    pub session: SessionSettings,
    pub config: Arc<Config>,
    key: Key,
}

impl DeskState {
    pub fn new(storage: Storage, notifier: Notifier, config: Arc<Config>) -> Self {
        let key = session_key(config.basic.session_secret.as_deref());
        let session = SessionSettings {
            hours: config.basic.session_hours.max(1),
            secure: !config.basic.insecure_cookie,
        };
        Self {
            storage,
            notifier,
            session,
            config,
            key,
        }
    }
}

impl FromRef<DeskState> for Key {
    fn from_ref(state: &DeskState) -> Self {
        state.key.clone()
    }
}

/// Cookie key from the configured secret; a random key (sessions lost on
/// restart) when none of sufficient length is set.
fn session_key(secret: Option<&str>) -> Key {
    match secret.map(|s| Key::try_from(s.as_bytes())) {
        Some(Ok(key)) => key,
        Some(Err(e)) => {
            warn!(error = %e, "session_secret rejected, using a random key");
            Key::generate()
        }
        None => {
            warn!("session_secret not set, sessions will not survive a restart");
            Key::generate()
        }
    }
}

pub fn desk_router(state: DeskState) -> Router {
    let uploads = Router::new()
        .route("/api/visitors/{id}/photos", post(media::upload_photos))
        .route("/api/visitors/{id}/voice", post(media::upload_voice))
        .layer(DefaultBodyLimit::max(state.config.upload_limit_bytes()));

    let api = Router::new()
        .route("/api/health", get(health::health))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/me", get(auth::me))
        .route("/api/change-password", post(auth::change_password))
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route("/api/users/{id}", delete(users::delete_user))
        .route("/api/users/{id}/role", put(users::set_role))
        .route("/api/users/{id}/password", post(users::set_password))
        .route(
            "/api/visitors",
            get(visitors::list_visitors).post(visitors::create_visitor),
        )
        .route(
            "/api/visitors/{id}",
            get(visitors::get_visitor)
                .put(visitors::update_visitor)
                .delete(visitors::delete_visitor),
        )
        .route("/api/visitors/{id}/contacts", post(contacts::add_contact))
        .route(
            "/api/contacts/{id}",
            put(contacts::update_contact).delete(contacts::delete_contact),
        )
        .route("/api/photos/{id}", delete(media::delete_photo))
        .route("/api/voices/{id}", delete(media::delete_voice))
        .route("/api/sms/send", post(notify::sms_send))
        .route("/api/sms/test", get(notify::sms_test))
        .route("/api/email/send", post(notify::email_send))
        .route("/api/email/test", get(notify::email_test))
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT));

    let basic = &state.config.basic;
    let uploads_dir = ServeDir::new(&basic.uploads_dir);
    let public_dir = ServeDir::new(&basic.public_dir);

    Router::new()
        .merge(api)
        .merge(uploads)
        .nest_service("/uploads", uploads_dir)
        .fallback_service(public_dir)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
