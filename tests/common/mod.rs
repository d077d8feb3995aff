#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use visitor_desk::config::Config;
use visitor_desk::db::{Role, Storage};
use visitor_desk::router::{DeskState, desk_router};
use visitor_desk::service::{accounts, notifier::Notifier, passwords::hash_password};

pub const ADMIN_PASSWORD: &str = "admin123";

pub struct TestApp {
    pub app: Router,
    pub storage: Storage,
    pub dir: TempDir,
}

/// Router over a fresh SQLite file with the default admin seeded.
pub async fn spawn_app(configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut cfg = Config::default();
    cfg.basic.database_url = format!("sqlite:{}", dir.path().join("app.sqlite").display());
    cfg.basic.uploads_dir = dir.path().join("uploads");
    cfg.basic.public_dir = dir.path().join("public");
    cfg.basic.session_secret = Some("s".repeat(64));
    cfg.basic.insecure_cookie = true;
    cfg.notify.per_minute = 1000;
    configure(&mut cfg);

    std::fs::create_dir_all(&cfg.basic.public_dir).expect("public dir");
    let storage = visitor_desk::db::connect(&cfg.basic.database_url)
        .await
        .expect("database");
    accounts::seed_default_admin(&storage, ADMIN_PASSWORD)
        .await
        .expect("seed admin");
    let notifier = Notifier::new(&cfg).expect("notifier");
    let state = DeskState::new(storage.clone(), notifier, Arc::new(cfg));

    TestApp {
        app: desk_router(state),
        storage,
        dir,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let resp = self.app.clone().oneshot(req).await.expect("request failed");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, headers, body)
    }

    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, body) = self.send(json_request(method, uri, cookie, body)).await;
        (status, body)
    }

    /// Signs in and returns the `cookie` header value for later requests.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, headers, body) = self
            .send(json_request(
                "POST",
                "/api/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        session_cookie(&headers).expect("login did not set a session cookie")
    }

    pub async fn login_admin(&self) -> String {
        self.login("admin", ADMIN_PASSWORD).await
    }

    /// Creates a regular user directly in storage and signs it in.
    pub async fn user_session(&self, username: &str) -> (i64, String) {
        let hash = hash_password("secret1").await.expect("hash");
        let user = self
            .storage
            .create_user(username, &hash, Role::User)
            .await
            .expect("create user");
        (user.id, self.login(username, "secret1").await)
    }
}

pub fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("failed to build request")
}

pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("visitor_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
}

pub fn multipart_body(boundary: &str, parts: &[(&str, Option<&str>, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content_type, data) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, cookie: &str, boundary: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .expect("failed to build request")
}
