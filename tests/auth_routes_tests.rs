mod common;

use axum::http::{StatusCode, header};
use common::{json_request, session_cookie, spawn_app};
use serde_json::json;

#[tokio::test]
async fn login_sets_session_and_me_reports_the_user() {
    let t = spawn_app(|_| {}).await;

    let (status, me) = t.json("GET", "/api/me", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(me.is_null());

    let cookie = t.login_admin().await;
    let (status, me) = t.json("GET", "/api/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "admin");
    assert_eq!(me["role"], "admin");
    assert!(me.get("password_hash").is_none());
}

#[tokio::test]
async fn login_rejects_missing_and_wrong_credentials() {
    let t = spawn_app(|_| {}).await;

    let (status, body) = t
        .json("POST", "/api/login", None, Some(json!({ "username": "admin" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing credentials");

    let (status, body) = t
        .json(
            "POST",
            "/api/login",
            None,
            Some(json!({ "username": "admin", "password": "nope" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, _) = t
        .json(
            "POST",
            "/api/login",
            None,
            Some(json!({ "username": "ghost", "password": "whatever" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_response_carries_hardened_cookie() {
    let t = spawn_app(|cfg| cfg.basic.insecure_cookie = false).await;
    let (status, headers, body) = t
        .send(json_request(
            "POST",
            "/api/login",
            None,
            Some(json!({ "username": "admin", "password": common::ADMIN_PASSWORD })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let raw = headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(raw.starts_with("visitor_session="));
    assert!(raw.contains("HttpOnly"));
    assert!(raw.contains("SameSite=Lax"));
    assert!(raw.contains("Secure"));
    assert!(raw.contains("Path=/"));
}

#[tokio::test]
async fn logout_clears_the_session() {
    let t = spawn_app(|_| {}).await;
    let cookie = t.login_admin().await;

    let (status, headers, body) = t
        .send(json_request("POST", "/api/logout", Some(&cookie), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
    let cleared = session_cookie(&headers).unwrap();
    assert_eq!(cleared, "visitor_session=");
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let t = spawn_app(|_| {}).await;
    let (status, body) = t.json("GET", "/api/visitors", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = t
        .json("GET", "/api/visitors", Some("visitor_session=forged"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn change_password_checks_current_and_length() {
    let t = spawn_app(|_| {}).await;
    let (_, cookie) = t.user_session("sara").await;

    let (status, body) = t
        .json(
            "POST",
            "/api/change-password",
            Some(&cookie),
            Some(json!({ "currentPassword": "secret1", "newPassword": "abc" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorKey"], "profile.passwordTooShort");

    let (status, body) = t
        .json(
            "POST",
            "/api/change-password",
            Some(&cookie),
            Some(json!({ "currentPassword": "wrong-one", "newPassword": "abcdef" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errorKey"], "profile.currentPasswordIncorrect");

    let (status, body) = t
        .json(
            "POST",
            "/api/change-password",
            Some(&cookie),
            Some(json!({ "currentPassword": "secret1", "newPassword": "abcdef" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    t.login("sara", "abcdef").await;
}

#[tokio::test]
async fn health_is_public() {
    let t = spawn_app(|_| {}).await;
    let (status, body) = t.json("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn non_json_body_is_rejected_with_api_error() {
    let t = spawn_app(|_| {}).await;
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/login")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(axum::body::Body::from("username=admin"))
        .unwrap();
    let (status, _, body) = t.send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Expected a JSON request body");
}

#[tokio::test]
async fn oversized_json_body_returns_413() {
    let t = spawn_app(|_| {}).await;
    let cookie = t.login_admin().await;
    let note = "a".repeat(11 * 1024 * 1024);
    let (status, body) = t
        .json(
            "POST",
            "/api/visitors",
            Some(&cookie),
            Some(json!({ "first_name": "A", "last_name": "B", "note": note })),
        )
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
}
