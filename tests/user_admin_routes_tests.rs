mod common;

use axum::http::StatusCode;
use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn admin_manages_accounts() {
    let t = spawn_app(|_| {}).await;
    let admin = t.login_admin().await;

    let (status, user) = t
        .json(
            "POST",
            "/api/users",
            Some(&admin),
            Some(json!({ "username": " reza ", "password": "pass123" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{user}");
    assert_eq!(user["username"], "reza");
    assert_eq!(user["role"], "user");
    let id = user["id"].as_i64().unwrap();

    let (status, body) = t
        .json(
            "POST",
            "/api/users",
            Some(&admin),
            Some(json!({ "username": "reza", "password": "pass123" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already exists");

    let reza = t.login("reza", "pass123").await;
    t.json(
        "POST",
        "/api/visitors",
        Some(&reza),
        Some(json!({ "first_name": "A", "last_name": "B" })),
    )
    .await;

    let (status, list) = t.json("GET", "/api/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let row = list
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["username"] == "reza")
        .unwrap();
    assert_eq!(row["visitor_count"], 1);

    let (status, promoted) = t
        .json(
            "PUT",
            &format!("/api/users/{id}/role"),
            Some(&admin),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(promoted["role"], "admin");

    let (status, body) = t
        .json(
            "POST",
            &format!("/api/users/{id}/password"),
            Some(&admin),
            Some(json!({ "password": "newpass1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    t.login("reza", "newpass1").await;

    let (status, _) = t
        .json("DELETE", &format!("/api/users/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Deleted accounts lose their session and cannot sign in again.
    let (status, _) = t.json("GET", "/api/visitors", Some(&reza), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = t
        .json(
            "POST",
            "/api/login",
            None,
            Some(json!({ "username": "reza", "password": "newpass1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_admin_input_is_validated() {
    let t = spawn_app(|_| {}).await;
    let admin = t.login_admin().await;

    let (status, _) = t
        .json(
            "POST",
            "/api/users",
            Some(&admin),
            Some(json!({ "username": "ab", "password": "pass123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = t
        .json(
            "POST",
            "/api/users",
            Some(&admin),
            Some(json!({ "username": "abc", "password": "123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorKey"], "users.passwordTooShort");

    let (status, _) = t
        .json(
            "POST",
            "/api/users",
            Some(&admin),
            Some(json!({ "username": "abc", "password": "pass123", "role": "root" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .json(
            "PUT",
            "/api/users/9999/role",
            Some(&admin),
            Some(json!({ "role": "user" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_cannot_demote_or_delete_themselves() {
    let t = spawn_app(|_| {}).await;
    let admin = t.login_admin().await;
    let (_, me) = t.json("GET", "/api/me", Some(&admin), None).await;
    let id = me["id"].as_i64().unwrap();

    let (status, _) = t
        .json(
            "PUT",
            &format!("/api/users/{id}/role"),
            Some(&admin),
            Some(json!({ "role": "user" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .json("DELETE", &format!("/api/users/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn regular_users_are_forbidden() {
    let t = spawn_app(|_| {}).await;
    let (_, sara) = t.user_session("sara").await;

    let (status, body) = t.json("GET", "/api/users", Some(&sara), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Forbidden");

    let (status, _) = t
        .json(
            "POST",
            "/api/users",
            Some(&sara),
            Some(json!({ "username": "sneaky", "password": "pass123" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
