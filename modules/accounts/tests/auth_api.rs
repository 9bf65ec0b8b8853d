mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use accounts::domain::model::UserRecord;
use accounts::domain::repo::UsersRepository;
use accounts::infra::storage::SeaOrmUsersRepository;
use common::{get, TestApp};

#[tokio::test]
async fn register_returns_token_and_identity() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post_json(
            "/api/auth/register",
            json!({"email": "  Ana@Example.COM ", "userName": "ana", "password": "secret1"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userName"], "ana");
    assert_eq!(body["email"], "ana@example.com");
    let session = app
        .service
        .verify_session(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(session.id.to_string(), body["id"].as_str().unwrap());
    assert_eq!(session.email, "ana@example.com");
}

#[tokio::test]
async fn losing_a_registration_race_is_still_a_conflict() {
    let app = TestApp::builder().racing_users().build().await;
    app.register("ana@example.com", "ana", "secret1").await;

    let (status, body) = app
        .post_json(
            "/api/auth/register",
            json!({"email": "ana@example.com", "userName": "other", "password": "secret1"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["code"], "EMAIL_TAKEN");

    let app = TestApp::builder().racing_users().build().await;
    app.register("ana@example.com", "ana", "secret1").await;

    let (status, body) = app
        .post_json(
            "/api/auth/register",
            json!({"email": "new@example.com", "userName": "ana", "password": "secret1"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert_eq!(body["code"], "USERNAME_TAKEN");
}

#[tokio::test]
async fn register_rejects_taken_email_and_user_name() {
    let app = TestApp::new().await;
    app.register("ana@example.com", "ana", "secret1").await;

    let (status, body) = app
        .post_json(
            "/api/auth/register",
            json!({"email": "ANA@example.com", "userName": "other", "password": "secret1"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "EMAIL_TAKEN");

    let (status, body) = app
        .post_json(
            "/api/auth/register",
            json!({"email": "new@example.com", "userName": "ana", "password": "secret1"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "USERNAME_TAKEN");
}

#[tokio::test]
async fn register_validates_input() {
    let app = TestApp::new().await;

    let cases = [
        (json!({"email": "not-an-email", "userName": "ana", "password": "secret1"}), "INVALID_EMAIL"),
        (json!({"email": "ana@example.com", "userName": "ana lima", "password": "secret1"}), "INVALID_USERNAME"),
        (json!({"email": "ana@example.com", "userName": "", "password": "secret1"}), "INVALID_USERNAME"),
        (json!({"email": "ana@example.com", "userName": "ana", "password": "123"}), "WEAK_PASSWORD"),
    ];
    for (req, code) in cases {
        let (status, body) = app.post_json("/api/auth/register", req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["code"], code);
        assert_eq!(body["status"], 400);
        assert_eq!(body["instance"], "/api/auth/register");
    }
}

#[tokio::test]
async fn login_by_email_or_user_name() {
    let app = TestApp::new().await;
    app.register("ana@example.com", "ana", "secret1").await;

    for body in [
        json!({"login": "ana", "password": "secret1"}),
        json!({"login": "ANA@example.com", "password": "secret1"}),
        json!({"email": "ana@example.com", "password": "secret1"}),
        json!({"emailOrUserName": "ana", "password": "secret1"}),
    ] {
        let (status, resp) = app.post_json("/api/auth/login", body).await;
        assert_eq!(status, StatusCode::OK, "{resp}");
        assert_eq!(resp["userName"], "ana");
        assert!(resp["token"].as_str().is_some_and(|t| !t.is_empty()));
    }
}

#[tokio::test]
async fn login_failures_do_not_say_which_field_was_wrong() {
    let app = TestApp::new().await;
    app.register("ana@example.com", "ana", "secret1").await;

    let (s1, wrong_password) = app
        .post_json("/api/auth/login", json!({"login": "ana", "password": "nope!!"}))
        .await;
    let (s2, unknown_user) = app
        .post_json("/api/auth/login", json!({"login": "bob", "password": "secret1"}))
        .await;

    assert_eq!(s1, StatusCode::UNAUTHORIZED);
    assert_eq!(s2, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password["code"], "INVALID_CREDENTIALS");
    assert_eq!(wrong_password["detail"], unknown_user["detail"]);
}

#[tokio::test]
async fn login_on_google_account_is_rejected_with_explicit_message() {
    let app = TestApp::new().await;
    SeaOrmUsersRepository::new(app.db.clone())
        .insert(UserRecord {
            id: Uuid::new_v4(),
            user_name: "gina".into(),
            email: "gina@example.com".into(),
            password_hash: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let (status, body) = app
        .post_json(
            "/api/auth/login",
            json!({"login": "gina@example.com", "password": "whatever"}),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "GOOGLE_ACCOUNT");
    assert_eq!(
        body["detail"],
        "This account was created via Google. Use Google sign-in."
    );
}

#[tokio::test]
async fn me_requires_a_valid_bearer_token() {
    let app = TestApp::new().await;
    let token = app.register("ana@example.com", "ana", "secret1").await;

    let (status, _) = app.call(get("/api/auth/me")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let bad = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, "Bearer not.a.jwt")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.call(bad).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let ok = Request::builder()
        .uri("/api/auth/me")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.call(ok).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userName"], "ana");
    assert_eq!(body["email"], "ana@example.com");
}

#[tokio::test]
async fn problems_carry_the_request_id() {
    let app = TestApp::new().await;
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-request-id", "req-123")
        .body(Body::from(json!({"login": "x", "password": "y"}).to_string()))
        .unwrap();

    let (status, body) = app.call(req).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["request_id"], "req-123");
}

#[tokio::test]
async fn local_client_resolves_users() {
    use accounts::contract::AccountsApi;
    use accounts::gateways::local::AccountsLocalClient;

    let app = TestApp::new().await;
    let token = app.register("ana@example.com", "ana", "secret1").await;
    let client = AccountsLocalClient::new(app.service.clone());

    let session = client.verify_session(&token).await.unwrap();
    let user = client.get_user(session.id).await.unwrap();
    assert_eq!(user.user_name, "ana");
    assert!(user.has_password);

    let users = client.get_users(&[session.id, Uuid::new_v4()]).await.unwrap();
    assert_eq!(users.len(), 1);

    assert_eq!(
        client.get_user(Uuid::nil()).await,
        Err(accounts::AccountsError::NotFound { id: Uuid::nil() })
    );
    assert_eq!(
        client.verify_session("garbage").await,
        Err(accounts::AccountsError::Unauthorized)
    );
}
