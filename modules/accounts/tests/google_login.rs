mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::Utc;
use httpmock::prelude::*;
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

use accounts::config::GoogleConfig;
use accounts::domain::model::UserRecord;
use accounts::domain::repo::UsersRepository;
use accounts::domain::service::ProviderLogin;
use accounts::infra::google::{GoogleIdentityProvider, InMemoryStateStore};
use accounts::infra::storage::entity::users;
use accounts::infra::storage::SeaOrmUsersRepository;
use common::{get, TestApp};

fn google_config(server: &MockServer) -> GoogleConfig {
    GoogleConfig {
        client_id: "client-1".into(),
        client_secret: "shh".into(),
        redirect_url: "http://localhost:5161/api/auth/google/callback".into(),
        auth_url: server.url("/o/oauth2/v2/auth"),
        token_url: server.url("/token"),
        userinfo_url: server.url("/userinfo"),
        state_ttl_seconds: 600,
    }
}

async fn app_with_google(server: &MockServer) -> TestApp {
    let google = ProviderLogin {
        provider: Arc::new(GoogleIdentityProvider::new(google_config(server)).unwrap()),
        states: Arc::new(InMemoryStateStore::new(Duration::from_secs(600))),
    };
    TestApp::builder().google(google).build().await
}

async fn mock_provider(server: &MockServer, profile: serde_json::Value) {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(200)
                .json_body(json!({"access_token": "at-1", "token_type": "Bearer"}));
        })
        .await;
    server
        .mock_async(move |when, then| {
            when.method(GET).path("/userinfo");
            then.status(200).json_body(profile.clone());
        })
        .await;
}

/// Follow `google/login` and return the issued state.
async fn start_login(app: &TestApp) -> String {
    let resp = app
        .router
        .clone()
        .oneshot(get("/api/auth/google/login"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = Url::parse(resp.headers()[header::LOCATION].to_str().unwrap()).unwrap();
    let q: HashMap<_, _> = location.query_pairs().into_owned().collect();
    assert_eq!(q["scope"], "openid email profile");
    q["state"].clone()
}

/// Hit the callback and return the redirect target.
async fn callback(app: &TestApp, query: &str) -> Url {
    let req = Request::builder()
        .uri(format!("/api/auth/google/callback?{query}"))
        .body(Body::empty())
        .unwrap();
    let resp = app.router.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    Url::parse(resp.headers()[header::LOCATION].to_str().unwrap()).unwrap()
}

fn query(url: &Url) -> HashMap<String, String> {
    url.query_pairs().into_owned().collect()
}

async fn user_count(app: &TestApp) -> u64 {
    users::Entity::find().count(&app.db).await.unwrap()
}

#[tokio::test]
async fn login_is_unavailable_without_configuration() {
    let app = TestApp::new().await;
    let (status, body) = app.call(get("/api/auth/google/login")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "GOOGLE_NOT_CONFIGURED");
}

#[tokio::test]
async fn first_login_creates_account_without_password() {
    let server = MockServer::start_async().await;
    mock_provider(
        &server,
        json!({"sub": "g-1", "email": "Ana.Lima@Example.com", "name": "Ana Lima"}),
    )
    .await;
    let app = app_with_google(&server).await;

    let state = start_login(&app).await;
    let target = callback(&app, &format!("code=abc&state={state}")).await;

    assert_eq!(target.path(), "/auth/callback");
    let session = app.service.verify_session(&query(&target)["token"]).unwrap();
    assert_eq!(session.email, "ana.lima@example.com");
    assert_eq!(session.user_name, "ana.lima");

    let user = app.service.get_user(session.id).await.unwrap();
    assert!(!user.has_password);
}

#[tokio::test]
async fn existing_email_is_reused_and_names_are_deduplicated() {
    let server = MockServer::start_async().await;
    mock_provider(&server, json!({"sub": "g-2", "email": "ana@example.com", "name": "Ana Lima"})).await;
    let app = app_with_google(&server).await;
    let repo = SeaOrmUsersRepository::new(app.db.clone());
    repo.insert(UserRecord {
        id: Uuid::new_v4(),
        user_name: "ana.lima".into(),
        email: "someone@example.com".into(),
        password_hash: None,
        created_at: Utc::now(),
    })
    .await
    .unwrap();

    let state = start_login(&app).await;
    let first = callback(&app, &format!("code=abc&state={state}")).await;
    let first = app.service.verify_session(&query(&first)["token"]).unwrap();
    assert_eq!(first.user_name, "ana.lima2");
    assert_eq!(user_count(&app).await, 2);

    // Second sign-in lands on the same account
    let state = start_login(&app).await;
    let second = callback(&app, &format!("code=abc&state={state}")).await;
    let second = app.service.verify_session(&query(&second)["token"]).unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(user_count(&app).await, 2);
}

#[tokio::test]
async fn long_profile_names_stay_registrable_after_deduplication() {
    let server = MockServer::start_async().await;
    let long_name = "Maria Fernanda Albuquerque Cavalcanti";
    mock_provider(&server, json!({"sub": "g-3", "email": "mf@example.com", "name": long_name})).await;
    let app = app_with_google(&server).await;
    let taken: String = "maria.fernanda.albuquerque.cavalcanti".chars().take(30).collect();
    SeaOrmUsersRepository::new(app.db.clone())
        .insert(UserRecord {
            id: Uuid::new_v4(),
            user_name: taken.clone(),
            email: "other@example.com".into(),
            password_hash: None,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let state = start_login(&app).await;
    let target = callback(&app, &format!("code=abc&state={state}")).await;
    let session = app.service.verify_session(&query(&target)["token"]).unwrap();

    assert_eq!(session.user_name.chars().count(), 30);
    assert_eq!(session.user_name, format!("{}2", &taken[..29]));
}

#[tokio::test]
async fn profile_without_email_creates_nothing() {
    let server = MockServer::start_async().await;
    mock_provider(&server, json!({"sub": "g-3", "name": "No Mail"})).await;
    let app = app_with_google(&server).await;

    let state = start_login(&app).await;
    let target = callback(&app, &format!("code=abc&state={state}")).await;

    assert_eq!(target.path(), "/");
    assert_eq!(query(&target)["error"], "google_email_missing");
    assert_eq!(user_count(&app).await, 0);
}

#[tokio::test]
async fn forged_or_reused_state_fails() {
    let server = MockServer::start_async().await;
    mock_provider(&server, json!({"sub": "g-4", "email": "ana@example.com"})).await;
    let app = app_with_google(&server).await;

    let forged = callback(&app, "code=abc&state=forged").await;
    assert_eq!(query(&forged)["error"], "google_auth_failed");
    assert_eq!(user_count(&app).await, 0);

    let state = start_login(&app).await;
    let ok = callback(&app, &format!("code=abc&state={state}")).await;
    assert!(query(&ok).contains_key("token"));

    let replay = callback(&app, &format!("code=abc&state={state}")).await;
    assert_eq!(query(&replay)["error"], "google_auth_failed");
}

#[tokio::test]
async fn provider_error_and_failed_exchange_redirect_to_login() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(400).json_body(json!({"error": "invalid_grant"}));
        })
        .await;
    let app = app_with_google(&server).await;

    let state = start_login(&app).await;
    let denied = callback(&app, &format!("error=access_denied&state={state}")).await;
    assert_eq!(query(&denied)["error"], "google_auth_failed");

    let state = start_login(&app).await;
    let failed = callback(&app, &format!("code=bad&state={state}")).await;
    assert_eq!(failed.path(), "/");
    assert_eq!(query(&failed)["error"], "google_auth_failed");

    let state = start_login(&app).await;
    let no_code = callback(&app, &format!("state={state}")).await;
    assert_eq!(query(&no_code)["error"], "google_auth_failed");
    assert_eq!(user_count(&app).await, 0);
}
