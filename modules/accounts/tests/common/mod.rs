#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use tower::ServiceExt;

use accounts::{
    config::JwtConfig,
    domain::{
        mail::ResetMailTemplate,
        model::{OutgoingMail, UserRecord},
        ports::Mailer,
        repo::UsersRepository,
        service::{ProviderLogin, Service, ServiceConfig, ServiceDeps},
    },
    infra::{
        crypto::{Argon2Hasher, JwtTokenIssuer},
        storage::{migrations::Migrator, SeaOrmResetTokenRepository, SeaOrmUsersRepository},
    },
};

pub const JWT_KEY: &str = "test-signing-key-0123456789abcdef";

/// Fresh in-memory database with the accounts schema.
pub async fn test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        key: JWT_KEY.to_string(),
        issuer: "Stargram.Api".to_string(),
        audience: "Stargram.Client".to_string(),
        expires_hours: 8,
    }
}

/// Keeps every mail instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()> {
        self.sent.lock().push(mail);
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _mail: OutgoingMail) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }
}

/// Users repository whose existence checks report "free" until an insert fails,
/// like a registration racing one that commits between its checks and its insert.
pub struct RacingUsers {
    inner: SeaOrmUsersRepository<DatabaseConnection>,
    lost_race: AtomicBool,
}

impl RacingUsers {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            inner: SeaOrmUsersRepository::new(db),
            lost_race: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl UsersRepository for RacingUsers {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>> {
        self.inner.find_by_id(id).await
    }
    async fn find_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<UserRecord>> {
        self.inner.find_by_ids(ids).await
    }
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        self.inner.find_by_email(email).await
    }
    async fn find_by_user_name(&self, user_name: &str) -> anyhow::Result<Option<UserRecord>> {
        self.inner.find_by_user_name(user_name).await
    }
    async fn email_exists(&self, email: &str) -> anyhow::Result<bool> {
        if !self.lost_race.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.email_exists(email).await
    }
    async fn user_name_exists(&self, user_name: &str) -> anyhow::Result<bool> {
        if !self.lost_race.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.user_name_exists(user_name).await
    }
    async fn insert(&self, user: UserRecord) -> anyhow::Result<()> {
        let res = self.inner.insert(user).await;
        if res.is_err() {
            self.lost_race.store(true, Ordering::SeqCst);
        }
        res
    }
}

/// Mock OpenAPI registry for testing
pub struct NoopRegistry;

impl modkit::api::OpenApiRegistry for NoopRegistry {
    fn register_operation(&self, _spec: &modkit::api::OperationSpec) {}

    fn ensure_schema_raw(&self, name: &str, _schemas: modkit::api::SchemaCollection) -> String {
        name.to_string()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub struct TestApp {
    pub db: DatabaseConnection,
    pub service: Arc<Service>,
    pub router: Router,
    pub mailer: Arc<RecordingMailer>,
}

pub struct TestAppBuilder {
    google: Option<ProviderLogin>,
    mailer: Option<Arc<dyn Mailer>>,
    racing_users: bool,
}

impl TestApp {
    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            google: None,
            mailer: None,
            racing_users: false,
        }
    }

    pub async fn new() -> Self {
        Self::builder().build().await
    }

    pub async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn post_json(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.call(json_request(path, body)).await
    }

    /// Register an account and return its session token.
    pub async fn register(&self, email: &str, user_name: &str, password: &str) -> String {
        let (status, body) = self
            .post_json(
                "/api/auth/register",
                serde_json::json!({"email": email, "userName": user_name, "password": password}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }
}

impl TestAppBuilder {
    pub fn google(mut self, google: ProviderLogin) -> Self {
        self.google = Some(google);
        self
    }

    pub fn mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn racing_users(mut self) -> Self {
        self.racing_users = true;
        self
    }

    pub async fn build(self) -> TestApp {
        let db = test_db().await;
        let recording = Arc::new(RecordingMailer::default());
        let mailer: Arc<dyn Mailer> = self.mailer.unwrap_or_else(|| recording.clone());
        let deps = ServiceDeps {
            users: if self.racing_users {
                Arc::new(RacingUsers::new(db.clone()))
            } else {
                Arc::new(SeaOrmUsersRepository::new(db.clone()))
            },
            reset_tokens: Arc::new(SeaOrmResetTokenRepository::new(db.clone())),
            hasher: Arc::new(Argon2Hasher::with_params(
                argon2::Params::new(1024, 1, 1, None).unwrap(),
            )),
            tokens: Arc::new(JwtTokenIssuer::new(&jwt_config())),
            mailer,
            reset_mail: ResetMailTemplate::default(),
            google: self.google,
        };
        let service = Arc::new(Service::new(deps, ServiceConfig::default()));
        let router = accounts::api::rest::routes::register_routes(
            Router::new(),
            &NoopRegistry,
            service.clone(),
        )
        .expect("Failed to register routes");
        TestApp {
            db,
            service,
            router,
            mailer: recording,
        }
    }
}

pub fn json_request(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

/// Extract the `token` query value from the first link in a mail body.
pub fn token_from_mail(html: &str) -> String {
    let start = html.find("token=").expect("mail has no token link") + "token=".len();
    html[start..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
