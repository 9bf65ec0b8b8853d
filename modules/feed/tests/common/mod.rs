#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use parking_lot::Mutex;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use accounts::{AccountsApi, AccountsError, SessionUser, User};
use feed::{
    api::rest::routes::{register_routes, MediaRoute},
    domain::service::{Service, ServiceConfig},
    infra::{
        media::LocalMediaStore,
        storage::{migrations::Migrator, SeaOrmPostsRepository, SeaOrmStarsRepository},
    },
};

/// Fresh in-memory database with the feed schema.
pub async fn test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// In-memory accounts: users by id and opaque session tokens.
#[derive(Default)]
pub struct FakeAccounts {
    users: Mutex<HashMap<Uuid, User>>,
    sessions: Mutex<HashMap<String, Uuid>>,
}

impl FakeAccounts {
    pub fn add_user(&self, user_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.users.lock().insert(
            id,
            User {
                id,
                user_name: user_name.to_string(),
                email: format!("{user_name}@example.com"),
                has_password: true,
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn remove_user(&self, id: Uuid) {
        self.users.lock().remove(&id);
    }

    pub fn session_for(&self, id: Uuid) -> String {
        let token = format!("session-{}", Uuid::new_v4().simple());
        self.sessions.lock().insert(token.clone(), id);
        token
    }
}

#[async_trait]
impl AccountsApi for FakeAccounts {
    async fn verify_session(&self, token: &str) -> Result<SessionUser, AccountsError> {
        let id = *self
            .sessions
            .lock()
            .get(token)
            .ok_or(AccountsError::Unauthorized)?;
        let users = self.users.lock();
        let user = users.get(&id).ok_or(AccountsError::Unauthorized)?;
        Ok(SessionUser {
            id,
            user_name: user.user_name.clone(),
            email: user.email.clone(),
        })
    }

    async fn get_user(&self, id: Uuid) -> Result<User, AccountsError> {
        self.users
            .lock()
            .get(&id)
            .cloned()
            .ok_or(AccountsError::NotFound { id })
    }

    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AccountsError> {
        let users = self.users.lock();
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
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
    pub accounts: Arc<FakeAccounts>,
    pub media_dir: tempfile::TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(ServiceConfig::default()).await
    }

    pub async fn with_config(config: ServiceConfig) -> Self {
        let db = test_db().await;
        let accounts = Arc::new(FakeAccounts::default());
        let media_dir = tempfile::tempdir().unwrap();
        let service = Arc::new(Service::new(
            Arc::new(SeaOrmPostsRepository::new(db.clone())),
            Arc::new(SeaOrmStarsRepository::new(db.clone())),
            accounts.clone(),
            Arc::new(LocalMediaStore::new(media_dir.path(), "/media", None)),
            config,
        ));
        let router = register_routes(
            Router::new(),
            &NoopRegistry,
            service.clone(),
            Some(MediaRoute {
                prefix: "/media".to_string(),
                dir: media_dir.path().to_path_buf(),
            }),
        )
        .expect("Failed to register routes");
        TestApp {
            db,
            service,
            router,
            accounts,
            media_dir,
        }
    }

    pub async fn call_raw(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes.to_vec())
    }

    pub async fn call(&self, req: Request<Body>) -> (StatusCode, Value) {
        let (status, bytes) = self.call_raw(req).await;
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

    /// Create a text post and return its id.
    pub async fn create_post(&self, user_id: Uuid, caption: &str) -> String {
        let (status, body) = self
            .post_json(
                "/api/posts",
                serde_json::json!({"caption": caption, "userId": user_id}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create post failed: {body}");
        body["id"].as_str().unwrap().to_string()
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

pub fn with_bearer(mut req: Request<Body>, token: &str) -> Request<Body> {
    req.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {token}").parse().unwrap(),
    );
    req
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

pub const BOUNDARY: &str = "stargram-test-boundary";

/// One part of a multipart body: (name, optional (file name, content type), bytes).
pub type Part<'a> = (&'a str, Option<(&'a str, &'a str)>, &'a [u8]);

pub fn multipart_request(path: &str, parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file {
            Some((file_name, content_type)) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Keeps created_at strictly increasing between consecutive writes.
pub async fn tick() {
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
}
