//! The feed module as the runtime drives it: accounts client from the hub,
//! configuration, migrations, routes and the published FeedApi.

mod common;

use std::sync::Arc;

use axum::{http::StatusCode, Router};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use accounts::AccountsApi;
use common::{json_request, FakeAccounts, NoopRegistry};
use feed::{Feed, FeedApi};
use modkit::{ClientHub, ConfigProvider, DbModule, Module, ModuleCtx, ModuleCtxBuilder, RestfulModule};

struct JsonConfig(Value);

impl ConfigProvider for JsonConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&Value> {
        self.0.get(module_name)
    }
}

async fn ctx(cfg: Value, hub: Arc<ClientHub>, home: &std::path::Path) -> (ModuleCtx, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_db(db.clone())
        .with_config_provider(Arc::new(JsonConfig(json!({ "feed": cfg }))))
        .with_client_hub(hub)
        .with_home_dir(home)
        .for_module("feed")
        .build();
    (ctx, db)
}

fn hub_with_accounts() -> (Arc<ClientHub>, Arc<FakeAccounts>) {
    let hub = Arc::new(ClientHub::new());
    let accounts = Arc::new(FakeAccounts::default());
    hub.register::<dyn AccountsApi>(accounts.clone());
    (hub, accounts)
}

#[tokio::test]
async fn init_migrate_and_serve() {
    let home = tempfile::tempdir().unwrap();
    let (hub, accounts) = hub_with_accounts();
    let (ctx, db) = ctx(json!({"media_dir": "uploads"}), hub.clone(), home.path()).await;
    let module = Feed::new();

    module.init(&ctx).await.unwrap();
    module.migrate(&db).await.unwrap();
    assert!(home.path().join("uploads").is_dir());

    let router = module
        .register_rest(&ctx, Router::new(), &NoopRegistry)
        .unwrap();

    let ana = accounts.add_user("ana");
    let resp = router
        .oneshot(json_request(
            "/api/posts",
            json!({"caption": "hello", "userId": ana}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let api = hub.get::<dyn FeedApi>().unwrap();
    let posts = api.list_posts(None).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].user_name, "ana");

    let one = api.get_post(posts[0].id, Some(ana)).await.unwrap();
    assert_eq!(one.caption, "hello");
    assert!(api.get_post(uuid::Uuid::new_v4(), None).await.is_err());
}

#[tokio::test]
async fn missing_section_uses_defaults() {
    let home = tempfile::tempdir().unwrap();
    let (hub, _) = hub_with_accounts();
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let ctx = ModuleCtxBuilder::new(CancellationToken::new())
        .with_db(db)
        .with_config_provider(Arc::new(JsonConfig(json!({}))))
        .with_client_hub(hub)
        .with_home_dir(home.path())
        .for_module("feed")
        .build();

    Feed::new().init(&ctx).await.unwrap();
    assert!(home.path().join("media").is_dir());
}

#[tokio::test]
async fn accounts_client_is_required() {
    let home = tempfile::tempdir().unwrap();
    let (ctx, _db) = ctx(json!({}), Arc::new(ClientHub::new()), home.path()).await;
    let err = Feed::new().init(&ctx).await.unwrap_err();
    assert!(err.to_string().contains("accounts"));
}

#[tokio::test]
async fn invalid_media_prefix_is_fatal() {
    let home = tempfile::tempdir().unwrap();
    let (hub, _) = hub_with_accounts();
    let (ctx, _db) = ctx(json!({"media_url_prefix": "media"}), hub, home.path()).await;
    assert!(Feed::new().init(&ctx).await.is_err());
}

#[tokio::test]
async fn rest_before_init_is_an_error() {
    let home = tempfile::tempdir().unwrap();
    let (ctx, _db) = ctx(json!({}), Arc::new(ClientHub::new()), home.path()).await;
    assert!(Feed::new()
        .register_rest(&ctx, Router::new(), &NoopRegistry)
        .is_err());
}
