use std::path::{Path, PathBuf};
use std::sync::Arc;

use accounts::AccountsApi;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use axum::Router;
use modkit::api::OpenApiRegistry;
use modkit::{DbModule, Module, ModuleCtx, RestfulModule};
use parking_lot::Mutex;
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::api::rest::routes::MediaRoute;
use crate::config::FeedConfig;
use crate::contract::FeedApi;
use crate::domain::service::{Service, ServiceConfig};
use crate::gateways::local::FeedLocalClient;
use crate::infra::media::LocalMediaStore;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::{SeaOrmPostsRepository, SeaOrmStarsRepository};

/// Feed module: posts, likes, comments and star cards.
#[derive(Default)]
pub struct Feed {
    service: ArcSwapOption<Service>,
    media: Mutex<Option<MediaRoute>>,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("feed service not initialized"))
    }
}

fn resolve_media_dir(dir: &str, home_dir: &Path) -> PathBuf {
    let p = Path::new(dir);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        home_dir.join(p)
    }
}

#[async_trait]
impl Module for Feed {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        let cfg: FeedConfig = ctx.module_config();
        cfg.validate()?;
        let db = ctx.db_required()?;

        let accounts = ctx.client_hub().get::<dyn AccountsApi>().map_err(|e| {
            anyhow::anyhow!("feed requires the accounts client: {e}")
        })?;

        let home_dir = ctx
            .home_dir()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let media_dir = resolve_media_dir(&cfg.media_dir, &home_dir);
        std::fs::create_dir_all(&media_dir).map_err(|e| {
            anyhow::anyhow!("failed to create media dir {}: {e}", media_dir.display())
        })?;

        let media = LocalMediaStore::new(
            media_dir.clone(),
            cfg.url_prefix(),
            cfg.public_base_url.as_deref(),
        );
        let service = Arc::new(Service::new(
            Arc::new(SeaOrmPostsRepository::new(db.clone())),
            Arc::new(SeaOrmStarsRepository::new(db)),
            accounts,
            Arc::new(media),
            ServiceConfig {
                max_caption_len: cfg.max_caption_len,
                max_comment_len: cfg.max_comment_len,
            },
        ));
        self.service.store(Some(service.clone()));
        *self.media.lock() = Some(MediaRoute {
            prefix: cfg.url_prefix().to_string(),
            dir: media_dir.clone(),
        });

        let api: Arc<dyn FeedApi> = Arc::new(FeedLocalClient::new(service));
        ctx.client_hub().register::<dyn FeedApi>(api);

        info!(media_dir = %media_dir.display(), "Feed module initialized");
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for Feed {
    async fn migrate(&self, db: &sea_orm::DatabaseConnection) -> anyhow::Result<()> {
        info!("Running feed database migrations");
        Migrator::up(db, None).await?;
        Ok(())
    }
}

impl RestfulModule for Feed {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<Router> {
        let media = self.media.lock().clone();
        let router = crate::api::rest::routes::register_routes(router, openapi, self.service()?, media)?;
        info!("Feed REST routes registered");
        Ok(router)
    }
}
