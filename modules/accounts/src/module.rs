use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use axum::Router;
use modkit::api::OpenApiRegistry;
use modkit::{DbModule, Module, ModuleCtx, RestfulModule};
use sea_orm_migration::MigratorTrait;
use tracing::{info, warn};

use crate::config::AccountsConfig;
use crate::contract::AccountsApi;
use crate::domain::ports::Mailer;
use crate::domain::service::{ProviderLogin, Service, ServiceConfig, ServiceDeps};
use crate::gateways::local::AccountsLocalClient;
use crate::infra::crypto::{Argon2Hasher, JwtTokenIssuer};
use crate::infra::google::{GoogleIdentityProvider, InMemoryStateStore};
use crate::infra::mail::{load_reset_template, LogMailer, SmtpMailer};
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::{SeaOrmResetTokenRepository, SeaOrmUsersRepository};

/// Accounts module: user store, sessions, password reset and Google sign-in.
#[derive(Default)]
pub struct Accounts {
    service: ArcSwapOption<Service>,
    mailer: Option<Arc<dyn Mailer>>,
}

impl Accounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver outgoing mail through `mailer` instead of the configured transport.
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    fn service(&self) -> anyhow::Result<Arc<Service>> {
        self.service
            .load_full()
            .ok_or_else(|| anyhow::anyhow!("accounts service not initialized"))
    }

    fn build_mailer(&self, cfg: &AccountsConfig) -> anyhow::Result<Arc<dyn Mailer>> {
        if let Some(m) = &self.mailer {
            return Ok(m.clone());
        }
        Ok(match &cfg.smtp {
            Some(smtp) => {
                info!(host = %smtp.host, port = smtp.port, "Using SMTP mail transport");
                Arc::new(SmtpMailer::new(smtp)?)
            }
            None => {
                warn!("SMTP not configured; reset mails will only be logged");
                Arc::new(LogMailer)
            }
        })
    }
}

fn service_config(cfg: &AccountsConfig) -> ServiceConfig {
    ServiceConfig {
        password_min_length: cfg.password_min_length,
        reset_token_ttl: chrono::Duration::minutes(i64::from(cfg.reset_token_ttl_minutes)),
        frontend_url: cfg.frontend_url.clone(),
        login_path: cfg.login_path.clone(),
        callback_path: cfg.callback_path.clone(),
        reset_path: cfg.reset_path.clone(),
    }
}

#[async_trait]
impl Module for Accounts {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        let cfg: AccountsConfig = ctx.module_config_required()?;
        cfg.validate()?;
        let db = ctx.db_required()?;

        let home_dir = ctx
            .home_dir()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        let reset_mail = load_reset_template(cfg.email_template_path.as_deref(), &home_dir)?;
        let mailer = self.build_mailer(&cfg)?;

        let google = match cfg.google.clone() {
            Some(g) => {
                let ttl = Duration::from_secs(g.state_ttl_seconds);
                info!(client_id = %g.client_id, "Google sign-in enabled");
                Some(ProviderLogin {
                    provider: Arc::new(GoogleIdentityProvider::new(g)?),
                    states: Arc::new(InMemoryStateStore::new(ttl)),
                })
            }
            None => None,
        };

        let deps = ServiceDeps {
            users: Arc::new(SeaOrmUsersRepository::new(db.clone())),
            reset_tokens: Arc::new(SeaOrmResetTokenRepository::new(db)),
            hasher: Arc::new(Argon2Hasher::new()),
            tokens: Arc::new(JwtTokenIssuer::new(&cfg.jwt)),
            mailer,
            reset_mail,
            google,
        };
        let service = Arc::new(Service::new(deps, service_config(&cfg)));
        self.service.store(Some(service.clone()));

        let api: Arc<dyn AccountsApi> = Arc::new(AccountsLocalClient::new(service));
        ctx.client_hub().register::<dyn AccountsApi>(api);

        info!(
            frontend_url = %cfg.frontend_url,
            reset_token_ttl_minutes = cfg.reset_token_ttl_minutes,
            "Accounts module initialized"
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

#[async_trait]
impl DbModule for Accounts {
    async fn migrate(&self, db: &sea_orm::DatabaseConnection) -> anyhow::Result<()> {
        info!("Running accounts database migrations");
        Migrator::up(db, None).await?;
        Ok(())
    }
}

impl RestfulModule for Accounts {
    fn register_rest(
        &self,
        _ctx: &ModuleCtx,
        router: Router,
        openapi: &dyn OpenApiRegistry,
    ) -> anyhow::Result<Router> {
        let router = crate::api::rest::routes::register_routes(router, openapi, self.service()?)?;
        info!("Accounts REST routes registered");
        Ok(router)
    }
}
