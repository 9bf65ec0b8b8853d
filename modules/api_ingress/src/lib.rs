//! API ingress: the REST host of the Stargram server.
//!
//! Owns the axum router across the REST phase, collects operation specs and
//! component schemas into a single OpenAPI document, applies the global
//! middleware stack and serves HTTP until the runtime is cancelled.

use async_trait::async_trait;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use axum::{extract::DefaultBodyLimit, middleware::from_fn, routing::get, Router};
use modkit::api::{OpenApiRegistry, OperationSpec, SchemaCollection};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
mod model;
mod openapi;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;
use model::{ComponentsRegistry, SchemaInsert};

const STOP_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST host module: collects typed operation specs, emits one OpenAPI
/// document and owns the HTTP server.
pub struct ApiIngress {
    // Lock-free config using arc-swap for read-mostly access
    config: ArcSwap<ApiIngressConfig>,
    // Used when the module config does not set `bind_addr`
    default_bind: String,
    // Used when the module config does not set `timeout_sec`
    default_timeout: Duration,
    components_registry: ArcSwap<ComponentsRegistry>,
    final_router: Mutex<Option<Router>>,

    // Duplicate detection (per (method, path) and per handler id)
    registered_routes: DashMap<(Method, String), ()>,
    registered_handlers: DashMap<String, ()>,

    operation_specs: DashMap<String, OperationSpec>,

    server: Mutex<Option<JoinHandle<()>>>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl ApiIngress {
    pub fn new(default_bind: impl Into<String>) -> Self {
        Self {
            config: ArcSwap::from_pointee(ApiIngressConfig::default()),
            default_bind: default_bind.into(),
            default_timeout: DEFAULT_REQUEST_TIMEOUT,
            components_registry: ArcSwap::from_pointee(ComponentsRegistry::default()),
            final_router: Mutex::new(None),
            registered_routes: DashMap::new(),
            registered_handlers: DashMap::new(),
            operation_specs: DashMap::new(),
            server: Mutex::new(None),
            local_addr: Mutex::new(None),
        }
    }

    pub fn with_config(self, config: ApiIngressConfig) -> Self {
        self.config.store(Arc::new(config));
        self
    }

    /// Server-wide request timeout, used unless the module config sets its own.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn get_config(&self) -> ApiIngressConfig {
        (**self.config.load()).clone()
    }

    pub fn bind_addr(&self) -> String {
        self.config
            .load()
            .bind_addr
            .clone()
            .unwrap_or_else(|| self.default_bind.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        self.config
            .load()
            .timeout_sec
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout)
    }

    /// Address the server actually bound to (differs from config for port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    /// Finalized router, available after the REST phase.
    pub fn router(&self) -> Option<Router> {
        self.final_router.lock().clone()
    }

    fn cors_layer(cfg: &ApiIngressConfig) -> CorsLayer {
        if cfg.cors_origins.iter().any(|o| o == "*") {
            return CorsLayer::permissive();
        }
        let origins: Vec<HeaderValue> = cfg
            .cors_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }

    /// Apply the global middleware stack.
    ///
    /// Order (outermost to innermost):
    /// PropagateRequestId -> SetRequestId -> push_req_id_to_extensions -> Trace -> Timeout -> CORS -> BodyLimit
    fn apply_middleware(&self, mut router: Router) -> Router {
        let cfg = self.get_config();
        let x_request_id = request_id::header();

        // Layers wrap everything added before them, so add innermost first
        router = router
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(cfg.body_limit_bytes));
        if cfg.cors_enabled {
            router = router.layer(Self::cors_layer(&cfg));
        }
        router
            .layer(TimeoutLayer::new(self.request_timeout()))
            .layer(request_id::create_trace_layer())
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(SetRequestIdLayer::new(x_request_id.clone(), request_id::MakeReqId))
            .layer(PropagateRequestIdLayer::new(x_request_id))
    }

    /// Build the OpenAPI document from registered operations and components.
    pub fn build_openapi(&self) -> Result<serde_json::Value> {
        let components = self.components_registry.load();
        let specs: Vec<OperationSpec> = self
            .operation_specs
            .iter()
            .map(|e| e.value().clone())
            .collect();
        tracing::info!(operations = specs.len(), "Building OpenAPI document");
        let doc = openapi::build(specs.iter(), &components)?;
        Ok(serde_json::to_value(doc)?)
    }
}

#[async_trait]
impl modkit::Module for ApiIngress {
    async fn init(&self, ctx: &modkit::ModuleCtx) -> anyhow::Result<()> {
        let cfg = ctx.module_config::<Option<ApiIngressConfig>>();
        if let Some(cfg) = cfg {
            self.config.store(Arc::new(cfg));
        }
        tracing::debug!(
            bind = %self.bind_addr(),
            timeout_ms = self.request_timeout().as_millis() as u64,
            "api_ingress initialized"
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

// REST host role: prepare/finalize the router, but do not start the server here.
impl modkit::contracts::RestHostModule for ApiIngress {
    fn rest_prepare(&self, _ctx: &modkit::ModuleCtx, router: Router) -> anyhow::Result<Router> {
        let router = router.route("/health", get(web::health_check));
        tracing::debug!("REST host prepared base router with health check");
        Ok(router)
    }

    fn rest_finalize(&self, _ctx: &modkit::ModuleCtx, mut router: Router) -> anyhow::Result<Router> {
        let config = self.get_config();

        if config.enable_docs {
            // Build once, serve as static JSON
            let openapi_value = Arc::new(self.build_openapi()?);
            router = router
                .route(
                    "/openapi.json",
                    get({
                        use axum::{http::header, response::IntoResponse};
                        let v = openapi_value.clone();
                        move || async move {
                            let json = axum::Json((*v).clone());
                            ([(header::CACHE_CONTROL, "no-store")], json).into_response()
                        }
                    }),
                )
                .route("/docs", get(web::serve_docs));
        }

        let router = self.apply_middleware(router);
        *self.final_router.lock() = Some(router.clone());

        tracing::debug!("REST host finalized router");
        Ok(router)
    }

    fn as_registry(&self) -> &dyn OpenApiRegistry {
        self
    }
}

#[async_trait]
impl modkit::StatefulModule for ApiIngress {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()> {
        let bind = self.bind_addr();
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{bind}': {e}"))?;

        let router = self
            .router()
            .ok_or_else(|| anyhow::anyhow!("REST phase did not produce a router"))?;

        // Bind before returning so startup fails on a busy port
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        *self.local_addr.lock() = Some(local);
        tracing::info!(addr = %local, "HTTP server bound");

        let handle = tokio::spawn(async move {
            let shutdown = async move {
                cancel.cancelled().await;
                tracing::info!("HTTP server shutting down gracefully");
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(error = %e, "HTTP server terminated with error");
            }
        });
        *self.server.lock() = Some(handle);
        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> anyhow::Result<()> {
        let handle = self.server.lock().take();
        if let Some(handle) = handle {
            match tokio::time::timeout(STOP_TIMEOUT, handle).await {
                Ok(Ok(())) => tracing::info!("HTTP server stopped"),
                Ok(Err(e)) => tracing::error!(error = %e, "HTTP server task failed"),
                Err(_) => tracing::warn!("HTTP server did not stop within {STOP_TIMEOUT:?}"),
            }
        }
        Ok(())
    }
}

impl OpenApiRegistry for ApiIngress {
    fn register_operation(&self, spec: &OperationSpec) {
        // First registration wins; a second one is a programmer error
        if self
            .registered_handlers
            .insert(spec.handler_id.clone(), ())
            .is_some()
        {
            tracing::error!(
                handler_id = %spec.handler_id,
                method = %spec.method.as_str(),
                path = %spec.path,
                "Duplicate handler_id detected; ignoring subsequent registration"
            );
            return;
        }

        let route_key = (spec.method.clone(), spec.path.clone());
        if self.registered_routes.insert(route_key, ()).is_some() {
            tracing::error!(
                method = %spec.method.as_str(),
                path = %spec.path,
                "Duplicate (method, path) detected; ignoring subsequent registration"
            );
            return;
        }

        let operation_key = format!("{}:{}", spec.method.as_str(), spec.path);
        self.operation_specs.insert(operation_key, spec.clone());
        tracing::debug!(
            handler_id = %spec.handler_id,
            method = %spec.method.as_str(),
            path = %spec.path,
            total_operations = self.operation_specs.len(),
            "Registered API operation"
        );
    }

    fn ensure_schema_raw(&self, name: &str, schemas: SchemaCollection) -> String {
        // Copy-on-write snapshot
        let current = self.components_registry.load();
        let mut reg = (**current).clone();
        for (key, outcome) in reg.register_collection(schemas) {
            match outcome {
                SchemaInsert::Inserted => tracing::debug!(schema = %key, "Registered schema"),
                SchemaInsert::Identical => {}
                SchemaInsert::Conflict => tracing::error!(
                    schema = %key,
                    "Conflicting schema content under the same component name; keeping the first"
                ),
            }
        }
        self.components_registry.store(Arc::new(reg));
        name.to_string()
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
