use axum::Router;
use sea_orm::DatabaseConnection;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::context;
use crate::contracts;

/// One module and the capabilities it provides.
pub struct ModuleEntry {
    pub name: &'static str,
    pub deps: &'static [&'static str],
    pub core: Arc<dyn contracts::Module>,
    pub rest: Option<Arc<dyn contracts::RestfulModule>>,
    pub rest_host: Option<Arc<dyn contracts::RestHostModule>>,
    pub db: Option<Arc<dyn contracts::DbModule>>,
    pub stateful: Option<Arc<dyn contracts::StatefulModule>>,
}

impl ModuleEntry {
    pub fn new(name: &'static str, core: Arc<dyn contracts::Module>) -> Self {
        Self {
            name,
            deps: &[],
            core,
            rest: None,
            rest_host: None,
            db: None,
            stateful: None,
        }
    }

    pub fn deps(mut self, deps: &'static [&'static str]) -> Self {
        self.deps = deps;
        self
    }

    pub fn rest(mut self, m: Arc<dyn contracts::RestfulModule>) -> Self {
        self.rest = Some(m);
        self
    }

    pub fn rest_host(mut self, m: Arc<dyn contracts::RestHostModule>) -> Self {
        self.rest_host = Some(m);
        self
    }

    pub fn db(mut self, m: Arc<dyn contracts::DbModule>) -> Self {
        self.db = Some(m);
        self
    }

    pub fn stateful(mut self, m: Arc<dyn contracts::StatefulModule>) -> Self {
        self.stateful = Some(m);
        self
    }
}

impl std::fmt::Debug for ModuleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("name", &self.name)
            .field("deps", &self.deps)
            .field("has_rest", &self.rest.is_some())
            .field("is_rest_host", &self.rest_host.is_some())
            .field("has_db", &self.db.is_some())
            .field("has_stateful", &self.stateful.is_some())
            .finish()
    }
}

/// The final, topo-sorted runtime registry.
pub struct ModuleRegistry {
    modules: Vec<ModuleEntry>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&'static str> = self.modules.iter().map(|m| m.name).collect();
        f.debug_struct("ModuleRegistry")
            .field("modules", &names)
            .finish()
    }
}

impl ModuleRegistry {
    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.modules.iter().map(|m| m.name).collect()
    }

    // ---- Ordered phases: init → DB → REST (sync) → start → stop ----

    pub async fn run_init_phase(&self, base_ctx: &context::ModuleCtx) -> Result<(), RegistryError> {
        for e in &self.modules {
            let ctx = base_ctx.clone().for_module(e.name);
            e.core
                .init(&ctx)
                .await
                .map_err(|source| RegistryError::Init {
                    module: e.name,
                    source,
                })?;
            tracing::debug!(module = e.name, "module initialized");
        }
        Ok(())
    }

    pub async fn run_db_phase(&self, db: &DatabaseConnection) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(dbm) = &e.db {
                dbm.migrate(db)
                    .await
                    .map_err(|source| RegistryError::DbMigrate {
                        module: e.name,
                        source,
                    })?;
                tracing::info!(module = e.name, "migrations applied");
            }
        }
        Ok(())
    }

    pub fn run_rest_phase(
        &self,
        base_ctx: &context::ModuleCtx,
        mut router: Router,
    ) -> Result<Router, RegistryError> {
        let Some(host_entry) = self.modules.iter().find(|e| e.rest_host.is_some()) else {
            return if self.modules.iter().any(|e| e.rest.is_some()) {
                Err(RegistryError::RestRequiresHost)
            } else {
                Ok(router)
            };
        };
        let Some(host) = host_entry.rest_host.as_ref() else {
            return Err(RegistryError::RestRequiresHost);
        };
        let host_ctx = base_ctx.clone().for_module(host_entry.name);
        let registry: &dyn contracts::OpenApiRegistry = host.as_registry();

        router = host
            .rest_prepare(&host_ctx, router)
            .map_err(|source| RegistryError::RestPrepare {
                module: host_entry.name,
                source,
            })?;

        for e in &self.modules {
            if let Some(rest) = &e.rest {
                let ctx = base_ctx.clone().for_module(e.name);
                router = rest
                    .register_rest(&ctx, router, registry)
                    .map_err(|source| RegistryError::RestRegister {
                        module: e.name,
                        source,
                    })?;
            }
        }

        router = host.rest_finalize(&host_ctx, router).map_err(|source| {
            RegistryError::RestFinalize {
                module: host_entry.name,
                source,
            }
        })?;

        Ok(router)
    }

    pub async fn run_start_phase(&self, cancel: CancellationToken) -> Result<(), RegistryError> {
        for e in &self.modules {
            if let Some(s) = &e.stateful {
                s.start(cancel.clone())
                    .await
                    .map_err(|source| RegistryError::Start {
                        module: e.name,
                        source,
                    })?;
            }
        }
        Ok(())
    }

    /// Stop in reverse order; failures are logged and do not abort the remaining stops.
    pub async fn run_stop_phase(&self, cancel: CancellationToken) {
        for e in self.modules.iter().rev() {
            if let Some(s) = &e.stateful {
                if let Err(err) = s.stop(cancel.clone()).await {
                    tracing::warn!(module = e.name, error = %err, "Failed to stop module");
                }
            }
        }
    }
}

/// Collects module entries in registration order; `build` validates and topo-sorts them.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<ModuleEntry>,
}

impl RegistryBuilder {
    pub fn register(mut self, entry: ModuleEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn build(self) -> Result<ModuleRegistry, RegistryError> {
        let mut idx: HashMap<&'static str, usize> = HashMap::new();
        for (i, e) in self.entries.iter().enumerate() {
            if idx.insert(e.name, i).is_some() {
                return Err(RegistryError::DuplicateModule(e.name.to_string()));
            }
        }

        let hosts: Vec<&'static str> = self
            .entries
            .iter()
            .filter(|e| e.rest_host.is_some())
            .map(|e| e.name)
            .collect();
        if hosts.len() > 1 {
            return Err(RegistryError::MultipleRestHosts(hosts.join(", ")));
        }
        if hosts.is_empty() && self.entries.iter().any(|e| e.rest.is_some()) {
            return Err(RegistryError::RestRequiresHost);
        }

        // edge dep -> module
        let n = self.entries.len();
        let mut adj = vec![Vec::<usize>::new(); n];
        let mut indeg = vec![0usize; n];
        for (u, e) in self.entries.iter().enumerate() {
            for &d in e.deps {
                let v = *idx.get(d).ok_or_else(|| RegistryError::UnknownDependency {
                    module: e.name.to_string(),
                    depends_on: d.to_string(),
                })?;
                adj[v].push(u);
                indeg[u] += 1;
            }
        }

        // Kahn's algorithm; ties keep registration order
        let mut q: VecDeque<usize> = (0..n).filter(|&i| indeg[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(u) = q.pop_front() {
            order.push(u);
            for &w in &adj[u] {
                indeg[w] -= 1;
                if indeg[w] == 0 {
                    q.push_back(w);
                }
            }
        }

        if order.len() != n {
            let stuck = self
                .entries
                .iter()
                .enumerate()
                .filter(|(i, _)| indeg[*i] > 0)
                .map(|(_, e)| e.name)
                .collect();
            return Err(RegistryError::CycleDetected { modules: stuck });
        }

        let mut slots: Vec<Option<ModuleEntry>> = self.entries.into_iter().map(Some).collect();
        let modules = order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect::<Vec<_>>();

        tracing::debug!(
            modules = ?modules.iter().map(|m| m.name).collect::<Vec<_>>(),
            "module registry built"
        );
        Ok(ModuleRegistry { modules })
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("module '{0}' is registered more than once")]
    DuplicateModule(String),
    #[error("module '{module}' depends on unknown module '{depends_on}'")]
    UnknownDependency { module: String, depends_on: String },
    #[error("cyclic dependency between modules: {modules:?}")]
    CycleDetected { modules: Vec<&'static str> },
    #[error("multiple REST host modules registered: {0}")]
    MultipleRestHosts(String),
    #[error("REST modules are registered but no REST host is present")]
    RestRequiresHost,

    #[error("init failed for module '{module}'")]
    Init {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("DB migration failed for module '{module}'")]
    DbMigrate {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST prepare failed for host module '{module}'")]
    RestPrepare {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST registration failed for module '{module}'")]
    RestRegister {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("REST finalize failed for host module '{module}'")]
    RestFinalize {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
    #[error("start failed for module '{module}'")]
    Start {
        module: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ModuleCtxBuilder;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct Recorder {
        name: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
        fail_init: bool,
    }

    #[async_trait]
    impl contracts::Module for Recorder {
        async fn init(&self, ctx: &context::ModuleCtx) -> anyhow::Result<()> {
            assert_eq!(ctx.current_module(), Some(self.name));
            self.calls.lock().push(format!("init:{}", self.name));
            if self.fail_init {
                anyhow::bail!("boom");
            }
            Ok(())
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn recorder(name: &'static str, calls: &Arc<Mutex<Vec<String>>>) -> Arc<Recorder> {
        Arc::new(Recorder {
            name,
            calls: calls.clone(),
            fail_init: false,
        })
    }

    #[tokio::test]
    async fn dependencies_initialize_first() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry = RegistryBuilder::default()
            .register(ModuleEntry::new("feed", recorder("feed", &calls)).deps(&["accounts"]))
            .register(ModuleEntry::new("accounts", recorder("accounts", &calls)))
            .build()
            .unwrap();

        assert_eq!(registry.names(), vec!["accounts", "feed"]);

        let ctx = ModuleCtxBuilder::new(CancellationToken::new()).build();
        registry.run_init_phase(&ctx).await.unwrap();
        assert_eq!(*calls.lock(), vec!["init:accounts", "init:feed"]);
    }

    #[tokio::test]
    async fn init_failure_names_the_module() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry = RegistryBuilder::default()
            .register(ModuleEntry::new(
                "accounts",
                Arc::new(Recorder {
                    name: "accounts",
                    calls: calls.clone(),
                    fail_init: true,
                }),
            ))
            .build()
            .unwrap();

        let ctx = ModuleCtxBuilder::new(CancellationToken::new()).build();
        let err = registry.run_init_phase(&ctx).await.unwrap_err();
        assert!(matches!(err, RegistryError::Init { module: "accounts", .. }));
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let err = RegistryBuilder::default()
            .register(ModuleEntry::new("feed", recorder("feed", &calls)).deps(&["accounts"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownDependency { .. }));
    }

    #[test]
    fn cycles_and_duplicates_are_rejected() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let err = RegistryBuilder::default()
            .register(ModuleEntry::new("a", recorder("a", &calls)).deps(&["b"]))
            .register(ModuleEntry::new("b", recorder("b", &calls)).deps(&["a"]))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::CycleDetected { .. }));

        let err = RegistryBuilder::default()
            .register(ModuleEntry::new("a", recorder("a", &calls)))
            .register(ModuleEntry::new("a", recorder("a", &calls)))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateModule(_)));
    }
}
