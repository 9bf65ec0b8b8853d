use serde::{Deserialize, Serialize};

/// `modules.api_ingress` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// Overrides `server.host:server.port` when set.
    pub bind_addr: Option<String>,
    pub enable_docs: bool,
    pub cors_enabled: bool,
    /// Allowed origins; `"*"` allows any origin.
    pub cors_origins: Vec<String>,
    /// Overrides `server.timeout_sec` when set.
    pub timeout_sec: Option<u64>,
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            bind_addr: None,
            enable_docs: true,
            cors_enabled: true,
            cors_origins: vec!["http://localhost:5173".to_string()],
            timeout_sec: None,
            body_limit_bytes: 16 * 1024 * 1024,
        }
    }
}
