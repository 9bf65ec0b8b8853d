use serde::{Deserialize, Serialize};

/// Configuration for the accounts module (`modules.accounts`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountsConfig {
    pub jwt: JwtConfig,
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_callback_path")]
    pub callback_path: String,
    #[serde(default = "default_reset_path")]
    pub reset_path: String,
    #[serde(default = "default_reset_token_ttl_minutes")]
    pub reset_token_ttl_minutes: u32,
    #[serde(default = "default_password_min_length")]
    pub password_min_length: usize,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    /// HTML template for the reset mail; the built-in one is used when unset.
    #[serde(default)]
    pub email_template_path: Option<String>,
    #[serde(default)]
    pub google: Option<GoogleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JwtConfig {
    /// HMAC secret, at least 32 bytes.
    pub key: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_expires_hours")]
    pub expires_hours: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub pass: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Callback URL registered with Google, e.g. `http://localhost:5161/api/auth/google/callback`.
    pub redirect_url: String,
    #[serde(default = "default_google_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_google_token_url")]
    pub token_url: String,
    #[serde(default = "default_google_userinfo_url")]
    pub userinfo_url: String,
    #[serde(default = "default_state_ttl_seconds")]
    pub state_ttl_seconds: u64,
}

pub const MIN_JWT_KEY_BYTES: usize = 32;

impl AccountsConfig {
    /// Reject configurations the module cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jwt.key.len() < MIN_JWT_KEY_BYTES {
            anyhow::bail!(
                "modules.accounts.jwt.key must be at least {MIN_JWT_KEY_BYTES} bytes (got {})",
                self.jwt.key.len()
            );
        }
        if !(8..=12).contains(&self.jwt.expires_hours) {
            anyhow::bail!(
                "modules.accounts.jwt.expires_hours must be between 8 and 12 (got {})",
                self.jwt.expires_hours
            );
        }
        if self.reset_token_ttl_minutes == 0 {
            anyhow::bail!("modules.accounts.reset_token_ttl_minutes must be positive");
        }
        url::Url::parse(&self.frontend_url)
            .map_err(|e| anyhow::anyhow!("invalid modules.accounts.frontend_url: {e}"))?;
        Ok(())
    }
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_login_path() -> String {
    "/".to_string()
}

fn default_callback_path() -> String {
    "/auth/callback".to_string()
}

fn default_reset_path() -> String {
    "/reset-password".to_string()
}

fn default_reset_token_ttl_minutes() -> u32 {
    60
}

fn default_password_min_length() -> usize {
    6
}

fn default_issuer() -> String {
    "Stargram.Api".to_string()
}

fn default_audience() -> String {
    "Stargram.Client".to_string()
}

fn default_expires_hours() -> u32 {
    8
}

fn default_smtp_port() -> u16 {
    587
}

fn default_google_auth_url() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_google_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_google_userinfo_url() -> String {
    "https://openidconnect.googleapis.com/v1/userinfo".to_string()
}

fn default_state_ttl_seconds() -> u64 {
    600
}
