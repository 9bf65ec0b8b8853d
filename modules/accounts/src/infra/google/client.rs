//! Google OAuth 2.0 authorization-code client.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::config::GoogleConfig;
use crate::domain::model::ExternalProfile;
use crate::domain::ports::IdentityProvider;

const SCOPES: &str = "openid email profile";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

pub struct GoogleIdentityProvider {
    http: reqwest::Client,
    cfg: GoogleConfig,
}

impl GoogleIdentityProvider {
    pub fn new(cfg: GoogleConfig) -> anyhow::Result<Self> {
        Url::parse(&cfg.auth_url).context("google.auth_url")?;
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("building HTTP client")?;
        Ok(Self { http, cfg })
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    fn authorization_url(&self, state: &str) -> anyhow::Result<String> {
        let mut url = Url::parse(&self.cfg.auth_url)?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.cfg.client_id)
            .append_pair("redirect_uri", &self.cfg.redirect_url)
            .append_pair("scope", SCOPES)
            .append_pair("state", state);
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> anyhow::Result<ExternalProfile> {
        let token: TokenResponse = self
            .http
            .post(&self.cfg.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", self.cfg.client_id.as_str()),
                ("client_secret", self.cfg.client_secret.as_str()),
                ("redirect_uri", self.cfg.redirect_url.as_str()),
            ])
            .send()
            .await
            .context("token request")?
            .error_for_status()
            .context("token endpoint")?
            .json()
            .await
            .context("token response")?;

        let info: UserInfo = self
            .http
            .get(&self.cfg.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("userinfo request")?
            .error_for_status()
            .context("userinfo endpoint")?
            .json()
            .await
            .context("userinfo response")?;

        Ok(ExternalProfile {
            subject: info.sub,
            email: info.email,
            name: info.name,
        })
    }
}
