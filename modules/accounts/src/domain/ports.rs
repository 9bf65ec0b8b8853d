//! Output ports of the accounts domain.

use async_trait::async_trait;

use crate::contract::SessionUser;
use crate::domain::error::DomainError;
use crate::domain::model::{ExternalProfile, IssuedToken, OutgoingMail};

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> anyhow::Result<String>;
    /// `false` for a mismatch and for a malformed stored hash.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Issues and validates signed session tokens.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user: &SessionUser) -> anyhow::Result<IssuedToken>;
    fn verify(&self, token: &str) -> Result<SessionUser, DomainError>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> anyhow::Result<()>;
}

/// External identity provider reached by redirect + authorization code.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Provider authorization URL carrying `state`.
    fn authorization_url(&self, state: &str) -> anyhow::Result<String>;
    /// Exchange an authorization code for the user's profile.
    async fn exchange_code(&self, code: &str) -> anyhow::Result<ExternalProfile>;
}

/// Single-use CSRF `state` values for the provider redirect.
pub trait LoginStateStore: Send + Sync {
    fn issue(&self) -> String;
    /// Remove the state; true only if it existed and had not expired.
    fn take(&self, state: &str) -> bool;
}
