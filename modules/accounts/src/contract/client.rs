use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{AccountsError, SessionUser, User};

/// Public API of the accounts module, published to the `ClientHub`.
#[async_trait]
pub trait AccountsApi: Send + Sync {
    /// Validate a bearer session token and return the identity it carries.
    async fn verify_session(&self, token: &str) -> Result<SessionUser, AccountsError>;

    async fn get_user(&self, id: Uuid) -> Result<User, AccountsError>;

    /// Users for the given ids; unknown ids are skipped.
    async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, AccountsError>;
}
