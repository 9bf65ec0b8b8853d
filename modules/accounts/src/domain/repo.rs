use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::model::{ResetTokenRecord, UserRecord};

/// Carried inside the `anyhow::Error` of an insert rejected by a unique constraint.
#[derive(Debug, thiserror::Error)]
#[error("unique constraint violated")]
pub struct UniqueViolation;

pub fn is_unique_violation(e: &anyhow::Error) -> bool {
    e.downcast_ref::<UniqueViolation>().is_some()
}

/// Persistence port for accounts.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>>;
    async fn find_by_ids(&self, ids: &[Uuid]) -> anyhow::Result<Vec<UserRecord>>;
    /// Lookup by the normalized (lower-cased) email.
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>>;
    async fn find_by_user_name(&self, user_name: &str) -> anyhow::Result<Option<UserRecord>>;
    async fn email_exists(&self, email: &str) -> anyhow::Result<bool>;
    async fn user_name_exists(&self, user_name: &str) -> anyhow::Result<bool>;
    /// Fails with [`UniqueViolation`] when the email or user name is already stored.
    async fn insert(&self, user: UserRecord) -> anyhow::Result<()>;
}

/// Persistence port for password-reset tokens.
#[async_trait]
pub trait ResetTokenRepository: Send + Sync {
    /// Mark every unused, unexpired token of the user as used. Returns how many changed.
    async fn invalidate_active(&self, user_id: Uuid, now: DateTime<Utc>) -> anyhow::Result<u64>;

    async fn insert(&self, token: ResetTokenRecord) -> anyhow::Result<()>;

    /// Atomically consume a live token and store the new password hash for its user.
    ///
    /// Returns the user id when the token was unused and unexpired at `now`;
    /// `None` leaves both the token and the password untouched.
    async fn consume_and_set_password(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<Uuid>>;
}
