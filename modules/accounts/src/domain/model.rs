use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::{SessionUser, User};

/// Persisted account, including the credential hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    /// `None` for accounts created through Google sign-in.
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn session_user(&self) -> SessionUser {
        SessionUser {
            id: self.id,
            user_name: self.user_name.clone(),
            email: self.email.clone(),
        }
    }
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: r.id,
            has_password: r.password_hash.is_some(),
            user_name: r.user_name,
            email: r.email,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

/// Registration input after transport decoding.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful register/login: the account and its session token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: IssuedToken,
}

/// Profile returned by the external identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalProfile {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Query parameters Google sends back to the callback.
#[derive(Debug, Clone, Default)]
pub struct ProviderCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Where the browser goes after the provider callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderLoginOutcome {
    Authenticated { token: String },
    Failed,
    EmailMissing,
}
