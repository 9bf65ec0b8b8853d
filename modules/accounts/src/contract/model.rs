use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Account as seen by other modules; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    /// False for accounts created through Google sign-in.
    pub has_password: bool,
    pub created_at: DateTime<Utc>,
}

/// Identity carried by a verified session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
}
