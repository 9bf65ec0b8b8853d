use thiserror::Error;
use uuid::Uuid;

/// Errors that are safe to expose to other modules
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountsError {
    #[error("User not found: {id}")]
    NotFound { id: Uuid },

    #[error("Invalid or expired session")]
    Unauthorized,

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error")]
    Internal,
}

impl From<crate::domain::error::DomainError> for AccountsError {
    fn from(e: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match e {
            UserNotFound { id } => Self::NotFound { id },
            InvalidSession | InvalidCredentials | GoogleAccount => Self::Unauthorized,
            InvalidEmail { .. }
            | InvalidUserName { .. }
            | WeakPassword { .. }
            | EmailTaken
            | UserNameTaken
            | InvalidResetToken => Self::Validation {
                message: e.to_string(),
            },
            GoogleNotConfigured | Database { .. } | Internal { .. } => Self::Internal,
        }
    }
}
