use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid email address")]
    InvalidEmail { email: String },

    #[error("Invalid user name: {reason}")]
    InvalidUserName { reason: String },

    #[error("Password must be at least {min} characters long")]
    WeakPassword { min: usize },

    #[error("Email is already registered")]
    EmailTaken,

    #[error("User name is already taken")]
    UserNameTaken,

    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("This account was created via Google. Use Google sign-in.")]
    GoogleAccount,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    #[error("Invalid or expired session")]
    InvalidSession,

    #[error("User not found: {id}")]
    UserNotFound { id: Uuid },

    #[error("Google sign-in is not configured")]
    GoogleNotConfigured,

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn invalid_email(email: impl Into<String>) -> Self {
        Self::InvalidEmail {
            email: email.into(),
        }
    }

    pub fn invalid_user_name(reason: impl Into<String>) -> Self {
        Self::InvalidUserName {
            reason: reason.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
