use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Post not found: {id}")]
    PostNotFound { id: Uuid },

    #[error("User not found: {id}")]
    UserNotFound { id: Uuid },

    #[error("A post needs a caption or an image")]
    EmptyPost,

    #[error("Caption too long: {len} characters (max: {max})")]
    CaptionTooLong { len: usize, max: usize },

    #[error("Comment text cannot be empty")]
    EmptyComment,

    #[error("Comment too long: {len} characters (max: {max})")]
    CommentTooLong { len: usize, max: usize },

    #[error("Only image uploads are accepted (got {content_type})")]
    UnsupportedMedia { content_type: String },

    #[error("Invalid star: {reason}")]
    InvalidStar { reason: String },

    #[error("Invalid or expired session")]
    Unauthorized,

    #[error("Session user does not match userId")]
    UserMismatch,

    #[error("Accounts lookup failed: {message}")]
    Accounts { message: String },

    #[error("Media storage error: {message}")]
    Storage { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn invalid_star(reason: impl Into<String>) -> Self {
        Self::InvalidStar {
            reason: reason.into(),
        }
    }
}
