use axum::http::StatusCode;
use modkit::{ProblemResponse, RequestCtx};

use crate::domain::error::DomainError;

/// Map a domain error to an RFC 9457 problem bound to the current request.
pub fn map_domain_error(e: &DomainError, ctx: &RequestCtx) -> ProblemResponse {
    use DomainError::*;

    let (status, code, title) = match e {
        InvalidEmail { .. } => (StatusCode::BAD_REQUEST, "INVALID_EMAIL", "Invalid email"),
        InvalidUserName { .. } => (StatusCode::BAD_REQUEST, "INVALID_USERNAME", "Invalid user name"),
        WeakPassword { .. } => (StatusCode::BAD_REQUEST, "WEAK_PASSWORD", "Weak password"),
        EmailTaken => (StatusCode::CONFLICT, "EMAIL_TAKEN", "Email already registered"),
        UserNameTaken => (StatusCode::CONFLICT, "USERNAME_TAKEN", "User name already taken"),
        InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", "Unauthorized"),
        GoogleAccount => (StatusCode::UNAUTHORIZED, "GOOGLE_ACCOUNT", "Unauthorized"),
        InvalidSession => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized"),
        InvalidResetToken => (StatusCode::BAD_REQUEST, "INVALID_RESET_TOKEN", "Invalid reset token"),
        UserNotFound { .. } => (StatusCode::NOT_FOUND, "USER_NOT_FOUND", "User not found"),
        GoogleNotConfigured => (
            StatusCode::SERVICE_UNAVAILABLE,
            "GOOGLE_NOT_CONFIGURED",
            "Google sign-in unavailable",
        ),
        Database { .. } | Internal { .. } => {
            tracing::error!(error = %e, path = %ctx.path, "Request failed");
            return ctx.problem(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Internal Server Error",
                "An internal error occurred",
            );
        }
    };
    ctx.problem(status, code, title, e.to_string())
}
