use axum::http::StatusCode;
use modkit::{ProblemResponse, RequestCtx};

use crate::domain::error::DomainError;

/// Map a domain error to an RFC 9457 problem bound to the current request.
pub fn map_domain_error(e: &DomainError, ctx: &RequestCtx) -> ProblemResponse {
    use DomainError::*;

    let (status, code, title) = match e {
        PostNotFound { .. } => (StatusCode::NOT_FOUND, "POST_NOT_FOUND", "Post not found"),
        UserNotFound { .. } => (StatusCode::NOT_FOUND, "USER_NOT_FOUND", "User not found"),
        EmptyPost => (StatusCode::BAD_REQUEST, "EMPTY_POST", "Empty post"),
        CaptionTooLong { .. } => (StatusCode::BAD_REQUEST, "CAPTION_TOO_LONG", "Caption too long"),
        EmptyComment => (StatusCode::BAD_REQUEST, "EMPTY_COMMENT", "Empty comment"),
        CommentTooLong { .. } => (StatusCode::BAD_REQUEST, "COMMENT_TOO_LONG", "Comment too long"),
        UnsupportedMedia { .. } => (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "UNSUPPORTED_MEDIA_TYPE",
            "Unsupported media type",
        ),
        InvalidStar { .. } => (StatusCode::BAD_REQUEST, "INVALID_STAR", "Invalid star"),
        Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized"),
        UserMismatch => (StatusCode::FORBIDDEN, "USER_MISMATCH", "Forbidden"),
        Accounts { .. } | Storage { .. } | Database { .. } => {
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

/// 400 for request bodies the extractors could not decode.
pub fn bad_request(ctx: &RequestCtx, detail: impl Into<String>) -> ProblemResponse {
    ctx.problem(StatusCode::BAD_REQUEST, "BAD_REQUEST", "Bad Request", detail)
}
