use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, StatusCode};

use crate::api::problem::{Problem, ProblemResponse};

/// Per-request facts handlers need for error reporting and optional auth:
/// the request path, the `x-request-id` set by the ingress and a bearer token.
#[derive(Debug, Clone, Default)]
pub struct RequestCtx {
    pub path: String,
    pub request_id: Option<String>,
    bearer: Option<String>,
}

impl RequestCtx {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// `Authorization: Bearer <token>` value, if present and non-empty.
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    /// Build a problem response bound to this request.
    pub fn problem(
        &self,
        status: StatusCode,
        code: &str,
        title: &str,
        detail: impl Into<String>,
    ) -> ProblemResponse {
        let mut problem = Problem::new(status, title, detail)
            .with_type(format!("https://stargram.dev/problems/{}", code.to_ascii_lowercase()))
            .with_code(code)
            .with_instance(self.path.clone());
        if let Some(id) = &self.request_id {
            problem = problem.with_request_id(id.clone());
        }
        ProblemResponse(problem)
    }
}

fn parse_bearer(value: &str) -> Option<String> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

impl<S: Send + Sync> FromRequestParts<S> for RequestCtx {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_str = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        Ok(Self {
            path: parts.uri.path().to_string(),
            request_id: header_str("x-request-id"),
            bearer: parts
                .headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_bearer),
        })
    }
}
