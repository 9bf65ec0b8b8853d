use std::sync::Arc;

use axum::{
    extract::Query,
    http::StatusCode,
    response::{Json, Redirect},
    Extension,
};
use modkit::{ProblemResponse, RequestCtx};
use tracing::debug;

use crate::api::rest::dto::{
    AuthResponse, ForgotPasswordReq, GoogleCallbackQuery, LoginReq, MeDto, MessageDto,
    RegisterReq, ResetPasswordReq,
};
use crate::api::rest::error::map_domain_error;
use crate::domain::model::ProviderLoginOutcome;
use crate::domain::service::Service;

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for this email, a password reset link has been sent.";
const RESET_PASSWORD_MESSAGE: &str = "Password has been reset.";

/// Create an account and start a session
pub async fn register(
    Extension(svc): Extension<Arc<Service>>,
    ctx: RequestCtx,
    Json(req): Json<RegisterReq>,
) -> Result<Json<AuthResponse>, ProblemResponse> {
    let session = svc
        .register(req.into())
        .await
        .map_err(|e| map_domain_error(&e, &ctx))?;
    Ok(Json(session.into()))
}

/// Password login by email or user name
pub async fn login(
    Extension(svc): Extension<Arc<Service>>,
    ctx: RequestCtx,
    Json(req): Json<LoginReq>,
) -> Result<Json<AuthResponse>, ProblemResponse> {
    let session = svc
        .login(&req.login, &req.password)
        .await
        .map_err(|e| map_domain_error(&e, &ctx))?;
    Ok(Json(session.into()))
}

/// Identity of the bearer token holder
pub async fn me(
    Extension(svc): Extension<Arc<Service>>,
    ctx: RequestCtx,
) -> Result<Json<MeDto>, ProblemResponse> {
    let Some(token) = ctx.bearer_token() else {
        return Err(ctx.problem(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Unauthorized",
            "Missing bearer token",
        ));
    };
    let user = svc
        .verify_session(token)
        .map_err(|e| map_domain_error(&e, &ctx))?;
    Ok(Json(user.into()))
}

pub async fn forgot_password(
    Extension(svc): Extension<Arc<Service>>,
    ctx: RequestCtx,
    Json(req): Json<ForgotPasswordReq>,
) -> Result<Json<MessageDto>, ProblemResponse> {
    svc.forgot_password(&req.email)
        .await
        .map_err(|e| map_domain_error(&e, &ctx))?;
    Ok(Json(MessageDto::new(FORGOT_PASSWORD_MESSAGE)))
}

pub async fn reset_password(
    Extension(svc): Extension<Arc<Service>>,
    ctx: RequestCtx,
    Json(req): Json<ResetPasswordReq>,
) -> Result<Json<MessageDto>, ProblemResponse> {
    svc.reset_password(&req.token, &req.new_password)
        .await
        .map_err(|e| map_domain_error(&e, &ctx))?;
    Ok(Json(MessageDto::new(RESET_PASSWORD_MESSAGE)))
}

/// Redirect to the Google consent screen
pub async fn google_login(
    Extension(svc): Extension<Arc<Service>>,
    ctx: RequestCtx,
) -> Result<Redirect, ProblemResponse> {
    let url = svc
        .google_authorization_url()
        .map_err(|e| map_domain_error(&e, &ctx))?;
    Ok(Redirect::to(&url))
}

/// Finish Google sign-in and send the browser back to the frontend
pub async fn google_callback(
    Extension(svc): Extension<Arc<Service>>,
    Query(query): Query<GoogleCallbackQuery>,
) -> Redirect {
    let outcome = svc.google_callback(query.into()).await;
    debug!(outcome = outcome_kind(&outcome), "Google callback handled");
    Redirect::to(&svc.redirect_for(&outcome))
}

// The authenticated variant carries the session token; log only the kind
fn outcome_kind(outcome: &ProviderLoginOutcome) -> &'static str {
    use ProviderLoginOutcome::*;
    match outcome {
        Authenticated { .. } => "authenticated",
        Failed => "failed",
        EmailMissing => "email_missing",
    }
}
