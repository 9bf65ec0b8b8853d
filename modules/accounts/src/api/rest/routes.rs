use axum::{Extension, Router};
use modkit::api::{Missing, OpenApiRegistry, OperationBuilder};
use std::sync::Arc;

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

pub fn register_routes(
    mut router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<Service>,
) -> anyhow::Result<Router> {
    // POST /api/auth/register
    router = OperationBuilder::<Missing, Missing, ()>::post("/api/auth/register")
        .operation_id("accounts.register")
        .summary("Register a new account")
        .description("Create an account with email, user name and password and return a session token")
        .tag("auth")
        .json_request::<dto::RegisterReq>(openapi, "Account data")
        .handler(handlers::register)
        .json_response_with_schema::<dto::AuthResponse>(openapi, 200, "Account created")
        .problem_response(openapi, 400, "Validation failed")
        .problem_response(openapi, 409, "Email or user name taken")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // POST /api/auth/login
    router = OperationBuilder::<Missing, Missing, ()>::post("/api/auth/login")
        .operation_id("accounts.login")
        .summary("Log in")
        .description("Authenticate with an email or user name and a password")
        .tag("auth")
        .json_request::<dto::LoginReq>(openapi, "Credentials")
        .handler(handlers::login)
        .json_response_with_schema::<dto::AuthResponse>(openapi, 200, "Authenticated")
        .problem_response(openapi, 401, "Invalid credentials or Google account")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // GET /api/auth/me
    router = OperationBuilder::<Missing, Missing, ()>::get("/api/auth/me")
        .operation_id("accounts.me")
        .summary("Current user")
        .description("Identity carried by the bearer session token")
        .tag("auth")
        .bearer_auth()
        .handler(handlers::me)
        .json_response_with_schema::<dto::MeDto>(openapi, 200, "Current user")
        .problem_response(openapi, 401, "Unauthorized")
        .register(router, openapi);

    // POST /api/auth/forgot-password
    router = OperationBuilder::<Missing, Missing, ()>::post("/api/auth/forgot-password")
        .operation_id("accounts.forgot_password")
        .summary("Request a password reset")
        .description("Always succeeds for a well-formed email; a reset link is mailed when the account exists")
        .tag("auth")
        .json_request::<dto::ForgotPasswordReq>(openapi, "Account email")
        .handler(handlers::forgot_password)
        .json_response_with_schema::<dto::MessageDto>(openapi, 200, "Request accepted")
        .problem_response(openapi, 400, "Invalid email")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // POST /api/auth/reset-password
    router = OperationBuilder::<Missing, Missing, ()>::post("/api/auth/reset-password")
        .operation_id("accounts.reset_password")
        .summary("Reset a password")
        .description("Consume a reset token and set a new password")
        .tag("auth")
        .json_request::<dto::ResetPasswordReq>(openapi, "Reset token and new password")
        .handler(handlers::reset_password)
        .json_response_with_schema::<dto::MessageDto>(openapi, 200, "Password changed")
        .problem_response(openapi, 400, "Invalid token or weak password")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // GET /api/auth/google/login
    router = OperationBuilder::<Missing, Missing, ()>::get("/api/auth/google/login")
        .operation_id("accounts.google_login")
        .summary("Start Google sign-in")
        .tag("auth")
        .handler(handlers::google_login)
        .empty_response(303, "Redirect to Google")
        .problem_response(openapi, 503, "Google sign-in not configured")
        .register(router, openapi);

    // GET /api/auth/google/callback
    router = OperationBuilder::<Missing, Missing, ()>::get("/api/auth/google/callback")
        .operation_id("accounts.google_callback")
        .summary("Google sign-in callback")
        .description("Redirects to the frontend with either `?token=` or `?error=`")
        .tag("auth")
        .query_param("code", false, "Authorization code")
        .query_param("state", false, "Login state issued by google/login")
        .query_param("error", false, "Provider error")
        .handler(handlers::google_callback)
        .empty_response(303, "Redirect to the frontend")
        .register(router, openapi);

    router = router.layer(Extension(service));

    Ok(router)
}
