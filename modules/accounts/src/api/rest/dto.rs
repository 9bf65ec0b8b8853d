use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::contract::SessionUser;
use crate::domain::model::{AuthSession, NewAccount, ProviderCallback};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReq {
    pub email: String,
    pub user_name: String,
    pub password: String,
}

/// `login` holds an email address or a user name.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginReq {
    #[serde(alias = "email", alias = "emailOrUserName")]
    pub login: String,
    pub password: String,
}

/// Session token plus the identity it was issued for.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeDto {
    pub id: Uuid,
    pub email: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ForgotPasswordReq {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordReq {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageDto {
    pub message: String,
}

impl MessageDto {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl From<RegisterReq> for NewAccount {
    fn from(req: RegisterReq) -> Self {
        Self {
            email: req.email,
            user_name: req.user_name,
            password: req.password,
        }
    }
}

impl From<AuthSession> for AuthResponse {
    fn from(s: AuthSession) -> Self {
        Self {
            token: s.token.token,
            id: s.user.id,
            user_name: s.user.user_name,
            email: s.user.email,
        }
    }
}

impl From<SessionUser> for MeDto {
    fn from(u: SessionUser) -> Self {
        Self {
            id: u.id,
            email: u.email,
            user_name: u.user_name,
        }
    }
}

impl From<GoogleCallbackQuery> for ProviderCallback {
    fn from(q: GoogleCallbackQuery) -> Self {
        Self {
            code: q.code,
            state: q.state,
            error: q.error,
        }
    }
}
