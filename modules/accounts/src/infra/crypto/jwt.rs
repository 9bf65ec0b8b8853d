//! HS256 session tokens.
//!
//! Claims carry the user id twice (`sub` and `id`) plus user name and email,
//! so clients can read the identity without another round trip.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::contract::SessionUser;
use crate::domain::error::DomainError;
use crate::domain::model::IssuedToken;
use crate::domain::ports::TokenIssuer;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    id: Uuid,
    username: String,
    email: String,
    iss: String,
    aud: String,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    lifetime: Duration,
}

impl JwtTokenIssuer {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[cfg.issuer.as_str()]);
        validation.set_audience(&[cfg.audience.as_str()]);
        Self {
            encoding: EncodingKey::from_secret(cfg.key.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.key.as_bytes()),
            validation,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            lifetime: Duration::hours(i64::from(cfg.expires_hours)),
        }
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, user: &SessionUser) -> anyhow::Result<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.lifetime;
        let claims = Claims {
            sub: user.id.to_string(),
            id: user.id,
            username: user.user_name.clone(),
            email: user.email.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<SessionUser, DomainError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            tracing::debug!(error = %e, "Session token rejected");
            DomainError::InvalidSession
        })?;
        Ok(SessionUser {
            id: data.claims.id,
            user_name: data.claims.username,
            email: data.claims.email,
        })
    }
}
