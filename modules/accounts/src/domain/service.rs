use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::{SessionUser, User};
use crate::domain::error::DomainError;
use crate::domain::mail::ResetMailTemplate;
use crate::domain::model::{
    AuthSession, NewAccount, ProviderCallback, ProviderLoginOutcome, ResetTokenRecord, UserRecord,
};
use crate::domain::ports::{IdentityProvider, LoginStateStore, Mailer, PasswordHasher, TokenIssuer};
use crate::domain::repo::{is_unique_violation, ResetTokenRepository, UsersRepository};
use crate::domain::secrets::{random_url_token, RESET_TOKEN_BYTES};
use crate::domain::{username, validation};

/// Upper bound on `name2`, `name3`, ... attempts at a free user name.
const MAX_USER_NAME_ATTEMPTS: u32 = 1000;

/// Provider account creation retries after losing an insert race.
const MAX_PROVIDER_INSERTS: usize = 3;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub password_min_length: usize,
    pub reset_token_ttl: Duration,
    pub frontend_url: String,
    pub login_path: String,
    pub callback_path: String,
    pub reset_path: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            password_min_length: 6,
            reset_token_ttl: Duration::minutes(60),
            frontend_url: "http://localhost:5173".to_string(),
            login_path: "/".to_string(),
            callback_path: "/auth/callback".to_string(),
            reset_path: "/reset-password".to_string(),
        }
    }
}

/// Google sign-in collaborators; absent when the provider is not configured.
#[derive(Clone)]
pub struct ProviderLogin {
    pub provider: Arc<dyn IdentityProvider>,
    pub states: Arc<dyn LoginStateStore>,
}

/// Account, session and password-reset rules.
/// Depends only on ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    users: Arc<dyn UsersRepository>,
    reset_tokens: Arc<dyn ResetTokenRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
    mailer: Arc<dyn Mailer>,
    reset_mail: ResetMailTemplate,
    google: Option<ProviderLogin>,
    config: ServiceConfig,
}

/// Collaborators of [`Service`].
pub struct ServiceDeps {
    pub users: Arc<dyn UsersRepository>,
    pub reset_tokens: Arc<dyn ResetTokenRepository>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub tokens: Arc<dyn TokenIssuer>,
    pub mailer: Arc<dyn Mailer>,
    pub reset_mail: ResetMailTemplate,
    pub google: Option<ProviderLogin>,
}

fn db_err(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

impl Service {
    pub fn new(deps: ServiceDeps, config: ServiceConfig) -> Self {
        Self {
            users: deps.users,
            reset_tokens: deps.reset_tokens,
            hasher: deps.hasher,
            tokens: deps.tokens,
            mailer: deps.mailer,
            reset_mail: deps.reset_mail,
            google: deps.google,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn start_session(&self, record: UserRecord) -> Result<AuthSession, DomainError> {
        let token = self
            .tokens
            .issue(&record.session_user())
            .map_err(|e| DomainError::internal(format!("token issue failed: {e}")))?;
        Ok(AuthSession {
            user: record.into(),
            token,
        })
    }

    #[instrument(name = "accounts.service.register", skip_all, fields(user_name = %account.user_name))]
    pub async fn register(&self, account: NewAccount) -> Result<AuthSession, DomainError> {
        let email = validation::normalize_email(&account.email);
        let user_name = account.user_name.trim().to_string();
        validation::validate_email(&email)?;
        validation::validate_user_name(&user_name)?;
        validation::validate_password(&account.password, self.config.password_min_length)?;

        if self.users.email_exists(&email).await.map_err(db_err)? {
            return Err(DomainError::EmailTaken);
        }
        if self.users.user_name_exists(&user_name).await.map_err(db_err)? {
            return Err(DomainError::UserNameTaken);
        }

        let hash = self
            .hasher
            .hash(&account.password)
            .map_err(|e| DomainError::internal(format!("password hashing failed: {e}")))?;

        let record = UserRecord {
            id: Uuid::new_v4(),
            user_name,
            email,
            password_hash: Some(hash),
            created_at: Utc::now(),
        };
        if let Err(e) = self.users.insert(record.clone()).await {
            return Err(self.registration_conflict(e, &record.email).await);
        }
        info!(user_id = %record.id, "Registered new account");
        self.start_session(record)
    }

    /// A concurrent registration can pass the existence checks too; the unique
    /// index then decides, and the loser gets the same conflict as a sequential caller.
    async fn registration_conflict(&self, e: anyhow::Error, email: &str) -> DomainError {
        if !is_unique_violation(&e) {
            return db_err(e);
        }
        match self.users.email_exists(email).await {
            Ok(true) => DomainError::EmailTaken,
            Ok(false) => DomainError::UserNameTaken,
            Err(e) => db_err(e),
        }
    }

    /// `login` is an email address or a user name.
    #[instrument(name = "accounts.service.login", skip_all)]
    pub async fn login(&self, login: &str, password: &str) -> Result<AuthSession, DomainError> {
        let login = login.trim();
        if login.is_empty() || password.is_empty() {
            return Err(DomainError::InvalidCredentials);
        }

        let record = if login.contains('@') {
            self.users
                .find_by_email(&validation::normalize_email(login))
                .await
        } else {
            self.users.find_by_user_name(login).await
        }
        .map_err(db_err)?
        .ok_or(DomainError::InvalidCredentials)?;

        let Some(hash) = record.password_hash.as_deref() else {
            debug!(user_id = %record.id, "Password login attempted on a Google account");
            return Err(DomainError::GoogleAccount);
        };
        if !self.hasher.verify(password, hash) {
            return Err(DomainError::InvalidCredentials);
        }

        debug!(user_id = %record.id, "Login succeeded");
        self.start_session(record)
    }

    pub fn verify_session(&self, token: &str) -> Result<SessionUser, DomainError> {
        self.tokens.verify(token)
    }

    #[instrument(name = "accounts.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        self.users
            .find_by_id(id)
            .await
            .map_err(db_err)?
            .map(Into::into)
            .ok_or(DomainError::UserNotFound { id })
    }

    pub async fn get_users(&self, ids: &[Uuid]) -> Result<Vec<User>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.users.find_by_ids(ids).await.map_err(db_err)?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Succeeds for every syntactically valid email so callers cannot test
    /// which addresses have accounts.
    #[instrument(name = "accounts.service.forgot_password", skip_all)]
    pub async fn forgot_password(&self, email: &str) -> Result<(), DomainError> {
        let email = validation::normalize_email(email);
        validation::validate_email(&email)?;

        let Some(user) = self.users.find_by_email(&email).await.map_err(db_err)? else {
            debug!("Password reset requested for an unknown email");
            return Ok(());
        };

        let now = Utc::now();
        let invalidated = self
            .reset_tokens
            .invalidate_active(user.id, now)
            .await
            .map_err(db_err)?;
        if invalidated > 0 {
            debug!(user_id = %user.id, invalidated, "Superseded previous reset tokens");
        }

        let token = ResetTokenRecord {
            id: Uuid::new_v4(),
            user_id: user.id,
            token: random_url_token(RESET_TOKEN_BYTES),
            expires_at: now + self.config.reset_token_ttl,
            used: false,
            created_at: now,
        };
        self.reset_tokens
            .insert(token.clone())
            .await
            .map_err(db_err)?;

        let reset_url = self.reset_url(&token.token);
        let mail = self
            .reset_mail
            .render(&user.email, &reset_url, self.config.reset_token_ttl);
        match self.mailer.send(mail).await {
            Ok(()) => info!(user_id = %user.id, "Password reset mail sent"),
            Err(e) => warn!(user_id = %user.id, error = %format!("{e:#}"), "Password reset mail delivery failed"),
        }
        Ok(())
    }

    #[instrument(name = "accounts.service.reset_password", skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), DomainError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(DomainError::InvalidResetToken);
        }
        validation::validate_password(new_password, self.config.password_min_length)?;

        let hash = self
            .hasher
            .hash(new_password)
            .map_err(|e| DomainError::internal(format!("password hashing failed: {e}")))?;

        let user_id = self
            .reset_tokens
            .consume_and_set_password(token, &hash, Utc::now())
            .await
            .map_err(db_err)?
            .ok_or(DomainError::InvalidResetToken)?;

        info!(user_id = %user_id, "Password reset completed");
        Ok(())
    }

    pub fn reset_url(&self, token: &str) -> String {
        self.frontend_url(&self.config.reset_path, &[("token", token)])
    }

    fn frontend_url(&self, path: &str, query: &[(&str, &str)]) -> String {
        let base = self.config.frontend_url.trim_end_matches('/');
        let qs = query
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencode(v)))
            .collect::<Vec<_>>()
            .join("&");
        if qs.is_empty() {
            format!("{base}{path}")
        } else {
            format!("{base}{path}?{qs}")
        }
    }

    /// Provider authorization URL with a fresh single-use state.
    pub fn google_authorization_url(&self) -> Result<String, DomainError> {
        let google = self.google.as_ref().ok_or(DomainError::GoogleNotConfigured)?;
        let state = google.states.issue();
        google
            .provider
            .authorization_url(&state)
            .map_err(|e| DomainError::internal(format!("authorization url: {e}")))
    }

    /// Handle the provider callback. Never fails: every failure becomes a
    /// redirect back to the login page.
    #[instrument(name = "accounts.service.google_callback", skip_all)]
    pub async fn google_callback(&self, cb: ProviderCallback) -> ProviderLoginOutcome {
        match self.google_login(cb).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Google sign-in failed");
                ProviderLoginOutcome::Failed
            }
        }
    }

    async fn google_login(&self, cb: ProviderCallback) -> Result<ProviderLoginOutcome, DomainError> {
        let google = self.google.as_ref().ok_or(DomainError::GoogleNotConfigured)?;

        if let Some(err) = cb.error.as_deref() {
            debug!(provider_error = %err, "Provider returned an error");
            return Ok(ProviderLoginOutcome::Failed);
        }
        let state_ok = cb
            .state
            .as_deref()
            .map(|s| google.states.take(s))
            .unwrap_or(false);
        if !state_ok {
            debug!("Unknown or expired login state");
            return Ok(ProviderLoginOutcome::Failed);
        }
        let Some(code) = cb.code.as_deref().filter(|c| !c.is_empty()) else {
            return Ok(ProviderLoginOutcome::Failed);
        };

        let profile = google
            .provider
            .exchange_code(code)
            .await
            .map_err(|e| DomainError::internal(format!("code exchange failed: {e:#}")))?;

        let Some(email) = profile
            .email
            .as_deref()
            .map(validation::normalize_email)
            .filter(|e| !e.is_empty())
        else {
            info!(subject = %profile.subject, "Provider profile has no email; no account created");
            return Ok(ProviderLoginOutcome::EmailMissing);
        };

        let record = self
            .provider_account(&email, profile.name.as_deref())
            .await?;

        let session = self.start_session(record)?;
        Ok(ProviderLoginOutcome::Authenticated {
            token: session.token.token,
        })
    }

    /// Existing account for `email`, or a new one without a password.
    async fn provider_account(
        &self,
        email: &str,
        name: Option<&str>,
    ) -> Result<UserRecord, DomainError> {
        let base = username::base_user_name(name, email);
        let mut attempts = 0;
        loop {
            if let Some(existing) = self.users.find_by_email(email).await.map_err(db_err)? {
                return Ok(existing);
            }
            let record = UserRecord {
                id: Uuid::new_v4(),
                user_name: self.free_user_name(&base).await?,
                email: email.to_string(),
                password_hash: None,
                created_at: Utc::now(),
            };
            match self.users.insert(record.clone()).await {
                Ok(()) => {
                    info!(user_id = %record.id, "Created account from Google profile");
                    return Ok(record);
                }
                Err(e) if is_unique_violation(&e) && attempts + 1 < MAX_PROVIDER_INSERTS => {
                    attempts += 1;
                    debug!(attempts, "Provider account insert lost a race; retrying");
                }
                Err(e) => return Err(db_err(e)),
            }
        }
    }

    async fn free_user_name(&self, base: &str) -> Result<String, DomainError> {
        for attempt in 1..=MAX_USER_NAME_ATTEMPTS {
            let name = username::candidate(base, attempt);
            if !self.users.user_name_exists(&name).await.map_err(db_err)? {
                return Ok(name);
            }
        }
        Err(DomainError::internal(format!(
            "no free user name for base '{base}'"
        )))
    }

    /// Frontend URL the browser is sent to after the provider callback.
    pub fn redirect_for(&self, outcome: &ProviderLoginOutcome) -> String {
        match outcome {
            ProviderLoginOutcome::Authenticated { token } => {
                self.frontend_url(&self.config.callback_path, &[("token", token)])
            }
            ProviderLoginOutcome::Failed => {
                self.frontend_url(&self.config.login_path, &[("error", "google_auth_failed")])
            }
            ProviderLoginOutcome::EmailMissing => {
                self.frontend_url(&self.config.login_path, &[("error", "google_email_missing")])
            }
        }
    }
}

fn urlencode(v: &str) -> String {
    url::form_urlencoded::byte_serialize(v.as_bytes()).collect()
}
