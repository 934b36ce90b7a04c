use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};

use super::http::{Credential, HttpClient};
use crate::cache::QueryCache;
use crate::error::ClientError;
use crate::models::{NewUser, User};
use crate::session::{fingerprint, SessionContext};

const LOGIN: &str = "auth/token/login/";
const LOGOUT: &str = "auth/token/logout/";
const PROFILE: &str = "auth/users/me/";
const REGISTER: &str = "auth/users/";

const INVALID_CREDENTIALS: &str = "Invalid credentials.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    auth_token: String,
}

type ProfileFuture = Shared<BoxFuture<'static, Result<User, ClientError>>>;

struct Verification {
    token: String,
    profile: ProfileFuture,
}

/// Authentication endpoints. The only binding that drives session
/// transitions and persisted storage.
#[derive(Clone)]
pub struct AuthApi {
    http: HttpClient,
    session: SessionContext,
    cache: QueryCache,
    verification: Arc<Mutex<Option<Verification>>>,
}

impl AuthApi {
    pub fn new(http: HttpClient, session: SessionContext, cache: QueryCache) -> Self {
        Self {
            http,
            session,
            cache,
            verification: Arc::new(Mutex::new(None)),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Exchange credentials for a token, fetch the profile with it, then
    /// mark the session authenticated. The session is not marked
    /// authenticated until the profile (and therefore the role) is known.
    /// On any failure the session is cleared, the message recorded and no
    /// token persisted.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ClientError> {
        self.session.start();
        tracing::debug!(username = %credentials.username, "logging in");

        match self.exchange(credentials).await {
            Ok((user, token)) => {
                self.session.success(user.clone(), token)?;
                Ok(user)
            }
            Err(e) => {
                let message = login_failure_message(&e);
                tracing::warn!(username = %credentials.username, "login failed: {}", message);
                if let Err(storage) = self.session.failure(message.clone()) {
                    tracing::warn!("login failure left a stored token behind: {}", storage);
                }
                Err(match e {
                    ClientError::Validation { .. } => ClientError::Authentication(message),
                    e if e.is_auth_rejection() => ClientError::Authentication(message),
                    other => other,
                })
            }
        }
    }

    async fn exchange(&self, credentials: &Credentials) -> Result<(User, String), ClientError> {
        let issued: TokenResponse = self
            .http
            .post_as(LOGIN, Credential::Anonymous, credentials)
            .await?;
        let user: User = self
            .http
            .get_as(PROFILE, Credential::Token(&issued.auth_token))
            .await?;
        Ok((user, issued.auth_token))
    }

    /// Current profile for the session token, without touching the session.
    pub async fn profile(&self) -> Result<User, ClientError> {
        self.http.get(PROFILE).await
    }

    /// Re-read the profile of the signed-in user, e.g. after it was edited.
    pub async fn refresh_profile(&self) -> Result<User, ClientError> {
        let user = self.profile().await?;
        if !self.session.set_user(user.clone()) {
            tracing::debug!("profile refreshed without an authenticated session");
        }
        Ok(user)
    }

    /// Confirm a restored token by fetching the profile. Success
    /// authenticates the session, failure clears it. Concurrent callers for
    /// the same token share one request.
    pub async fn verify(&self) -> Result<User, ClientError> {
        let token = self
            .session
            .token()
            .ok_or_else(|| ClientError::authentication("No stored credentials"))?;

        let profile = self.shared_profile(&token);
        let result = profile.await;
        self.finish_verification(&token);

        match result {
            Ok(user) => {
                // A logout or new login may have happened meanwhile
                if self.session.token().as_deref() == Some(token.as_str()) {
                    self.session.success(user.clone(), token)?;
                }
                Ok(user)
            }
            Err(e) => {
                if self.session.token().as_deref() == Some(token.as_str()) {
                    tracing::warn!(token = %fingerprint(&token), "token verification failed: {}", e);
                    self.session.failure(e.to_string())?;
                }
                Err(e)
            }
        }
    }

    fn shared_profile(&self, token: &str) -> ProfileFuture {
        let mut slot = self.verification.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pending) = slot.as_ref().filter(|v| v.token == token) {
            tracing::debug!(token = %fingerprint(token), "joining verification in flight");
            return pending.profile.clone();
        }

        tracing::debug!(token = %fingerprint(token), "verifying persisted token");
        let http = self.http.clone();
        let owned = token.to_string();
        let profile = async move { http.get_as::<User>(PROFILE, Credential::Token(&owned)).await }
            .boxed()
            .shared();
        *slot = Some(Verification {
            token: token.to_string(),
            profile: profile.clone(),
        });
        profile
    }

    fn finish_verification(&self, token: &str) {
        let mut slot = self.verification.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|v| v.token == token) {
            *slot = None;
        }
    }

    /// Sign out remotely, then clear the session and the query cache. The
    /// local clear happens even when the remote call fails; that failure is
    /// only logged.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if let Some(token) = self.session.token() {
            if let Err(e) = self.http.post_empty(LOGOUT, Credential::Token(&token)).await {
                tracing::warn!("remote sign-out failed, clearing local session anyway: {}", e);
            }
        }
        self.cache.clear();
        self.session.logout()
    }

    /// Self-registration. Does not change the session.
    pub async fn register(&self, user: &NewUser) -> Result<User, ClientError> {
        self.http.post_as(REGISTER, Credential::Anonymous, user).await
    }
}

/// Message shown when login fails: the server's first non-field error or
/// detail when present, a generic message otherwise.
fn login_failure_message(error: &ClientError) -> String {
    match error {
        ClientError::Validation { message, field_errors } if field_errors.is_empty() => {
            message.clone()
        }
        ClientError::Validation { .. } => INVALID_CREDENTIALS.to_string(),
        ClientError::Authentication(message) if !message.is_empty() => message.clone(),
        ClientError::Authentication(_) => INVALID_CREDENTIALS.to_string(),
        other => other.to_string(),
    }
}
