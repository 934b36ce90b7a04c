use serde::Serialize;

use crate::models::User;

/// Where the session stands, derived from the stored fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No token.
    Anonymous,
    /// Token present, user not yet confirmed, no error recorded.
    Verifying,
    /// Token and user present.
    Authenticated,
}

/// Session state. Fields are private: the only mutators are the
/// transitions below, driven through [`super::SessionContext`].
///
/// Invariant: `is_authenticated` implies `user` and `token` are both set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    user: Option<User>,
    #[serde(skip_serializing)]
    token: Option<String>,
    is_authenticated: bool,
    is_loading: bool,
    error: Option<String>,
}

impl Session {
    /// State at process start. A restored token is not trusted until the
    /// profile has been fetched with it, so the session is not yet
    /// authenticated.
    pub fn restored(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            ..Self::default()
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.token, &self.user) {
            (Some(_), Some(_)) if self.is_authenticated => SessionPhase::Authenticated,
            (Some(_), _) if self.error.is_none() => SessionPhase::Verifying,
            _ => SessionPhase::Anonymous,
        }
    }

    pub(crate) fn start(&mut self) {
        self.is_loading = true;
        self.error = None;
    }

    /// A later call overwrites an earlier one.
    pub(crate) fn succeed(&mut self, user: User, token: String) {
        self.user = Some(user);
        self.token = Some(token);
        self.is_authenticated = true;
        self.is_loading = false;
        self.error = None;
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.clear();
        self.error = Some(message);
    }

    pub(crate) fn clear(&mut self) {
        self.user = None;
        self.token = None;
        self.is_authenticated = false;
        self.is_loading = false;
        self.error = None;
    }

    /// Returns false, leaving the state untouched, when not authenticated.
    pub(crate) fn replace_user(&mut self, user: User) -> bool {
        if !self.is_authenticated {
            return false;
        }
        self.user = Some(user);
        true
    }

    pub(crate) fn invariant_holds(&self) -> bool {
        !self.is_authenticated || (self.user.is_some() && self.token.is_some())
    }
}
