use serde::Serialize;

use crate::api::AuthApi;
use crate::session::{Session, SessionPhase};

/// What to show for a protected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardDecision {
    Render,
    /// Verification of a persisted token is outstanding.
    Loading,
    RedirectToLogin,
}

/// Gate for protected views, as a function of the session alone.
pub fn decide(session: &Session) -> GuardDecision {
    match session.phase() {
        SessionPhase::Authenticated => GuardDecision::Render,
        SessionPhase::Verifying => GuardDecision::Loading,
        SessionPhase::Anonymous => GuardDecision::RedirectToLogin,
    }
}

/// Route guard bound to a session. `resolve` runs the cold-start token
/// verification when needed.
#[derive(Clone)]
pub struct RouteGuard {
    auth: AuthApi,
}

impl RouteGuard {
    pub fn new(auth: AuthApi) -> Self {
        Self { auth }
    }

    /// Decision for the current session, without any network call.
    pub fn decision(&self) -> GuardDecision {
        decide(&self.auth.session().snapshot())
    }

    /// Settle the decision. When a persisted token is awaiting verification
    /// the profile is fetched (once, however many callers are waiting) and
    /// the outcome decides between rendering and redirecting.
    pub async fn resolve(&self) -> GuardDecision {
        if self.decision() != GuardDecision::Loading {
            return self.decision();
        }

        if let Err(e) = self.auth.verify().await {
            tracing::debug!("guard verification ended with error: {}", e);
        }
        self.decision()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};

    fn user() -> User {
        User {
            id: "1".into(),
            username: "tech".into(),
            email: String::new(),
            first_name: None,
            last_name: None,
            role: Role::Technician,
            is_active: None,
            is_staff: None,
        }
    }

    #[test]
    fn anonymous_redirects() {
        assert_eq!(decide(&Session::restored(None)), GuardDecision::RedirectToLogin);
    }

    #[test]
    fn unverified_token_shows_loading() {
        assert_eq!(
            decide(&Session::restored(Some("tok".into()))),
            GuardDecision::Loading
        );
    }

    #[test]
    fn authenticated_renders_and_failure_redirects() {
        let mut session = Session::restored(Some("tok".into()));
        session.succeed(user(), "tok".into());
        assert_eq!(decide(&session), GuardDecision::Render);

        session.fail("Invalid token.".into());
        assert_eq!(decide(&session), GuardDecision::RedirectToLogin);
    }
}
