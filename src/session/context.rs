use std::sync::Arc;

use tokio::sync::watch;

use super::fingerprint;
use super::state::Session;
use super::storage::TokenStore;
use crate::error::ClientError;
use crate::models::User;

/// Shared, explicitly constructed session container. Cloning is cheap and
/// every clone observes the same state. Snapshots are published on a watch
/// channel so views can re-render on change.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

struct Inner {
    state: watch::Sender<Session>,
    store: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("phase", &self.inner.state.borrow().phase())
            .field("store", &self.inner.store)
            .finish()
    }
}

impl SessionContext {
    /// Initialize from persisted storage. An unreadable store starts the
    /// session anonymous.
    pub fn restore(store: Arc<dyn TokenStore>) -> Self {
        let token = match store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("could not read persisted token, starting anonymous: {}", e);
                None
            }
        };
        if let Some(token) = &token {
            tracing::debug!(token = %fingerprint(token), "restored persisted token");
        }

        let (state, _) = watch::channel(Session::restored(token));
        Self {
            inner: Arc::new(Inner { state, store }),
        }
    }

    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.state.borrow().token().map(String::from)
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    pub fn start(&self) {
        self.inner.state.send_modify(Session::start);
    }

    /// Mark the session authenticated and persist the token. The in-memory
    /// state is updated even when persisting fails.
    pub fn success(&self, user: User, token: String) -> Result<(), ClientError> {
        tracing::info!(
            user = %user.username,
            role = %user.role,
            token = %fingerprint(&token),
            "session authenticated"
        );
        let persisted = self.inner.store.save(&token);
        self.inner.state.send_modify(|s| s.succeed(user, token));
        persisted.map_err(ClientError::from)
    }

    /// Clear the session, record `message` and erase the persisted token.
    pub fn failure(&self, message: impl Into<String>) -> Result<(), ClientError> {
        let message = message.into();
        tracing::info!("session cleared after failure: {}", message);
        self.inner.state.send_modify(|s| s.fail(message));
        self.erase_token()
    }

    /// Clear the session without recording an error and erase the
    /// persisted token.
    pub fn logout(&self) -> Result<(), ClientError> {
        tracing::info!("session cleared by logout");
        self.inner.state.send_modify(Session::clear);
        self.erase_token()
    }

    /// Replace the profile of an authenticated session. Returns false when
    /// there is no authenticated session to update.
    pub fn set_user(&self, user: User) -> bool {
        self.inner.state.send_if_modified(|s| s.replace_user(user))
    }

    fn erase_token(&self) -> Result<(), ClientError> {
        self.inner.store.clear().map_err(|e| {
            tracing::warn!("failed to erase persisted token: {}", e);
            ClientError::from(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::session::state::SessionPhase;
    use crate::session::storage::MemoryTokenStore;

    fn admin() -> User {
        User {
            id: "7".into(),
            username: "admin".into(),
            email: "admin@example.com".into(),
            first_name: None,
            last_name: None,
            role: Role::Admin,
            is_active: Some(true),
            is_staff: Some(true),
        }
    }

    #[test]
    fn restore_reads_persisted_token() {
        let store = Arc::new(MemoryTokenStore::with_token("persisted"));
        let ctx = SessionContext::restore(store);
        assert_eq!(ctx.token().as_deref(), Some("persisted"));
        assert_eq!(ctx.snapshot().phase(), SessionPhase::Verifying);
    }

    #[test]
    fn success_persists_and_logout_erases() {
        let store = Arc::new(MemoryTokenStore::new());
        let ctx = SessionContext::restore(store.clone());

        ctx.success(admin(), "tok-1".into()).unwrap();
        assert_eq!(store.current().as_deref(), Some("tok-1"));
        assert!(ctx.snapshot().is_authenticated());

        ctx.logout().unwrap();
        assert_eq!(store.current(), None);
        let session = ctx.snapshot();
        assert_eq!(session.phase(), SessionPhase::Anonymous);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn failure_erases_token_and_keeps_message() {
        let store = Arc::new(MemoryTokenStore::with_token("stale"));
        let ctx = SessionContext::restore(store.clone());

        ctx.failure("Invalid token.").unwrap();
        assert_eq!(store.current(), None);
        assert_eq!(ctx.snapshot().error(), Some("Invalid token."));
    }

    #[test]
    fn subscribers_observe_transitions() {
        let ctx = SessionContext::restore(Arc::new(MemoryTokenStore::new()));
        let mut rx = ctx.subscribe();
        assert!(!rx.has_changed().unwrap());

        ctx.start();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_loading());
    }

    #[test]
    fn set_user_only_applies_when_authenticated() {
        let ctx = SessionContext::restore(Arc::new(MemoryTokenStore::new()));
        assert!(!ctx.set_user(admin()));

        ctx.success(admin(), "tok".into()).unwrap();
        let mut renamed = admin();
        renamed.first_name = Some("Ada".into());
        assert!(ctx.set_user(renamed));
        assert_eq!(ctx.user().unwrap().display_name(), "Ada");
    }
}
