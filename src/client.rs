use std::sync::Arc;

use crate::api::{AssetsApi, AuthApi, HttpClient, PartsApi, UsersApi, WorkOrdersApi};
use crate::cache::QueryCache;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::guard::RouteGuard;
use crate::policy::{Policy, RolePolicy};
use crate::session::{SessionContext, TokenStore};

/// Composition root: one session context, one transport, one query cache
/// and one policy, shared by every binding handed out.
#[derive(Clone)]
pub struct CmmsClient {
    session: SessionContext,
    http: HttpClient,
    cache: QueryCache,
    auth: AuthApi,
    policy: Arc<dyn Policy>,
}

impl CmmsClient {
    /// Build a client whose session is restored from `store`.
    pub fn new(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, ClientError> {
        Self::with_session(config, SessionContext::restore(store))
    }

    pub fn with_session(config: &ClientConfig, session: SessionContext) -> Result<Self, ClientError> {
        let http = HttpClient::new(config, session.clone())?;
        let cache = QueryCache::new(&config.cache);
        let auth = AuthApi::new(http.clone(), session.clone(), cache.clone());

        Ok(Self {
            session,
            http,
            cache,
            auth,
            policy: Arc::new(RolePolicy),
        })
    }

    /// Replace the role policy, e.g. with overrides in tests.
    pub fn with_policy(mut self, policy: Arc<dyn Policy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn policy(&self) -> &dyn Policy {
        self.policy.as_ref()
    }

    pub fn auth(&self) -> &AuthApi {
        &self.auth
    }

    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(self.auth.clone())
    }

    pub fn assets(&self) -> AssetsApi {
        AssetsApi::new(self.http.clone(), self.cache.clone())
    }

    pub fn work_orders(&self) -> WorkOrdersApi {
        WorkOrdersApi::new(self.http.clone(), self.cache.clone())
    }

    pub fn parts(&self) -> PartsApi {
        PartsApi::new(self.http.clone(), self.cache.clone())
    }

    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.http.clone(), self.cache.clone())
    }
}
