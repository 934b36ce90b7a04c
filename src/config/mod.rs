use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

use crate::error::ClientError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Versioned API root, e.g. `http://127.0.0.1:8000/api/v1/`
    pub base_url: String,
    /// No timeout when unset; a hung request stays in flight.
    pub request_timeout_secs: Option<u64>,
    pub user_agent: String,
    pub log_requests: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Buffered cache events per subscriber before it is considered lagging
    pub event_capacity: usize,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        Self::for_environment(environment).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api.base_url = base_url.into();
        self
    }

    /// Parsed API root. A missing trailing slash is added so relative
    /// endpoint paths join under it instead of replacing its last segment.
    pub fn api_url(&self) -> Result<Url, ClientError> {
        let mut raw = self.api.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|e| {
            ClientError::transport(format!("invalid API base URL '{}': {}", self.api.base_url, e))
        })
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("CMMS_API_URL") {
            self.api.base_url = v;
        }
        if let Ok(v) = env::var("CMMS_REQUEST_TIMEOUT_SECS") {
            self.api.request_timeout_secs = v.parse().ok().filter(|secs| *secs > 0);
        }
        if let Ok(v) = env::var("CMMS_USER_AGENT") {
            self.api.user_agent = v;
        }
        if let Ok(v) = env::var("CMMS_LOG_HTTP") {
            self.api.log_requests = v.parse().unwrap_or(self.api.log_requests);
        }
        if let Ok(v) = env::var("CMMS_CACHE_ENABLED") {
            self.cache.enabled = v.parse().unwrap_or(self.cache.enabled);
        }
        if let Ok(v) = env::var("CMMS_CACHE_EVENT_CAPACITY") {
            self.cache.event_capacity = v.parse().unwrap_or(self.cache.event_capacity);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://127.0.0.1:8000/api/v1/".to_string(),
                request_timeout_secs: None,
                user_agent: default_user_agent(),
                log_requests: true,
            },
            cache: CacheConfig {
                enabled: true,
                event_capacity: 256,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://staging.example.com/api/v1/".to_string(),
                request_timeout_secs: None,
                user_agent: default_user_agent(),
                log_requests: true,
            },
            cache: CacheConfig {
                enabled: true,
                event_capacity: 256,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://app.example.com/api/v1/".to_string(),
                request_timeout_secs: None,
                user_agent: default_user_agent(),
                log_requests: false,
            },
            cache: CacheConfig {
                enabled: true,
                event_capacity: 1024,
            },
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::development()
    }
}

fn default_user_agent() -> String {
    format!("cmms-client/{}", env!("CARGO_PKG_VERSION"))
}

// Process-wide default for the CLI. Library code takes the config explicitly.
pub static CONFIG: Lazy<ClientConfig> = Lazy::new(ClientConfig::from_env);

pub fn config() -> &'static ClientConfig {
    &CONFIG
}
