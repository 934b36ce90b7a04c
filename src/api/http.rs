use std::time::Duration;

use reqwest::{header, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::session::{fingerprint, SessionContext};

/// Which credential to attach to a request.
#[derive(Debug, Clone, Copy)]
pub enum Credential<'a> {
    /// Whatever token the session currently holds, if any.
    Session,
    /// A specific token, e.g. one just issued by login.
    Token(&'a str),
    Anonymous,
}

/// Thin wrapper over `reqwest` bound to the versioned API root. Attaches
/// `Authorization: Token <token>` and maps failures to [`ClientError`].
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: Url,
    session: SessionContext,
    log_requests: bool,
}

impl HttpClient {
    pub fn new(config: &ClientConfig, session: SessionContext) -> Result<Self, ClientError> {
        let base_url = config.api_url()?;

        let mut builder = reqwest::Client::builder().user_agent(config.api.user_agent.clone());
        if let Some(secs) = config.api.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            session,
            log_requests: config.api.log_requests,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let body = self.send::<()>(Method::GET, path, Credential::Session, None).await?;
        decode(&body)
    }

    pub async fn get_as<T: DeserializeOwned>(
        &self,
        path: &str,
        credential: Credential<'_>,
    ) -> Result<T, ClientError> {
        let body = self.send::<()>(Method::GET, path, credential, None).await?;
        decode(&body)
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        self.post_as(path, Credential::Session, body).await
    }

    pub async fn post_as<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        credential: Credential<'_>,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = self.send(Method::POST, path, credential, Some(body)).await?;
        decode(&body)
    }

    /// POST without a body, ignoring any response content.
    pub async fn post_empty(&self, path: &str, credential: Credential<'_>) -> Result<(), ClientError> {
        self.send::<()>(Method::POST, path, credential, None).await?;
        Ok(())
    }

    pub async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = self.send(Method::PATCH, path, Credential::Session, Some(body)).await?;
        decode(&body)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send::<()>(Method::DELETE, path, Credential::Session, None).await?;
        Ok(())
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        credential: Credential<'_>,
        body: Option<&B>,
    ) -> Result<String, ClientError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::transport(format!("invalid request path '{}': {}", path, e)))?;

        let token = match credential {
            Credential::Session => self.session.token(),
            Credential::Token(token) => Some(token.to_string()),
            Credential::Anonymous => None,
        };

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &token {
            request = request.header(header::AUTHORIZATION, format!("Token {}", token));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        if self.log_requests {
            tracing::debug!(
                %method,
                %url,
                token = %token.as_deref().map(fingerprint).unwrap_or_default(),
                "sending request"
            );
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, %url, "request failed: {}", e);
            ClientError::from(e)
        })?;
        let status = response.status();
        let text = response.text().await?;

        if self.log_requests {
            tracing::debug!(%method, %url, status = status.as_u16(), "received response");
        }

        if status.is_success() {
            Ok(text)
        } else {
            Err(error_for(status, &text))
        }
    }
}

fn error_for(status: StatusCode, body: &str) -> ClientError {
    ClientError::from_response(status.as_u16(), body)
}

/// Decode a response body; empty bodies decode as JSON `null`.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|e| ClientError::decode(format!("{}", e)))
}
