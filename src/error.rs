// Client error types
use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Failure of a remote call or of a local session operation, with a
/// human-readable message suitable for inline display next to a form or list.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClientError {
    // Network or transport failure, no response received
    #[error("Network error: {0}")]
    Transport(String),

    // 401: invalid credentials, expired or unknown token
    #[error("{0}")]
    Authentication(String),

    // 403: the server refused the action for this role
    #[error("{0}")]
    Authorization(String),

    // 400 / 422: malformed payload
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: BTreeMap<String, Vec<String>>,
    },

    // 404
    #[error("{0}")]
    NotFound(String),

    // Any other non-success status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    // Response received but the body could not be decoded
    #[error("Invalid response: {0}")]
    Decode(String),

    // Persisted session storage could not be read or written
    #[error("Session storage error: {0}")]
    Storage(String),

    // Refused client-side by the role policy before any request was made
    #[error("{0}")]
    Forbidden(String),
}

impl ClientError {
    /// HTTP status the error was derived from, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Authentication(_) => Some(401),
            ClientError::Authorization(_) => Some(403),
            ClientError::Validation { .. } => Some(400),
            ClientError::NotFound(_) => Some(404),
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get error code for machine-readable output
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Transport(_) => "TRANSPORT_ERROR",
            ClientError::Authentication(_) => "UNAUTHORIZED",
            ClientError::Authorization(_) => "FORBIDDEN",
            ClientError::Validation { .. } => "VALIDATION_ERROR",
            ClientError::NotFound(_) => "NOT_FOUND",
            ClientError::Server { .. } => "SERVER_ERROR",
            ClientError::Decode(_) => "INVALID_RESPONSE",
            ClientError::Storage(_) => "STORAGE_ERROR",
            ClientError::Forbidden(_) => "NOT_PERMITTED",
        }
    }

    /// The server refused the credentials or token (HTTP 401).
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ClientError::Authentication(_))
    }

    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            ClientError::Validation { field_errors, .. } => Some(field_errors),
            _ => None,
        }
    }

    /// Build an error from a non-success response. The message comes from
    /// `detail`, then the first of `non_field_errors`, then per-field errors,
    /// then the raw body or the status reason.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();
        let (detail, field_errors) = match &parsed {
            Some(value) => extract_messages(value),
            None => (None, BTreeMap::new()),
        };

        let message = detail
            .or_else(|| summarize_fields(&field_errors))
            .or_else(|| {
                let trimmed = body.trim();
                (parsed.is_none() && !trimmed.is_empty() && trimmed.len() <= 200)
                    .then(|| trimmed.to_string())
            })
            .unwrap_or_else(|| default_message(status).to_string());

        match status {
            400 | 422 => ClientError::Validation {
                message,
                field_errors,
            },
            401 => ClientError::Authentication(message),
            403 => ClientError::Authorization(message),
            404 => ClientError::NotFound(message),
            _ => ClientError::Server { status, message },
        }
    }
}

// Static constructor methods
impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        ClientError::Transport(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        ClientError::Authentication(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation {
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ClientError::Decode(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ClientError::Forbidden(message.into())
    }
}

fn extract_messages(value: &Value) -> (Option<String>, BTreeMap<String, Vec<String>>) {
    let mut field_errors = BTreeMap::new();
    let Some(object) = value.as_object() else {
        return (value.as_str().map(String::from), field_errors);
    };

    let detail = object
        .get("detail")
        .and_then(Value::as_str)
        .map(String::from)
        .or_else(|| {
            object
                .get("non_field_errors")
                .and_then(|v| messages_of(v).into_iter().next())
        });

    for (field, messages) in object {
        if field == "detail" || field == "non_field_errors" {
            continue;
        }
        let messages = messages_of(messages);
        if !messages.is_empty() {
            field_errors.insert(field.clone(), messages);
        }
    }

    (detail, field_errors)
}

fn messages_of(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(String::from))
            .collect(),
        _ => Vec::new(),
    }
}

fn summarize_fields(field_errors: &BTreeMap<String, Vec<String>>) -> Option<String> {
    if field_errors.is_empty() {
        return None;
    }
    let parts: Vec<String> = field_errors
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
        .collect();
    Some(parts.join("; "))
}

fn default_message(status: u16) -> &'static str {
    match status {
        400 => "Invalid request",
        401 => "Invalid credentials.",
        403 => "You do not have permission to perform this action.",
        404 => "Not found.",
        422 => "Invalid request",
        500..=599 => "The server could not process the request",
        _ => "Unknown error",
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<crate::session::storage::StorageError> for ClientError {
    fn from(err: crate::session::storage::StorageError) -> Self {
        ClientError::Storage(err.to_string())
    }
}
