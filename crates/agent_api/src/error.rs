use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Message used when a failed response carries nothing readable.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

#[derive(Debug, Error)]
pub enum AgentApiError {
    /// Connectivity failure (`status` is `None`) or a non-success HTTP status.
    #[error("{message}")]
    Transport {
        status: Option<StatusCode>,
        message: String,
    },

    /// The response body was unavailable, unreadable, or not the expected shape.
    #[error("failed to decode response: {reason}")]
    Decode { reason: String },

    /// The backend reported a failure in-band through the error sentinel.
    #[error("{message}")]
    Stream { message: String },

    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("invalid request header: {0}")]
    InvalidHeader(String),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

impl AgentApiError {
    #[must_use]
    pub fn transport(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }

    /// HTTP status for transport failures that got as far as a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AgentApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() || error.is_body() {
            return Self::decode(error.to_string());
        }
        Self::transport(error.status(), error.to_string())
    }
}

/// Pull a displayable message out of a failed response body.
///
/// The body is read in wire convention: a non-empty `message` string wins, then `detail`.
/// A `detail` list of validation entries is flattened by joining each entry's `msg`.
pub fn parse_error_message(body: &str) -> String {
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) else {
        return GENERIC_ERROR_MESSAGE.to_owned();
    };

    if let Some(message) = fields
        .get("message")
        .and_then(Value::as_str)
        .and_then(non_empty_string)
    {
        return message.to_owned();
    }

    match fields.get("detail") {
        Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
        Some(Value::Array(entries)) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                .filter_map(non_empty_string)
                .collect();
            if messages.is_empty() {
                GENERIC_ERROR_MESSAGE.to_owned()
            } else {
                messages.join("; ")
            }
        }
        _ => GENERIC_ERROR_MESSAGE.to_owned(),
    }
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
