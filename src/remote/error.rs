//! Remote store error types.

use thiserror::Error;

/// PostgREST error code for a missing relation (schema not provisioned).
const UNDEFINED_TABLE: &str = "42P01";

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The backing tables have not been created. Distinguished for operator
    /// diagnostics, not control flow.
    #[error("remote schema not provisioned; run the setup SQL against the database")]
    SchemaMissing,

    #[error("remote API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode remote row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("remote configuration error: {0}")]
    Config(String),
}

impl RemoteError {
    pub fn is_schema_missing(&self) -> bool {
        matches!(self, RemoteError::SchemaMissing)
    }
}

/// Map a non-success response body to an error, extracting the PostgREST
/// `{code, message}` payload when present.
pub(crate) fn classify(status: u16, body: &str) -> RemoteError {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if json.get("code").and_then(|c| c.as_str()) == Some(UNDEFINED_TABLE) {
            return RemoteError::SchemaMissing;
        }
        if let Some(message) = json.get("message").and_then(|m| m.as_str()) {
            return RemoteError::Api {
                status,
                message: message.to_string(),
            };
        }
    }
    RemoteError::Api {
        status,
        message: body.to_string(),
    }
}
