//! Error types for hierarchy synchronization
//!
//! Provides the taxonomy surfaced to the dashboard:
//! - Transport failures (no response at all)
//! - Auth failures (401/403, never retried)
//! - Validation failures (422 with per-field messages, never retried)
//! - Server failures (5xx, retried with backoff)

use hierarchy_tree::{BuildError, EdgeValidationError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Fixed message shown when the backend could not be reached
pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to reach the server. Please check your connection and try again.";

/// Errors reported by a [`HierarchyApi`](crate::HierarchyApi) implementation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// No response received
    #[error("transport error: {message}")]
    Transport {
        /// Underlying client error
        message: String,
    },

    /// Authentication or authorization failed
    #[error("not authorized (HTTP {status})")]
    Auth {
        /// 401 or 403
        status: u16,
    },

    /// Request rejected with field errors
    #[error("validation failed: {message}")]
    Validation {
        /// Summary from the response body
        message: String,
        /// Messages per request field
        fields: BTreeMap<String, Vec<String>>,
    },

    /// Backend failed
    #[error("server error (HTTP {status}): {message}")]
    Server {
        /// 5xx status
        status: u16,
        /// Message from the response body, possibly empty
        message: String,
    },

    /// Any other non-success status
    #[error("request failed (HTTP {status}): {message}")]
    Status {
        /// HTTP status
        status: u16,
        /// Message from the response body, possibly empty
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Create transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP response
    ///
    /// Reads `message` and, for 422, the `errors` object of field → messages
    /// from a JSON body.
    #[must_use]
    pub fn from_status(status: u16, body: &Value) -> Self {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match status {
            401 | 403 => Self::Auth { status },
            422 => Self::Validation {
                message,
                fields: field_errors(body),
            },
            500..=599 => Self::Server { status, message },
            _ => Self::Status { status, message },
        }
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    /// Whether the caller should send the user back to login
    #[inline]
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }

    /// Message suitable for an inline alert
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { .. } => NETWORK_ERROR_MESSAGE.to_string(),
            Self::Auth { .. } => "Your session has expired. Please sign in again.".to_string(),
            Self::Validation { message, .. } if !message.is_empty() => message.clone(),
            Self::Validation { .. } => "The submitted data is invalid.".to_string(),
            Self::Server { .. } => "The server encountered an error. Please try again later.".to_string(),
            Self::Status { message, .. } if !message.is_empty() => message.clone(),
            Self::Status { status, .. } => format!("Request failed with status {status}."),
            Self::Decode(_) => "The server sent an unexpected response.".to_string(),
        }
    }

    /// Per-field messages of a validation failure
    #[must_use]
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            Self::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

fn field_errors(body: &Value) -> BTreeMap<String, Vec<String>> {
    body.get("errors")
        .and_then(Value::as_object)
        .map(|errors| {
            errors
                .iter()
                .map(|(field, messages)| {
                    let messages = match messages {
                        Value::Array(items) => items
                            .iter()
                            .filter_map(Value::as_str)
                            .map(str::to_string)
                            .collect(),
                        Value::String(single) => vec![single.clone()],
                        _ => Vec::new(),
                    };
                    (field.clone(), messages)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Errors from the sync orchestrator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Backend call failed
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Tree response could not be ingested
    #[error("malformed tree: {0}")]
    Build(#[from] BuildError),

    /// Create request refused before it was sent
    #[error("rejected before sending: {0}")]
    Rejected(#[from] EdgeValidationError),
}

impl SyncError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Api(err) if err.is_retryable())
    }

    /// Whether the caller should send the user back to login
    #[inline]
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(self, Self::Api(err) if err.requires_login())
    }
}

/// Errors while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during file read
    #[error("io error reading {}: {source}", path.display())]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// TOML could not be parsed
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type alias for sync operations
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn classifies_statuses() {
        assert!(ApiError::from_status(401, &json!({})).requires_login());
        assert!(ApiError::from_status(403, &json!({})).requires_login());
        assert!(ApiError::from_status(503, &json!({})).is_retryable());
        assert!(!ApiError::from_status(404, &json!({})).is_retryable());
        assert!(!ApiError::transport("reset").is_retryable());
    }

    #[test]
    fn validation_carries_field_messages() {
        let body = json!({
            "message": "The given data was invalid.",
            "errors": {
                "lower_role_id": ["The lower role id field is required."],
                "store_id": "Unknown store."
            }
        });

        let err = ApiError::from_status(422, &body);

        let fields = err.field_errors().unwrap();
        assert_eq!(fields["lower_role_id"], vec!["The lower role id field is required."]);
        assert_eq!(fields["store_id"], vec!["Unknown store."]);
        assert_eq!(err.user_message(), "The given data was invalid.");
    }

    #[test]
    fn transport_has_fixed_user_message() {
        let err = ApiError::transport("connection refused");
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
        assert_eq!(err.to_string(), "transport error: connection refused");
    }

    #[test]
    fn sync_error_conversions() {
        let err: SyncError = ApiError::Server {
            status: 502,
            message: String::new(),
        }
        .into();
        assert!(err.is_retryable());
        assert!(!err.requires_login());

        let rejected: SyncError = EdgeValidationError::SelfReference {
            role_id: hierarchy_model::RoleId(1),
        }
        .into();
        assert!(matches!(rejected, SyncError::Rejected(_)));
    }
}
