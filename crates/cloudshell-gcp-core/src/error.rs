// ── Core error types ──
//
// Errors surfaced by rule allocation, creation and cleanup. Consumers never
// match on HTTP status codes directly; the `From<cloudshell_gcp_api::Error>`
// impl translates transport-layer failures into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach Compute API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Timed out after {timeout_secs}s waiting for {what}")]
    Timeout { what: String, timeout_secs: u64 },

    #[error("Request to {url} timed out")]
    RequestTimeout { url: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Entity not found: {entity_type} '{identifier}'")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Allocation & validation ──────────────────────────────────────
    #[error("Priority band '{band}' exhausted: no free priority between {start} and {limit}")]
    PriorityBandExhausted { band: String, start: u16, limit: u16 },

    #[error("Invalid firewall rule: {message}")]
    InvalidRuleSpec { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Cloud operation {operation} failed{}: {message}", code_suffix(.code.as_deref()))]
    CloudOperation {
        operation: String,
        code: Option<String>,
        message: String,
    },

    #[error("Cancelled after {completed} rule(s)")]
    Cancelled { completed: usize },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Compute error reason, e.g. `alreadyExists`, `quotaExceeded`.
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

fn code_suffix(code: Option<&str>) -> String {
    code.map(|c| format!(" ({c})")).unwrap_or_default()
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<cloudshell_gcp_api::Error> for CoreError {
    fn from(err: cloudshell_gcp_api::Error) -> Self {
        use cloudshell_gcp_api::Error as ApiError;

        if err.is_not_found() {
            let identifier = match &err {
                ApiError::Transport(e) => e.url().map(|u| u.path().to_owned()).unwrap_or_default(),
                other => other.to_string(),
            };
            return CoreError::NotFound {
                entity_type: "resource".into(),
                identifier,
            };
        }

        match err {
            ApiError::Authentication { message } => CoreError::AuthenticationFailed { message },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::RequestTimeout {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                    }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { what, timeout_secs } => CoreError::Timeout { what, timeout_secs },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Api {
                status,
                message,
                reason,
            } => CoreError::Api {
                message,
                code: reason,
                status: Some(status),
            },
            ApiError::Operation {
                operation,
                code,
                message,
            } => CoreError::CloudOperation {
                operation,
                code,
                message,
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudshell_gcp_api::Error as ApiError;

    #[test]
    fn not_found_api_error_maps_to_not_found() {
        let err: CoreError = ApiError::Api {
            status: 404,
            message: "The resource 'x' was not found".into(),
            reason: Some("notFound".into()),
        }
        .into();
        assert!(err.is_not_found());
    }

    #[test]
    fn operation_error_keeps_provider_code() {
        let err: CoreError = ApiError::Operation {
            operation: "op-1".into(),
            code: Some("QUOTA_EXCEEDED".into()),
            message: "Quota 'FIREWALLS' exceeded".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Cloud operation op-1 failed (QUOTA_EXCEEDED): Quota 'FIREWALLS' exceeded"
        );
    }

    #[test]
    fn conflict_keeps_reason_as_code() {
        let err: CoreError = ApiError::Api {
            status: 409,
            message: "already exists".into(),
            reason: Some("alreadyExists".into()),
        }
        .into();
        match err {
            CoreError::Api { code, status, .. } => {
                assert_eq!(code.as_deref(), Some("alreadyExists"));
                assert_eq!(status, Some(409));
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }
}
