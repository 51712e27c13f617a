use thiserror::Error;

/// Top-level error type for the `cloudshell-gcp-api` crate.
///
/// Covers authentication, transport, Compute API error envelopes and
/// operations that finished with an error. `cloudshell-gcp-core` maps these
/// into its own domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token rejected or malformed.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Operation did not reach `DONE` in time.
    #[error("Timed out after {timeout_secs}s waiting for {what}")]
    Timeout { what: String, timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Compute API ─────────────────────────────────────────────────
    /// Structured error from the `{"error": {...}}` envelope.
    #[error("Compute API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        /// First `errors[].reason`, e.g. `notFound`, `alreadyExists`.
        reason: Option<String>,
    },

    /// Long-running operation completed with `error` populated.
    #[error("Operation {operation} failed: {message}")]
    Operation {
        operation: String,
        code: Option<String>,
        message: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            Self::Api { reason, .. } => reason.as_deref() == Some("notFound"),
            _ => false,
        }
    }
}
