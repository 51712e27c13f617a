//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use cloudshell_gcp_config::ConfigError;
use cloudshell_gcp_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the Compute API at {url}")]
    #[diagnostic(
        code(cloudshell_gcp::connection_failed),
        help("Check network access to the endpoint, or set api_base in your profile.")
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(cloudshell_gcp::auth_failed),
        help(
            "The access token was rejected or has expired.\n\
             Refresh it with: gcloud auth print-access-token"
        )
    )]
    AuthFailed { message: String },

    #[error("No access token configured for profile '{profile}'")]
    #[diagnostic(
        code(cloudshell_gcp::no_credentials),
        help(
            "Pass --access-token, set CLOUDSHELL_GCP_ACCESS_TOKEN, or set\n\
             access_token_env in the profile."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(cloudshell_gcp::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("{message}")]
    #[diagnostic(
        code(cloudshell_gcp::conflict),
        help("Another caller created the same rule concurrently. Re-run the command.")
    )]
    Conflict { message: String },

    // ── Cloud ────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(cloudshell_gcp::api_error))]
    ApiError { code: String, message: String },

    #[error("Operation {operation} failed ({code}): {message}")]
    #[diagnostic(
        code(cloudshell_gcp::operation_failed),
        help("Rules created before the failure are left in place; re-run to continue.")
    )]
    OperationFailed {
        operation: String,
        code: String,
        message: String,
    },

    #[error("Priority band '{band}' has no free slot between {start} and {limit}")]
    #[diagnostic(
        code(cloudshell_gcp::band_exhausted),
        help("Remove stale rules from the network with: cloudshell-gcp rules --network <name>")
    )]
    BandExhausted { band: String, start: u16, limit: u16 },

    #[error("Cancelled after {completed} rule(s)")]
    #[diagnostic(code(cloudshell_gcp::cancelled))]
    Cancelled { completed: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(cloudshell_gcp::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(cloudshell_gcp::profile_not_found),
        help("Add [profiles.{name}] to {path}, or pass --project and --access-token.")
    )]
    ProfileNotFound { name: String, path: String },

    #[error("No project configured")]
    #[diagnostic(
        code(cloudshell_gcp::no_config),
        help(
            "Pass --project and --access-token, or create a profile in:\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(cloudshell_gcp::config))]
    Config(Box<figment::Error>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Timed out after {seconds}s waiting for {what}")]
    #[diagnostic(
        code(cloudshell_gcp::timeout),
        help("Increase operation_timeout in the profile.")
    )]
    Timeout { what: String, seconds: u64 },

    #[error("Request to {url} timed out")]
    #[diagnostic(
        code(cloudshell_gcp::request_timeout),
        help("Raise the per-request limit with --timeout or timeout in the profile.")
    )]
    RequestTimeout { url: String },

    #[error("Internal error: {0}")]
    #[diagnostic(code(cloudshell_gcp::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } | Self::RequestTimeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NoConfig { .. } => exit_code::USAGE,
            Self::Cancelled { .. } => exit_code::CANCELLED,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                path: cloudshell_gcp_config::config_path().display().to_string(),
            },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Figment(err) => CliError::Config(err),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::Timeout { what, timeout_secs } => CliError::Timeout {
                what,
                seconds: timeout_secs,
            },
            CoreError::RequestTimeout { url } => CliError::RequestTimeout { url },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                resource_type: entity_type,
                identifier,
            },
            CoreError::PriorityBandExhausted { band, start, limit } => {
                CliError::BandExhausted { band, start, limit }
            }
            CoreError::InvalidRuleSpec { message } => CliError::Validation {
                field: "rule".into(),
                reason: message,
            },
            CoreError::CloudOperation {
                operation,
                code,
                message,
            } => CliError::OperationFailed {
                operation,
                code: code.unwrap_or_else(|| "unknown".into()),
                message,
            },
            CoreError::Cancelled { completed } => CliError::Cancelled { completed },
            CoreError::Api {
                message,
                code,
                status,
            } => {
                if status == Some(409) || code.as_deref() == Some("alreadyExists") {
                    CliError::Conflict { message }
                } else {
                    CliError::ApiError {
                        code: code
                            .or_else(|| status.map(|s| s.to_string()))
                            .unwrap_or_default(),
                        message,
                    }
                }
            }
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
