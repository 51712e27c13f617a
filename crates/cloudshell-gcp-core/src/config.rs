// ── Runtime driver configuration ──
//
// Describes which project to act on and how to reach the Compute API.
// Carries credential data but never touches disk; the CLI builds a
// `DriverConfig` from its config file and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file (corporate proxies).
    CustomCa(PathBuf),
}

#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// GCP project that owns the sandbox networks.
    pub project_id: String,
    /// OAuth2 access token with the compute scope.
    pub access_token: SecretString,
    /// Override for the Compute endpoint (emulators, tests).
    pub api_base: Option<Url>,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Upper bound for waiting on a single insert/delete operation.
    pub operation_timeout: Duration,
    /// CIDRs allowed into every sandbox.
    pub additional_mgmt_networks: Vec<String>,
}

impl DriverConfig {
    pub fn new(project_id: impl Into<String>, access_token: SecretString) -> Self {
        Self {
            project_id: project_id.into(),
            access_token,
            api_base: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            operation_timeout: Duration::from_secs(300),
            additional_mgmt_networks: Vec::new(),
        }
    }
}
