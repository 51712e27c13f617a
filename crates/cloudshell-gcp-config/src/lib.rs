//! Shared configuration for the cloudshell-gcp tools.
//!
//! TOML profiles, access-token resolution (env + keyring + plaintext),
//! and translation to `cloudshell_gcp_core::DriverConfig`. The CLI layers
//! its own flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cloudshell_gcp_core::{DriverConfig, TlsVerification};

/// Keyring service name; entries are keyed `{profile}/access-token`.
pub const KEYRING_SERVICE: &str = "cloudshell-gcp";

/// Environment prefix. Nested keys use `__`, e.g.
/// `CLOUDSHELL_GCP_PROFILES__LAB__PROJECT_ID`.
pub const ENV_PREFIX: &str = "CLOUDSHELL_GCP_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no access token configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Operation wait bound in seconds.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
            operation_timeout: default_operation_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_operation_timeout() -> u64 {
    300
}

/// A named project profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    pub project_id: String,

    /// Access token (plaintext; prefer keyring or env var).
    pub access_token: Option<String>,

    /// Environment variable holding the access token.
    pub access_token_env: Option<String>,

    /// Compute endpoint override.
    pub api_base: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    pub timeout: Option<u64>,

    pub operation_timeout: Option<u64>,

    /// CIDRs allowed into every sandbox.
    #[serde(default)]
    pub additional_mgmt_networks: Vec<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "quali", "cloudshell-gcp").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("cloudshell-gcp");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` (missing files are fine) merged with the environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

impl Config {
    /// Look up `name`, falling back to `default_profile`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the access token: profile env var, then keyring, then plaintext.
pub fn resolve_access_token(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    if let Some(token) = profile
        .access_token_env
        .as_deref()
        .and_then(|env_name| std::env::var(env_name).ok())
    {
        return Ok(SecretString::from(token));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/access-token"))
    {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    if let Some(token) = &profile.access_token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build a `DriverConfig` from a profile with an already-resolved token.
pub fn profile_to_driver_config(
    profile: &Profile,
    defaults: &Defaults,
    access_token: SecretString,
) -> Result<DriverConfig, ConfigError> {
    if profile.project_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "project_id".into(),
            reason: "must not be empty".into(),
        });
    }

    let api_base = profile
        .api_base
        .as_deref()
        .map(|raw| {
            raw.parse::<url::Url>().map_err(|_| ConfigError::Validation {
                field: "api_base".into(),
                reason: format!("invalid URL: {raw}"),
            })
        })
        .transpose()?;

    let mut config = DriverConfig::new(profile.project_id.clone(), access_token);
    config.api_base = api_base;
    if let Some(ca) = &profile.ca_cert {
        config.tls = TlsVerification::CustomCa(ca.clone());
    }
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.operation_timeout = Duration::from_secs(
        profile
            .operation_timeout
            .unwrap_or(defaults.operation_timeout),
    );
    config
        .additional_mgmt_networks
        .clone_from(&profile.additional_mgmt_networks);
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_profiles_from_toml() {
        let file = write_config(
            r#"
            default_profile = "lab"

            [defaults]
            operation_timeout = 120

            [profiles.lab]
            project_id = "sandbox-lab"
            access_token = "ya29.plain"
            additional_mgmt_networks = ["192.168.0.0/24"]
            "#,
        );

        let config = load_config_from(file.path()).unwrap();
        let (name, profile) = config.profile(None).unwrap();
        assert_eq!(name, "lab");
        assert_eq!(profile.project_id, "sandbox-lab");
        assert_eq!(config.defaults.operation_timeout, 120);
        assert_eq!(config.defaults.timeout, 30);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.default_profile.as_deref(), Some("default"));
        assert!(matches!(
            config.profile(None),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn plaintext_token_is_last_resort() {
        let profile = Profile {
            project_id: "p".into(),
            access_token: Some("ya29.plain".into()),
            ..Profile::default()
        };
        // Profile name unlikely to exist in any keyring.
        let token = resolve_access_token(&profile, "cloudshell-gcp-test-none").unwrap();
        assert_eq!(token.expose_secret(), "ya29.plain");
    }

    #[test]
    fn no_token_is_an_error() {
        let profile = Profile {
            project_id: "p".into(),
            access_token_env: Some("CLOUDSHELL_GCP_TEST_UNSET_TOKEN_VAR".into()),
            ..Profile::default()
        };
        assert!(matches!(
            resolve_access_token(&profile, "cloudshell-gcp-test-none"),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn profile_maps_to_driver_config() {
        let profile = Profile {
            project_id: "sandbox-lab".into(),
            api_base: Some("http://127.0.0.1:8080".into()),
            ca_cert: Some(PathBuf::from("/etc/ssl/corp.pem")),
            timeout: Some(10),
            additional_mgmt_networks: vec!["192.168.0.0/24".into()],
            ..Profile::default()
        };

        let config = profile_to_driver_config(
            &profile,
            &Defaults::default(),
            SecretString::from("t".to_owned()),
        )
        .unwrap();

        assert_eq!(config.project_id, "sandbox-lab");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.operation_timeout, Duration::from_secs(300));
        assert_eq!(
            config.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/ssl/corp.pem"))
        );
        assert_eq!(config.additional_mgmt_networks, ["192.168.0.0/24"]);
        assert!(config.api_base.is_some());
    }

    #[test]
    fn invalid_api_base_is_rejected() {
        let profile = Profile {
            project_id: "p".into(),
            api_base: Some("not a url".into()),
            ..Profile::default()
        };
        let err = profile_to_driver_config(
            &profile,
            &Defaults::default(),
            SecretString::from("t".to_owned()),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }
}
