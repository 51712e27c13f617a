//! Profile resolution with CLI flag overrides.
//!
//! The config file and credential lookup live in `cloudshell_gcp_config`;
//! this module layers `--project`, `--access-token`, `--api-base` and
//! `--timeout` on top and produces the `DriverConfig` core consumes.

use clap::ValueEnum;
use secrecy::SecretString;

use cloudshell_gcp_config::{Config, Defaults, Profile};
use cloudshell_gcp_core::DriverConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// `--output` if given, otherwise `defaults.output` from the config.
pub fn output_format(global: &GlobalOpts, defaults: &Defaults) -> Result<OutputFormat, CliError> {
    match global.output {
        Some(format) => Ok(format),
        None => OutputFormat::from_str(&defaults.output, true).map_err(|reason| {
            CliError::Validation {
                field: "defaults.output".into(),
                reason,
            }
        }),
    }
}

/// Build a `DriverConfig` from the config file, profile, and CLI overrides.
pub fn build_driver_config(global: &GlobalOpts, cfg: &Config) -> Result<DriverConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    // If a profile exists, use it with CLI flag overrides
    if let Some(profile) = cfg.profiles.get(&profile_name) {
        let profile = apply_overrides(profile.clone(), global);
        let token = match &global.access_token {
            Some(token) => SecretString::from(token.clone()),
            None => cloudshell_gcp_config::resolve_access_token(&profile, &profile_name)?,
        };
        return Ok(cloudshell_gcp_config::profile_to_driver_config(
            &profile,
            &cfg.defaults,
            token,
        )?);
    }

    // An explicitly requested profile must exist
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            path: cloudshell_gcp_config::config_path().display().to_string(),
        });
    }

    // No profile found -- try to build from CLI flags / env vars alone
    if global.project.is_none() {
        return Err(CliError::NoConfig {
            path: cloudshell_gcp_config::config_path().display().to_string(),
        });
    }
    let token = global
        .access_token
        .as_ref()
        .map(|token| SecretString::from(token.clone()))
        .ok_or(CliError::NoCredentials {
            profile: profile_name,
        })?;

    let profile = apply_overrides(Profile::default(), global);
    Ok(cloudshell_gcp_config::profile_to_driver_config(
        &profile,
        &cfg.defaults,
        token,
    )?)
}

/// Flag > env > profile.
fn apply_overrides(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(project) = &global.project {
        profile.project_id.clone_from(project);
    }
    if let Some(api_base) = &global.api_base {
        profile.api_base = Some(api_base.clone());
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    profile
}
