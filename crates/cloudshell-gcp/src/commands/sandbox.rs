//! Sandbox lifecycle handlers: prepare and cleanup.

use tabled::Tabled;
use tokio_util::sync::CancellationToken;
use tracing::info;

use cloudshell_gcp_core::{DriverConfig, SandboxDriver, SandboxRequest};

use crate::cli::{CleanupArgs, GlobalOpts, PrepareArgs};
use crate::error::CliError;
use crate::output;

use super::rules::print_ensured;

pub async fn prepare(
    mut config: DriverConfig,
    args: PrepareArgs,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    // Flag-supplied management networks extend the profile's list
    config.additional_mgmt_networks.extend(args.mgmt_networks);
    let driver = SandboxDriver::new(&config)?;

    let request = SandboxRequest {
        network: args.network,
        sandbox_cidr: args.sandbox_cidr,
        prepare_subnets: args.subnets,
        private_subnets: args.private_subnets,
    };
    let rules = driver.prepare_sandbox(request, cancel).await?;
    print_ensured(&rules, global)
}

pub async fn cleanup(
    config: &DriverConfig,
    args: CleanupArgs,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let driver = SandboxDriver::new(config)?;
    let deleted = driver.cleanup_sandbox(&args.network, cancel).await?;
    info!(network = %args.network, deleted = deleted.len(), "sandbox rules removed");

    let out = output::render_list(
        &global.output_format(),
        &deleted,
        |name| DeletedRow { name: name.clone() },
        String::clone,
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[derive(Tabled)]
struct DeletedRow {
    #[tabled(rename = "Deleted")]
    name: String,
}
