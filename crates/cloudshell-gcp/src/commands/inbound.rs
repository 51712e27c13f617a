//! Inbound port handler.

use tokio_util::sync::CancellationToken;

use cloudshell_gcp_core::{DriverConfig, InboundRequest, SandboxDriver, parse_inbound_ports};

use crate::cli::{GlobalOpts, InboundArgs};
use crate::error::CliError;

use super::rules::print_ensured;

pub async fn handle(
    config: &DriverConfig,
    args: InboundArgs,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    // Parse before connecting so a typo never touches the project
    let ports = parse_inbound_ports(&args.ports).map_err(|e| CliError::Validation {
        field: "ports".into(),
        reason: e.to_string(),
    })?;
    if ports.is_empty() {
        return Err(CliError::Validation {
            field: "ports".into(),
            reason: "no port entries given".into(),
        });
    }

    let driver = SandboxDriver::new(config)?;
    let request = InboundRequest {
        network: args.network,
        vm_name: args.vm,
        network_tag: args.tag,
        ports,
    };
    let rules = driver.add_inbound_rules(&request, cancel).await?;
    print_ensured(&rules, global)
}
