//! Command dispatch: bridges CLI args -> core driver calls -> output formatting.

pub mod inbound;
pub mod rules;
pub mod sandbox;

use tokio_util::sync::CancellationToken;

use cloudshell_gcp_core::DriverConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a project-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    config: DriverConfig,
    global: &GlobalOpts,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    match cmd {
        Command::Prepare(args) => sandbox::prepare(config, args, global, cancel).await,
        Command::Cleanup(args) => sandbox::cleanup(&config, args, global, cancel).await,
        Command::Inbound(args) => inbound::handle(&config, args, global, cancel).await,
        Command::Rules(args) => rules::handle(&config, args, global).await,
        // VpcName and Completions are handled before dispatch
        Command::VpcName(_) | Command::Completions(_) => unreachable!(),
    }
}
