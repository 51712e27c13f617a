mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Cancel `token` on the first Ctrl-C. Rules already created stay in place.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping after the current rule");
            token.cancel();
        }
    });
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "cloudshell-gcp", &mut std::io::stdout());
            Ok(())
        }

        // Pure naming, no project needed
        Command::VpcName(args) => {
            let name = cloudshell_gcp_core::naming::vpc_name(&args.reservation_id);
            output::print_output(&name, cli.global.quiet);
            Ok(())
        }

        // All other commands talk to the Compute API
        cmd => {
            let cfg = cloudshell_gcp_config::load_config()?;
            let mut global = cli.global;
            global.output = Some(config::output_format(&global, &cfg.defaults)?);
            let driver_config = config::build_driver_config(&global, &cfg)?;
            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, driver_config, &global, &cancel).await
        }
    }
}
