//! Clap derive structures for the `cloudshell-gcp` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// cloudshell-gcp -- sandbox firewall rules for Google Cloud VPCs
#[derive(Debug, Parser)]
#[command(
    name = "cloudshell-gcp",
    version,
    about = "Provision and tear down CloudShell sandbox firewall rules on Google Cloud",
    long_about = "Creates the firewall rule set of a CloudShell sandbox VPC, opens\n\
        inbound ports for deployed VMs, and removes the rules at teardown.\n\n\
        Rule creation is idempotent: re-running a command only creates the\n\
        rules that are missing.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "CLOUDSHELL_GCP_PROFILE", global = true)]
    pub profile: Option<String>,

    /// GCP project ID (overrides profile)
    #[arg(long, env = "CLOUDSHELL_GCP_PROJECT", global = true)]
    pub project: Option<String>,

    /// OAuth2 access token (overrides profile)
    #[arg(long, env = "CLOUDSHELL_GCP_ACCESS_TOKEN", global = true, hide_env_values = true)]
    pub access_token: Option<String>,

    /// Compute API base URL (overrides profile)
    #[arg(long, env = "CLOUDSHELL_GCP_API_BASE", global = true)]
    pub api_base: Option<String>,

    /// Output format [default: `defaults.output` from config, else table]
    #[arg(long, short = 'o', env = "CLOUDSHELL_GCP_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CLOUDSHELL_GCP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl GlobalOpts {
    /// The selected output format, table when none was resolved.
    pub fn output_format(&self) -> OutputFormat {
        self.output.unwrap_or_default()
    }
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Rule names, one per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the firewall rule set of a sandbox VPC
    Prepare(PrepareArgs),

    /// Open inbound ports for a deployed VM
    Inbound(InboundArgs),

    /// Delete every firewall rule on a sandbox VPC
    Cleanup(CleanupArgs),

    /// List firewall rules on a network
    #[command(alias = "ls")]
    Rules(RulesArgs),

    /// Print the VPC name used for a reservation
    VpcName(VpcNameArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Args ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PrepareArgs {
    /// Sandbox VPC network name
    #[arg(long, short = 'n')]
    pub network: String,

    /// CIDR covering the whole sandbox
    #[arg(long)]
    pub sandbox_cidr: String,

    /// Subnet the sandbox may reach (repeatable)
    #[arg(long = "subnet")]
    pub subnets: Vec<String>,

    /// Private subnet closed to sandbox traffic (repeatable)
    #[arg(long = "private-subnet")]
    pub private_subnets: Vec<String>,

    /// Extra management CIDR allowed into the sandbox (repeatable, adds to the profile's list)
    #[arg(long = "mgmt-network")]
    pub mgmt_networks: Vec<String>,
}

#[derive(Debug, Args)]
pub struct InboundArgs {
    /// Sandbox VPC network name
    #[arg(long, short = 'n')]
    pub network: String,

    /// VM name, used in rule names
    #[arg(long)]
    pub vm: String,

    /// Network tag carried by the VM
    #[arg(long)]
    pub tag: String,

    /// Inbound ports, e.g. "22;80-81:udp;443:tcp:10.0.0.0/8;icmp"
    #[arg(long)]
    pub ports: String,
}

#[derive(Debug, Args)]
pub struct CleanupArgs {
    /// Sandbox VPC network name
    #[arg(long, short = 'n')]
    pub network: String,
}

#[derive(Debug, Args)]
pub struct RulesArgs {
    /// Network name
    #[arg(long, short = 'n')]
    pub network: String,
}

#[derive(Debug, Args)]
pub struct VpcNameArgs {
    /// Sandbox reservation ID
    pub reservation_id: String,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
