// cloudshell-gcp-core: Sandbox firewall provisioning on top of cloudshell-gcp-api.
//
// Priority allocation, idempotent rule creation, the sandbox rule-set
// builder and teardown. Everything talks to the cloud through `FirewallApi`.

pub mod cleanup;
pub mod cloud;
pub mod config;
pub mod convert;
pub mod driver;
pub mod error;
pub mod model;
pub mod naming;
pub mod priority;
pub mod rules;
pub mod sandbox;

#[cfg(test)]
mod fake;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cleanup::cleanup_network_rules;
pub use cloud::{CloudFirewalls, FirewallApi};
pub use config::{DriverConfig, TlsVerification};
pub use driver::SandboxDriver;
pub use error::CoreError;
pub use priority::{PriorityAllocator, PriorityBand, SENTINEL_PRIORITY, ScanOrder};
pub use rules::{EnsuredRule, RuleCreator, RuleOutcome, RulePriority};
pub use sandbox::{InboundRequest, PlannedRule, SandboxFirewall, SandboxRequest};

pub use cloudshell_gcp_api::Lookup;

pub use model::{
    Direction, FirewallRule, InboundPort, PortRange, Protocol, RuleAction, RuleSpec,
    ports::{parse_inbound_port, parse_inbound_ports},
};
