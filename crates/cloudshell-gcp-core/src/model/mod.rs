// ── Domain model ──
//
// Canonical firewall types used by the allocator, the rule creator and the
// sandbox rule-set builder. API wire types live in `cloudshell-gcp-api`;
// `crate::convert` bridges the two.

pub mod firewall;
pub mod ports;

pub use firewall::{Direction, FirewallRule, Protocol, RuleAction, RuleSpec};
pub use ports::{InboundPort, PortRange};
