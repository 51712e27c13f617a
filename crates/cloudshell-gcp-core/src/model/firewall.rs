// ── Firewall domain types ──

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::ports::PortRange;
use crate::naming;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Direction {
    Ingress,
    Egress,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum RuleAction {
    Allow,
    Deny,
}

/// IP protocol of a rule. `Other` keeps whatever the API returned for rules
/// this driver did not create (`esp`, `sctp`, protocol numbers, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    All,
    Other(String),
}

/// Named protocols the Compute API accepts besides tcp/udp/icmp/all.
const EXTRA_PROTOCOLS: &[&str] = &["esp", "ah", "sctp", "ipip"];

impl Protocol {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp => "icmp",
            Self::All => "all",
            Self::Other(raw) => raw,
        }
    }

    /// Port lists are only meaningful for tcp, udp and sctp.
    pub fn accepts_ports(&self) -> bool {
        match self {
            Self::Tcp | Self::Udp => true,
            Self::Other(raw) => raw == "sctp",
            Self::Icmp | Self::All => false,
        }
    }

    fn is_supported(&self) -> bool {
        match self {
            Self::Other(raw) => {
                EXTRA_PROTOCOLS.contains(&raw.as_str()) || raw.parse::<u8>().is_ok()
            }
            _ => true,
        }
    }
}

impl From<&str> for Protocol {
    fn from(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "tcp" => Self::Tcp,
            "udp" => Self::Udp,
            "icmp" => Self::Icmp,
            "all" => Self::All,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for Protocol {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<Protocol> for String {
    fn from(protocol: Protocol) -> Self {
        protocol.as_str().to_owned()
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A firewall rule as it exists (or will exist) on a VPC network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub name: String,
    /// Network name (not the full resource URL).
    pub network: String,
    pub direction: Direction,
    pub action: RuleAction,
    /// Lower number wins. 0–65535.
    pub priority: u16,
    pub protocol: Protocol,
    pub ports: Vec<String>,
    pub source_ranges: Vec<String>,
    pub destination_ranges: Vec<String>,
    pub target_tags: Vec<String>,
    pub description: Option<String>,
}

/// Everything needed to create a rule except its priority, which is
/// resolved only when the rule turns out to be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub network: String,
    pub direction: Direction,
    pub action: RuleAction,
    pub protocol: Protocol,
    pub ports: Vec<String>,
    pub source_ranges: Vec<String>,
    pub destination_ranges: Vec<String>,
    pub target_tags: Vec<String>,
    pub description: Option<String>,
}

impl RuleSpec {
    fn new(name: impl Into<String>, network: impl Into<String>, direction: Direction) -> Self {
        Self {
            name: name.into(),
            network: network.into(),
            direction,
            action: RuleAction::Allow,
            protocol: Protocol::All,
            ports: Vec::new(),
            source_ranges: Vec::new(),
            destination_ranges: Vec::new(),
            target_tags: Vec::new(),
            description: None,
        }
    }

    /// Ingress rule that allows all protocols until told otherwise.
    pub fn ingress(name: impl Into<String>, network: impl Into<String>) -> Self {
        Self::new(name, network, Direction::Ingress)
    }

    /// Egress rule that allows all protocols until told otherwise.
    pub fn egress(name: impl Into<String>, network: impl Into<String>) -> Self {
        Self::new(name, network, Direction::Egress)
    }

    pub fn allow(mut self, protocol: Protocol) -> Self {
        self.action = RuleAction::Allow;
        self.protocol = protocol;
        self
    }

    pub fn deny(mut self, protocol: Protocol) -> Self {
        self.action = RuleAction::Deny;
        self.protocol = protocol;
        self
    }

    pub fn ports<I, S>(mut self, ports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ports = ports.into_iter().map(Into::into).collect();
        self
    }

    pub fn from_ranges<I, S>(mut self, ranges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source_ranges = ranges.into_iter().map(Into::into).collect();
        self
    }

    pub fn to_ranges<I, S>(mut self, ranges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.destination_ranges = ranges.into_iter().map(Into::into).collect();
        self
    }

    pub fn target_tag(mut self, tag: impl Into<String>) -> Self {
        self.target_tags.push(tag.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Reject malformed input before any API call is made.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !naming::is_valid_resource_name(&self.name) {
            return Err(invalid(format!(
                "rule name '{}' must be 1-63 chars of lowercase letters, digits or '-', \
                 start with a letter and not end with '-'",
                self.name
            )));
        }
        if self.network.is_empty() {
            return Err(invalid(format!("rule '{}' has no network", self.name)));
        }
        if !self.protocol.is_supported() {
            return Err(invalid(format!("unsupported protocol '{}'", self.protocol)));
        }
        if !self.ports.is_empty() && !self.protocol.accepts_ports() {
            return Err(invalid(format!(
                "ports are not allowed with protocol '{}'",
                self.protocol
            )));
        }
        for port in &self.ports {
            port.parse::<PortRange>()?;
        }
        for cidr in self.source_ranges.iter().chain(&self.destination_ranges) {
            parse_cidr(cidr)?;
        }
        for tag in &self.target_tags {
            if !naming::is_valid_resource_name(tag) {
                return Err(invalid(format!("invalid network tag '{tag}'")));
            }
        }

        match self.direction {
            Direction::Ingress if self.source_ranges.is_empty() => Err(invalid(format!(
                "ingress rule '{}' needs at least one source range",
                self.name
            ))),
            Direction::Egress if self.destination_ranges.is_empty() => Err(invalid(format!(
                "egress rule '{}' needs at least one destination range",
                self.name
            ))),
            _ => Ok(()),
        }
    }

    pub fn into_rule(self, priority: u16) -> FirewallRule {
        FirewallRule {
            name: self.name,
            network: self.network,
            direction: self.direction,
            action: self.action,
            priority,
            protocol: self.protocol,
            ports: self.ports,
            source_ranges: self.source_ranges,
            destination_ranges: self.destination_ranges,
            target_tags: self.target_tags,
            description: self.description,
        }
    }
}

fn invalid(message: String) -> CoreError {
    CoreError::InvalidRuleSpec { message }
}

/// Parse `address/prefix`, IPv4 or IPv6.
pub fn parse_cidr(cidr: &str) -> Result<(IpAddr, u8), CoreError> {
    let (host, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| invalid(format!("invalid CIDR '{cidr}': missing prefix length")))?;
    let host_ip = host
        .parse::<IpAddr>()
        .map_err(|_| invalid(format!("invalid address '{host}' in CIDR '{cidr}'")))?;
    let prefix_len = prefix
        .parse::<u8>()
        .map_err(|_| invalid(format!("invalid prefix length '{prefix}' in CIDR '{cidr}'")))?;
    let max = if host_ip.is_ipv4() { 32 } else { 128 };
    if prefix_len > max {
        return Err(invalid(format!(
            "prefix length must be <= {max}, got {prefix_len} in '{cidr}'"
        )));
    }
    Ok((host_ip, prefix_len))
}
