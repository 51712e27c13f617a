// ── Inbound port specifications ──
//
// Deploy-time "Inbound Ports" attribute: `;`-separated entries of the form
// `from[-to][:protocol][:source]` or `icmp[:source]`.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::firewall::{Protocol, parse_cidr};

/// Source range used when an entry names none.
pub const DEFAULT_SOURCE: &str = "0.0.0.0/0";

/// Inclusive port range. A single port has `from == to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRange {
    pub from: u16,
    pub to: u16,
}

impl PortRange {
    pub fn single(port: u16) -> Self {
        Self { from: port, to: port }
    }
}

impl FromStr for PortRange {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_port = |raw: &str| {
            raw.parse::<u16>()
                .ok()
                .filter(|port| *port > 0)
                .ok_or_else(|| invalid(format!("invalid port '{raw}' in '{s}' (expected 1-65535)")))
        };

        let range = match s.split_once('-') {
            Some((from, to)) => Self {
                from: parse_port(from)?,
                to: parse_port(to)?,
            },
            None => Self::single(parse_port(s)?),
        };

        if range.from > range.to {
            return Err(invalid(format!("port range '{s}' is reversed")));
        }
        Ok(range)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{}-{}", self.from, self.to)
        }
    }
}

/// One parsed inbound-port entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundPort {
    /// `None` for protocols without ports (`icmp`, `all`).
    pub ports: Option<PortRange>,
    pub protocol: Protocol,
    /// Source CIDR; bare addresses are widened to a host route.
    pub source: String,
}

impl InboundPort {
    /// Port list in the form the firewall API expects.
    pub fn api_ports(&self) -> Vec<String> {
        self.ports.iter().map(ToString::to_string).collect()
    }
}

impl FromStr for InboundPort {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_inbound_port(s)
    }
}

/// Parse a single entry, e.g. `22`, `80-81:udp`, `443:tcp:10.0.0.0/8`, `icmp`.
pub fn parse_inbound_port(entry: &str) -> Result<InboundPort, CoreError> {
    let entry = entry.trim();
    if entry.is_empty() {
        return Err(invalid("empty inbound port entry".into()));
    }

    let (head, rest) = match entry.split_once(':') {
        Some((head, rest)) => (head, Some(rest)),
        None => (entry, None),
    };

    if head.eq_ignore_ascii_case("icmp") {
        return Ok(InboundPort {
            ports: None,
            protocol: Protocol::Icmp,
            source: parse_source(rest)?,
        });
    }

    let ports: PortRange = head
        .parse()
        .map_err(|_| invalid(format!("'{entry}' is not a valid inbound ports rule")))?;

    // The next segment is a protocol only if it names one; otherwise it is
    // the start of the source (IPv6 sources contain ':').
    let (protocol, source) = match rest {
        None => (Protocol::Tcp, None),
        Some(rest) => {
            let (candidate, tail) = match rest.split_once(':') {
                Some((candidate, tail)) => (candidate, Some(tail)),
                None => (rest, None),
            };
            match Protocol::from(candidate) {
                Protocol::Other(_) => (Protocol::Tcp, Some(rest)),
                protocol => (protocol, tail),
            }
        }
    };

    if !protocol.accepts_ports() {
        return Err(invalid(format!(
            "'{entry}': protocol '{protocol}' does not take ports"
        )));
    }

    Ok(InboundPort {
        ports: Some(ports),
        protocol,
        source: parse_source(source)?,
    })
}

/// Parse the whole `;`-separated attribute. Blank entries are ignored.
pub fn parse_inbound_ports(attribute: &str) -> Result<Vec<InboundPort>, CoreError> {
    attribute
        .split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(parse_inbound_port)
        .collect()
}

fn parse_source(raw: Option<&str>) -> Result<String, CoreError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(DEFAULT_SOURCE.to_owned());
    };

    if raw.contains('/') {
        parse_cidr(raw)?;
        return Ok(raw.to_owned());
    }

    match raw.parse::<IpAddr>() {
        Ok(IpAddr::V4(addr)) => Ok(format!("{addr}/32")),
        Ok(IpAddr::V6(addr)) => Ok(format!("{addr}/128")),
        Err(_) => Err(invalid(format!("invalid source address '{raw}'"))),
    }
}

fn invalid(message: String) -> CoreError {
    CoreError::InvalidRuleSpec { message }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn single_port_defaults() {
        let port = parse_inbound_port("22").unwrap();
        assert_eq!(port.ports, Some(PortRange::single(22)));
        assert_eq!(port.protocol, Protocol::Tcp);
        assert_eq!(port.source, DEFAULT_SOURCE);
        assert_eq!(port.api_ports(), ["22"]);
    }

    #[test]
    fn range_protocol_and_source() {
        let port = parse_inbound_port("8000-8080:UDP:10.0.0.0/8").unwrap();
        assert_eq!(port.ports, Some(PortRange { from: 8000, to: 8080 }));
        assert_eq!(port.protocol, Protocol::Udp);
        assert_eq!(port.source, "10.0.0.0/8");
        assert_eq!(port.api_ports(), ["8000-8080"]);
    }

    #[test]
    fn source_without_protocol() {
        let port = parse_inbound_port("443:192.168.5.0/24").unwrap();
        assert_eq!(port.protocol, Protocol::Tcp);
        assert_eq!(port.source, "192.168.5.0/24");
    }

    #[test]
    fn bare_address_becomes_host_route() {
        assert_eq!(parse_inbound_port("22:tcp:1.2.3.4").unwrap().source, "1.2.3.4/32");
        assert_eq!(parse_inbound_port("22:fd00::1").unwrap().source, "fd00::1/128");
    }

    #[test]
    fn icmp_entries_have_no_ports() {
        let port = parse_inbound_port("icmp").unwrap();
        assert_eq!(port.ports, None);
        assert_eq!(port.protocol, Protocol::Icmp);

        let port = parse_inbound_port("ICMP:10.1.0.0/16").unwrap();
        assert_eq!(port.source, "10.1.0.0/16");
        assert!(port.api_ports().is_empty());
    }

    #[test]
    fn ports_with_portless_protocol_are_rejected() {
        assert!(parse_inbound_port("22:icmp").is_err());
        assert!(parse_inbound_port("22:all").is_err());
    }

    #[test]
    fn malformed_entries_are_rejected() {
        for entry in ["", "ssh", "0", "70000", "90-80", "22:tcp:not-an-ip", "22:tcp:10.0.0.0/40"] {
            assert!(
                matches!(parse_inbound_port(entry), Err(CoreError::InvalidRuleSpec { .. })),
                "expected '{entry}' to be rejected"
            );
        }
    }

    #[test]
    fn attribute_list_skips_blank_entries() {
        let ports = parse_inbound_ports("22; 80-81:udp ;;icmp;").unwrap();
        assert_eq!(ports.len(), 3);
        assert_eq!(ports[1].protocol, Protocol::Udp);
        assert!(parse_inbound_ports("").unwrap().is_empty());
    }

    #[test]
    fn one_bad_entry_fails_the_list() {
        assert!(parse_inbound_ports("22;bogus;80").is_err());
    }
}
