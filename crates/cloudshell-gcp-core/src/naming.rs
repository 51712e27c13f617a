// ── Deterministic resource names ──
//
// Rule names double as idempotency keys: the same logical rule on the same
// network always gets the same name. Firewall names are project-wide, so
// every rule name carries a short key derived from its network.

use uuid::Uuid;

use crate::model::InboundPort;

/// Compute Engine resource names: `[a-z]([-a-z0-9]{0,61}[a-z0-9])?`.
pub const MAX_NAME_LEN: usize = 63;

const NETWORK_KEY_LEN: usize = 8;
const VPC_PREFIX: &str = "quali-";

/// `10.10.1.0/24` → `10-10-1-0--24`.
pub fn cidr_fragment(cidr: &str) -> String {
    cidr.trim()
        .to_ascii_lowercase()
        .replace('/', "--")
        .replace(['.', ':'], "-")
}

/// First eight hex digits of the UUIDv5 of `network`.
pub fn network_key(network: &str) -> String {
    let mut key = Uuid::new_v5(&Uuid::NAMESPACE_OID, network.as_bytes())
        .simple()
        .to_string();
    key.truncate(NETWORK_KEY_LEN);
    key
}

pub fn is_valid_resource_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    bytes.len() <= MAX_NAME_LEN
        && first.is_ascii_lowercase()
        && (last.is_ascii_lowercase() || last.is_ascii_digit())
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}

/// Lowercase `raw` and map anything outside `[a-z0-9-]` to `-`.
fn normalise(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c.to_ascii_lowercase() {
            c @ ('a'..='z' | '0'..='9' | '-') => c,
            _ => '-',
        })
        .collect()
}

/// [`normalise`], then make sure the result starts with a letter.
fn sanitize(raw: &str) -> String {
    let mut out = normalise(raw);
    if !out.starts_with(|c: char| c.is_ascii_lowercase()) {
        out.insert_str(0, "r-");
    }
    out
}

fn fit(mut body: String, budget: usize) -> String {
    body.truncate(budget);
    body.trim_end_matches('-').to_owned()
}

/// `{body}-{network key}`, sanitized and cut to the resource-name limit.
pub fn scoped_name(body: &str, network: &str) -> String {
    let key = network_key(network);
    let body = fit(sanitize(body), MAX_NAME_LEN - key.len() - 1);
    format!("{body}-{key}")
}

// ── Rule templates ───────────────────────────────────────────────────

pub fn allow_sandbox_to_subnet(subnet_cidr: &str, network: &str) -> String {
    scoped_name(
        &format!("allow-sandbox-traffic-to-{}", cidr_fragment(subnet_cidr)),
        network,
    )
}

pub fn deny_internet_to_private_subnet(subnet_cidr: &str, network: &str) -> String {
    scoped_name(
        &format!(
            "deny-internet-traffic-to-priv-subnet-{}",
            cidr_fragment(subnet_cidr)
        ),
        network,
    )
}

pub fn allow_mgmt_to_sandbox(mgmt_cidr: &str, sandbox_cidr: &str, network: &str) -> String {
    scoped_name(
        &format!(
            "allow-{}-to-{}",
            cidr_fragment(mgmt_cidr),
            cidr_fragment(sandbox_cidr)
        ),
        network,
    )
}

pub fn deny_other_sandboxes(network: &str) -> String {
    scoped_name("deny-traffic-from-other-sandboxes", network)
}

/// `{vm}-{source}-{ports}-{protocol}`; port ranges use `--` (`80--81`).
pub fn inbound_rule(vm_name: &str, port: &InboundPort, network: &str) -> String {
    let source = cidr_fragment(&port.source);
    let body = match port.ports {
        Some(range) => format!(
            "{vm_name}-{source}-{}-{}",
            range.to_string().replace('-', "--"),
            port.protocol
        ),
        None => format!("{vm_name}-{source}-{}", port.protocol),
    };
    scoped_name(&body, network)
}

/// VPC network name for a sandbox reservation.
pub fn vpc_name(reservation_id: &str) -> String {
    let body = fit(normalise(reservation_id), MAX_NAME_LEN - VPC_PREFIX.len());
    format!("{VPC_PREFIX}{body}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::ports::parse_inbound_port;

    #[test]
    fn cidr_fragment_replaces_separators() {
        assert_eq!(cidr_fragment("10.10.1.0/24"), "10-10-1-0--24");
        assert_eq!(cidr_fragment("0.0.0.0/0"), "0-0-0-0--0");
    }

    #[test]
    fn every_cidr_yields_a_valid_name() {
        let cidrs = [
            "0.0.0.0/0",
            "10.0.0.0/8",
            "10.10.1.0/24",
            "172.16.254.128/25",
            "192.168.100.200/32",
            "255.255.255.255/32",
            "fd00:1234::/48",
        ];
        for cidr in cidrs {
            let fragment = cidr_fragment(cidr);
            assert!(!fragment.contains(['.', '/']), "{fragment}");

            for name in [
                allow_sandbox_to_subnet(cidr, "quali-sb"),
                deny_internet_to_private_subnet(cidr, "quali-sb"),
                allow_mgmt_to_sandbox(cidr, "10.10.0.0/16", "quali-sb"),
            ] {
                assert!(is_valid_resource_name(&name), "invalid name {name}");
            }
        }
    }

    #[test]
    fn names_are_deterministic_and_network_scoped() {
        let a = allow_sandbox_to_subnet("10.10.1.0/24", "quali-a");
        assert_eq!(a, allow_sandbox_to_subnet("10.10.1.0/24", "quali-a"));
        assert_ne!(a, allow_sandbox_to_subnet("10.10.1.0/24", "quali-b"));
        assert!(a.starts_with("allow-sandbox-traffic-to-10-10-1-0--24-"));
        assert_eq!(deny_other_sandboxes("quali-a").len(), 33 + 1 + 8);
    }

    #[test]
    fn long_names_are_truncated() {
        let name = allow_mgmt_to_sandbox(
            "fd00:1234:5678:9abc:def0::/80",
            "192.168.100.200/32",
            "quali-sb",
        );
        assert_eq!(name.len(), MAX_NAME_LEN);
        assert!(is_valid_resource_name(&name));
        assert!(name.ends_with(&network_key("quali-sb")));
    }

    #[test]
    fn inbound_names() {
        let port = parse_inbound_port("80-81:udp:10.0.0.0/8").unwrap();
        let name = inbound_rule("web-1", &port, "quali-sb");
        assert!(name.starts_with("web-1-10-0-0-0--8-80--81-udp-"), "{name}");

        let icmp = parse_inbound_port("icmp").unwrap();
        let name = inbound_rule("Web_1", &icmp, "quali-sb");
        assert!(name.starts_with("web-1-0-0-0-0--0-icmp-"), "{name}");
        assert!(is_valid_resource_name(&name));
    }

    #[test]
    fn leading_digit_gets_a_prefix() {
        let port = parse_inbound_port("22").unwrap();
        let name = inbound_rule("1vm", &port, "n");
        assert!(name.starts_with("r-1vm-"));
        assert!(is_valid_resource_name(&name));
    }

    #[test]
    fn resource_name_pattern() {
        assert!(is_valid_resource_name("a"));
        assert!(is_valid_resource_name("allow-x-1"));
        assert!(!is_valid_resource_name(""));
        assert!(!is_valid_resource_name("1abc"));
        assert!(!is_valid_resource_name("abc-"));
        assert!(!is_valid_resource_name("ABC"));
        assert!(!is_valid_resource_name("a_b"));
        assert!(!is_valid_resource_name(&"a".repeat(64)));
    }

    #[test]
    fn vpc_names() {
        assert_eq!(
            vpc_name("5B1F3C2A-0d4e-4f6a-9b7c-2e8d1a0f9c3b"),
            "quali-5b1f3c2a-0d4e-4f6a-9b7c-2e8d1a0f9c3b"
        );
        assert!(is_valid_resource_name(&vpc_name("res_42")));
    }
}
