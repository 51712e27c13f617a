// ── API-to-domain type conversions ──
//
// Bridges `cloudshell_gcp_api::Firewall` and `crate::model::FirewallRule`.
// The API keeps protocol and ports in `allowed[]`/`denied[]` lists and the
// network as a URL; the domain model flattens both.

use cloudshell_gcp_api::{Firewall, PortRule};

use crate::model::{Direction, FirewallRule, Protocol, RuleAction};

/// Priority the Compute API assigns when none is set.
pub const API_DEFAULT_PRIORITY: u16 = 1000;

/// Last path segment of a network URL (`.../global/networks/{name}`).
pub fn network_name(network: &str) -> &str {
    network
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(network)
}

// ── Firewall ───────────────────────────────────────────────────────

impl From<Firewall> for FirewallRule {
    fn from(fw: Firewall) -> Self {
        let direction = fw
            .direction
            .as_deref()
            .and_then(|d| d.parse().ok())
            .unwrap_or(Direction::Ingress);

        // A rule carries exactly one of `allowed` / `denied`; only the first
        // entry is modelled.
        let (action, entry) = match (fw.allowed.into_iter().next(), fw.denied.into_iter().next()) {
            (Some(entry), _) => (RuleAction::Allow, Some(entry)),
            (None, Some(entry)) => (RuleAction::Deny, Some(entry)),
            (None, None) => (RuleAction::Allow, None),
        };
        let (protocol, ports) = entry.map_or((Protocol::All, Vec::new()), |e| {
            (Protocol::from(e.ip_protocol), e.ports)
        });

        FirewallRule {
            network: network_name(&fw.network).to_owned(),
            name: fw.name,
            direction,
            action,
            priority: fw.priority.unwrap_or(API_DEFAULT_PRIORITY),
            protocol,
            ports,
            source_ranges: fw.source_ranges,
            destination_ranges: fw.destination_ranges,
            target_tags: fw.target_tags,
            description: fw.description,
        }
    }
}

/// Request body for `insert`. `network_path` is the partial network URL.
pub fn firewall_from_rule(rule: &FirewallRule, network_path: String) -> Firewall {
    let entry = vec![PortRule {
        ip_protocol: rule.protocol.to_string(),
        ports: rule.ports.clone(),
    }];
    let (allowed, denied) = match rule.action {
        RuleAction::Allow => (entry, Vec::new()),
        RuleAction::Deny => (Vec::new(), entry),
    };

    Firewall {
        name: rule.name.clone(),
        network: network_path,
        direction: Some(rule.direction.to_string()),
        priority: Some(rule.priority),
        allowed,
        denied,
        source_ranges: rule.source_ranges.clone(),
        destination_ranges: rule.destination_ranges.clone(),
        target_tags: rule.target_tags.clone(),
        description: rule.description.clone(),
        ..Firewall::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn api_firewall() -> Firewall {
        Firewall {
            name: "deny-x".into(),
            network: "https://www.googleapis.com/compute/v1/projects/demo/global/networks/quali-sb"
                .into(),
            direction: Some("INGRESS".into()),
            priority: Some(2002),
            denied: vec![PortRule {
                ip_protocol: "all".into(),
                ports: Vec::new(),
            }],
            source_ranges: vec!["10.10.0.0/16".into()],
            destination_ranges: vec!["10.10.2.0/24".into()],
            ..Firewall::default()
        }
    }

    #[test]
    fn network_name_takes_last_segment() {
        assert_eq!(network_name("projects/p/global/networks/n"), "n");
        assert_eq!(network_name("n"), "n");
        assert_eq!(network_name("https://x/networks/n/"), "n");
    }

    #[test]
    fn denied_rule_maps_to_deny_action() {
        let rule = FirewallRule::from(api_firewall());
        assert_eq!(rule.action, RuleAction::Deny);
        assert_eq!(rule.protocol, Protocol::All);
        assert_eq!(rule.network, "quali-sb");
        assert_eq!(rule.priority, 2002);
        assert_eq!(rule.destination_ranges, ["10.10.2.0/24"]);
    }

    #[test]
    fn missing_priority_and_direction_use_api_defaults() {
        let mut fw = api_firewall();
        fw.priority = None;
        fw.direction = None;
        let rule = FirewallRule::from(fw);
        assert_eq!(rule.priority, API_DEFAULT_PRIORITY);
        assert_eq!(rule.direction, Direction::Ingress);
    }

    #[test]
    fn rule_to_request_body() {
        let rule = FirewallRule::from(api_firewall());
        let body = firewall_from_rule(&rule, "projects/demo/global/networks/quali-sb".into());
        assert_eq!(body.network, "projects/demo/global/networks/quali-sb");
        assert!(body.allowed.is_empty());
        assert_eq!(body.denied[0].ip_protocol, "all");
        assert_eq!(body.direction.as_deref(), Some("INGRESS"));
        assert_eq!(body.priority, Some(2002));
    }
}
