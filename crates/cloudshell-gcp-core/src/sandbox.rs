// ── Sandbox firewall rule sets ──
//
// The rule topology of a sandbox VPC, computed as an ordered plan and then
// applied rule by rule through a `RuleCreator`. Priorities follow the plan
// order: subnet rules share the low band, management rules take the high
// band, and the catch-all deny sits at the sentinel.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cloud::FirewallApi;
use crate::error::CoreError;
use crate::model::{InboundPort, Protocol, RuleSpec, firewall::parse_cidr};
use crate::naming;
use crate::priority::{PriorityBand, SENTINEL_PRIORITY, ScanOrder};
use crate::rules::{EnsuredRule, RuleCreator, RulePriority};

/// Any IPv4 source.
pub const ANY_SOURCE: &str = "0.0.0.0/0";

/// First priority scanned past for deploy-time inbound rules.
pub const INBOUND_START_PRIORITY: u16 = 4000;

/// Subnets requested for one sandbox VPC.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SandboxRequest {
    pub network: String,
    pub sandbox_cidr: String,
    /// Subnets the sandbox may reach.
    #[serde(default)]
    pub prepare_subnets: Vec<String>,
    /// Subnets closed to sandbox traffic.
    #[serde(default)]
    pub private_subnets: Vec<String>,
}

/// Inbound ports opened on one deployed VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundRequest {
    pub network: String,
    pub vm_name: String,
    /// Network tag carried by the VM; rules target it.
    pub network_tag: String,
    pub ports: Vec<InboundPort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRule {
    pub spec: RuleSpec,
    pub priority: RulePriority,
}

/// Rule set for one sandbox VPC.
#[derive(Debug, Clone)]
pub struct SandboxFirewall {
    request: SandboxRequest,
    mgmt_networks: Vec<String>,
}

impl SandboxFirewall {
    pub fn new(request: SandboxRequest, mgmt_networks: Vec<String>) -> Result<Self, CoreError> {
        if request.network.is_empty() {
            return Err(CoreError::InvalidRuleSpec {
                message: "sandbox network name is empty".into(),
            });
        }
        parse_cidr(&request.sandbox_cidr)?;
        for cidr in request
            .prepare_subnets
            .iter()
            .chain(&request.private_subnets)
            .chain(&mgmt_networks)
        {
            parse_cidr(cidr)?;
        }
        Ok(Self {
            request,
            mgmt_networks,
        })
    }

    pub fn request(&self) -> &SandboxRequest {
        &self.request
    }

    /// Rules in creation order.
    pub fn plan(&self) -> Vec<PlannedRule> {
        let SandboxRequest {
            network,
            sandbox_cidr,
            prepare_subnets,
            private_subnets,
        } = &self.request;
        let low = RulePriority::Band(PriorityBand::LOW);
        let mut plan = Vec::new();

        for subnet in prepare_subnets {
            plan.push(PlannedRule {
                spec: RuleSpec::ingress(naming::allow_sandbox_to_subnet(subnet, network), network)
                    .allow(Protocol::All)
                    .from_ranges([sandbox_cidr.as_str()])
                    .to_ranges([subnet.as_str()])
                    .description(format!("Allow sandbox traffic to {subnet}")),
                priority: low,
            });
        }

        for subnet in private_subnets {
            plan.push(PlannedRule {
                spec: RuleSpec::ingress(
                    naming::deny_internet_to_private_subnet(subnet, network),
                    network,
                )
                .deny(Protocol::All)
                .from_ranges([sandbox_cidr.as_str()])
                .to_ranges([subnet.as_str()])
                .description(format!("Deny traffic to private subnet {subnet}")),
                priority: low,
            });
        }

        for mgmt in &self.mgmt_networks {
            plan.push(PlannedRule {
                spec: RuleSpec::ingress(
                    naming::allow_mgmt_to_sandbox(mgmt, sandbox_cidr, network),
                    network,
                )
                .allow(Protocol::All)
                .from_ranges([mgmt.as_str()])
                .to_ranges([sandbox_cidr.as_str()])
                .description(format!("Allow management network {mgmt}")),
                priority: RulePriority::Band(PriorityBand::HIGH),
            });
        }

        plan.push(PlannedRule {
            spec: RuleSpec::ingress(naming::deny_other_sandboxes(network), network)
                .deny(Protocol::All)
                .from_ranges([ANY_SOURCE])
                .to_ranges([sandbox_cidr.as_str()])
                .description("Deny traffic from other sandboxes"),
            priority: RulePriority::Fixed(SENTINEL_PRIORITY),
        });

        plan
    }

    /// Plan and apply.
    pub async fn prepare<A: FirewallApi>(
        &self,
        creator: &mut RuleCreator<'_, A>,
        cancel: &CancellationToken,
    ) -> Result<Vec<EnsuredRule>, CoreError> {
        info!(
            network = %self.request.network,
            sandbox_cidr = %self.request.sandbox_cidr,
            "preparing sandbox firewall rules"
        );
        apply(creator, self.plan(), cancel).await
    }
}

/// One ALLOW rule per inbound port entry, targeting the VM's network tag.
pub fn inbound_port_rules(request: &InboundRequest) -> Vec<PlannedRule> {
    request
        .ports
        .iter()
        .map(|port| PlannedRule {
            spec: RuleSpec::ingress(
                naming::inbound_rule(&request.vm_name, port, &request.network),
                &request.network,
            )
            .allow(port.protocol.clone())
            .ports(port.api_ports())
            .from_ranges([port.source.as_str()])
            .target_tag(&request.network_tag)
            .description(format!("Inbound ports for {}", request.vm_name)),
            priority: RulePriority::FirstFree {
                start: INBOUND_START_PRIORITY,
                order: ScanOrder::Ascending,
            },
        })
        .collect()
}

/// Ensure each planned rule in order. The whole plan is validated before
/// the first API call. Stops at the first failure; rules already created
/// stay in place.
pub async fn apply<A: FirewallApi>(
    creator: &mut RuleCreator<'_, A>,
    plan: Vec<PlannedRule>,
    cancel: &CancellationToken,
) -> Result<Vec<EnsuredRule>, CoreError> {
    for planned in &plan {
        planned.spec.validate()?;
    }

    let mut ensured = Vec::with_capacity(plan.len());

    for PlannedRule { spec, priority } in plan {
        if cancel.is_cancelled() {
            warn!(
                completed = ensured.len(),
                next = %spec.name,
                "cancelled before next firewall rule"
            );
            return Err(CoreError::Cancelled {
                completed: ensured.len(),
            });
        }
        ensured.push(creator.ensure(spec, priority).await?);
    }

    Ok(ensured)
}
