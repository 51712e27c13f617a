// ── Idempotent rule creation ──
//
// Rules are keyed by their deterministic name. A lookup hit returns the
// existing rule untouched; only a miss resolves a priority and inserts.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::cloud::FirewallApi;
use crate::error::CoreError;
use crate::model::{FirewallRule, RuleSpec};
use crate::priority::{PriorityAllocator, PriorityBand, ScanOrder};
use cloudshell_gcp_api::Lookup;

/// How a new rule gets its priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RulePriority {
    /// Exact value, not subject to allocation.
    Fixed(u16),
    /// Next free value in a band.
    Band(PriorityBand),
    /// First free value past `start` on the network.
    FirstFree { start: u16, order: ScanOrder },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RuleOutcome {
    Created,
    Existing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnsuredRule {
    pub rule: FirewallRule,
    pub outcome: RuleOutcome,
}

/// Get-or-create over a [`FirewallApi`], owning one priority allocator per
/// network for the duration of a single sandbox operation.
pub struct RuleCreator<'a, A> {
    api: &'a A,
    allocators: HashMap<String, PriorityAllocator>,
}

impl<'a, A: FirewallApi> RuleCreator<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            allocators: HashMap::new(),
        }
    }

    pub fn api(&self) -> &'a A {
        self.api
    }

    /// Allocator for `network`, primed with one `list` call on first use.
    async fn allocator(&mut self, network: &str) -> Result<&mut PriorityAllocator, CoreError> {
        if !self.allocators.contains_key(network) {
            let existing = self.api.list_rules(network).await?;
            debug!(network, existing = existing.len(), "priming priority allocator");
            self.allocators.insert(
                network.to_owned(),
                PriorityAllocator::with_occupied(existing.iter().map(|rule| rule.priority)),
            );
        }
        self.allocators
            .get_mut(network)
            .ok_or_else(|| CoreError::Internal(format!("allocator for {network} missing")))
    }

    async fn resolve_priority(
        &mut self,
        network: &str,
        priority: RulePriority,
    ) -> Result<u16, CoreError> {
        match priority {
            RulePriority::Fixed(value) => {
                if let Some(allocator) = self.allocators.get_mut(network) {
                    allocator.reserve(value);
                }
                Ok(value)
            }
            RulePriority::Band(band) => self
                .allocator(network)
                .await?
                .next_in_band(band, ScanOrder::Ascending),
            RulePriority::FirstFree { start, order } => {
                self.allocator(network).await?.first_free(start, order)
            }
        }
    }

    /// Make sure the rule named by `spec` exists, reporting whether it was
    /// created by this call.
    pub async fn ensure(
        &mut self,
        spec: RuleSpec,
        priority: RulePriority,
    ) -> Result<EnsuredRule, CoreError> {
        spec.validate()?;

        if let Lookup::Found(rule) = self.api.get_rule(&spec.name).await? {
            info!(rule = %rule.name, priority = rule.priority, "firewall rule already exists");
            return Ok(EnsuredRule {
                rule,
                outcome: RuleOutcome::Existing,
            });
        }

        let value = self.resolve_priority(&spec.network, priority).await?;
        let rule = spec.into_rule(value);
        self.api.create_rule(&rule).await?;
        info!(
            rule = %rule.name,
            network = %rule.network,
            action = %rule.action,
            priority = rule.priority,
            "created firewall rule"
        );

        Ok(EnsuredRule {
            rule,
            outcome: RuleOutcome::Created,
        })
    }

    pub async fn get_or_create(
        &mut self,
        spec: RuleSpec,
        priority: RulePriority,
    ) -> Result<FirewallRule, CoreError> {
        self.ensure(spec, priority).await.map(|ensured| ensured.rule)
    }
}
