// ── Firewall API seam ──
//
// `FirewallApi` is everything the allocator, rule creator and cleanup flow
// need from the cloud. `CloudFirewalls` implements it over the Compute REST
// client; tests can substitute their own implementation.

use std::future::Future;
use std::time::Duration;

use cloudshell_gcp_api::{ComputeClient, Lookup};
use tracing::debug;

use crate::convert::firewall_from_rule;
use crate::error::CoreError;
use crate::model::FirewallRule;

pub trait FirewallApi: Send + Sync {
    /// Look a rule up by name. A missing rule is `Lookup::NotFound`.
    fn get_rule(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Lookup<FirewallRule>, CoreError>> + Send;

    /// Every rule attached to `network`.
    fn list_rules(
        &self,
        network: &str,
    ) -> impl Future<Output = Result<Vec<FirewallRule>, CoreError>> + Send;

    /// Insert `rule` and wait until the operation is done.
    fn create_rule(&self, rule: &FirewallRule)
    -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Delete a rule and wait until the operation is done. A rule that does
    /// not exist fails with [`CoreError::NotFound`].
    fn delete_rule(&self, name: &str) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// [`FirewallApi`] backed by the Compute Engine REST API.
pub struct CloudFirewalls {
    client: ComputeClient,
    operation_timeout: Duration,
}

impl CloudFirewalls {
    pub fn new(client: ComputeClient, operation_timeout: Duration) -> Self {
        Self {
            client,
            operation_timeout,
        }
    }

    pub fn client(&self) -> &ComputeClient {
        &self.client
    }
}

impl FirewallApi for CloudFirewalls {
    async fn get_rule(&self, name: &str) -> Result<Lookup<FirewallRule>, CoreError> {
        let lookup = self.client.get_firewall(name).await?;
        Ok(lookup.map(FirewallRule::from))
    }

    async fn list_rules(&self, network: &str) -> Result<Vec<FirewallRule>, CoreError> {
        let firewalls = self.client.list_firewalls_by_network(network).await?;
        debug!(network, count = firewalls.len(), "listed firewall rules");
        Ok(firewalls.into_iter().map(FirewallRule::from).collect())
    }

    async fn create_rule(&self, rule: &FirewallRule) -> Result<(), CoreError> {
        let body = firewall_from_rule(rule, self.client.network_path(&rule.network));
        let operation = self.client.insert_firewall(&body).await?;
        let done = self
            .client
            .wait_until_done(operation, self.operation_timeout)
            .await?;
        debug!(rule = %rule.name, operation = %done.name, "insert finished");
        Ok(())
    }

    async fn delete_rule(&self, name: &str) -> Result<(), CoreError> {
        let operation = match self.client.delete_firewall(name).await {
            Ok(operation) => operation,
            Err(e) if e.is_not_found() => {
                return Err(CoreError::NotFound {
                    entity_type: "firewall rule".into(),
                    identifier: name.to_owned(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let done = self
            .client
            .wait_until_done(operation, self.operation_timeout)
            .await?;
        debug!(rule = name, operation = %done.name, "delete finished");
        Ok(())
    }
}
