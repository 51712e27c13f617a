// ── Sandbox driver ──
//
// Entry point for the sandbox flows. Each call builds a fresh `RuleCreator`,
// so priority allocation state never outlives one operation.

use cloudshell_gcp_api::transport::{TlsMode, TransportConfig};
use cloudshell_gcp_api::{ComputeClient, compute::client::DEFAULT_BASE_URL};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cleanup::cleanup_network_rules;
use crate::cloud::{CloudFirewalls, FirewallApi};
use crate::config::{DriverConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::FirewallRule;
use crate::rules::{EnsuredRule, RuleCreator};
use crate::sandbox::{self, InboundRequest, SandboxFirewall, SandboxRequest};

pub struct SandboxDriver<A = CloudFirewalls> {
    api: A,
    mgmt_networks: Vec<String>,
}

impl SandboxDriver<CloudFirewalls> {
    /// Driver talking to the Compute API described by `config`.
    pub fn new(config: &DriverConfig) -> Result<Self, CoreError> {
        let transport = build_transport(config);
        let client = match &config.api_base {
            Some(base_url) => ComputeClient::with_base_url(
                base_url.as_str(),
                &config.project_id,
                &config.access_token,
                &transport,
            )?,
            None => ComputeClient::new(&config.project_id, &config.access_token, &transport)?,
        };
        let base_url = config
            .api_base
            .as_ref()
            .map_or(DEFAULT_BASE_URL, url::Url::as_str);
        info!(project = %config.project_id, base_url, "compute client ready");

        Ok(Self::with_api(
            CloudFirewalls::new(client, config.operation_timeout),
            config.additional_mgmt_networks.clone(),
        ))
    }
}

impl<A: FirewallApi> SandboxDriver<A> {
    pub fn with_api(api: A, mgmt_networks: Vec<String>) -> Self {
        Self { api, mgmt_networks }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Create (or reuse) the sandbox's subnet, management and sentinel rules.
    pub async fn prepare_sandbox(
        &self,
        request: SandboxRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<EnsuredRule>, CoreError> {
        let firewall = SandboxFirewall::new(request, self.mgmt_networks.clone())?;
        let mut creator = RuleCreator::new(&self.api);
        firewall.prepare(&mut creator, cancel).await
    }

    /// Open a deployed VM's inbound ports.
    pub async fn add_inbound_rules(
        &self,
        request: &InboundRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<EnsuredRule>, CoreError> {
        info!(
            network = %request.network,
            vm = %request.vm_name,
            ports = request.ports.len(),
            "adding inbound port rules"
        );
        let mut creator = RuleCreator::new(&self.api);
        sandbox::apply(&mut creator, sandbox::inbound_port_rules(request), cancel).await
    }

    /// Remove every rule on the sandbox network.
    pub async fn cleanup_sandbox(
        &self,
        network: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, CoreError> {
        cleanup_network_rules(&self.api, network, cancel).await
    }

    /// Rules on `network`, ordered by priority then name.
    pub async fn list_rules(&self, network: &str) -> Result<Vec<FirewallRule>, CoreError> {
        let mut rules = self.api.list_rules(network).await?;
        rules.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        Ok(rules)
    }
}

fn build_transport(config: &DriverConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        },
        timeout: config.timeout,
    }
}
