// ── Sandbox teardown ──

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cloud::FirewallApi;
use crate::error::CoreError;

/// Delete every firewall rule attached to `network`, returning the names
/// actually deleted. Rules that vanish between list and delete are skipped.
pub async fn cleanup_network_rules<A: FirewallApi>(
    api: &A,
    network: &str,
    cancel: &CancellationToken,
) -> Result<Vec<String>, CoreError> {
    let rules = api.list_rules(network).await?;
    info!(network, count = rules.len(), "removing sandbox firewall rules");

    let mut deleted = Vec::with_capacity(rules.len());
    for rule in rules {
        if cancel.is_cancelled() {
            warn!(network, completed = deleted.len(), "cleanup cancelled");
            return Err(CoreError::Cancelled {
                completed: deleted.len(),
            });
        }

        match api.delete_rule(&rule.name).await {
            Ok(()) => {
                info!(rule = %rule.name, "deleted firewall rule");
                deleted.push(rule.name);
            }
            Err(e) if e.is_not_found() => {
                warn!(rule = %rule.name, "firewall rule already gone");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(deleted)
}
