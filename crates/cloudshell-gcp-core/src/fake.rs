// In-memory `FirewallApi` for unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use cloudshell_gcp_api::Lookup;

use crate::cloud::FirewallApi;
use crate::error::CoreError;
use crate::model::FirewallRule;

#[derive(Default)]
pub(crate) struct FakeFirewalls {
    rules: Mutex<Vec<FirewallRule>>,
    failing: Mutex<Vec<String>>,
    gets: AtomicUsize,
    lists: AtomicUsize,
    inserts: AtomicUsize,
    deletes: AtomicUsize,
}

#[allow(clippy::unwrap_used)]
impl FakeFirewalls {
    pub(crate) fn with_rules(rules: impl IntoIterator<Item = FirewallRule>) -> Self {
        let fake = Self::default();
        fake.rules.lock().unwrap().extend(rules);
        fake
    }

    /// Inserts of `name` finish with an operation error.
    pub(crate) fn fail_insert(&self, name: &str) {
        self.failing.lock().unwrap().push(name.to_owned());
    }

    pub(crate) fn rule(&self, name: &str) -> Option<FirewallRule> {
        self.rules
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == name)
            .cloned()
    }

    pub(crate) fn all(&self) -> Vec<FirewallRule> {
        self.rules.lock().unwrap().clone()
    }

    pub(crate) fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub(crate) fn lists(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }

    pub(crate) fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub(crate) fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[allow(clippy::unwrap_used)]
impl FirewallApi for FakeFirewalls {
    async fn get_rule(&self, name: &str) -> Result<Lookup<FirewallRule>, CoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.rule(name).map_or(Lookup::NotFound, Lookup::Found))
    }

    async fn list_rules(&self, network: &str) -> Result<Vec<FirewallRule>, CoreError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .all()
            .into_iter()
            .filter(|r| r.network == network)
            .collect())
    }

    async fn create_rule(&self, rule: &FirewallRule) -> Result<(), CoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().unwrap().contains(&rule.name) {
            return Err(CoreError::CloudOperation {
                operation: format!("op-{}", rule.name),
                code: Some("QUOTA_EXCEEDED".into()),
                message: "Quota 'FIREWALLS' exceeded".into(),
            });
        }
        self.rules.lock().unwrap().push(rule.clone());
        Ok(())
    }

    async fn delete_rule(&self, name: &str) -> Result<(), CoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut rules = self.rules.lock().unwrap();
        let before = rules.len();
        rules.retain(|r| r.name != name);
        if rules.len() == before {
            return Err(CoreError::NotFound {
                entity_type: "firewall rule".into(),
                identifier: name.to_owned(),
            });
        }
        Ok(())
    }
}
