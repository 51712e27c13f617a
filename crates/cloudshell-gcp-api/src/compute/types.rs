//! Compute Engine v1 resource types.
//!
//! All types match the JSON bodies of `/compute/v1/projects/{project}/global/...`
//! endpoints. Field names use camelCase via `#[serde(rename_all = "camelCase")]`.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ── Lookup ───────────────────────────────────────────────────────────

/// Result of a by-name lookup. A missing resource is a normal outcome,
/// not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotFound => Lookup::NotFound,
        }
    }
}

// ── Firewalls ────────────────────────────────────────────────────────

/// One `allowed[]` / `denied[]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRule {
    /// `tcp`, `udp`, `icmp`, `all`, or an IP protocol number.
    #[serde(rename = "IPProtocol")]
    pub ip_protocol: String,
    /// Single ports (`"22"`) or ranges (`"8000-8080"`). Empty means every port.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
}

/// Firewall rule resource: `GET /global/firewalls/{firewall}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Firewall {
    pub name: String,
    /// Full or partial URL of the network, e.g. `projects/p/global/networks/n`.
    pub network: String,
    /// `INGRESS` or `EGRESS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<PortRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub denied: Vec<PortRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_ranges: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub destination_ranges: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,

    // Output only
    #[serde(default, skip_serializing)]
    pub id: Option<String>,
    #[serde(default, skip_serializing)]
    pub creation_timestamp: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing)]
    pub self_link: Option<String>,
}

/// List wrapper: `GET /global/firewalls`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallList {
    #[serde(default)]
    pub items: Vec<Firewall>,
    pub next_page_token: Option<String>,
}

// ── Operations ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,
    Running,
    Done,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationErrorEntry {
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub errors: Vec<OperationErrorEntry>,
}

/// Long-running operation, returned by every mutating call and by
/// `POST /global/operations/{operation}/wait`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    pub status: OperationStatus,
    pub operation_type: Option<String>,
    pub target_link: Option<String>,
    pub progress: Option<u8>,
    pub error: Option<OperationError>,
    pub http_error_status_code: Option<u16>,
    pub http_error_message: Option<String>,
}

impl Operation {
    pub fn is_done(&self) -> bool {
        self.status == OperationStatus::Done
    }

    /// The first reported error as `(code, message)`, if the operation failed.
    pub fn first_error(&self) -> Option<(Option<&str>, String)> {
        let entry = self.error.as_ref()?.errors.first();
        let code = entry.and_then(|e| e.code.as_deref());
        let message = entry
            .and_then(|e| e.message.clone())
            .or_else(|| self.http_error_message.clone())
            .unwrap_or_else(|| "operation reported an error".into());
        Some((code, message))
    }
}
