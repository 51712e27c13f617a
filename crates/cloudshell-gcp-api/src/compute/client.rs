// Hand-crafted async HTTP client for the Compute Engine v1 REST API.
//
// Base path: https://compute.googleapis.com/compute/v1/
// Auth: Authorization: Bearer <access token>

use std::time::Duration;

use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, trace};
use url::Url;

use super::types::{Firewall, FirewallList, Lookup, Operation};
use crate::Error;
use crate::transport::TransportConfig;

/// Public Compute Engine endpoint.
pub const DEFAULT_BASE_URL: &str = "https://compute.googleapis.com/compute/v1/";

// ── Error response shape from the Compute API ────────────────────────

#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(serde::Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Compute Engine global firewall and operation endpoints.
///
/// Every request is scoped to one project. Mutating calls return the
/// [`Operation`] that tracks them; use [`wait_until_done`](Self::wait_until_done)
/// to block until it reaches a terminal state.
pub struct ComputeClient {
    http: reqwest::Client,
    base_url: Url,
    project: String,
}

impl ComputeClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build against the public endpoint with a bearer token.
    pub fn new(
        project: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        Self::with_base_url(DEFAULT_BASE_URL, project, token, transport)
    }

    /// Build against a custom endpoint (emulators, private service connect).
    pub fn with_base_url(
        base_url: &str,
        project: &str,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client_with_token(token)?;
        Self::from_reqwest(base_url, project, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, project: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            project: project.to_owned(),
        })
    }

    /// Ensure the base URL ends with `/compute/v1/` so relative joins work.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/compute/v1") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/compute/v1/"));
        }

        Ok(url)
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Partial network URL as the API accepts it in `Firewall.network`.
    pub fn network_path(&self, network: &str) -> String {
        format!("projects/{}/global/networks/{network}", self.project)
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self
            .base_url
            .join(&format!("projects/{}/global/{path}", self.project))?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    /// Body-less POST with its own total timeout in place of the client's.
    async fn post_empty_with_timeout<T: DeserializeOwned>(
        &self,
        path: &str,
        timeout: Duration,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url} timeout={timeout:?}");

        let resp = self.http.post(url).timeout(timeout).send().await?;
        Self::handle_response(resp).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorEnvelope>(&raw).ok();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Authentication {
                message: parsed
                    .and_then(|env| env.error.message)
                    .unwrap_or_else(|| "access token rejected".into()),
            };
        }

        match parsed {
            Some(env) => Error::Api {
                status: status.as_u16(),
                message: env.error.message.unwrap_or_else(|| status.to_string()),
                reason: env.error.errors.into_iter().find_map(|d| d.reason),
            },
            None => Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                reason: None,
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Firewalls ────────────────────────────────────────────────────

    pub async fn insert_firewall(&self, firewall: &Firewall) -> Result<Operation, Error> {
        self.post("firewalls", firewall).await
    }

    pub async fn get_firewall(&self, name: &str) -> Result<Lookup<Firewall>, Error> {
        match self.get(&format!("firewalls/{name}")).await {
            Ok(firewall) => Ok(Lookup::Found(firewall)),
            Err(e) if e.is_not_found() => Ok(Lookup::NotFound),
            Err(e) => Err(e),
        }
    }

    pub async fn delete_firewall(&self, name: &str) -> Result<Operation, Error> {
        self.delete(&format!("firewalls/{name}")).await
    }

    /// List every firewall rule in the project, following `nextPageToken`.
    pub async fn list_firewalls(&self, filter: Option<&str>) -> Result<Vec<Firewall>, Error> {
        let mut all = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("maxResults", "500".to_owned())];
            if let Some(filter) = filter {
                params.push(("filter", filter.to_owned()));
            }
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }

            let page: FirewallList = self.get_with_params("firewalls", &params).await?;
            trace!(received = page.items.len(), "firewall page");
            all.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(all)
    }

    /// Firewall rules attached to `network`. The API returns full network
    /// URLs, so matching is done on the `projects/{p}/global/networks/{n}` suffix.
    pub async fn list_firewalls_by_network(&self, network: &str) -> Result<Vec<Firewall>, Error> {
        let suffix = self.network_path(network);
        let rules = self.list_firewalls(None).await?;
        Ok(rules
            .into_iter()
            .filter(|rule| rule.network.ends_with(&suffix))
            .collect())
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Server-side wait. Returns when the operation is `DONE` or after the
    /// server's own deadline (about two minutes), whichever comes first.
    ///
    /// The request is bounded by `timeout` rather than the transport's
    /// per-request timeout, since the server holds it open.
    pub async fn wait_operation(&self, name: &str, timeout: Duration) -> Result<Operation, Error> {
        self.post_empty_with_timeout(&format!("operations/{name}/wait"), timeout)
            .await
    }

    /// Block until `operation` is `DONE`, re-issuing `wait` as needed.
    ///
    /// Each `wait` may run for whatever is left of `timeout`. An operation
    /// that finishes with `error` populated is returned as
    /// [`Error::Operation`].
    pub async fn wait_until_done(
        &self,
        operation: Operation,
        timeout: Duration,
    ) -> Result<Operation, Error> {
        let deadline = Instant::now() + timeout;
        let timed_out = |name: &str| Error::Timeout {
            what: format!("operation {name}"),
            timeout_secs: timeout.as_secs(),
        };
        let mut current = operation;

        while !current.is_done() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timed_out(&current.name));
            }
            debug!(operation = %current.name, status = ?current.status, "waiting for operation");
            current = match self.wait_operation(&current.name, remaining).await {
                Ok(next) => next,
                Err(Error::Transport(e)) if e.is_timeout() => {
                    return Err(timed_out(&current.name));
                }
                Err(e) => return Err(e),
            };
        }

        if let Some((code, message)) = current.first_error() {
            return Err(Error::Operation {
                operation: current.name.clone(),
                code: code.map(str::to_owned),
                message,
            });
        }

        Ok(current)
    }
}
