//! Cluster endpoint set and the per-command API context.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AoError, AoResult};

/// Short connect timeout so an unreachable cluster fails fast.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const LOCALHOST_ADDRESS: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEndpoint {
    pub name: String,
    pub reachable: bool,
    pub base_url: String,
    pub token: String,
    pub api_cluster: bool,
}

#[derive(Debug, Clone, Default)]
pub struct EndpointSet {
    endpoints: Vec<ClusterEndpoint>,
}

impl EndpointSet {
    pub fn new(endpoints: Vec<ClusterEndpoint>) -> Self {
        Self { endpoints }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClusterEndpoint> {
        self.endpoints.iter()
    }

    pub fn api_cluster(&self) -> Option<&ClusterEndpoint> {
        self.endpoints.iter().find(|e| e.api_cluster)
    }

    pub fn first(&self) -> Option<&ClusterEndpoint> {
        self.endpoints.first()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Everything a command needs to talk to the store, passed explicitly.
#[derive(Debug, Clone)]
pub struct ApiContext {
    pub affiliation: String,
    pub endpoints: EndpointSet,
    /// Send every request to this address instead of the cluster endpoints.
    pub api_address: Option<String>,
    pub dry_run: bool,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl ApiContext {
    pub fn new(affiliation: impl Into<String>, endpoints: EndpointSet) -> Self {
        Self {
            affiliation: affiliation.into(),
            endpoints,
            api_address: None,
            dry_run: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_api_address(mut self, address: Option<String>) -> Self {
        self.api_address = address;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }
}

/// On-disk cluster configuration written by the login collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub api_cluster: Option<String>,
    /// Base URL template with a `{cluster}` placeholder, used when a cluster has no `url`.
    #[serde(default)]
    pub url_pattern: Option<String>,
    #[serde(default)]
    pub clusters: Vec<ClusterEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterEntry {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_reachable")]
    pub reachable: bool,
}

fn default_reachable() -> bool {
    true
}

impl ClusterConfig {
    pub fn load(path: &Path) -> AoResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AoError::Config(format!("read {}: {e}", path.display())))?;
        Self::parse(&text)
            .map_err(|e| AoError::Config(format!("parse {}: {e}", path.display())))
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn endpoint_set(&self) -> AoResult<EndpointSet> {
        let mut endpoints = Vec::with_capacity(self.clusters.len());
        for entry in &self.clusters {
            let base_url = match (&entry.url, &self.url_pattern) {
                (Some(url), _) => url.clone(),
                (None, Some(pattern)) => pattern.replace("{cluster}", &entry.name),
                (None, None) => {
                    return Err(AoError::Config(format!(
                        "cluster '{}' has no url and no urlPattern is configured",
                        entry.name
                    )));
                }
            };
            endpoints.push(ClusterEndpoint {
                name: entry.name.clone(),
                reachable: entry.reachable,
                base_url,
                token: entry.token.clone(),
                api_cluster: self.api_cluster.as_deref() == Some(entry.name.as_str()),
            });
        }
        Ok(EndpointSet::new(endpoints))
    }
}
