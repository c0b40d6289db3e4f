//! Multi-target request dispatcher.
//!
//! A request is sent to every eligible cluster endpoint concurrently and the
//! per-endpoint replies are folded into one [`DispatchOutcome`]: bodies keyed
//! by endpoint name plus newline-joinable failure fragments. Partial success is
//! kept even when some endpoints fail.

use std::collections::BTreeMap;

use futures::future::join_all;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};

use crate::config::ApiContext;
use crate::error::{AoError, AoResult};

/// Body fragment returned by a cluster where the store is not deployed.
pub const NOT_INSTALLED_SENTINEL: &str = "Application is not available";

const DRY_RUN_HEADER: &str = "dryrun";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Delete,
}

#[derive(Debug, Clone)]
pub struct DispatchRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
    pub api_only: bool,
}

impl DispatchRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
            api_only: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn put(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(Method::Put, path).body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Only address the designated API cluster.
    pub fn api_only(mut self) -> Self {
        self.api_only = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    pub status: u16,
    pub body: String,
}

impl EndpointResponse {
    pub fn is_success(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }

    pub fn is_validation_failure(&self) -> bool {
        self.status == StatusCode::BAD_REQUEST.as_u16()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointFailure {
    pub endpoint: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    pub responses: BTreeMap<String, EndpointResponse>,
    pub failures: Vec<EndpointFailure>,
    /// Endpoints that answered with the not-installed sentinel.
    pub skipped: Vec<String>,
}

impl DispatchOutcome {
    /// Aggregate error across all failed endpoints, if any.
    pub fn error(&self) -> Option<AoError> {
        if self.failures.is_empty() {
            return None;
        }
        let text = self
            .failures
            .iter()
            .map(|f| f.message.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Some(AoError::Transport(text))
    }

    /// Enforce the single-authoritative-copy contract.
    pub fn into_single(self) -> AoResult<(String, EndpointResponse)> {
        let count = self.responses.len();
        if count != 1 {
            return Err(AoError::Inconsistency(format!(
                "expected a response from exactly one endpoint, got {count}"
            )));
        }
        self.responses
            .into_iter()
            .next()
            .ok_or_else(|| AoError::Inconsistency("response map emptied".into()))
    }

    fn record(&mut self, endpoint: String, reply: EndpointReply) {
        match reply {
            EndpointReply::Answered(resp) => {
                if !resp.body.is_empty() {
                    self.responses.insert(endpoint, resp);
                }
            }
            EndpointReply::Failed { response, message } => {
                if let Some(resp) = response.filter(|r| !r.body.is_empty()) {
                    self.responses.insert(endpoint.clone(), resp);
                }
                self.failures.push(EndpointFailure { endpoint, message });
            }
            EndpointReply::NotInstalled => self.skipped.push(endpoint),
        }
    }
}

#[derive(Debug)]
enum EndpointReply {
    /// 200 or 400; a 400 carries a validation envelope and is not a transport error.
    Answered(EndpointResponse),
    Failed {
        response: Option<EndpointResponse>,
        message: String,
    },
    NotInstalled,
}

#[derive(Debug, Clone)]
struct Target {
    name: String,
    url: String,
    token: String,
}

/// Sends store requests to the cluster endpoints described by an [`ApiContext`].
pub struct Dispatcher {
    client: Client,
    ctx: ApiContext,
}

impl Dispatcher {
    pub fn new(ctx: ApiContext) -> AoResult<Self> {
        let client = Client::builder()
            .connect_timeout(ctx.connect_timeout)
            .timeout(ctx.request_timeout)
            .build()?;
        Ok(Self { client, ctx })
    }

    pub fn context(&self) -> &ApiContext {
        &self.ctx
    }

    pub async fn dispatch(&self, req: &DispatchRequest) -> DispatchOutcome {
        let targets = self.targets(req.api_only, &req.path);
        if targets.is_empty() {
            tracing::warn!(path = %req.path, "no reachable endpoint for request");
        }

        let calls = targets.into_iter().map(|target| async move {
            let reply = self.call_endpoint(&target, req).await;
            (target.name, reply)
        });

        let mut outcome = DispatchOutcome::default();
        for (name, reply) in join_all(calls).await {
            outcome.record(name, reply);
        }
        for name in &outcome.skipped {
            tracing::warn!(
                endpoint = %name,
                "configuration service not installed, endpoint skipped"
            );
        }
        outcome
    }

    fn targets(&self, api_only: bool, path: &str) -> Vec<Target> {
        if let Some(address) = &self.ctx.api_address {
            let endpoints = &self.ctx.endpoints;
            let name = endpoints
                .first()
                .map(|e| e.name.clone())
                .unwrap_or_else(|| "api".to_string());
            let token = endpoints
                .api_cluster()
                .map(|e| e.token.clone())
                .unwrap_or_default();
            return vec![Target {
                name,
                url: join_url(address, path),
                token,
            }];
        }

        self.ctx
            .endpoints
            .iter()
            .filter(|e| e.reachable && (!api_only || e.api_cluster))
            .map(|e| Target {
                name: e.name.clone(),
                url: join_url(&e.base_url, path),
                token: e.token.clone(),
            })
            .collect()
    }

    async fn call_endpoint(&self, target: &Target, req: &DispatchRequest) -> EndpointReply {
        let mut builder = match req.method {
            Method::Get => self.client.get(&target.url),
            Method::Put => self.client.put(&target.url),
            Method::Delete => self.client.delete(&target.url),
        };

        builder = builder
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .header(DRY_RUN_HEADER, self.ctx.dry_run.to_string());
        match HeaderValue::from_str(&format!("Bearer {}", target.token)) {
            Ok(value) => builder = builder.header(AUTHORIZATION, value),
            Err(e) => {
                return EndpointReply::Failed {
                    response: None,
                    message: format!("invalid token for {}: {e}", target.name),
                };
            }
        }
        for (k, v) in &req.headers {
            match (HeaderName::from_bytes(k.as_bytes()), HeaderValue::from_str(v)) {
                (Ok(name), Ok(value)) => builder = builder.header(name, value),
                _ => {
                    return EndpointReply::Failed {
                        response: None,
                        message: format!("invalid header {k} for {}", target.url),
                    };
                }
            }
        }
        if let Some(body) = &req.body {
            builder = builder.body(body.clone());
        }

        tracing::debug!(
            endpoint = %target.name,
            url = %target.url,
            method = ?req.method,
            "sending request"
        );
        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(endpoint = %target.name, "request failed: {e}");
                return EndpointReply::Failed {
                    response: None,
                    message: format!(
                        "error connecting to the configuration service on {}: {e}",
                        target.url
                    ),
                };
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                return EndpointReply::Failed {
                    response: None,
                    message: format!("read body from {} failed: {e}", target.url),
                };
            }
        };
        tracing::debug!(endpoint = %target.name, status = status.as_u16(), "response received");

        let resp = EndpointResponse {
            status: status.as_u16(),
            body,
        };
        if status == StatusCode::OK || status == StatusCode::BAD_REQUEST {
            return EndpointReply::Answered(resp);
        }
        if resp.body.contains(NOT_INSTALLED_SENTINEL) {
            return EndpointReply::NotInstalled;
        }
        let message = if resp.body.is_empty() {
            format!("internal error on {}: {status}", target.url)
        } else {
            format!("internal error on {}: {}", target.url, resp.body)
        };
        EndpointReply::Failed {
            response: Some(resp),
            message,
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
