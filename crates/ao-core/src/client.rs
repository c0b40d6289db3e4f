//! Snapshot store client: fetch, replace and single-file writes through the dispatcher.

use crate::config::ApiContext;
use crate::dispatch::{DispatchOutcome, DispatchRequest, Dispatcher, EndpointResponse};
use crate::envelope::{Envelope, ValidationReport};
use crate::error::{AoError, AoResult};
use crate::snapshot::Snapshot;

/// Request header carrying the optimistic-concurrency token of a file.
pub const VERSION_HEADER: &str = "AuroraConfigFileVersion";

pub fn snapshot_endpoint(affiliation: &str) -> String {
    format!("/affiliation/{affiliation}/auroraconfig")
}

pub fn file_endpoint(affiliation: &str, path: &str) -> String {
    format!("/affiliation/{affiliation}/auroraconfigfile/{path}")
}

pub struct SnapshotClient {
    dispatcher: Dispatcher,
}

impl SnapshotClient {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn from_context(ctx: ApiContext) -> AoResult<Self> {
        Ok(Self::new(Dispatcher::new(ctx)?))
    }

    pub fn context(&self) -> &ApiContext {
        self.dispatcher.context()
    }

    /// Fetch the snapshot from the single authoritative (API cluster) endpoint.
    pub async fn fetch_snapshot(&self, affiliation: &str) -> AoResult<Snapshot> {
        let req = DispatchRequest::get(snapshot_endpoint(affiliation)).api_only();
        let outcome = self.dispatcher.dispatch(&req).await;
        reject_failures(&outcome)?;

        let (endpoint, resp) = outcome.into_single()?;
        let envelope = Envelope::parse(&resp.body)?;
        let snapshot = envelope.single_item::<Snapshot>("snapshot")?.unwrap_or_default();
        tracing::debug!(
            %endpoint,
            files = snapshot.files.len(),
            "fetched snapshot for {affiliation}"
        );
        Ok(snapshot)
    }

    /// Replace the whole snapshot; replicated to every reachable endpoint.
    pub async fn write_snapshot(&self, affiliation: &str, snapshot: &Snapshot) -> AoResult<()> {
        let body = serde_json::to_string(snapshot).map_err(|e| AoError::decode("snapshot", e))?;
        let req = DispatchRequest::put(snapshot_endpoint(affiliation), body);
        let outcome = self.dispatcher.dispatch(&req).await;
        reject_failures(&outcome)?;
        tracing::info!(
            files = snapshot.files.len(),
            endpoints = outcome.responses.len(),
            "wrote snapshot for {affiliation}"
        );
        Ok(())
    }

    /// Write one file guarded by its version token.
    ///
    /// A stale version comes back from the store as a validation failure.
    pub async fn write_file(
        &self,
        affiliation: &str,
        path: &str,
        content: &str,
        version: &str,
    ) -> AoResult<()> {
        let req = DispatchRequest::put(file_endpoint(affiliation, path), content)
            .header(VERSION_HEADER, version);
        let outcome = self.dispatcher.dispatch(&req).await;
        reject_failures(&outcome)?;
        tracing::info!(%path, "wrote file for {affiliation}");
        Ok(())
    }
}

/// Surface store-side validation first, then aggregated transport failures.
fn reject_failures(outcome: &DispatchOutcome) -> AoResult<()> {
    for resp in outcome.responses.values() {
        if let Some(report) = validation_failure(resp) {
            return Err(AoError::Validation(report));
        }
    }
    match outcome.error() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn validation_failure(resp: &EndpointResponse) -> Option<ValidationReport> {
    match Envelope::parse(&resp.body) {
        Ok(envelope) if !envelope.success => Some(envelope.validation_report()),
        Ok(_) => None,
        Err(_) if resp.is_validation_failure() => Some(ValidationReport::plain(resp.body.clone())),
        Err(_) => None,
    }
}
