#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use ao_core::config::{ApiContext, ClusterEndpoint, EndpointSet};
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, put};

pub const AFFILIATION: &str = "paas";

/// In-memory configuration store speaking the envelope protocol.
#[derive(Clone, Default)]
pub struct StoreFixture {
    pub snapshot: Arc<Mutex<String>>,
    pub writes: Arc<Mutex<Vec<RecordedWrite>>>,
    /// Version the single-file endpoint accepts; anything else is rejected as stale.
    pub file_version: Arc<Mutex<String>>,
}

#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub path: String,
    pub authorization: Option<String>,
    pub version: Option<String>,
    pub dry_run: Option<String>,
    pub body: String,
}

impl StoreFixture {
    pub fn with_snapshot(snapshot: &str) -> Self {
        let fixture = Self::default();
        *fixture.snapshot.lock().unwrap() = snapshot.to_string();
        fixture
    }

    pub fn snapshot_text(&self) -> String {
        self.snapshot.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(
                "/affiliation/{affiliation}/auroraconfig",
                get(get_snapshot).put(put_snapshot),
            )
            .route(
                "/affiliation/{affiliation}/auroraconfigfile/{*path}",
                put(put_file),
            )
            .with_state(self.clone())
    }

    fn record(&self, path: String, headers: &HeaderMap, body: &Bytes) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.writes.lock().unwrap().push(RecordedWrite {
            path,
            authorization: header("authorization"),
            version: header("auroraconfigfileversion"),
            dry_run: header("dryrun"),
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }
}

pub fn envelope(items: &[&str]) -> String {
    format!(
        r#"{{"success":true,"message":"","items":[{}],"count":{}}}"#,
        items.join(","),
        items.len()
    )
}

async fn get_snapshot(State(fixture): State<StoreFixture>) -> (StatusCode, String) {
    let snapshot = fixture.snapshot_text();
    (StatusCode::OK, envelope(&[&snapshot]))
}

async fn put_snapshot(
    State(fixture): State<StoreFixture>,
    Path(affiliation): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    fixture.record(format!("{affiliation}/auroraconfig"), &headers, &body);
    *fixture.snapshot.lock().unwrap() = String::from_utf8_lossy(&body).into_owned();
    (StatusCode::OK, envelope(&[]))
}

async fn put_file(
    State(fixture): State<StoreFixture>,
    Path((affiliation, path)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    fixture.record(format!("{affiliation}/file/{path}"), &headers, &body);
    let expected = fixture.file_version.lock().unwrap().clone();
    let given = headers
        .get("auroraconfigfileversion")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if given != expected {
        let rejection = format!(
            r#"{{"success":false,"message":"Validation error","items":[{{"application":"app1","environment":"dev","messages":[{{"message":"stale version {given}","field":{{"path":"/version","value":"{given}","source":"{path}"}}}}]}}],"count":1}}"#
        );
        return (StatusCode::BAD_REQUEST, rejection);
    }
    (StatusCode::OK, envelope(&[]))
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

/// Base URL of a port nothing listens on.
pub async fn closed_url() -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

pub fn endpoint(name: &str, base_url: &str, api_cluster: bool) -> ClusterEndpoint {
    ClusterEndpoint {
        name: name.to_string(),
        reachable: true,
        base_url: base_url.to_string(),
        token: format!("{name}-token"),
        api_cluster,
    }
}

pub fn context(endpoints: Vec<ClusterEndpoint>) -> ApiContext {
    ApiContext::new(AFFILIATION, EndpointSet::new(endpoints))
}
