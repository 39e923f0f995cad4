//! Test helpers: a mock VCD server and a per-test cleanup registry
//!
//! Enabled with the `test-support` feature so downstream crates can test
//! against the same fixtures.
//!
//! ```rust,ignore
//! use vcd_core::testing::MockVcdServer;
//! use vcd_core::{Catalog, QueryParams};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn lists_catalogs() {
//!     let server = MockVcdServer::start().await;
//!     server
//!         .mock_list("1.0.0/catalogs/", vec![json!({"id": "urn:vcloud:catalog:1", "name": "a"})])
//!         .await;
//!     let catalogs = Catalog::list(&server.client(), QueryParams::new()).await.unwrap();
//!     assert_eq!(catalogs.len(), 1);
//! }
//! ```

use serde_json::{Value, json};
use tracing::warn;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::VcdClient;
use crate::config::TaskWaitConfig;
use crate::crud::{CrudConfig, delete_entity_by_id};
use crate::endpoint::Endpoint;
use crate::error::VcdError;
use crate::version::ApiVersion;

/// Versions advertised by [`MockVcdServer::client`]
pub const DEFAULT_VERSIONS: [&str; 5] = ["36.0", "37.0", "37.1", "37.2", "38.1"];

/// Bearer token the mock client sends
pub const TEST_TOKEN: &str = "test-token";

/// wiremock server speaking enough of the VCD API for SDK tests
pub struct MockVcdServer {
    server: MockServer,
}

impl MockVcdServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// The underlying wiremock server, for custom mocks
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Absolute URL of a path relative to `cloudapi/`
    pub fn cloudapi_url(&self, relative: &str) -> String {
        format!("{}{}", self.uri(), cloudapi(relative))
    }

    /// Client with a token, [`DEFAULT_VERSIONS`] and fast task polling
    pub fn client(&self) -> VcdClient {
        self.client_with_versions(&DEFAULT_VERSIONS)
    }

    pub fn client_with_versions(&self, versions: &[&str]) -> VcdClient {
        let versions: Vec<ApiVersion> = versions.iter().filter_map(|v| v.parse().ok()).collect();
        VcdClient::builder(self.uri())
            .token(TEST_TOKEN)
            .api_versions(versions)
            .task_wait(TaskWaitConfig {
                timeout_secs: 5,
                interval_ms: 10,
            })
            .build()
            .expect("mock client")
    }

    /// Answer `GET api/versions` with `versions`
    pub async fn mock_versions(&self, versions: &[&str]) {
        let info: Vec<Value> = versions
            .iter()
            .map(|v| json!({"version": v, "deprecated": false}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/api/versions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"versionInfo": info})))
            .mount(&self.server)
            .await;
    }

    /// Answer session logins with `token` in the access-token header
    pub async fn mock_login(&self, token: &str) {
        for endpoint in ["1.0.0/sessions", "1.0.0/sessions/provider"] {
            Mock::given(method("POST"))
                .and(path(cloudapi(endpoint)))
                .respond_with(
                    ResponseTemplate::new(200)
                        .insert_header(crate::client::ACCESS_TOKEN_HEADER, token)
                        .set_body_json(json!({"id": "urn:vcloud:session:1"})),
                )
                .mount(&self.server)
                .await;
        }
    }

    /// A one-page collection at `relative`
    pub async fn mock_list(&self, relative: &str, values: Vec<Value>) {
        self.mock_list_pages(relative, vec![values]).await;
    }

    /// A multi-page collection; page `n` (1-based) returns `pages[n - 1]`
    pub async fn mock_list_pages(&self, relative: &str, pages: Vec<Vec<Value>>) {
        let total: usize = pages.iter().map(Vec::len).sum();
        let page_count = pages.len();
        for (index, values) in pages.into_iter().enumerate() {
            let page = index + 1;
            Mock::given(method("GET"))
                .and(path(cloudapi(relative)))
                .and(query_param("page", page.to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "resultTotal": total,
                    "pageCount": page_count,
                    "page": page,
                    "pageSize": 128,
                    "values": values,
                })))
                .mount(&self.server)
                .await;
        }
    }

    pub async fn mock_get(&self, relative: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(cloudapi(relative)))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// `http_method` on `relative` answers 200 (201 for POST) with `body`
    pub async fn mock_sync(&self, http_method: &str, relative: &str, body: Value) {
        let status = if http_method.eq_ignore_ascii_case("POST") { 201 } else { 200 };
        Mock::given(method(http_method))
            .and(path(cloudapi(relative)))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// `http_method` on `relative` answers 204
    pub async fn mock_no_content(&self, http_method: &str, relative: &str) {
        Mock::given(method(http_method))
            .and(path(cloudapi(relative)))
            .respond_with(ResponseTemplate::new(204))
            .mount(&self.server)
            .await;
    }

    /// `http_method` on `relative` answers 202 with a `Location` header
    /// pointing at `task_path` (relative to the server root, e.g. `/api/task/1`)
    pub async fn mock_accepted(&self, http_method: &str, relative: &str, task_path: &str) {
        let location = format!("{}{}", self.uri(), task_path);
        Mock::given(method(http_method))
            .and(path(cloudapi(relative)))
            .respond_with(ResponseTemplate::new(202).insert_header("Location", location.as_str()))
            .mount(&self.server)
            .await;
    }

    /// Serve `snapshots` from `task_path`, one per poll
    ///
    /// The last snapshot keeps being served once the others are used up.
    pub async fn mock_task_sequence(&self, task_path: &str, snapshots: Vec<Value>) {
        let count = snapshots.len();
        for (index, snapshot) in snapshots.into_iter().enumerate() {
            let mock = Mock::given(method("GET"))
                .and(path(task_path))
                .respond_with(ResponseTemplate::new(200).set_body_json(snapshot));
            let mock = if index + 1 < count { mock.up_to_n_times(1) } else { mock };
            mock.mount(&self.server).await;
        }
    }

    /// `http_method` on `relative` fails with `status` and a VCD error payload
    pub async fn mock_error(&self, http_method: &str, relative: &str, status: u16, minor_code: &str, message: &str) {
        Mock::given(method(http_method))
            .and(path(cloudapi(relative)))
            .respond_with(ResponseTemplate::new(status).set_body_json(error_body(status, minor_code, message)))
            .mount(&self.server)
            .await;
    }

    /// Like [`mock_error`](Self::mock_error) but only for the first `times` requests
    pub async fn mock_error_times(
        &self,
        http_method: &str,
        relative: &str,
        times: u64,
        status: u16,
        minor_code: &str,
        message: &str,
    ) {
        Mock::given(method(http_method))
            .and(path(cloudapi(relative)))
            .respond_with(ResponseTemplate::new(status).set_body_json(error_body(status, minor_code, message)))
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_not_found(&self, http_method: &str, relative: &str) {
        self.mock_error(http_method, relative, 404, "NOT_FOUND", "entity not found")
            .await;
    }

    /// Number of requests received so far
    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or(0)
    }

    /// Number of requests received for `http_method` on the absolute path `request_path`
    pub async fn requests_to(&self, http_method: &str, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.method.as_str().eq_ignore_ascii_case(http_method) && r.url.path() == request_path)
            .count()
    }
}

/// `/cloudapi/<relative>`
pub fn cloudapi(relative: &str) -> String {
    format!("/cloudapi/{}", relative.trim_start_matches('/'))
}

/// A task snapshot as VCD returns it
pub fn task_json(id: &str, status: &str, owner_id: Option<&str>) -> Value {
    let mut task = json!({
        "id": format!("urn:vcloud:task:{id}"),
        "name": "task",
        "operationName": "test",
        "status": status,
    });
    if let Some(owner) = owner_id {
        task["owner"] = json!({"id": owner, "name": "owner"});
    }
    if status == "error" {
        task["error"] = json!({"minorErrorCode": "BAD_REQUEST", "message": "task went wrong"});
    }
    task
}

/// A VCD OpenAPI error payload
pub fn error_body(status: u16, minor_code: &str, message: &str) -> Value {
    json!({
        "majorErrorCode": status,
        "minorErrorCode": minor_code,
        "message": message,
    })
}

#[derive(Debug, Clone)]
struct Tracked {
    endpoint: Endpoint,
    path_params: Vec<String>,
    id: String,
    label: String,
}

/// Records entities created by one test so they can be removed afterwards
///
/// Cleanup runs in reverse creation order, so children go before their
/// parents. Entities that are already gone are skipped.
#[derive(Debug, Default)]
pub struct CleanupTracker {
    entries: Vec<Tracked>,
}

impl CleanupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(
        &mut self,
        endpoint: Endpoint,
        path_params: &[String],
        id: impl Into<String>,
        label: impl Into<String>,
    ) {
        self.entries.push(Tracked {
            endpoint,
            path_params: path_params.to_vec(),
            id: id.into(),
            label: label.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Delete everything tracked; returns the deletions that failed
    pub async fn cleanup(&mut self, client: &VcdClient) -> Vec<(String, VcdError)> {
        let mut failures = Vec::new();
        while let Some(entry) = self.entries.pop() {
            let config = entry
                .path_params
                .iter()
                .fold(CrudConfig::new(entry.endpoint, entry.label.clone()), |config, param| {
                    config.path_param(param.clone())
                })
                .item(entry.id.clone());
            match delete_entity_by_id(client, &config).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    warn!(entity = %entry.label, id = %entry.id, error = %e, "cleanup failed");
                    failures.push((format!("{} {}", entry.label, entry.id), e));
                }
            }
        }
        failures
    }
}
