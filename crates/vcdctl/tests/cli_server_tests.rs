//! End-to-end runs of the binary against a mock VCD server

use assert_cmd::Command;
use assert_cmd::assert::{Assert, OutputAssertExt};
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use vcd_core::testing::{DEFAULT_VERSIONS, MockVcdServer, task_json};

struct Fixture {
    server: MockVcdServer,
    dir: TempDir,
}

impl Fixture {
    async fn start() -> Self {
        let server = MockVcdServer::start().await;
        server.mock_versions(&DEFAULT_VERSIONS).await;
        let dir = TempDir::new().unwrap();
        let config = format!(
            "default_profile = \"mock\"\n\n[profiles.mock]\nurl = \"{}\"\norg = \"acme\"\ntoken = \"test-token\"\n\n[profiles.mock.task]\ntimeout_secs = 5\ninterval_ms = 10\n",
            server.uri()
        );
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        Self { server, dir }
    }

    /// Run vcdctl on a blocking thread so the mock server keeps answering
    async fn run(&self, args: &[&str]) -> Assert {
        let mut cmd = Command::cargo_bin("vcdctl").unwrap();
        cmd.arg("--config-file")
            .arg(self.dir.path().join("config.toml"))
            .args(args)
            .env_remove("VCDCTL_PROFILE")
            .env_remove("VCD_URL")
            .env_remove("VCD_TOKEN")
            .env_remove("VCD_ORG")
            .env_remove("VCD_USER")
            .env_remove("VCD_PASSWORD")
            .env_remove("RUST_LOG");
        let output = tokio::task::spawn_blocking(move || cmd.output())
            .await
            .unwrap()
            .unwrap();
        output.assert()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_catalog_list_json() {
    let fx = Fixture::start().await;
    fx.server
        .mock_list(
            "1.0.0/catalogs/",
            vec![
                json!({"id": "urn:vcloud:catalog:1", "name": "images", "isPublished": true}),
                json!({"id": "urn:vcloud:catalog:2", "name": "isos"}),
            ],
        )
        .await;

    fx.run(&["catalog", "list", "-o", "json"])
        .await
        .success()
        .stdout(predicate::str::contains("\"name\": \"images\""))
        .stdout(predicate::str::contains("urn:vcloud:catalog:2"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_catalog_list_table_and_query() {
    let fx = Fixture::start().await;
    fx.server
        .mock_list(
            "1.0.0/catalogs/",
            vec![json!({"id": "urn:vcloud:catalog:1", "name": "images", "numberOfVAppTemplates": 4})],
        )
        .await;

    fx.run(&["catalog", "list"])
        .await
        .success()
        .stdout(predicate::str::contains("templates"))
        .stdout(predicate::str::contains("images"));

    fx.run(&["catalog", "list", "-q", "[].name", "-o", "json"])
        .await
        .success()
        .stdout(predicate::str::contains("\"images\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_catalog_exits_with_suggestion() {
    let fx = Fixture::start().await;
    fx.server.mock_list("1.0.0/catalogs/", vec![]).await;

    fx.run(&["catalog", "get", "nothing-here"])
        .await
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Not found"))
        .stderr(predicate::str::contains("tip:"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_role_get_by_urn() {
    let fx = Fixture::start().await;
    fx.server
        .mock_get(
            "1.0.0/roles/urn:vcloud:role:7",
            json!({"id": "urn:vcloud:role:7", "name": "Viewer", "description": "read only", "readOnly": true}),
        )
        .await;

    fx.run(&["role", "get", "urn:vcloud:role:7"])
        .await
        .success()
        .stdout(predicate::str::contains("\"name\": \"Viewer\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ip_space_list_rejects_unknown_type() {
    let fx = Fixture::start().await;

    fx.run(&["ip-space", "list", "--type", "GLOBAL"])
        .await
        .failure()
        .stderr(predicate::str::contains("PUBLIC, SHARED_SERVICES, PRIVATE"));
    assert_eq!(fx.server.request_count().await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_get_legacy_versions() {
    let fx = Fixture::start().await;

    fx.run(&["api", "get", "/api/versions", "-q", "length(versionInfo)"])
        .await
        .success()
        .stdout(predicate::str::contains(DEFAULT_VERSIONS.len().to_string()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_api_version_too_new_is_rejected() {
    let fx = Fixture::start().await;

    fx.run(&["api", "get", "1.0.0/future", "--min-version", "99.0"])
        .await
        .failure()
        .stderr(predicate::str::contains("Not supported by this server"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_task_wait_until_success() {
    let fx = Fixture::start().await;
    fx.server
        .mock_task_sequence(
            "/api/task/99",
            vec![
                task_json("99", "running", None),
                task_json("99", "success", Some("urn:vcloud:catalog:1")),
            ],
        )
        .await;

    fx.run(&["task", "wait", "/api/task/99", "-o", "json"])
        .await
        .success()
        .stdout(predicate::str::contains("\"status\": \"success\""));
    assert_eq!(fx.server.requests_to("GET", "/api/task/99").await, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_task_wait_reports_failure() {
    let fx = Fixture::start().await;
    fx.server
        .mock_task_sequence("/api/task/13", vec![task_json("13", "error", None)])
        .await;

    fx.run(&["task", "wait", "/api/task/13"])
        .await
        .failure()
        .code(1)
        .stderr(predicate::str::contains("task went wrong"));
}
