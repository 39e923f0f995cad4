//! Task polling behavior: poll counts, terminal states, timeouts, cancellation

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vcd_core::testing::{MockVcdServer, task_json};
use vcd_core::{
    ProgressEvent, Task, TaskStatus, TaskWaitOptions, wait_task_completion,
    wait_task_completion_with_timeout,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const TASK_PATH: &str = "/api/task/42";

fn task(server: &MockVcdServer) -> Task {
    Task::from_href(format!("{}{}", server.uri(), TASK_PATH))
}

fn fast() -> TaskWaitOptions {
    TaskWaitOptions::new(Duration::from_secs(5), Duration::from_millis(10))
}

#[tokio::test]
async fn test_success_after_two_running_polls() {
    let server = MockVcdServer::start().await;
    server
        .mock_task_sequence(
            TASK_PATH,
            vec![
                task_json("42", "running", None),
                task_json("42", "running", None),
                task_json("42", "success", Some("urn:vcloud:catalog:1")),
            ],
        )
        .await;

    let done = wait_task_completion(&server.client(), &task(&server), fast())
        .await
        .unwrap();

    assert_eq!(done.status, TaskStatus::Success);
    assert_eq!(done.owner_id(), Some("urn:vcloud:catalog:1"));
    assert_eq!(server.requests_to("GET", TASK_PATH).await, 3);
}

#[tokio::test]
async fn test_error_after_one_running_poll() {
    let server = MockVcdServer::start().await;
    server
        .mock_task_sequence(
            TASK_PATH,
            vec![task_json("42", "running", None), task_json("42", "error", None)],
        )
        .await;

    let err = wait_task_completion(&server.client(), &task(&server), fast())
        .await
        .unwrap_err();

    assert!(err.is_task_failed());
    assert_eq!(server.requests_to("GET", TASK_PATH).await, 2);
}

#[tokio::test]
async fn test_aborted_task_fails() {
    let server = MockVcdServer::start().await;
    server
        .mock_task_sequence(TASK_PATH, vec![task_json("42", "aborted", None)])
        .await;

    let err = wait_task_completion(&server.client(), &task(&server), fast())
        .await
        .unwrap_err();
    assert!(err.is_task_failed());
    assert!(err.to_string().contains("aborted"));
}

#[tokio::test]
async fn test_never_finishing_task_times_out() {
    let server = MockVcdServer::start().await;
    server
        .mock_task_sequence(TASK_PATH, vec![task_json("42", "running", None)])
        .await;

    let options = TaskWaitOptions::new(Duration::from_millis(50), Duration::from_millis(10));
    let err = wait_task_completion(&server.client(), &task(&server), options)
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "{err}");
    let polls = server.requests_to("GET", TASK_PATH).await;
    assert!(polls >= 2, "expected several polls, got {polls}");
}

#[tokio::test]
async fn test_explicit_timeout_gives_up_on_running_task() {
    let server = MockVcdServer::start().await;
    server
        .mock_task_sequence(TASK_PATH, vec![task_json("42", "running", None)])
        .await;

    let err = wait_task_completion_with_timeout(
        &server.client(),
        &task(&server),
        Duration::from_millis(50),
    )
    .await
    .unwrap_err();

    assert!(err.is_timeout(), "{err}");
    assert!(!err.is_task_failed());
    assert!(err.to_string().starts_with("wait for task task: "), "{err}");
}

#[tokio::test]
async fn test_cancel_posts_cancel_action() {
    let server = MockVcdServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{TASK_PATH}/action/cancel")))
        .respond_with(ResponseTemplate::new(204))
        .mount(server.inner())
        .await;

    task(&server).cancel(&server.client()).await.unwrap();

    assert_eq!(
        server
            .requests_to("POST", &format!("{TASK_PATH}/action/cancel"))
            .await,
        1
    );
}

#[tokio::test]
async fn test_cancel_failure_is_labelled_as_cancel() {
    let server = MockVcdServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{TASK_PATH}/action/cancel")))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "minorErrorCode": "BAD_REQUEST",
            "message": "task already finished"
        })))
        .mount(server.inner())
        .await;

    let err = task(&server).cancel(&server.client()).await.unwrap_err();

    assert_eq!(err.status_code(), Some(400));
    let text = err.to_string();
    assert!(text.starts_with("cancel task failed with HTTP 400"), "{text}");
    assert!(text.contains("task already finished"));
}

#[tokio::test]
async fn test_unknown_status_keeps_polling() {
    let server = MockVcdServer::start().await;
    server
        .mock_task_sequence(
            TASK_PATH,
            vec![
                task_json("42", "somethingNew", None),
                task_json("42", "success", None),
            ],
        )
        .await;

    let done = wait_task_completion(&server.client(), &task(&server), fast())
        .await
        .unwrap();
    assert_eq!(done.status, TaskStatus::Success);
    assert_eq!(server.requests_to("GET", TASK_PATH).await, 2);
}

#[tokio::test]
async fn test_progress_events_in_order() {
    let server = MockVcdServer::start().await;
    server
        .mock_task_sequence(
            TASK_PATH,
            vec![task_json("42", "queued", None), task_json("42", "success", None)],
        )
        .await;

    let events: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&events);
    let options = fast().on_progress(Box::new(move |event| {
        let name = match event {
            ProgressEvent::Started { .. } => "started".to_string(),
            ProgressEvent::Polling { status, .. } => format!("polling:{status}"),
            ProgressEvent::Completed { .. } => "completed".to_string(),
            ProgressEvent::Failed { .. } => "failed".to_string(),
        };
        sink.lock().unwrap().push(name);
    }));

    wait_task_completion(&server.client(), &task(&server), options)
        .await
        .unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec!["started", "polling:queued", "polling:success", "completed"]
    );
}

#[tokio::test]
async fn test_cancellation_stops_waiting() {
    let server = MockVcdServer::start().await;
    server
        .mock_task_sequence(TASK_PATH, vec![task_json("42", "running", None)])
        .await;

    let token = CancellationToken::new();
    let options = TaskWaitOptions::new(Duration::from_secs(30), Duration::from_millis(20))
        .with_cancellation(token.clone());
    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let err = wait_task_completion(&server.client(), &task(&server), options)
        .await
        .unwrap_err();
    canceller.await.unwrap();
    assert!(err.is_cancelled(), "{err}");
}

#[tokio::test]
async fn test_snapshot_is_not_mutated_by_waiting() {
    let server = MockVcdServer::start().await;
    server
        .mock_task_sequence(TASK_PATH, vec![task_json("42", "success", None)])
        .await;

    let original = task(&server);
    let before = original.clone();
    let done = original.wait(&server.client()).await.unwrap();

    assert_eq!(original, before);
    assert_eq!(original.status, TaskStatus::Queued);
    assert_eq!(done.status, TaskStatus::Success);
}
