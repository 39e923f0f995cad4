//! Task polling for asynchronous VCD operations
//!
//! Mutating calls that the server runs in the background answer
//! `202 Accepted` with a `Location` header pointing at a task. A [`Task`]
//! is an immutable snapshot of that task; every poll fetches a new one
//! instead of updating the old value in place, so a snapshot can be shared
//! between threads without surprises.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vcd_core::{ProgressEvent, Task, TaskWaitOptions, VcdClient, wait_task_completion};
//!
//! # async fn example(client: &VcdClient, task: Task) -> vcd_core::Result<()> {
//! let options = TaskWaitOptions::new(Duration::from_secs(300), Duration::from_secs(2))
//!     .on_progress(Box::new(|event| {
//!         if let ProgressEvent::Polling { status, progress, .. } = event {
//!             println!("{status} {}%", progress.unwrap_or(0));
//!         }
//!     }));
//! let done = wait_task_completion(client, &task, options).await?;
//! println!("finished: {:?}", done.owner);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ApiRequest, MediaType, VcdClient};
use crate::config::TaskWaitConfig;
use crate::error::{ApiErrorBody, Operation, Result, VcdError};

const TASK: &str = "task";

/// Lifecycle state of a server task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    Queued,
    PreRunning,
    Running,
    Success,
    Error,
    #[serde(alias = "canceled", alias = "cancelled")]
    Aborted,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Success, error and aborted are final; everything else is still moving
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Success | TaskStatus::Error | TaskStatus::Aborted
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskStatus::Queued => "queued",
            TaskStatus::PreRunning => "preRunning",
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Error => "error",
            TaskStatus::Aborted => "aborted",
            TaskStatus::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Reference to another entity, as embedded in tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// One snapshot of a server task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    pub status: TaskStatus,
    /// Percentage reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    /// The entity the task works on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<FixedOffset>>,
}

impl Task {
    /// A placeholder snapshot for a task known only by its href
    pub fn from_href(href: impl Into<String>) -> Self {
        Self {
            id: None,
            href: href.into(),
            name: None,
            operation_name: None,
            operation: None,
            status: TaskStatus::Queued,
            progress: None,
            owner: None,
            error: None,
            details: None,
            start_time: None,
            end_time: None,
        }
    }

    /// Id when known, href otherwise
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.href)
    }

    /// Id of the entity this task operates on
    pub fn owner_id(&self) -> Option<&str> {
        self.owner
            .as_ref()
            .and_then(|o| o.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Server-reported reason for an error or aborted task
    pub fn failure_message(&self) -> String {
        self.error
            .as_ref()
            .and_then(|e| e.message.clone())
            .or_else(|| self.details.clone())
            .unwrap_or_else(|| format!("task ended in state {}", self.status))
    }

    /// Fetch a fresh snapshot; `self` is left untouched
    pub async fn refresh(&self, client: &VcdClient) -> Result<Task> {
        fetch_task(client, &self.href, None).await
    }

    /// Wait using the client's default timeout and interval
    pub async fn wait(&self, client: &VcdClient) -> Result<Task> {
        wait_task_completion(client, self, TaskWaitOptions::from_config(client.task_wait())).await
    }

    /// Ask the server to cancel the task
    pub async fn cancel(&self, client: &VcdClient) -> Result<()> {
        let url = client.resolve_href(&format!("{}/action/cancel", self.href.trim_end_matches('/')))?;
        let request = ApiRequest::new(Method::POST, url).media(MediaType::Legacy);
        client.execute(Operation::Cancel, TASK, request).await?;
        info!(task = self.label(), "task cancellation requested");
        Ok(())
    }
}

/// Progress events emitted while waiting for a task
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Waiting has begun
    Started { task: String },
    /// One poll came back
    Polling {
        task: String,
        status: TaskStatus,
        progress: Option<u32>,
        elapsed: Duration,
    },
    /// Task succeeded
    Completed {
        task: String,
        owner: Option<EntityRef>,
    },
    /// Task failed, was aborted, or waiting gave up
    Failed { task: String, error: String },
}

/// Callback type for progress updates
///
/// The CLI uses this to drive its spinner.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// How to wait for a task
pub struct TaskWaitOptions {
    pub timeout: Duration,
    pub interval: Duration,
    pub cancel: Option<CancellationToken>,
    pub on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for TaskWaitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskWaitOptions")
            .field("timeout", &self.timeout)
            .field("interval", &self.interval)
            .field("cancel", &self.cancel)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl Default for TaskWaitOptions {
    fn default() -> Self {
        Self::from_config(&TaskWaitConfig::default())
    }
}

impl TaskWaitOptions {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval,
            cancel: None,
            on_progress: None,
        }
    }

    pub fn from_config(config: &TaskWaitConfig) -> Self {
        Self::new(config.timeout(), config.interval())
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    #[must_use]
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }
}

/// GET the task at `href` and decode it
pub async fn fetch_task(
    client: &VcdClient,
    href: &str,
    cancel: Option<CancellationToken>,
) -> Result<Task> {
    if href.trim().is_empty() {
        return Err(VcdError::invalid(Operation::WaitTask, TASK, "task has no href"));
    }
    let url = client.resolve_href(href)?;
    let request = ApiRequest::new(Method::GET, url)
        .media(MediaType::Legacy)
        .cancel_on(cancel);
    let response = client.execute(Operation::WaitTask, TASK, request).await?;
    let mut task: Task = response.json(Operation::WaitTask, TASK)?;
    if task.href.is_empty() {
        task.href = href.to_string();
    }
    Ok(task)
}

/// Poll `task` until it reaches a terminal state
///
/// The first poll happens immediately; afterwards polls are spaced by
/// `options.interval`. Returns the final snapshot on success, `TaskFailed`
/// on error or abort, `TaskTimeout` once `options.timeout` has elapsed and
/// `Cancelled` if the token fires.
pub async fn wait_task_completion(
    client: &VcdClient,
    task: &Task,
    options: TaskWaitOptions,
) -> Result<Task> {
    let TaskWaitOptions {
        timeout,
        interval,
        cancel,
        on_progress,
    } = options;
    let label = task.label().to_string();
    let start = Instant::now();

    emit(&on_progress, ProgressEvent::Started { task: label.clone() });

    let polling = async {
        let mut polls = 0u32;
        loop {
            let snapshot = fetch_task(client, &task.href, cancel.clone()).await?;
            polls += 1;
            debug!(task = %label, status = %snapshot.status, polls, "task polled");

            emit(
                &on_progress,
                ProgressEvent::Polling {
                    task: label.clone(),
                    status: snapshot.status,
                    progress: snapshot.progress,
                    elapsed: start.elapsed(),
                },
            );

            match snapshot.status {
                TaskStatus::Success => {
                    info!(task = %label, polls, "task succeeded");
                    emit(
                        &on_progress,
                        ProgressEvent::Completed {
                            task: label.clone(),
                            owner: snapshot.owner.clone(),
                        },
                    );
                    return Ok(snapshot);
                }
                TaskStatus::Error | TaskStatus::Aborted => {
                    let message = snapshot.failure_message();
                    info!(task = %label, status = %snapshot.status, %message, "task failed");
                    emit(
                        &on_progress,
                        ProgressEvent::Failed {
                            task: label.clone(),
                            error: message.clone(),
                        },
                    );
                    return Err(VcdError::TaskFailed {
                        operation: Operation::WaitTask,
                        entity: TASK.to_string(),
                        task: label.clone(),
                        status: snapshot.status.to_string(),
                        message,
                    });
                }
                _ => sleep_or_cancel(interval, cancel.as_ref(), Operation::WaitTask, TASK).await?,
            }
        }
    };

    let outcome = tokio::time::timeout(timeout, polling).await;
    match outcome {
        Ok(result) => result,
        Err(_) => {
            warn!(task = %label, ?timeout, "gave up waiting for task");
            emit(
                &on_progress,
                ProgressEvent::Failed {
                    task: label.clone(),
                    error: format!("timed out after {timeout:?}"),
                },
            );
            Err(VcdError::TaskTimeout {
                operation: Operation::WaitTask,
                entity: TASK.to_string(),
                task: label,
                timeout,
            })
        }
    }
}

/// [`wait_task_completion`] with an explicit timeout and the client's default interval
pub async fn wait_task_completion_with_timeout(
    client: &VcdClient,
    task: &Task,
    timeout: Duration,
) -> Result<Task> {
    let options = TaskWaitOptions::new(timeout, client.task_wait().interval());
    wait_task_completion(client, task, options).await
}

/// Sleep for `interval`, returning `Cancelled` early if `cancel` fires
pub(crate) async fn sleep_or_cancel(
    interval: Duration,
    cancel: Option<&CancellationToken>,
    operation: Operation,
    entity: &str,
) -> Result<()> {
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Err(VcdError::cancelled(operation, entity)),
            _ = tokio::time::sleep(interval) => Ok(()),
        },
        None => {
            tokio::time::sleep(interval).await;
            Ok(())
        }
    }
}

fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
