//! Task command implementations

use super::CommandContext;
use crate::cli::TaskCommands;
use crate::error::{Result as CliResult, VcdCtlError};
use crate::output::OutputFormat;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use vcd_core::{ProgressCallback, ProgressEvent, Task, TaskStatus, TaskWaitOptions, wait_task_completion};

pub async fn handle_task_command(ctx: &CommandContext<'_>, command: &TaskCommands) -> CliResult<()> {
    match command {
        TaskCommands::Wait {
            href,
            timeout,
            interval,
        } => wait_for_task(ctx, href, *timeout, *interval).await,
    }
}

/// Wait for a task with a spinner; Ctrl-C stops waiting without touching the task
async fn wait_for_task(
    ctx: &CommandContext<'_>,
    href: &str,
    timeout_secs: Option<u64>,
    interval_ms: Option<u64>,
) -> CliResult<()> {
    let client = ctx.client().await?;
    let defaults = client.task_wait();
    let timeout = timeout_secs.map_or_else(|| defaults.timeout(), Duration::from_secs);
    let interval = interval_ms.map_or_else(|| defaults.interval(), Duration::from_millis);

    let task = Task::from_href(client.resolve_href(href)?.to_string());

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed_precise}]") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Waiting for task");

    let options = TaskWaitOptions::new(timeout, interval)
        .with_cancellation(cancel)
        .on_progress(spinner_callback(pb.clone()));
    let result = wait_task_completion(&client, &task, options).await;
    ctrl_c.abort();

    match result {
        Ok(done) => {
            pb.finish_and_clear();
            let format = ctx.output.or(OutputFormat::Table);
            if format.is_structured() || ctx.query.is_some() {
                ctx.print(&done, format)
            } else {
                let summary = json!({
                    "task": done.label(),
                    "operation": done.operation_name,
                    "status": done.status.to_string(),
                    "owner": done.owner,
                    "startTime": done.start_time,
                    "endTime": done.end_time,
                });
                ctx.print(summary, format)
            }
        }
        Err(e) => {
            if !pb.is_finished() {
                pb.abandon();
            }
            Err(VcdCtlError::from(e))
        }
    }
}

fn spinner_callback(pb: ProgressBar) -> ProgressCallback {
    Box::new(move |event| match event {
        ProgressEvent::Started { task } => pb.set_message(format!("Task {task} started")),
        ProgressEvent::Polling {
            task,
            status,
            progress,
            elapsed,
        } => {
            let pct = progress.map(|p| format!(" {p}%")).unwrap_or_default();
            pb.set_message(format!(
                "Task {task}: {}{pct} ({:.0}s)",
                format_task_state(status),
                elapsed.as_secs_f64()
            ));
        }
        ProgressEvent::Completed { task, .. } => {
            pb.finish_with_message(format!("Task {task}: {}", format_task_state(TaskStatus::Success)));
        }
        ProgressEvent::Failed { task, error } => {
            pb.finish_with_message(format!("Task {task} failed: {error}"));
        }
    })
}

/// Task state with a status icon
fn format_task_state(status: TaskStatus) -> String {
    match status {
        TaskStatus::Success => format!("\u{2713} {status}"),
        TaskStatus::Error => format!("\u{2717} {status}"),
        TaskStatus::Aborted => format!("\u{2298} {status}"),
        TaskStatus::Running | TaskStatus::PreRunning => format!("\u{21bb} {status}"),
        _ => status.to_string(),
    }
}
