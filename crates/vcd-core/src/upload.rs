//! Client-side progress for large binary uploads
//!
//! Uploads (media, OVF disk files) do not produce a server task while the
//! bytes move; progress is tracked locally instead. The transfer runs on its
//! own tokio task and bumps atomic counters as chunks go out, so
//! [`UploadProgress`] can be read from anywhere at any time without locking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures::stream;
use reqwest::Method;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ApiRequest, MediaType, VcdClient};
use crate::error::{Operation, Result, VcdError};

/// Default chunk size for streamed uploads
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

const UPLOAD: &str = "file";

#[derive(Debug, Default)]
struct Counters {
    total: AtomicU64,
    transferred: AtomicU64,
    finished: AtomicBool,
    failed: AtomicBool,
}

/// Shared, lock-free view of one transfer
#[derive(Debug, Clone, Default)]
pub struct UploadProgress {
    counters: Arc<Counters>,
}

impl UploadProgress {
    pub fn new(total: u64) -> Self {
        let progress = Self::default();
        progress.counters.total.store(total, Ordering::Relaxed);
        progress
    }

    pub fn total(&self) -> u64 {
        self.counters.total.load(Ordering::Relaxed)
    }

    pub fn transferred(&self) -> u64 {
        self.counters.transferred.load(Ordering::Relaxed)
    }

    /// Completed share in percent, `0.0..=100.0`
    pub fn percentage(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return if self.is_finished() { 100.0 } else { 0.0 };
        }
        (self.transferred().min(total) as f64 / total as f64) * 100.0
    }

    pub fn is_finished(&self) -> bool {
        self.counters.finished.load(Ordering::Acquire)
    }

    pub fn is_failed(&self) -> bool {
        self.counters.failed.load(Ordering::Acquire)
    }

    /// Finished or failed
    pub fn is_done(&self) -> bool {
        self.is_finished() || self.is_failed()
    }

    pub(crate) fn advance(&self, bytes: u64) {
        self.counters.transferred.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn finish(&self) {
        self.counters.finished.store(true, Ordering::Release);
    }

    pub(crate) fn fail(&self) {
        self.counters.failed.store(true, Ordering::Release);
    }
}

/// A running upload
#[derive(Debug)]
pub struct UploadHandle {
    pub progress: UploadProgress,
    join: JoinHandle<Result<()>>,
}

impl UploadHandle {
    /// Wait for the transfer to end and return its outcome
    pub async fn wait(self) -> Result<()> {
        match self.join.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(VcdError::cancelled(Operation::Upload, UPLOAD)),
        }
    }

    /// Abort the transfer task
    pub fn abort(&self) {
        self.join.abort();
        self.progress.fail();
    }
}

/// Upload settings
#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub chunk_size: usize,
    pub cancel: Option<CancellationToken>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            cancel: None,
        }
    }
}

/// PUT `data` to the transfer URL `href` on a background task
///
/// The returned handle's progress is updated as chunks are handed to the
/// transport.
pub fn spawn_upload(client: &VcdClient, href: &str, data: Bytes, options: UploadOptions) -> UploadHandle {
    let progress = UploadProgress::new(data.len() as u64);
    let client = client.clone();
    let href = href.to_string();
    let task_progress = progress.clone();

    let join = tokio::spawn(async move {
        let result = run_upload(&client, &href, data, &options, &task_progress).await;
        match &result {
            Ok(()) => {
                task_progress.finish();
                info!(href = %href, bytes = task_progress.transferred(), "upload finished");
            }
            Err(e) => {
                task_progress.fail();
                warn!(href = %href, error = %e, "upload failed");
            }
        }
        result
    });

    UploadHandle { progress, join }
}

async fn run_upload(
    client: &VcdClient,
    href: &str,
    data: Bytes,
    options: &UploadOptions,
    progress: &UploadProgress,
) -> Result<()> {
    let url = client.resolve_href(href)?;
    let total = data.len();
    let chunk_size = options.chunk_size.max(1);
    debug!(%url, total, chunk_size, "starting upload");

    let chunks: Vec<Bytes> = (0..total)
        .step_by(chunk_size)
        .map(|start| data.slice(start..(start + chunk_size).min(total)))
        .collect();
    let counter = progress.clone();
    let body = stream::iter(chunks.into_iter().map(move |chunk| {
        counter.advance(chunk.len() as u64);
        Ok::<_, std::io::Error>(chunk)
    }));

    let request = ApiRequest::new(Method::PUT, url)
        .media(MediaType::Legacy)
        .header("Content-Length", total.to_string())
        .stream_body(reqwest::Body::wrap_stream(body))
        .cancel_on(options.cancel.clone());
    client.execute(Operation::Upload, UPLOAD, request).await?;
    Ok(())
}

/// Report `progress.percentage()` every `interval` until the transfer ends
///
/// The callback always sees a final value once the transfer is finished or
/// failed. Returns true when the transfer finished successfully.
pub async fn show_upload_progress<F>(progress: &UploadProgress, interval: Duration, mut callback: F) -> bool
where
    F: FnMut(f64),
{
    loop {
        let done = progress.is_done();
        callback(progress.percentage());
        if done {
            return progress.is_finished();
        }
        tokio::time::sleep(interval).await;
    }
}
