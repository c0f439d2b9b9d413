/// Asynchronous job pipelines
///
/// Each pipeline is an in-process queue plus a worker loop, decoupled
/// from the request path: enqueue is fire-and-forget and a job's
/// failure never reaches the enqueuing caller or its sibling jobs.
/// Failures are terminal (no retries) and are reported on a shared
/// failure channel for logging or alerting.
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

pub mod thumbnail;
pub mod welcome;

use crate::db::users::UserStore;
use crate::files::FileStore;
use crate::notify::Notifier;
use crate::storage::DiskStorage;
pub use thumbnail::{ThumbnailJob, THUMBNAIL_WIDTHS};
pub use welcome::WelcomeJob;

/// Terminal failure of a single job. The message is the
/// machine-checkable reason ("Missing fileId", "File not found", ...).
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct JobError {
    reason: String,
}

impl JobError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<crate::error::Error> for JobError {
    fn from(e: crate::error::Error) -> Self {
        Self {
            reason: e.to_string(),
        }
    }
}

/// A failed job as surfaced on the failure channel
#[derive(Debug)]
pub struct JobFailure {
    pub queue: &'static str,
    pub reason: String,
}

/// Producer handle for a job queue
pub struct JobQueue<J> {
    name: &'static str,
    tx: mpsc::UnboundedSender<J>,
}

// Manual impl: the sender clones regardless of J
impl<J> Clone for JobQueue<J> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
        }
    }
}

impl<J> JobQueue<J> {
    pub fn new(name: &'static str) -> (Self, mpsc::UnboundedReceiver<J>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { name, tx }, rx)
    }

    /// Push a job. Fire-and-forget: a missing worker is logged, never
    /// surfaced to the caller.
    pub fn enqueue(&self, job: J) {
        if self.tx.send(job).is_err() {
            warn!("Queue {} has no worker; dropping job", self.name);
        }
    }
}

/// Worker loop for the thumbnail pipeline. Runs until the queue's
/// producers are all dropped.
pub async fn run_thumbnail_worker(
    store: FileStore,
    storage: DiskStorage,
    mut rx: mpsc::UnboundedReceiver<ThumbnailJob>,
    failures: mpsc::UnboundedSender<JobFailure>,
) {
    while let Some(job) = rx.recv().await {
        debug!("Processing thumbnail job: {:?}", job);
        match thumbnail::process(&store, &storage, &job).await {
            Ok(()) => debug!("Thumbnail job completed"),
            Err(e) => report_failure(&failures, thumbnail::QUEUE_NAME, e),
        }
    }
}

/// Worker loop for the welcome pipeline
pub async fn run_welcome_worker(
    users: UserStore,
    notifier: Notifier,
    mut rx: mpsc::UnboundedReceiver<WelcomeJob>,
    failures: mpsc::UnboundedSender<JobFailure>,
) {
    while let Some(job) = rx.recv().await {
        debug!("Processing welcome job: {:?}", job);
        match welcome::process(&users, &notifier, &job).await {
            Ok(()) => debug!("Welcome job completed"),
            Err(e) => report_failure(&failures, welcome::QUEUE_NAME, e),
        }
    }
}

fn report_failure(failures: &mpsc::UnboundedSender<JobFailure>, queue: &'static str, e: JobError) {
    error!("{} job failed: {}", queue, e);
    let _ = failures.send(JobFailure {
        queue,
        reason: e.to_string(),
    });
}

/// Drain the failure channel into the log. The channel itself is the
/// hook for external alerting; this is the default consumer.
pub async fn log_failures(mut rx: mpsc::UnboundedReceiver<JobFailure>) {
    while let Some(failure) = rx.recv().await {
        error!(queue = failure.queue, reason = %failure.reason, "job failed");
    }
}
