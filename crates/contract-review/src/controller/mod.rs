//! Job lifecycle controller
//!
//! Drives one job at a time from submission to a terminal state:
//!
//! ```text
//! Idle ──submit──▶ Uploading ──accepted──▶ Processing(label) ──"complete"──▶ Complete
//!   ▲                  │                        │    ▲
//!   └──── rejected ────┘                        │    └── other label
//!                                               └──"failed" / poll error──▶ Failed
//! ```
//!
//! A new `submit` from any state replaces the current job. Every transition
//! publishes a [`JobSnapshot`] on a watch channel; consumers never see the
//! poll timer itself.

mod poller;

use parking_lot::Mutex;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::client::JobService;
use crate::config::{ClientConfig, MessagesConfig};
use crate::error::{JobError, Result};
use crate::types::{Document, JobId, JobSnapshot, JobState, JobStatusReport, SubmitOptions};

use poller::{Poller, StatusKind};

/// Owns the active job and its poll loop
///
/// Dropping the controller disposes it.
pub struct JobController {
    shared: Arc<Shared>,
}

/// State reachable from both the controller and its poll task
pub(crate) struct Shared {
    service: Arc<dyn JobService>,
    interval: Duration,
    messages: MessagesConfig,
    record: Mutex<JobRecord>,
    snapshots: watch::Sender<JobSnapshot>,
}

/// The single active job
#[derive(Default)]
struct JobRecord {
    /// Bumped on every submission; responses tagged with an older value are stale
    generation: u64,
    revision: u64,
    job_id: Option<JobId>,
    state: JobState,
    error: Option<JobError>,
    poller: Option<Poller>,
    disposed: bool,
}

impl JobRecord {
    fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.cancel();
        }
    }

    fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            revision: self.revision,
            job_id: self.job_id.clone(),
            state: self.state.clone(),
            error: self.error.clone(),
        }
    }
}

impl JobController {
    /// Create a controller polling every `interval`
    pub fn new(service: Arc<dyn JobService>, interval: Duration, messages: MessagesConfig) -> Self {
        let (snapshots, _) = watch::channel(JobSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                service,
                interval,
                messages,
                record: Mutex::new(JobRecord::default()),
                snapshots,
            }),
        }
    }

    /// Create a controller from client configuration
    pub fn from_config(service: Arc<dyn JobService>, config: &ClientConfig) -> Self {
        Self::new(service, config.polling.interval(), config.messages.clone())
    }

    /// Observe snapshot updates
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.shared.snapshots.subscribe()
    }

    /// Current snapshot
    pub fn snapshot(&self) -> JobSnapshot {
        self.shared.snapshots.borrow().clone()
    }

    /// Submit a document, replacing any current job
    ///
    /// Returns the job id once the service has accepted the document; polling
    /// then continues in the background. On rejection the controller is back
    /// in `Idle` with the submission error attached to the snapshot.
    pub async fn submit(
        &self,
        document: Document,
        options: SubmitOptions,
    ) -> std::result::Result<JobId, JobError> {
        let generation = {
            let mut record = self.shared.record.lock();
            if record.disposed {
                return Err(JobError::Disposed);
            }
            record.stop_polling();
            record.generation += 1;
            record.job_id = None;
            record.state = JobState::Uploading;
            record.error = None;
            self.shared.publish(&mut record);
            record.generation
        };

        tracing::info!(
            generation,
            filename = %document.filename,
            service = self.shared.service.name(),
            "Submitting document"
        );

        let result = self.shared.service.submit_job(&document, options).await;

        let mut record = self.shared.record.lock();
        if record.disposed {
            tracing::debug!(generation, "Discarding submission response after dispose");
            return Err(JobError::Disposed);
        }
        if record.generation != generation {
            tracing::debug!(generation, "Discarding submission response for replaced job");
            return Err(JobError::Superseded);
        }

        match result {
            Ok(submitted) => {
                tracing::info!(
                    job_id = %submitted.job_id,
                    status = %submitted.status,
                    "Job accepted, polling every {:?}",
                    self.shared.interval
                );
                record.job_id = Some(submitted.job_id.clone());
                record.state = JobState::Processing(submitted.status);
                self.shared.publish(&mut record);
                record.poller = Some(Poller::spawn(
                    Arc::clone(&self.shared),
                    generation,
                    submitted.job_id.clone(),
                ));
                Ok(submitted.job_id)
            }
            Err(e) => {
                tracing::warn!(generation, error = %e, "Submission failed");
                let error = JobError::Submission(self.shared.messages.submission_failed.clone());
                record.state = JobState::Idle;
                record.error = Some(error.clone());
                self.shared.publish(&mut record);
                Err(error)
            }
        }
    }

    /// Stop polling and silence all further updates. Idempotent.
    pub fn dispose(&self) {
        let mut record = self.shared.record.lock();
        if record.disposed {
            return;
        }
        record.disposed = true;
        record.stop_polling();
        tracing::debug!(
            job_id = ?record.job_id,
            state = record.state.label(),
            "Job controller disposed"
        );
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.record.lock().disposed
    }
}

impl Drop for JobController {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Shared {
    fn publish(&self, record: &mut JobRecord) {
        record.revision += 1;
        self.snapshots.send_replace(record.snapshot());
    }

    fn fail(&self, record: &mut JobRecord, error: JobError) {
        tracing::debug!(job_id = ?record.job_id, kind = error.kind(), "Job failed");
        record.state = JobState::Failed {
            message: error.to_string(),
        };
        record.error = Some(error);
        record.poller = None;
        self.publish(record);
    }

    /// Apply one status check. `Break` ends the poll loop.
    fn apply_status(
        &self,
        generation: u64,
        job_id: &JobId,
        result: Result<JobStatusReport>,
    ) -> ControlFlow<()> {
        let mut record = self.record.lock();
        if record.disposed || record.generation != generation || record.state.is_terminal() {
            tracing::debug!(%job_id, "Discarding stale status response");
            return ControlFlow::Break(());
        }

        let status = match result {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(%job_id, error = %e, "Status check failed");
                let error = JobError::Poll(self.messages.status_check_failed.clone());
                self.fail(&mut record, error);
                return ControlFlow::Break(());
            }
        };

        match StatusKind::classify(&status.status) {
            StatusKind::Complete => match status.report {
                Some(report) => {
                    tracing::info!(
                        %job_id,
                        clauses = report.clauses.len(),
                        issues = report.issue_count(),
                        "Analysis complete"
                    );
                    record.state = JobState::Complete {
                        report: Arc::new(report),
                        download_reference: status.download_reference,
                    };
                    record.error = None;
                    record.poller = None;
                    self.publish(&mut record);
                }
                None => {
                    tracing::warn!(%job_id, "Job reported complete without a report");
                    let error = JobError::BusinessFailure(self.messages.missing_report.clone());
                    self.fail(&mut record, error);
                }
            },
            StatusKind::Failed(reason) => {
                let message = status
                    .failure_message
                    .filter(|m| !m.trim().is_empty())
                    .or_else(|| reason.map(str::to_string))
                    .unwrap_or_else(|| self.messages.analysis_failed.clone());
                tracing::warn!(%job_id, %message, "Analysis failed");
                self.fail(&mut record, JobError::BusinessFailure(message));
            }
            StatusKind::InProgress => {
                if record.state.label() != status.status {
                    tracing::debug!(%job_id, status = %status.status, "Job progressed");
                    record.state = JobState::Processing(status.status);
                    self.publish(&mut record);
                }
                return ControlFlow::Continue(());
            }
        }

        ControlFlow::Break(())
    }
}
