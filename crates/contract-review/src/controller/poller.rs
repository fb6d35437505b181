//! Serialized status polling for one job

use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::Shared;
use crate::types::job::{STATUS_COMPLETE, STATUS_FAILED};
use crate::types::JobId;

/// How a status label drives the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusKind<'a> {
    Complete,
    /// Carries the reason embedded in a `"failed: <reason>"` label
    Failed(Option<&'a str>),
    InProgress,
}

impl<'a> StatusKind<'a> {
    /// Only `"complete"` and `"failed"` are significant; any other label is
    /// an intermediate phase.
    pub(crate) fn classify(label: &'a str) -> Self {
        if label == STATUS_COMPLETE {
            return Self::Complete;
        }
        if label == STATUS_FAILED {
            return Self::Failed(None);
        }
        match label.strip_prefix(STATUS_FAILED).and_then(|rest| rest.strip_prefix(':')) {
            Some(reason) => Self::Failed(Some(reason.trim()).filter(|r| !r.is_empty())),
            None => Self::InProgress,
        }
    }
}

/// Running poll loop
pub(crate) struct Poller {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Poller {
    /// Spawn the loop for `job_id`, tagged with the submission generation
    pub(crate) fn spawn(shared: Arc<Shared>, generation: u64, job_id: JobId) -> Self {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(shared, generation, job_id, cancel.clone()));
        Self { cancel, task }
    }

    /// Stop the loop. Any in-flight status request is dropped.
    pub(crate) fn cancel(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

/// Sleep, check, apply, repeat. The next interval only starts once the
/// previous response has been applied, so at most one request is in flight.
async fn run(shared: Arc<Shared>, generation: u64, job_id: JobId, cancel: CancellationToken) {
    tracing::debug!("Polling job {} every {:?}", job_id, shared.interval);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(shared.interval) => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = shared.service.fetch_status(&job_id) => result,
        };

        if let ControlFlow::Break(()) = shared.apply_status(generation, &job_id, result) {
            break;
        }
    }

    tracing::debug!("Poll loop for job {} stopped", job_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_labels() {
        assert_eq!(StatusKind::classify("complete"), StatusKind::Complete);
        assert_eq!(StatusKind::classify("failed"), StatusKind::Failed(None));
        assert_eq!(
            StatusKind::classify("failed: timeout no LLM"),
            StatusKind::Failed(Some("timeout no LLM"))
        );
        assert_eq!(StatusKind::classify("failed:  "), StatusKind::Failed(None));
        assert_eq!(StatusKind::classify("processing_clauses"), StatusKind::InProgress);
        assert_eq!(StatusKind::classify("failed_over"), StatusKind::InProgress);
        assert_eq!(StatusKind::classify("Complete"), StatusKind::InProgress);
        assert_eq!(StatusKind::classify(""), StatusKind::InProgress);
    }
}
