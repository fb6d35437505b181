//! Maps controller snapshots onto renderable view states

use std::sync::Arc;
use tokio::sync::watch;

use crate::client::HttpJobClient;
use crate::types::{JobSnapshot, JobState, Report};

/// Turns a `download_url` into something a view can link to
pub trait DownloadResolver: Send + Sync {
    fn resolve(&self, reference: &str) -> Option<String>;
}

impl DownloadResolver for HttpJobClient {
    fn resolve(&self, reference: &str) -> Option<String> {
        match self.resolve_download_url(reference) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                tracing::warn!("Unusable download reference: {}", e);
                None
            }
        }
    }
}

/// What a view should render
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    /// Upload form, with the last submission error if there was one
    Idle { error: Option<String> },
    /// Progress indicator with the current status label
    Working { status: String },
    Error { message: String },
    Complete {
        report: ReportView,
        download_url: Option<String>,
    },
}

impl ViewState {
    /// Build the view state for a snapshot
    pub fn from_snapshot(snapshot: &JobSnapshot, resolver: Option<&dyn DownloadResolver>) -> Self {
        match &snapshot.state {
            JobState::Idle => Self::Idle {
                error: snapshot.error_message(),
            },
            JobState::Uploading | JobState::Processing(_) => Self::Working {
                status: snapshot.state.label().to_string(),
            },
            JobState::Failed { message } => Self::Error {
                message: message.clone(),
            },
            JobState::Complete {
                report,
                download_reference,
            } => Self::Complete {
                report: ReportView::new(Arc::clone(report)),
                download_url: download_reference.as_deref().and_then(|reference| match resolver {
                    Some(resolver) => resolver.resolve(reference),
                    None => Some(reference.to_string()),
                }),
            },
        }
    }

    /// Whether nothing further will change without a new submission
    pub fn is_settled(&self) -> bool {
        match self {
            Self::Idle { error } => error.is_some(),
            Self::Working { .. } => false,
            Self::Error { .. } | Self::Complete { .. } => true,
        }
    }
}

/// Per-clause line for a report sidebar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseSummary {
    pub id: String,
    pub title: String,
    pub issue_count: usize,
}

impl ClauseSummary {
    pub fn has_issues(&self) -> bool {
        self.issue_count > 0
    }
}

/// Report plus the summaries a view needs to lay it out
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub report: Arc<Report>,
    pub clauses: Vec<ClauseSummary>,
}

impl ReportView {
    pub fn new(report: Arc<Report>) -> Self {
        let clauses = report
            .clauses
            .iter()
            .map(|c| ClauseSummary {
                id: c.id.clone(),
                title: c.title.clone(),
                issue_count: c.issues.len(),
            })
            .collect();
        Self { report, clauses }
    }

    pub fn total_issues(&self) -> usize {
        self.report.issue_count()
    }

    /// Clause shown first when the report opens
    pub fn default_selection(&self) -> Option<&str> {
        self.clauses.first().map(|c| c.id.as_str())
    }
}

/// Follows a controller and yields view states
pub struct PresentationAdapter {
    snapshots: watch::Receiver<JobSnapshot>,
    resolver: Option<Arc<dyn DownloadResolver>>,
}

impl PresentationAdapter {
    pub fn new(snapshots: watch::Receiver<JobSnapshot>) -> Self {
        Self {
            snapshots,
            resolver: None,
        }
    }

    /// Resolve download links with `resolver`
    pub fn with_resolver(mut self, resolver: Arc<dyn DownloadResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// View state for the latest snapshot
    pub fn current(&self) -> ViewState {
        ViewState::from_snapshot(&self.snapshots.borrow(), self.resolver.as_deref())
    }

    /// Wait for the next snapshot. `None` once the controller is gone.
    pub async fn next(&mut self) -> Option<ViewState> {
        self.snapshots.changed().await.ok()?;
        let snapshot = self.snapshots.borrow_and_update().clone();
        Some(ViewState::from_snapshot(&snapshot, self.resolver.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::error::JobError;
    use crate::types::{Clause, GlobalIssue, Issue, JobId};

    fn report() -> Report {
        Report {
            clauses: vec![
                Clause {
                    id: "1".to_string(),
                    title: "Do Objeto".to_string(),
                    original_text: "texto".to_string(),
                    issues: vec![Issue::default(), Issue::default()],
                },
                Clause {
                    id: "2".to_string(),
                    title: "Do Prazo".to_string(),
                    original_text: "texto".to_string(),
                    issues: vec![],
                },
            ],
            global_issues: vec![GlobalIssue::default()],
            ..Default::default()
        }
    }

    fn snapshot(state: JobState, error: Option<JobError>) -> JobSnapshot {
        JobSnapshot {
            revision: 1,
            job_id: Some(JobId::new("J1")),
            state,
            error,
        }
    }

    #[test]
    fn test_maps_every_state() {
        assert_eq!(
            ViewState::from_snapshot(&JobSnapshot::default(), None),
            ViewState::Idle { error: None }
        );
        assert_eq!(
            ViewState::from_snapshot(
                &snapshot(
                    JobState::Idle,
                    Some(JobError::Submission("Erro ao iniciar a análise.".to_string()))
                ),
                None
            ),
            ViewState::Idle {
                error: Some("Erro ao iniciar a análise.".to_string())
            }
        );
        assert_eq!(
            ViewState::from_snapshot(&snapshot(JobState::Uploading, None), None),
            ViewState::Working {
                status: "uploading".to_string()
            }
        );
        assert_eq!(
            ViewState::from_snapshot(&snapshot(JobState::Processing("extracting".to_string()), None), None),
            ViewState::Working {
                status: "extracting".to_string()
            }
        );
        let failed = ViewState::from_snapshot(
            &snapshot(
                JobState::Failed {
                    message: "A análise falhou.".to_string(),
                },
                Some(JobError::BusinessFailure("A análise falhou.".to_string())),
            ),
            None,
        );
        assert_eq!(
            failed,
            ViewState::Error {
                message: "A análise falhou.".to_string()
            }
        );
        assert!(failed.is_settled());
    }

    #[test]
    fn test_complete_resolves_download() {
        let client = HttpJobClient::new(&ServiceConfig::default()).unwrap();
        let state = JobState::Complete {
            report: Arc::new(report()),
            download_reference: Some("/downloads/revisado_contrato.docx".to_string()),
        };

        let view = ViewState::from_snapshot(&snapshot(state, None), Some(&client as &dyn DownloadResolver));
        match view {
            ViewState::Complete { report, download_url } => {
                assert_eq!(
                    download_url.as_deref(),
                    Some("http://localhost:8000/downloads/revisado_contrato.docx")
                );
                assert_eq!(report.total_issues(), 3);
                assert_eq!(report.default_selection(), Some("1"));
                assert!(report.clauses[0].has_issues());
                assert!(!report.clauses[1].has_issues());
            }
            other => panic!("expected complete view, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_adapter_follows_snapshots() {
        let (tx, rx) = watch::channel(JobSnapshot::default());
        let mut adapter = PresentationAdapter::new(rx);
        assert_eq!(adapter.current(), ViewState::Idle { error: None });

        tx.send_replace(snapshot(JobState::Processing("queued".to_string()), None));
        assert_eq!(
            adapter.next().await,
            Some(ViewState::Working {
                status: "queued".to_string()
            })
        );

        drop(tx);
        assert_eq!(adapter.next().await, None);
    }
}
