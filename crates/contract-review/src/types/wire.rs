//! HTTP payloads exchanged with the analysis service

use serde::{Deserialize, Serialize};

use super::job::JobId;
use super::report::Report;

/// Reply to `POST /iniciar_analise`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: String,
}

/// Reply to `GET /status/{job_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub resultado: Option<AnalysisResult>,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// `resultado` is a report when complete and a description when failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    Message(String),
    Report(Report),
}

/// Accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub job_id: JobId,
    /// Initial status label
    pub status: String,
}

impl From<SubmitResponse> for SubmittedJob {
    fn from(resp: SubmitResponse) -> Self {
        Self {
            job_id: JobId::new(resp.job_id),
            status: resp.status,
        }
    }
}

/// Decoded status check
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobStatusReport {
    /// Status label, verbatim
    pub status: String,
    pub report: Option<Report>,
    pub download_reference: Option<String>,
    /// Failure description sent in place of a report
    pub failure_message: Option<String>,
}

impl JobStatusReport {
    /// Status-only report, as sent for jobs still running
    pub fn in_progress(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Default::default()
        }
    }
}

impl From<StatusResponse> for JobStatusReport {
    fn from(resp: StatusResponse) -> Self {
        let (report, failure_message) = match resp.resultado {
            Some(AnalysisResult::Report(report)) => (Some(report), None),
            Some(AnalysisResult::Message(message)) => (None, Some(message)),
            None => (None, None),
        };
        Self {
            status: resp.status,
            report,
            download_reference: resp.download_url,
            failure_message,
        }
    }
}
