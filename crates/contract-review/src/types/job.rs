//! Job lifecycle types shared by the client, controller and views

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::report::Report;
use crate::error::{JobError, Result};

/// Status label the service uses for a finished job
pub const STATUS_COMPLETE: &str = "complete";
/// Status label the service uses for a failed job
pub const STATUS_FAILED: &str = "failed";
/// Label shown while the document is being sent
pub const STATUS_UPLOADING: &str = "uploading";

/// Opaque job identifier assigned by the service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Lifecycle state of the active job
///
/// The report only exists in `Complete` and the failure message only in
/// `Failed`, so neither can be observed out of place.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum JobState {
    #[default]
    Idle,
    Uploading,
    /// Carries the service's status label verbatim
    Processing(String),
    Complete {
        report: Arc<Report>,
        download_reference: Option<String>,
    },
    Failed {
        message: String,
    },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Failed { .. })
    }

    /// Whether a job is in flight (uploading or being processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Uploading | Self::Processing(_))
    }

    /// Short label for logs and status lines
    pub fn label(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Uploading => STATUS_UPLOADING,
            Self::Processing(label) => label.as_str(),
            Self::Complete { .. } => STATUS_COMPLETE,
            Self::Failed { .. } => STATUS_FAILED,
        }
    }
}

/// Consistent view of the controller at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSnapshot {
    /// Incremented on every published update
    pub revision: u64,
    /// Set once the service has accepted the submission
    pub job_id: Option<JobId>,
    pub state: JobState,
    /// Error to show alongside the state (submission error while `Idle`,
    /// poll error or business failure while `Failed`)
    pub error: Option<JobError>,
}

impl JobSnapshot {
    pub fn report(&self) -> Option<&Arc<Report>> {
        match &self.state {
            JobState::Complete { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn download_reference(&self) -> Option<&str> {
        match &self.state {
            JobState::Complete {
                download_reference, ..
            } => download_reference.as_deref(),
            _ => None,
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        match &self.state {
            JobState::Failed { message } => Some(message.as_str()),
            _ => None,
        }
    }

    /// User-visible error string, if any
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// Document to analyse
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

impl Document {
    /// Build a document, guessing the MIME type from the filename
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let filename = filename.into();
        let content_type = mime_guess::from_path(&filename)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        Self {
            filename,
            content_type,
            data: data.into(),
        }
    }

    /// Read a document from disk
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document.docx")
            .to_string();
        Ok(Self::new(filename, data))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Analysis options sent with a submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Ask the service to consult the reference manual (reserved, off by default)
    pub use_reference_manual: bool,
}
