//! Transport to the remote analysis service
//!
//! The [`JobService`] trait is the seam between the controller and the
//! network. [`HttpJobClient`] is the production implementation; tests drive
//! the controller with scripted in-memory services.

mod http;

pub use http::HttpJobClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Document, JobId, JobStatusReport, SubmitOptions, SubmittedJob};

/// Stateless job transport
///
/// Implementations do not retry. Every failure (network, non-2xx reply,
/// undecodable body) is reported as [`crate::Error::Transport`].
#[async_trait]
pub trait JobService: Send + Sync {
    /// Create a job for `document`
    async fn submit_job(&self, document: &Document, options: SubmitOptions) -> Result<SubmittedJob>;

    /// Fetch the current status of a job
    async fn fetch_status(&self, job_id: &JobId) -> Result<JobStatusReport>;

    /// Service name for logging
    fn name(&self) -> &str;
}
