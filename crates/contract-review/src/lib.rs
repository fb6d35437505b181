//! contract-review: client and job lifecycle controller for asynchronous contract analysis
//!
//! A document is uploaded to the analysis service, which answers with a job id.
//! The [`JobController`] then polls the job until it completes or fails and
//! publishes every transition as a [`JobSnapshot`]. The presentation layer
//! turns those snapshots into view states a front end can render.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod presentation;
pub mod types;

pub use client::{HttpJobClient, JobService};
pub use config::ClientConfig;
pub use controller::JobController;
pub use error::{Error, JobError, Result};
pub use presentation::{PresentationAdapter, ReportView, ViewState};
pub use types::{
    job::{Document, JobId, JobSnapshot, JobState, SubmitOptions},
    report::{Clause, GlobalIssue, Issue, Report},
};
