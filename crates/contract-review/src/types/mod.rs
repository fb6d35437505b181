//! Core types for jobs, reports and the service wire format

pub mod job;
pub mod report;
pub mod wire;

pub use job::{Document, JobId, JobSnapshot, JobState, SubmitOptions};
pub use report::{Clause, GlobalIssue, Issue, Report};
pub use wire::{AnalysisResult, JobStatusReport, StatusResponse, SubmitResponse, SubmittedJob};
