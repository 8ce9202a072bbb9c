//! Error taxonomy for the scan pipeline.
//!
//! Every variant here is scoped to a single artifact. The batch driver catches
//! them at the per-artifact boundary and moves on.

use std::path::PathBuf;

use thiserror::Error;

/// The request never produced an HTTP response (connect failure, timeout,
/// unreadable artifact).
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct TransportError {
    pub reason: String,
}

impl TransportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Reasons an artifact is skipped before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("not a file")]
    NotAFile,
    #[error("not .apk")]
    WrongExtension,
    #[error("not a valid APK (not ZIP or missing AndroidManifest.xml)")]
    InvalidArchive,
}

#[derive(Debug, Clone, Error)]
pub enum SubmissionError {
    #[error("HTTP error during upload: {0}")]
    Transport(#[from] TransportError),
    #[error("upload rejected (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },
}

#[derive(Debug, Clone, Error)]
pub enum PollError {
    /// `still_pending` is set when the last reply was the "not ready"
    /// sentinel: the job exists but had not finished within the budget.
    #[error("report not retrieved after {attempts} attempts (last: {last_failure})")]
    Exhausted {
        attempts: u32,
        last_failure: String,
        still_pending: bool,
    },
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why one artifact did not complete.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Poll(#[from] PollError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// Invalid configuration. These are the only errors that stop a batch
/// before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingEnv(&'static str),
    #[error("{0} is empty")]
    Empty(&'static str),
    #[error("max attempts must be at least 1")]
    ZeroAttempts,
    #[error("APK directory not found: {}", .0.display())]
    InputNotFound(PathBuf),
}
