//! The remote analysis service as seen by the pipeline.
//!
//! The pipeline only needs four calls. Interpreting the replies (status
//! codes, JSON bodies, the "not ready" sentinel) is the job of the submitter
//! and the poller, so implementations of [`ScanService`] stay thin transports.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::error::TransportError;

/// Longest body excerpt carried into logs and error messages.
pub const SNIPPET_LEN: usize = 400;

/// Opaque identifier of one remote scan job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-side view of how far a job got.
///
/// `Pending` is the final status of a job whose polling budget ran out while
/// the service still answered "not ready"; `Failed` means the last attempt
/// itself went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Uploaded,
    Started,
    Pending,
    Ready,
    Failed,
}

/// Raw HTTP reply: status code plus body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Reply {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn parse_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// First [`SNIPPET_LEN`] characters of the body, for diagnostics.
    pub fn snippet(&self) -> String {
        if self.body.is_empty() {
            return "<no body>".to_string();
        }
        let text = String::from_utf8_lossy(&self.body);
        let mut out: String = text.chars().take(SNIPPET_LEN).collect();
        if text.chars().count() > SNIPPET_LEN {
            out.push_str("...");
        }
        out
    }
}

/// The four operations of the MobSF REST API the pipeline drives.
pub trait ScanService {
    /// Multipart upload of the artifact bytes.
    fn upload(&self, artifact: &Path) -> Result<Reply, TransportError>;

    /// Ask the service to begin analysis of an uploaded artifact.
    fn start_scan(&self, handle: &JobHandle, scan_type: &str) -> Result<Reply, TransportError>;

    /// Fetch the structured report, or the "not ready" sentinel.
    fn report_json(&self, handle: &JobHandle) -> Result<Reply, TransportError>;

    /// Fetch the rendered PDF report.
    fn download_pdf(&self, handle: &JobHandle) -> Result<Reply, TransportError>;
}
