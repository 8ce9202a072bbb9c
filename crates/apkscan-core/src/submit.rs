//! Upload an artifact and kick off its analysis.

use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::SubmissionError;
use crate::service::{JobHandle, Reply, ScanService};

/// Field of the upload reply that carries the job handle.
pub const HANDLE_FIELD: &str = "hash";

/// Upload `artifact` and return the job handle MobSF assigned to it.
pub fn submit(service: &dyn ScanService, artifact: &Path) -> Result<JobHandle, SubmissionError> {
    info!(artifact = %artifact.display(), "uploading");
    let reply = service.upload(artifact)?;
    info!(status = reply.status, "upload answered");
    interpret_upload(&reply)
}

/// Turn an upload reply into a handle, or explain why it was rejected.
pub fn interpret_upload(reply: &Reply) -> Result<JobHandle, SubmissionError> {
    let rejected = |detail: String| SubmissionError::Rejected {
        status: reply.status,
        detail,
    };

    let json: Value = reply
        .parse_json()
        .map_err(|_| rejected(format!("non-JSON response: {}", reply.snippet())))?;

    if !reply.is_success() {
        return Err(rejected(json.to_string()));
    }
    if json.get("error").is_some() {
        return Err(rejected(json.to_string()));
    }

    match json.get(HANDLE_FIELD).and_then(Value::as_str) {
        Some(hash) if !hash.is_empty() => Ok(JobHandle::new(hash)),
        _ => Err(rejected(format!("no {HANDLE_FIELD} in response: {json}"))),
    }
}

/// Ask the service to start scanning. Returns whether it acknowledged.
///
/// A `false` here is not fatal: MobSF may already be analysing the upload,
/// and the report endpoint is polled either way.
pub fn start(service: &dyn ScanService, handle: &JobHandle, scan_type: &str) -> bool {
    info!(%handle, "starting scan");
    match service.start_scan(handle, scan_type) {
        Ok(reply) if reply.is_success() => {
            info!(%handle, status = reply.status, "scan started");
            true
        }
        Ok(reply) => {
            warn!(%handle, status = reply.status, body = %reply.snippet(), "scan kickoff failed, will still poll for the report");
            false
        }
        Err(e) => {
            warn!(%handle, error = %e, "scan request failed, will still poll for the report");
            false
        }
    }
}
