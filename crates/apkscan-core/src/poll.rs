//! Report polling.
//!
//! Each attempt lands in one of three buckets: the report is ready, the job
//! exists but has no result yet, or the attempt failed (transport error,
//! non-2xx, unparseable or error body). Only a ready report ends the loop
//! early. Pending and failed attempts both consume budget and wait the same
//! fixed interval.

use serde_json::Value;
use tracing::{info, warn};

use crate::config::{NotReadyProbe, PollPolicy};
use crate::error::PollError;
use crate::service::{JobHandle, Reply, ScanService};

/// A finished scan as retrieved from the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub data: Value,
    pub pdf: Option<Vec<u8>>,
    /// Number of report requests it took.
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq)]
enum Attempt {
    Ready(Value),
    NotReady,
    Failed(String),
}

fn classify(reply: &Reply, sentinel: &NotReadyProbe) -> Attempt {
    if !reply.is_success() {
        return Attempt::Failed(format!("HTTP {}: {}", reply.status, reply.snippet()));
    }
    let Ok(json) = reply.parse_json() else {
        return Attempt::Failed(format!("non-JSON body: {}", reply.snippet()));
    };
    if sentinel.matches(&json) {
        return Attempt::NotReady;
    }
    if let Some(err) = json.get("error") {
        return Attempt::Failed(format!("service error: {err}"));
    }
    Attempt::Ready(json)
}

/// Poll the report endpoint until the report is ready or the budget runs out.
///
/// On success the rendered PDF is fetched once; losing it only costs the PDF.
pub fn poll(
    service: &dyn ScanService,
    handle: &JobHandle,
    policy: &PollPolicy,
    sentinel: &NotReadyProbe,
) -> Result<Report, PollError> {
    let tries = policy.max_attempts;
    let mut last_failure = String::from("no attempt made");
    let mut still_pending = false;

    for attempt in 1..=tries {
        let outcome = match service.report_json(handle) {
            Ok(reply) => classify(&reply, sentinel),
            Err(e) => Attempt::Failed(format!("transport: {e}")),
        };

        match outcome {
            Attempt::Ready(data) => {
                info!(%handle, attempt, "report ready");
                let pdf = fetch_pdf(service, handle);
                return Ok(Report {
                    data,
                    pdf,
                    attempts: attempt,
                });
            }
            Attempt::NotReady => {
                info!(%handle, "report not ready (try {attempt}/{tries})");
                last_failure = "report not ready".to_string();
                still_pending = true;
            }
            Attempt::Failed(reason) => {
                warn!(%handle, "report_json failed (try {attempt}/{tries}): {reason}");
                last_failure = reason;
                still_pending = false;
            }
        }

        if attempt < tries && !policy.interval.is_zero() {
            std::thread::sleep(policy.interval);
        }
    }

    Err(PollError::Exhausted {
        attempts: tries,
        last_failure,
        still_pending,
    })
}

fn fetch_pdf(service: &dyn ScanService, handle: &JobHandle) -> Option<Vec<u8>> {
    match service.download_pdf(handle) {
        Ok(reply) if reply.is_success() && !reply.body.is_empty() => Some(reply.body),
        Ok(reply) => {
            warn!(%handle, status = reply.status, "PDF not available");
            None
        }
        Err(e) => {
            warn!(%handle, error = %e, "download_pdf failed");
            None
        }
    }
}
