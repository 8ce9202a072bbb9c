//! Batch driver: validate → submit → start → poll → persist, one artifact at
//! a time. Blocking throughout; a failed artifact never stops the batch.

use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::PipelineConfig;
use crate::error::{ArtifactError, ConfigError, PollError, ValidationError};
use crate::persist::{persist, OutputPaths, Persisted};
use crate::poll::poll;
use crate::service::{JobHandle, ScanService, ScanStatus};
use crate::submit::{start, submit};
use crate::validate::{check_artifact, has_apk_extension};

/// What to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Every `*.apk` directly inside the directory, in file-name order.
    Directory(PathBuf),
    /// One artifact, taken as given.
    Single(PathBuf),
}

/// How one artifact ended.
#[derive(Debug)]
pub enum Disposition {
    Completed(Persisted),
    Skipped(ValidationError),
    Failed(ArtifactError),
}

/// Per-artifact record of what happened.
#[derive(Debug)]
pub struct ArtifactOutcome {
    pub path: PathBuf,
    pub sha256: Option<String>,
    pub handle: Option<JobHandle>,
    /// Furthest stage reached; `None` if nothing was uploaded.
    pub status: Option<ScanStatus>,
    pub start_acknowledged: Option<bool>,
    /// Report requests made.
    pub attempts: u32,
    pub disposition: Disposition,
}

impl ArtifactOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self.disposition, Disposition::Completed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.disposition, Disposition::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.disposition, Disposition::Failed(_))
    }
}

/// Hex SHA-256 of the artifact, recorded so a report can be matched to the
/// exact bytes that were uploaded.
pub fn artifact_digest(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Resolve the input into the ordered list of candidate artifacts.
pub fn collect_artifacts(input: &InputSource) -> Result<Vec<PathBuf>, ConfigError> {
    match input {
        InputSource::Single(path) => Ok(vec![path.clone()]),
        InputSource::Directory(dir) => {
            if !dir.is_dir() {
                return Err(ConfigError::InputNotFound(dir.clone()));
            }
            let files = WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .flatten()
                .map(|entry| entry.into_path())
                .filter(|p| has_apk_extension(p))
                .collect();
            Ok(files)
        }
    }
}

/// Progress made on one artifact before it finished or failed.
#[derive(Debug, Default)]
struct Trace {
    sha256: Option<String>,
    handle: Option<JobHandle>,
    status: Option<ScanStatus>,
    start_acknowledged: Option<bool>,
    attempts: u32,
}

fn drive(
    service: &dyn ScanService,
    config: &PipelineConfig,
    path: &Path,
    trace: &mut Trace,
) -> Result<Persisted, ArtifactError> {
    trace.sha256 = artifact_digest(path).ok();

    let handle =
        submit(service, path).inspect_err(|_| trace.status = Some(ScanStatus::Failed))?;
    trace.handle = Some(handle.clone());
    trace.status = Some(ScanStatus::Uploaded);

    let acknowledged = start(service, &handle, &config.scan_type);
    trace.start_acknowledged = Some(acknowledged);
    if acknowledged {
        trace.status = Some(ScanStatus::Started);
    }

    let report = poll(service, &handle, &config.poll, &config.not_ready).inspect_err(|e| {
        let PollError::Exhausted {
            attempts,
            still_pending,
            ..
        } = e;
        trace.attempts = *attempts;
        trace.status = Some(if *still_pending {
            ScanStatus::Pending
        } else {
            ScanStatus::Failed
        });
    })?;
    trace.attempts = report.attempts;
    trace.status = Some(ScanStatus::Ready);

    let out = OutputPaths::for_artifact(&config.report_dir, path);
    Ok(persist(&report, &out)?)
}

/// Run the full pipeline for one artifact. Remote and local failures end up
/// in the returned record, never in a panic or an early return to the caller.
pub fn process_artifact(
    service: &dyn ScanService,
    config: &PipelineConfig,
    path: &Path,
) -> ArtifactOutcome {
    info!(artifact = %path.display(), "processing");

    let mut trace = Trace::default();
    let disposition = match check_artifact(path) {
        Err(reason) => {
            warn!(artifact = %path.display(), "SKIP: {reason}");
            Disposition::Skipped(reason)
        }
        Ok(()) => match drive(service, config, path, &mut trace) {
            Ok(persisted) => Disposition::Completed(persisted),
            Err(e) => {
                let handle = trace.handle.as_ref().map(JobHandle::as_str);
                error!(artifact = %path.display(), ?handle, "{e}");
                Disposition::Failed(e)
            }
        },
    };

    ArtifactOutcome {
        path: path.to_path_buf(),
        sha256: trace.sha256,
        handle: trace.handle,
        status: trace.status,
        start_acknowledged: trace.start_acknowledged,
        attempts: trace.attempts,
        disposition,
    }
}

/// Process `artifacts` strictly in order, one at a time.
pub fn run_batch(
    service: &dyn ScanService,
    config: &PipelineConfig,
    artifacts: &[PathBuf],
) -> Vec<ArtifactOutcome> {
    let total = artifacts.len();
    artifacts
        .iter()
        .enumerate()
        .map(|(idx, path)| {
            info!("artifact {}/{}", idx + 1, total);
            process_artifact(service, config, path)
        })
        .collect()
}
