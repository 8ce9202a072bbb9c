//! Writing retrieved reports to the output directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::PersistError;
use crate::poll::Report;

/// Destination files for one artifact: `<name>.json` and `<name>.pdf`,
/// where `<name>` is the artifact's full file name (`app.apk.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub pdf: PathBuf,
}

impl OutputPaths {
    pub fn for_artifact(report_dir: &Path, artifact: &Path) -> Self {
        let base = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "artifact".to_string());
        Self {
            json: report_dir.join(format!("{base}.json")),
            pdf: report_dir.join(format!("{base}.pdf")),
        }
    }
}

/// What actually got written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Persisted {
    pub json: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PathBuf>,
}

/// Write the report JSON (pretty, service key order kept) and the PDF when
/// there is one. Existing files are overwritten. Only the JSON write can
/// fail the call; a PDF that cannot be written is logged and left out.
pub fn persist(report: &Report, out: &OutputPaths) -> Result<Persisted, PersistError> {
    let text = serde_json::to_string_pretty(&report.data)?;
    write(&out.json, text.as_bytes())?;
    info!(path = %out.json.display(), "JSON saved");

    let pdf = match &report.pdf {
        Some(bytes) => match write(&out.pdf, bytes) {
            Ok(()) => {
                info!(path = %out.pdf.display(), "PDF saved");
                Some(out.pdf.clone())
            }
            Err(e) => {
                warn!("PDF not saved: {e}");
                None
            }
        },
        None => None,
    };

    Ok(Persisted {
        json: out.json.clone(),
        pdf,
    })
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    std::fs::write(path, bytes).map_err(|source| PersistError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn sample_report(pdf: Option<&[u8]>) -> Report {
        Report {
            data: json!({
                "app_name": "Cycle Tracker",
                "permissions": {
                    "android.permission.INTERNET": {"status": "normal"},
                    "android.permission.ACCESS_FINE_LOCATION": {"status": "dangerous"}
                },
                "trackers": {"detected_trackers": 2},
                "appsec": {"security_score": 48}
            }),
            pdf: pdf.map(<[u8]>::to_vec),
            attempts: 3,
        }
    }

    #[test]
    fn names_outputs_after_artifact_file_name() {
        let out = OutputPaths::for_artifact(Path::new("/reports"), Path::new("/apks/com.demo.apk"));
        assert_eq!(out.json, PathBuf::from("/reports/com.demo.apk.json"));
        assert_eq!(out.pdf, PathBuf::from("/reports/com.demo.apk.pdf"));
    }

    #[test]
    fn json_round_trips_byte_identically() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutputPaths::for_artifact(dir.path(), Path::new("app.apk"));
        let report = sample_report(None);

        persist(&report, &out).unwrap();

        let written = std::fs::read_to_string(&out.json).unwrap();
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, report.data);
        assert_eq!(serde_json::to_string_pretty(&parsed).unwrap(), written);
    }

    #[test]
    fn keeps_service_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutputPaths::for_artifact(dir.path(), Path::new("app.apk"));
        persist(&sample_report(None), &out).unwrap();

        let written = std::fs::read_to_string(&out.json).unwrap();
        let name = written.find("\"app_name\"").unwrap();
        let appsec = written.find("\"appsec\"").unwrap();
        assert!(name < appsec);
    }

    #[test]
    fn writes_pdf_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutputPaths::for_artifact(dir.path(), Path::new("app.apk"));

        let persisted = persist(&sample_report(Some(b"%PDF-1.7 body")), &out).unwrap();

        assert_eq!(persisted.pdf.as_deref(), Some(out.pdf.as_path()));
        assert_eq!(std::fs::read(&out.pdf).unwrap(), b"%PDF-1.7 body");
    }

    #[test]
    fn skips_pdf_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutputPaths::for_artifact(dir.path(), Path::new("app.apk"));

        let persisted = persist(&sample_report(None), &out).unwrap();

        assert!(persisted.pdf.is_none());
        assert!(!out.pdf.exists());
    }

    #[test]
    fn unwritable_pdf_keeps_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutputPaths::for_artifact(dir.path(), Path::new("app.apk"));
        std::fs::create_dir(&out.pdf).unwrap();

        let persisted = persist(&sample_report(Some(b"%PDF-1.7")), &out).unwrap();

        assert!(persisted.pdf.is_none());
        assert_eq!(persisted.json, out.json);
        assert!(out.json.is_file());
        assert!(out.pdf.is_dir());
    }

    #[test]
    fn overwrites_existing_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = OutputPaths::for_artifact(dir.path(), Path::new("app.apk"));
        std::fs::write(&out.json, "stale content that is much longer than needed").unwrap();

        let mut report = sample_report(None);
        report.data = json!({"fresh": true});
        persist(&report, &out).unwrap();

        let written = std::fs::read_to_string(&out.json).unwrap();
        assert_eq!(written, "{\n  \"fresh\": true\n}");
    }

    #[test]
    fn unwritable_destination_is_persist_error() {
        let out = OutputPaths::for_artifact(Path::new("/nonexistent/dir"), Path::new("app.apk"));
        let err = persist(&sample_report(None), &out).unwrap_err();
        assert!(matches!(err, PersistError::Write { .. }));
        assert!(err.to_string().contains("app.apk.json"));
    }
}
