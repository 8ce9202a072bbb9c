//! Output formatting for batch outcomes.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::{ArtifactError, SubmissionError};
use crate::pipeline::{ArtifactOutcome, Disposition};
use crate::service::{JobHandle, ScanStatus};

/// Flat, serializable view of one [`ArtifactOutcome`].
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub path: PathBuf,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<JobHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ScanStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_acknowledged: Option<bool>,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&ArtifactOutcome> for SummaryRow {
    fn from(o: &ArtifactOutcome) -> Self {
        let (outcome, json, pdf, detail) = match &o.disposition {
            Disposition::Completed(p) => ("completed", Some(p.json.clone()), p.pdf.clone(), None),
            Disposition::Skipped(reason) => ("skipped", None, None, Some(reason.to_string())),
            Disposition::Failed(err) => ("failed", None, None, Some(describe(err))),
        };
        Self {
            path: o.path.clone(),
            outcome,
            sha256: o.sha256.clone(),
            handle: o.handle.clone(),
            status: o.status,
            start_acknowledged: o.start_acknowledged,
            attempts: o.attempts,
            json,
            pdf,
            detail,
        }
    }
}

fn describe(err: &ArtifactError) -> String {
    match err {
        ArtifactError::Submission(SubmissionError::Rejected { status, detail }) => {
            format!("Upload failed (HTTP {status}); server response: {detail}")
        }
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {s}. Use 'text' or 'json'.")),
        }
    }
}

pub fn print_summary(outcomes: &[ArtifactOutcome], format: OutputFormat) {
    println!("{}", render_summary(outcomes, format));
}

pub fn render_summary(outcomes: &[ArtifactOutcome], format: OutputFormat) -> String {
    let rows: Vec<SummaryRow> = outcomes.iter().map(SummaryRow::from).collect();
    match format {
        OutputFormat::Text => render_text(&rows),
        OutputFormat::Json => render_json(&rows),
    }
}

fn count(rows: &[SummaryRow], outcome: &str) -> usize {
    rows.iter().filter(|r| r.outcome == outcome).count()
}

fn render_text(rows: &[SummaryRow]) -> String {
    let mut out = String::new();
    let rule = "=".repeat(70);

    out.push_str(&format!("\n{rule}\nMOBSF SCAN RESULTS\n{rule}\n"));

    let completed: Vec<_> = rows.iter().filter(|r| r.outcome == "completed").collect();
    if !completed.is_empty() {
        out.push_str(&format!("\nREPORTS ({}):\n", completed.len()));
        for r in &completed {
            out.push_str(&format!("  [ OK ] {}", r.path.display()));
            if let Some(json) = &r.json {
                out.push_str(&format!(" -> {}", json.display()));
            }
            if r.pdf.is_none() {
                out.push_str("  (no PDF)");
            }
            out.push('\n');
        }
    }

    let failed: Vec<_> = rows.iter().filter(|r| r.outcome == "failed").collect();
    if !failed.is_empty() {
        out.push_str(&format!("\nFAILED ({}):\n", failed.len()));
        for r in &failed {
            let detail = r.detail.as_deref().unwrap_or("unknown");
            out.push_str(&format!("  [FAIL] {} -- {}\n", r.path.display(), detail));
        }
    }

    let skipped: Vec<_> = rows.iter().filter(|r| r.outcome == "skipped").collect();
    if !skipped.is_empty() {
        out.push_str(&format!("\nSKIPPED ({}):\n", skipped.len()));
        for r in &skipped {
            let detail = r.detail.as_deref().unwrap_or("unknown");
            out.push_str(&format!("  [SKIP] {} -- {}\n", r.path.display(), detail));
        }
    }

    out.push_str("\nSUMMARY:\n");
    out.push_str(&format!("  Total artifacts:     {}\n", rows.len()));
    out.push_str(&format!("  Completed:           {}\n", completed.len()));
    out.push_str(&format!("  Failed:              {}\n", failed.len()));
    out.push_str(&format!("  Skipped:             {}\n", skipped.len()));
    out.push_str(&rule);
    out
}

fn render_json(rows: &[SummaryRow]) -> String {
    let output = serde_json::json!({
        "results": rows,
        "summary": {
            "total": rows.len(),
            "completed": count(rows, "completed"),
            "failed": count(rows, "failed"),
            "skipped": count(rows, "skipped"),
        }
    });
    serde_json::to_string_pretty(&output).unwrap_or_default()
}
