//! apkscan - uploads Android packages to MobSF and collects the reports.
//!
//! Usage:
//!   apkscan --apk-dir ./base_apks --report-dir ./mobsf_reports
//!   apkscan --single ./app.apk --report-dir ./mobsf_reports --format json
//!   MOBSF_URL=http://localhost:8000 MOBSF_API_KEY=... apkscan --apk-dir ./apks --tries 60 --interval 5

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use apkscan_core::config::{
    NotReadyProbe, PipelineConfig, PollPolicy, ServiceConfig, API_KEY_ENV, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_SCAN_TYPE, URL_ENV,
};
use apkscan_core::mobsf::MobsfClient;
use apkscan_core::pipeline::{collect_artifacts, run_batch, InputSource};
use apkscan_core::report::{print_summary, OutputFormat};

#[derive(Parser)]
#[command(name = "apkscan")]
#[command(about = "Submit APKs to MobSF and download the scan reports")]
struct Cli {
    /// Directory of .apk files to scan (non-recursive)
    #[arg(long, default_value = "base_apks", conflicts_with = "single")]
    apk_dir: PathBuf,

    /// Path to a single APK to scan instead of a directory
    #[arg(long)]
    single: Option<PathBuf>,

    /// Directory that receives <name>.json and <name>.pdf reports
    #[arg(long, default_value = "mobsf_reports")]
    report_dir: PathBuf,

    /// MobSF base URL
    #[arg(long, env = URL_ENV)]
    url: String,

    /// MobSF REST API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: String,

    /// Report polling attempts per artifact
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    tries: u32,

    /// Seconds to wait between polling attempts
    #[arg(long, default_value = "3")]
    interval: f64,

    /// Scan type sent with the start request
    #[arg(long, default_value = DEFAULT_SCAN_TYPE)]
    scan_type: String,

    /// Report field checked for the "not ready" sentinel
    #[arg(long, default_value = "report")]
    not_ready_field: String,

    /// Sentinel value meaning the report is still being produced
    #[arg(long, default_value = "Report not Found")]
    not_ready_value: String,

    /// Summary format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,apkscan_core=info,apkscan=info")),
        )
        .init();

    let cli = Cli::parse();

    let service = ServiceConfig::new(&cli.url, &cli.api_key).context("invalid MobSF settings")?;
    let interval = Duration::try_from_secs_f64(cli.interval)
        .context("--interval must be a non-negative number of seconds")?;
    let poll = PollPolicy::new(cli.tries, interval).context("invalid polling settings")?;

    std::fs::create_dir_all(&cli.report_dir)
        .with_context(|| format!("Cannot create report dir {}", cli.report_dir.display()))?;

    let input = match cli.single {
        Some(path) => InputSource::Single(path),
        None => InputSource::Directory(cli.apk_dir),
    };
    let artifacts = collect_artifacts(&input)?;

    let config = PipelineConfig {
        report_dir: cli.report_dir,
        scan_type: cli.scan_type,
        poll,
        not_ready: NotReadyProbe::new(cli.not_ready_field, cli.not_ready_value),
    };

    info!(url = service.base_url(), artifacts = artifacts.len(), "starting batch");
    let client = MobsfClient::new(service).context("Cannot build HTTP client")?;
    let outcomes = run_batch(&client, &config, &artifacts);

    if outcomes.is_empty() {
        info!("no APKs to scan");
        return Ok(());
    }

    print_summary(&outcomes, cli.format);

    Ok(())
}
