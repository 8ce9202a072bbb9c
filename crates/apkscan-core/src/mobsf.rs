//! MobSF REST API client.
//!
//! Talks to the v1 endpoints (`upload`, `scan`, `report_json`,
//! `download_pdf`). The API key goes in the `Authorization` header as-is.
//! Every request carries its own deadline so a stuck server cannot hang the
//! batch.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};

use crate::config::ServiceConfig;
use crate::error::TransportError;
use crate::service::{JobHandle, Reply, ScanService};

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const SCAN_TIMEOUT: Duration = Duration::from_secs(120);
const REPORT_TIMEOUT: Duration = Duration::from_secs(60);
const PDF_TIMEOUT: Duration = Duration::from_secs(120);

const APK_MIME: &str = "application/vnd.android.package-archive";

#[derive(Debug)]
pub struct MobsfClient {
    config: ServiceConfig,
    client: Client,
}

impl MobsfClient {
    pub fn new(config: ServiceConfig) -> Result<Self, TransportError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: ServiceConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn post(&self, endpoint: &str, timeout: Duration) -> RequestBuilder {
        self.client
            .post(self.config.endpoint(endpoint))
            .header(reqwest::header::AUTHORIZATION, self.config.api_key())
            .timeout(timeout)
    }

    fn send(request: RequestBuilder) -> Result<Reply, TransportError> {
        let resp = request.send()?;
        let status = resp.status().as_u16();
        let body = resp.bytes()?.to_vec();
        Ok(Reply { status, body })
    }
}

impl ScanService for MobsfClient {
    fn upload(&self, artifact: &Path) -> Result<Reply, TransportError> {
        let bytes = std::fs::read(artifact)?;
        let file_name = artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.apk".to_string());
        let part = Part::bytes(bytes).file_name(file_name).mime_str(APK_MIME)?;
        let form = Form::new().part("file", part);
        Self::send(self.post("upload", UPLOAD_TIMEOUT).multipart(form))
    }

    fn start_scan(&self, handle: &JobHandle, scan_type: &str) -> Result<Reply, TransportError> {
        let form = [("hash", handle.as_str()), ("scan_type", scan_type)];
        Self::send(self.post("scan", SCAN_TIMEOUT).form(&form))
    }

    fn report_json(&self, handle: &JobHandle) -> Result<Reply, TransportError> {
        let form = [("hash", handle.as_str())];
        Self::send(self.post("report_json", REPORT_TIMEOUT).form(&form))
    }

    fn download_pdf(&self, handle: &JobHandle) -> Result<Reply, TransportError> {
        let form = [("hash", handle.as_str())];
        Self::send(self.post("download_pdf", PDF_TIMEOUT).form(&form))
    }
}
