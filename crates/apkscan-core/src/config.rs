//! Immutable configuration passed into the pipeline.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::error::ConfigError;

pub const URL_ENV: &str = "MOBSF_URL";
pub const API_KEY_ENV: &str = "MOBSF_API_KEY";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_SCAN_TYPE: &str = "apk";

/// Where the MobSF instance lives and how to authenticate against it.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    base_url: String,
    api_key: String,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let api_key = api_key.into().trim().to_string();
        if base_url.is_empty() {
            return Err(ConfigError::Empty(URL_ENV));
        }
        if api_key.is_empty() {
            return Err(ConfigError::Empty(API_KEY_ENV));
        }
        Ok(Self { base_url, api_key })
    }

    /// Read `MOBSF_URL` and `MOBSF_API_KEY` from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var(URL_ENV).map_err(|_| ConfigError::MissingEnv(URL_ENV))?;
        let key = std::env::var(API_KEY_ENV).map_err(|_| ConfigError::MissingEnv(API_KEY_ENV))?;
        Self::new(url, key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path)
    }
}

/// Fixed-count, fixed-interval retry budget for report polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }
        Ok(Self {
            max_attempts,
            interval,
        })
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Recognises the "job exists but has no result yet" reply.
///
/// MobSF answers `{"report": "Report not Found"}` while analysis is running.
/// The field and value are configurable so a change on the service side does
/// not require a code change here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotReadyProbe {
    pub field: String,
    pub value: String,
}

impl NotReadyProbe {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, reply: &Value) -> bool {
        reply
            .get(&self.field)
            .and_then(Value::as_str)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(self.value.trim()))
    }
}

impl Default for NotReadyProbe {
    fn default() -> Self {
        Self::new("report", "Report not Found")
    }
}

/// Everything the driver needs besides the service itself.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub report_dir: PathBuf,
    pub scan_type: String,
    pub poll: PollPolicy,
    pub not_ready: NotReadyProbe,
}

impl PipelineConfig {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
            scan_type: DEFAULT_SCAN_TYPE.to_string(),
            poll: PollPolicy::default(),
            not_ready: NotReadyProbe::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn service_config_strips_trailing_slash() {
        let cfg = ServiceConfig::new("http://mobsf.local:8000/", "k").unwrap();
        assert_eq!(cfg.base_url(), "http://mobsf.local:8000");
        assert_eq!(
            cfg.endpoint("upload"),
            "http://mobsf.local:8000/api/v1/upload"
        );
    }

    #[test]
    fn service_config_rejects_empty_key() {
        let err = ServiceConfig::new("http://mobsf.local", "  ").unwrap_err();
        assert_eq!(err, ConfigError::Empty(API_KEY_ENV));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn service_config_rejects_empty_url() {
        let err = ServiceConfig::new("", "key").unwrap_err();
        assert_eq!(err, ConfigError::Empty(URL_ENV));
    }

    #[test]
    fn from_env_reads_and_checks_both_variables() {
        let saved_url = std::env::var(URL_ENV).ok();
        let saved_key = std::env::var(API_KEY_ENV).ok();

        std::env::remove_var(URL_ENV);
        std::env::set_var(API_KEY_ENV, "key");
        assert_eq!(
            ServiceConfig::from_env().unwrap_err(),
            ConfigError::MissingEnv(URL_ENV)
        );

        std::env::set_var(URL_ENV, "http://mobsf.local:8000/");
        std::env::remove_var(API_KEY_ENV);
        let err = ServiceConfig::from_env().unwrap_err();
        assert_eq!(err, ConfigError::MissingEnv(API_KEY_ENV));
        assert!(err.to_string().contains("not set"));

        std::env::set_var(API_KEY_ENV, "");
        assert_eq!(
            ServiceConfig::from_env().unwrap_err(),
            ConfigError::Empty(API_KEY_ENV)
        );

        std::env::set_var(API_KEY_ENV, "f510bd5d");
        let cfg = ServiceConfig::from_env().unwrap();
        assert_eq!(cfg.base_url(), "http://mobsf.local:8000");
        assert_eq!(cfg.api_key(), "f510bd5d");

        match saved_url {
            Some(val) => std::env::set_var(URL_ENV, val),
            None => std::env::remove_var(URL_ENV),
        }
        match saved_key {
            Some(val) => std::env::set_var(API_KEY_ENV, val),
            None => std::env::remove_var(API_KEY_ENV),
        }
    }

    #[test]
    fn poll_policy_requires_one_attempt() {
        assert_eq!(
            PollPolicy::new(0, Duration::ZERO).unwrap_err(),
            ConfigError::ZeroAttempts
        );
        let policy = PollPolicy::new(1, Duration::ZERO).unwrap();
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn poll_policy_default_matches_service_defaults() {
        let policy = PollPolicy::default();
        assert_eq!(policy.max_attempts, 30);
        assert_eq!(policy.interval, Duration::from_secs(3));
    }

    #[test]
    fn sentinel_matches_mobsf_reply() {
        let sentinel = NotReadyProbe::default();
        assert!(sentinel.matches(&json!({"report": "Report not Found"})));
        assert!(sentinel.matches(&json!({"report": "report not found "})));
    }

    #[test]
    fn sentinel_ignores_real_reports() {
        let sentinel = NotReadyProbe::default();
        assert!(!sentinel.matches(&json!({"app_name": "Demo", "report": {"a": 1}})));
        assert!(!sentinel.matches(&json!({"app_name": "Demo"})));
        assert!(!sentinel.matches(&json!(["Report not Found"])));
    }

    #[test]
    fn sentinel_field_is_configurable() {
        let sentinel = NotReadyProbe::new("status", "pending");
        assert!(sentinel.matches(&json!({"status": "PENDING"})));
        assert!(!sentinel.matches(&json!({"report": "Report not Found"})));
    }
}
