// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Configuration module

mod runtime;

pub use runtime::{DeviceAddress, RuntimeSettings};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP control surface
    pub server: ServerConfig,

    /// Remote camera / LED device
    pub device: DeviceConfig,

    /// Detector and prohibited classes
    pub detection: DetectionConfig,

    /// Monitor loop pacing
    pub monitor: MonitorConfig,

    /// Evidence storage and backend notification
    pub sink: SinkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            device: DeviceConfig::default(),
            detection: DetectionConfig::default(),
            monitor: MonitorConfig::default(),
            sink: SinkConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("examguard"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Apply environment overrides on top of the file configuration
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup("EXAM_DEVICE_ADDRESS") {
            self.device.address = address;
        }
        if let Some(raw) = lookup("EXAM_CONFIDENCE") {
            self.detection.confidence_threshold = raw
                .trim()
                .parse()
                .map_err(|e| anyhow!("EXAM_CONFIDENCE {:?} is not a number: {}", raw, e))?;
        }
        if let Some(url) = lookup("EXAM_BACKEND_URL") {
            self.sink.backend_url = non_empty(url);
        }
        if let Some(bucket) = lookup("EXAM_BUCKET") {
            self.sink.bucket = non_empty(bucket);
        }
        if let Some(token) = lookup("EXAM_STORAGE_TOKEN") {
            self.sink.access_token = non_empty(token);
        }
        if let Some(url) = lookup("EXAM_DETECTOR_URL") {
            self.detection.detector_url = url;
        }
        if let Some(raw) = lookup("PORT") {
            self.server.port = raw
                .trim()
                .parse()
                .map_err(|e| anyhow!("PORT {:?} is not a valid port: {}", raw, e))?;
        }
        Ok(())
    }

    /// Sanity checks that would otherwise surface as confusing runtime failures
    pub fn validate(&self) -> Result<()> {
        if self.detection.prohibited.is_empty() {
            warn!("No prohibited classes configured; incidents will never be raised");
        }
        if self.monitor.idle_interval_ms == 0 {
            return Err(anyhow!("monitor.idle_interval_ms must be greater than zero"));
        }
        if self.device.address.trim().is_empty() {
            return Err(anyhow!("device.address must not be empty"));
        }
        let sink_budget = self.sink.upload_timeout_ms.saturating_add(self.sink.notify_timeout_ms);
        if self.monitor.delivery_timeout_ms <= sink_budget {
            return Err(anyhow!(
                "monitor.delivery_timeout_ms ({}) must exceed sink upload + notify timeouts ({})",
                self.monitor.delivery_timeout_ms,
                sink_budget
            ));
        }
        Ok(())
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            request_timeout_secs: 60,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Remote device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device IP or URL; `http://` is assumed when no scheme is given
    pub address: String,

    /// Frame capture timeout in milliseconds
    pub capture_timeout_ms: u64,

    /// LED request timeout in milliseconds
    pub actuator_timeout_ms: u64,

    /// Reachability probe timeout in milliseconds
    pub probe_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: "192.168.0.139".to_string(),
            capture_timeout_ms: 8_000,
            actuator_timeout_ms: 800,
            probe_timeout_ms: 5_000,
        }
    }
}

/// A detector class id that must not appear during an exam
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProhibitedClass {
    pub class_id: u32,
    /// Display name used in incidents instead of the model label
    pub name: String,
}

/// Detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Base URL of the inference service
    pub detector_url: String,

    /// Inference request timeout in milliseconds
    pub detector_timeout_ms: u64,

    /// Minimum confidence for a detection to count (inclusive)
    pub confidence_threshold: f64,

    /// Class id counted as a person for frame statistics
    pub person_class: Option<u32>,

    /// Prohibited classes
    pub prohibited: Vec<ProhibitedClass>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            detector_url: "http://127.0.0.1:8500".to_string(),
            detector_timeout_ms: 10_000,
            confidence_threshold: 0.45,
            person_class: Some(0),
            prohibited: vec![
                ProhibitedClass { class_id: 67, name: "Phone".to_string() },
                ProhibitedClass { class_id: 73, name: "Book".to_string() },
            ],
        }
    }
}

/// Monitor loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Pause after every analysed frame
    pub idle_interval_ms: u64,

    /// Pause after a failed capture
    pub capture_backoff_ms: u64,

    /// Poll interval while the session is not active
    pub inactive_poll_ms: u64,

    /// How long the LED stays on for an incident
    pub alert_hold_ms: u64,

    /// Upper bound for one incident delivery
    pub delivery_timeout_ms: u64,

    /// How long stop waits for the loop to wind down before aborting it
    pub shutdown_grace_ms: u64,

    /// Number of delivered incidents kept for the incidents endpoint
    pub recent_incidents: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            idle_interval_ms: 500,
            capture_backoff_ms: 500,
            inactive_poll_ms: 1_000,
            alert_hold_ms: 2_000,
            delivery_timeout_ms: 20_000,
            shutdown_grace_ms: 5_000,
            recent_incidents: 100,
        }
    }
}

/// Incident sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Cloud storage bucket for evidence images
    pub bucket: Option<String>,

    /// Storage API endpoint
    pub storage_endpoint: String,

    /// Bearer token for the storage API
    pub access_token: Option<String>,

    /// Local evidence archive, used when no bucket is configured
    pub local_dir: Option<PathBuf>,

    /// Backend receiving incident notifications
    pub backend_url: Option<String>,

    /// Upload timeout in milliseconds
    pub upload_timeout_ms: u64,

    /// Notification timeout in milliseconds
    pub notify_timeout_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            storage_endpoint: "https://storage.googleapis.com".to_string(),
            access_token: None,
            local_dir: None,
            backend_url: None,
            upload_timeout_ms: 10_000,
            notify_timeout_ms: 5_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.server.port, 5001);
        assert_eq!(parsed.detection.prohibited, config.detection.prohibited);
        assert!(parsed.sink.bucket.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("EXAM_DEVICE_ADDRESS", "http://10.0.0.7"),
            ("EXAM_CONFIDENCE", "0.6"),
            ("EXAM_BUCKET", "exam-evidence"),
            ("EXAM_BACKEND_URL", "  "),
            ("PORT", "8080"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.device.address, "http://10.0.0.7");
        assert_eq!(config.detection.confidence_threshold, 0.6);
        assert_eq!(config.sink.bucket.as_deref(), Some("exam-evidence"));
        assert!(config.sink.backend_url.is_none());
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [device]
            address = "10.0.0.9"

            [sink]
            bucket = "exam-evidence"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.device.address, "10.0.0.9");
        assert_eq!(parsed.device.capture_timeout_ms, 8_000);
        assert_eq!(parsed.sink.bucket.as_deref(), Some("exam-evidence"));
        assert_eq!(parsed.detection.prohibited.len(), 2);
    }

    #[test]
    fn test_bad_confidence_override_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| {
            (key == "EXAM_CONFIDENCE").then(|| "high".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_idle_interval() {
        let mut config = Config::default();
        config.monitor.idle_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_delivery_timeout_must_cover_sink_timeouts() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.monitor.delivery_timeout_ms = config.sink.upload_timeout_ms + config.sink.notify_timeout_ms;
        assert!(config.validate().is_err());

        config.sink.notify_timeout_ms = 1_000;
        assert!(config.validate().is_ok());
    }
}
