// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Runtime-adjustable parameters shared by the adapters and the monitor loop

use parking_lot::RwLock;

use super::Config;

/// Device address as given by the operator plus the normalised base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAddress {
    raw: String,
    base_url: String,
}

impl DeviceAddress {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_string();
        let base = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.clone()
        } else {
            format!("http://{}", raw)
        };

        Self {
            base_url: base.trim_end_matches('/').to_string(),
            raw,
        }
    }

    /// Address as configured, e.g. `192.168.0.139`
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Base URL without trailing slash, e.g. `http://192.168.0.139`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone)]
struct RuntimeValues {
    confidence_threshold: f64,
    device: DeviceAddress,
}

/// Parameters that `POST /config` may change while the service runs.
///
/// Readers take a copy on every use, so a change is picked up by the next
/// capture or analysed frame without restarting the monitor loop.
#[derive(Debug)]
pub struct RuntimeSettings {
    inner: RwLock<RuntimeValues>,
}

impl RuntimeSettings {
    pub fn new(confidence_threshold: f64, device_address: &str) -> Self {
        Self {
            inner: RwLock::new(RuntimeValues {
                confidence_threshold,
                device: DeviceAddress::parse(device_address),
            }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.detection.confidence_threshold, &config.device.address)
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.inner.read().confidence_threshold
    }

    pub fn device(&self) -> DeviceAddress {
        self.inner.read().device.clone()
    }

    pub fn set_confidence_threshold(&self, value: f64) {
        self.inner.write().confidence_threshold = value;
    }

    pub fn set_device_address(&self, raw: &str) {
        self.inner.write().device = DeviceAddress::parse(raw);
    }
}
