// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Classifier reached over HTTP (`GET /model`, `POST /detect`)

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{BoundingBox, Detection, Detector, DetectorError};
use crate::config::DetectionConfig;
use crate::device::Frame;

#[derive(Debug, Deserialize)]
struct ModelInfo {
    model: String,
    #[serde(default)]
    labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<RawDetection>,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    class_id: u32,
    #[serde(default)]
    label: Option<String>,
    confidence: f64,
    bbox: [f64; 4],
}

pub struct HttpDetector {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    model: String,
    labels: Vec<String>,
}

impl HttpDetector {
    /// Fetch model metadata. Failure here means the service cannot run.
    pub async fn connect(config: &DetectionConfig) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        let base_url = config.detector_url.trim_end_matches('/').to_string();
        let timeout = Duration::from_millis(config.detector_timeout_ms);

        let response = client
            .get(format!("{}/model", base_url))
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("Detector at {} not reachable", base_url))?;

        if !response.status().is_success() {
            return Err(anyhow!("Detector model query failed: {}", response.status()));
        }

        let info: ModelInfo = response
            .json()
            .await
            .context("Detector returned malformed model info")?;

        info!("Detector model '{}' loaded ({} labels)", info.model, info.labels.len());

        Ok(Self {
            client,
            base_url,
            timeout,
            model: info.model,
            labels: info.labels,
        })
    }

    fn convert(&self, raw: RawDetection) -> Option<Detection> {
        let [x1, y1, x2, y2] = raw.bbox;
        let Some(bbox) = BoundingBox::from_corners(x1, y1, x2, y2) else {
            debug!("Dropping degenerate box for class {}: {:?}", raw.class_id, raw.bbox);
            return None;
        };

        let label = raw
            .label
            .or_else(|| self.label(raw.class_id).map(str::to_string))
            .unwrap_or_else(|| format!("class_{}", raw.class_id));

        Some(Detection::new(raw.class_id, label, raw.confidence, bbox))
    }

    fn classify(&self, err: reqwest::Error) -> DetectorError {
        if err.is_timeout() {
            DetectorError::Timeout(self.timeout)
        } else if err.is_decode() {
            DetectorError::Malformed(err.to_string())
        } else {
            DetectorError::Unreachable(err.to_string())
        }
    }
}

#[async_trait]
impl Detector for HttpDetector {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn label(&self, class_id: u32) -> Option<&str> {
        self.labels.get(class_id as usize).map(String::as_str)
    }

    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, DetectorError> {
        let part = Part::bytes(frame.jpeg().to_vec())
            .file_name("frame.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| DetectorError::Malformed(e.to_string()))?;
        let form = Form::new().part("image", part);

        let response = self
            .client
            .post(format!("{}/detect", self.base_url))
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(DetectorError::BadStatus(response.status().as_u16()));
        }

        let body: DetectResponse = response.json().await.map_err(|e| self.classify(e))?;

        Ok(body
            .detections
            .into_iter()
            .filter_map(|raw| self.convert(raw))
            .collect())
    }
}
