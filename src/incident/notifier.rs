// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Alert notifications to the external backend

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use super::{EvidenceRef, Incident, Severity};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification timed out after {0:?}")]
    Timeout(Duration),

    #[error("notification request failed: {0}")]
    Request(String),

    #[error("backend answered with HTTP {0}")]
    BadStatus(u16),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertDetection {
    pub object: String,
    pub confidence: f64,
}

/// Body of `POST /api/exam-alerts`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertPayload {
    pub timestamp: String,
    pub incident_number: u32,
    pub session_id: Uuid,
    pub image_url: String,
    pub detections: Vec<AlertDetection>,
    pub severity: Severity,
}

impl AlertPayload {
    pub fn new(incident: &Incident, evidence: &EvidenceRef) -> Self {
        Self {
            timestamp: incident.timestamp.to_rfc3339(),
            incident_number: incident.number,
            session_id: incident.session_id,
            image_url: evidence.as_str().to_string(),
            detections: incident
                .items
                .iter()
                .map(|item| AlertDetection {
                    object: item.object.clone(),
                    confidence: item.confidence,
                })
                .collect(),
            severity: incident.severity(),
        }
    }
}

#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn notify(&self, payload: &AlertPayload) -> Result<(), NotifyError>;
}

/// JSON POST to `{backend}/api/exam-alerts`
pub struct BackendNotifier {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl BackendNotifier {
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            url: format!("{}/api/exam-alerts", backend_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AlertNotifier for BackendNotifier {
    async fn notify(&self, payload: &AlertPayload) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout(self.timeout)
                } else {
                    NotifyError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(NotifyError::BadStatus(response.status().as_u16()));
        }

        debug!("Backend notified of incident #{}", payload.incident_number);
        Ok(())
    }
}
