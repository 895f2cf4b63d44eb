// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Incident records and their delivery to evidence storage and the alert backend

mod dispatcher;
mod history;
mod notifier;
mod storage;

pub use dispatcher::IncidentDispatcher;
pub use history::{IncidentLog, IncidentRecord};
pub use notifier::{AlertDetection, AlertNotifier, AlertPayload, BackendNotifier, NotifyError};
pub use storage::{EvidenceStore, GcsStore, LocalStore, StoreError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::detection::{BoundingBox, Detection};

/// Prefix under which evidence objects are stored
pub const EVIDENCE_PREFIX: &str = "exam_incidents";

/// Incident severity, derived from the number of prohibited items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

impl Severity {
    pub fn for_item_count(count: usize) -> Self {
        if count > 1 {
            Severity::High
        } else {
            Severity::Medium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// One prohibited object seen in the incident frame
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentItem {
    pub class_id: u32,
    pub object: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
}

impl From<&Detection> for IncidentItem {
    fn from(detection: &Detection) -> Self {
        Self {
            class_id: detection.class_id,
            object: detection.label.clone(),
            confidence: detection.confidence,
            bbox: detection.bbox,
        }
    }
}

/// A numbered occurrence of prohibited objects in one frame. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    pub session_id: Uuid,
    pub number: u32,
    pub timestamp: DateTime<Utc>,
    pub items: Vec<IncidentItem>,
}

impl Incident {
    pub fn new(session_id: Uuid, number: u32, prohibited: &[Detection]) -> Self {
        Self {
            session_id,
            number,
            timestamp: Utc::now(),
            items: prohibited.iter().map(IncidentItem::from).collect(),
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::for_item_count(self.items.len())
    }

    /// `incident_{number}_{YYYYmmdd_HHMMSS}.jpg`
    pub fn file_name(&self) -> String {
        format!(
            "incident_{}_{}.jpg",
            self.number,
            self.timestamp.format("%Y%m%d_%H%M%S")
        )
    }
}

/// Where the incident image can be found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvidenceRef {
    /// Durable store URL
    Url(String),
    /// `data:image/jpeg;base64,...`
    Inline(String),
}

impl EvidenceRef {
    pub fn as_str(&self) -> &str {
        match self {
            EvidenceRef::Url(url) | EvidenceRef::Inline(url) => url,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EvidenceRef::Url(_) => "url",
            EvidenceRef::Inline(_) => "inline",
        }
    }
}

/// Result of the backend notification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyOutcome {
    Sent,
    Failed,
    /// No backend configured
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub evidence: EvidenceRef,
    pub notify: NotifyOutcome,
}

impl DeliveryReport {
    /// Whether the backend heard about the incident (or was never meant to)
    pub fn delivered(&self) -> bool {
        self.notify != NotifyOutcome::Failed
    }
}

/// Final destination of incidents
#[async_trait]
pub trait IncidentSink: Send + Sync {
    /// Store the evidence and notify the backend. Never fails: every
    /// problem degrades to inline evidence or a failed notification.
    async fn deliver(&self, incident: &Incident, jpeg: &[u8]) -> DeliveryReport;

    /// True when a durable evidence store is configured
    fn durable_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn phone(confidence: f64) -> Detection {
        let mut d = Detection::new(67, "Phone", confidence, BoundingBox { x1: 1, y1: 2, x2: 3, y2: 4 });
        d.prohibited = true;
        d
    }

    #[test]
    fn test_severity_follows_item_count() {
        let one = Incident::new(Uuid::new_v4(), 1, &[phone(0.9)]);
        assert_eq!(one.severity(), Severity::Medium);

        let two = Incident::new(Uuid::new_v4(), 2, &[phone(0.9), phone(0.6)]);
        assert_eq!(two.severity(), Severity::High);
        assert_eq!(serde_json::to_value(two.severity()).unwrap(), "high");
    }

    #[test]
    fn test_file_name_format() {
        let mut incident = Incident::new(Uuid::new_v4(), 3, &[phone(0.9)]);
        incident.timestamp = Utc.with_ymd_and_hms(2026, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(incident.file_name(), "incident_3_20260309_140507.jpg");
    }

    #[test]
    fn test_items_keep_detection_order() {
        let mut book = phone(0.7);
        book.class_id = 73;
        book.label = "Book".into();

        let incident = Incident::new(Uuid::new_v4(), 1, &[book, phone(0.8)]);
        let objects: Vec<_> = incident.items.iter().map(|i| i.object.as_str()).collect();
        assert_eq!(objects, vec!["Book", "Phone"]);
    }
}
