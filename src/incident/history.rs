// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Bounded in-memory history of delivered incidents

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

use super::{DeliveryReport, Incident, IncidentItem, NotifyOutcome, Severity};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRecord {
    pub number: u32,
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub items: Vec<IncidentItem>,
    pub severity: Severity,
    pub evidence_kind: &'static str,
    pub evidence_ref: String,
    pub notification: NotifyOutcome,
}

impl IncidentRecord {
    pub fn new(incident: &Incident, report: &DeliveryReport) -> Self {
        Self {
            number: incident.number,
            session_id: incident.session_id,
            timestamp: incident.timestamp,
            items: incident.items.clone(),
            severity: incident.severity(),
            evidence_kind: report.evidence.kind(),
            evidence_ref: report.evidence.as_str().to_string(),
            notification: report.notify,
        }
    }
}

/// Ring of the most recent records; the oldest falls out first
pub struct IncidentLog {
    capacity: usize,
    records: Mutex<VecDeque<IncidentRecord>>,
}

impl IncidentLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    pub fn push(&self, record: IncidentRecord) {
        if self.capacity == 0 {
            return;
        }

        let mut records = self.records.lock();
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Newest first
    pub fn recent(&self, limit: usize) -> Vec<IncidentRecord> {
        self.records.lock().iter().rev().take(limit).cloned().collect()
    }
}
