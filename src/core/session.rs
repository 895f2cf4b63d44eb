// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Exam session state machine

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::ExamError;

/// Per-session monitor counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub frames_analyzed: u64,
    pub capture_failures: u64,
    pub last_frame_at: Option<DateTime<Utc>>,
    pub last_person_count: Option<usize>,
}

#[derive(Debug, Clone)]
struct ActivePeriod {
    id: Uuid,
    started_at: DateTime<Utc>,
    started: Instant,
    incident_count: u32,
    undelivered: u32,
    stats: MonitorStats,
}

/// Returned by a successful start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStarted {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
}

/// Returned by a successful stop
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration: Duration,
    pub incident_count: u32,
    pub undelivered_count: u32,
}

/// Point-in-time view for status requests
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub active: bool,
    pub session_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed: Option<Duration>,
    pub incident_count: u32,
    pub undelivered_count: u32,
    pub stats: MonitorStats,
}

/// Where a monitor loop bound to a session id stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    /// Its session is the active one
    Running,
    /// No session is active
    Idle,
    /// Another session has started since; the loop is stale
    Superseded,
}

/// Idle or Active. All Active-only data lives in one `Option`, so start time
/// and counters cannot exist outside an Active period.
#[derive(Debug, Default)]
pub struct ExamSession {
    active: Option<ActivePeriod>,
}

impl ExamSession {
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn begin(&mut self) -> Result<SessionStarted, ExamError> {
        if self.active.is_some() {
            return Err(ExamError::AlreadyActive);
        }

        let period = ActivePeriod {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            started: Instant::now(),
            incident_count: 0,
            undelivered: 0,
            stats: MonitorStats::default(),
        };
        let started = SessionStarted {
            session_id: period.id,
            started_at: period.started_at,
        };
        self.active = Some(period);
        Ok(started)
    }

    pub fn end(&mut self) -> Result<SessionSummary, ExamError> {
        let period = self.active.take().ok_or(ExamError::NotActive)?;

        Ok(SessionSummary {
            session_id: period.id,
            started_at: period.started_at,
            ended_at: Utc::now(),
            duration: period.started.elapsed(),
            incident_count: period.incident_count,
            undelivered_count: period.undelivered,
        })
    }

    pub fn phase(&self, session_id: Uuid) -> LoopPhase {
        match &self.active {
            Some(period) if period.id == session_id => LoopPhase::Running,
            Some(_) => LoopPhase::Superseded,
            None => LoopPhase::Idle,
        }
    }

    fn current_mut(&mut self, session_id: Uuid) -> Option<&mut ActivePeriod> {
        self.active.as_mut().filter(|period| period.id == session_id)
    }

    /// Assign the next incident number, only while `session_id` is active
    pub fn record_incident(&mut self, session_id: Uuid) -> Option<u32> {
        let period = self.current_mut(session_id)?;
        period.incident_count += 1;
        Some(period.incident_count)
    }

    pub fn mark_undelivered(&mut self, session_id: Uuid) -> bool {
        match self.current_mut(session_id) {
            Some(period) => {
                period.undelivered += 1;
                true
            }
            None => false,
        }
    }

    pub fn record_frame(&mut self, session_id: Uuid, person_count: usize) {
        if let Some(period) = self.current_mut(session_id) {
            period.stats.frames_analyzed += 1;
            period.stats.last_frame_at = Some(Utc::now());
            period.stats.last_person_count = Some(person_count);
        }
    }

    pub fn record_capture_failure(&mut self, session_id: Uuid) {
        if let Some(period) = self.current_mut(session_id) {
            period.stats.capture_failures += 1;
        }
    }

    pub fn status(&self) -> SessionStatus {
        match &self.active {
            Some(period) => SessionStatus {
                active: true,
                session_id: Some(period.id),
                started_at: Some(period.started_at),
                elapsed: Some(period.started.elapsed()),
                incident_count: period.incident_count,
                undelivered_count: period.undelivered,
                stats: period.stats.clone(),
            },
            None => SessionStatus {
                active: false,
                session_id: None,
                started_at: None,
                elapsed: None,
                incident_count: 0,
                undelivered_count: 0,
                stats: MonitorStats::default(),
            },
        }
    }
}

/// Shared session. Every transition runs under one lock acquisition.
pub type SessionHandle = Arc<Mutex<ExamSession>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_twice_is_rejected() {
        let mut session = ExamSession::default();
        let first = session.begin().unwrap();
        session.record_incident(first.session_id);

        assert!(matches!(session.begin(), Err(ExamError::AlreadyActive)));

        let status = session.status();
        assert_eq!(status.session_id, Some(first.session_id));
        assert_eq!(status.started_at, Some(first.started_at));
        assert_eq!(status.incident_count, 1);
    }

    #[test]
    fn test_stop_while_idle_is_rejected() {
        let mut session = ExamSession::default();
        assert!(matches!(session.end(), Err(ExamError::NotActive)));

        let started = session.begin().unwrap();
        session.end().unwrap();
        assert!(matches!(session.end(), Err(ExamError::NotActive)));
        assert_eq!(session.phase(started.session_id), LoopPhase::Idle);
    }

    #[test]
    fn test_numbers_are_contiguous_and_reset() {
        let mut session = ExamSession::default();
        let first = session.begin().unwrap().session_id;
        let numbers: Vec<_> = (0..4).filter_map(|_| session.record_incident(first)).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);

        let summary = session.end().unwrap();
        assert_eq!(summary.incident_count, 4);

        let second = session.begin().unwrap().session_id;
        assert_eq!(session.status().incident_count, 0);
        assert_eq!(session.record_incident(second), Some(1));
    }

    #[test]
    fn test_stale_session_cannot_mutate() {
        let mut session = ExamSession::default();
        let old = session.begin().unwrap().session_id;
        session.end().unwrap();

        assert_eq!(session.record_incident(old), None);
        assert!(!session.mark_undelivered(old));

        let new = session.begin().unwrap().session_id;
        assert_eq!(session.phase(old), LoopPhase::Superseded);
        assert_eq!(session.phase(new), LoopPhase::Running);

        session.record_frame(old, 3);
        session.record_capture_failure(old);
        assert_eq!(session.record_incident(old), None);

        let status = session.status();
        assert_eq!(status.incident_count, 0);
        assert_eq!(status.stats, MonitorStats::default());
    }

    #[test]
    fn test_idle_status_has_no_start_time() {
        let session = ExamSession::default();
        let status = session.status();
        assert!(!status.active);
        assert!(status.started_at.is_none());
        assert!(status.elapsed.is_none());
        assert_eq!(status.incident_count, 0);
    }

    #[test]
    fn test_undelivered_still_counts() {
        let handle = SessionHandle::default();
        let id = handle.lock().begin().unwrap().session_id;
        handle.lock().record_incident(id);
        handle.lock().record_incident(id);
        assert!(handle.lock().mark_undelivered(id));
        handle.lock().record_frame(id, 2);
        handle.lock().record_capture_failure(id);

        let status = handle.lock().status();
        assert_eq!(status.incident_count, 2);
        assert_eq!(status.undelivered_count, 1);
        assert_eq!(status.stats.frames_analyzed, 1);
        assert_eq!(status.stats.capture_failures, 1);
        assert_eq!(status.stats.last_person_count, Some(2));

        let summary = handle.lock().end().unwrap();
        assert_eq!((summary.incident_count, summary.undelivered_count), (2, 1));
        assert!(summary.ended_at >= summary.started_at);
    }
}
