// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Monitor loop: capture, detect, classify, react

use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::session::{LoopPhase, SessionHandle};
use crate::config::{MonitorConfig, RuntimeSettings};
use crate::detection::{analyze, Detector, ProhibitedClasses};
use crate::device::{Actuator, Frame, FrameSource};
use crate::incident::{Incident, IncidentLog, IncidentRecord, IncidentSink};

/// Loop pacing and bounds
#[derive(Debug, Clone, Copy)]
pub struct MonitorTiming {
    pub idle_interval: Duration,
    pub capture_backoff: Duration,
    pub inactive_poll: Duration,
    pub alert_hold: Duration,
    pub delivery_timeout: Duration,
}

impl From<&MonitorConfig> for MonitorTiming {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            idle_interval: Duration::from_millis(config.idle_interval_ms),
            capture_backoff: Duration::from_millis(config.capture_backoff_ms),
            inactive_poll: Duration::from_millis(config.inactive_poll_ms),
            alert_hold: Duration::from_millis(config.alert_hold_ms),
            delivery_timeout: Duration::from_millis(config.delivery_timeout_ms),
        }
    }
}

/// Everything a monitor loop reads or writes
pub struct MonitorContext {
    pub session: SessionHandle,
    pub camera: Arc<dyn FrameSource>,
    pub detector: Arc<dyn Detector>,
    pub actuator: Arc<dyn Actuator>,
    pub sink: Arc<dyn IncidentSink>,
    pub log: Arc<IncidentLog>,
    pub settings: Arc<RuntimeSettings>,
    pub prohibited: ProhibitedClasses,
    pub person_class: Option<u32>,
    pub timing: MonitorTiming,
}

/// Incident deliveries spawned by one session's loop
pub(crate) type Deliveries = Arc<Mutex<JoinSet<()>>>;

/// The running loop of one session and its in-flight deliveries
pub struct MonitorHandle {
    session_id: Uuid,
    cancel: CancellationToken,
    join: JoinHandle<()>,
    deliveries: Deliveries,
}

impl MonitorHandle {
    pub fn spawn(ctx: Arc<MonitorContext>, session_id: Uuid) -> Self {
        let cancel = CancellationToken::new();
        let deliveries = Deliveries::default();
        let join = tokio::spawn(monitor_loop(ctx, session_id, cancel.clone(), deliveries.clone()));

        Self {
            session_id,
            cancel,
            join,
            deliveries,
        }
    }

    /// Cancel and wait up to `grace` for the loop to return, then abort it.
    /// Deliveries already spawned get up to `delivery_wait` to settle.
    pub async fn shutdown(self, grace: Duration, delivery_wait: Duration) {
        self.cancel.cancel();

        let mut join = self.join;
        match tokio::time::timeout(grace, &mut join).await {
            Ok(Ok(())) => debug!("Monitor loop for session {} joined", self.session_id),
            Ok(Err(e)) => warn!("Monitor loop for session {} ended abnormally: {}", self.session_id, e),
            Err(_) => {
                warn!(
                    "Monitor loop for session {} did not stop within {:?}, aborting",
                    self.session_id, grace
                );
                join.abort();
                let _ = join.await;
            }
        }

        let mut pending = std::mem::take(&mut *self.deliveries.lock());
        if pending.is_empty() {
            return;
        }

        debug!("Waiting for {} deliveries of session {}", pending.len(), self.session_id);
        let drained = tokio::time::timeout(delivery_wait, async {
            while let Some(joined) = pending.join_next().await {
                if let Err(e) = joined {
                    warn!("Delivery task ended abnormally: {}", e);
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                "{} deliveries of session {} still running after {:?}",
                pending.len(),
                self.session_id,
                delivery_wait
            );
            pending.detach_all();
        }
    }
}

/// Sleep unless cancelled first. Returns true on cancellation.
async fn pause(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

pub(crate) async fn monitor_loop(
    ctx: Arc<MonitorContext>,
    session_id: Uuid,
    cancel: CancellationToken,
    deliveries: Deliveries,
) {
    info!("Monitor loop started for session {}", session_id);
    let timing = ctx.timing;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let phase = ctx.session.lock().phase(session_id);
        match phase {
            LoopPhase::Running => {}
            LoopPhase::Idle => {
                if pause(&cancel, timing.inactive_poll).await {
                    break;
                }
                continue;
            }
            LoopPhase::Superseded => {
                debug!("Session {} superseded, loop exiting", session_id);
                break;
            }
        }

        let captured = tokio::select! {
            _ = cancel.cancelled() => break,
            result = ctx.camera.capture() => result,
        };

        let frame = match captured {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Capture failed: {}", e);
                ctx.session.lock().record_capture_failure(session_id);
                if pause(&cancel, timing.capture_backoff).await {
                    break;
                }
                continue;
            }
        };

        let detected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = ctx.detector.detect(&frame) => result,
        };

        let raw = match detected {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Detection failed: {}", e);
                if pause(&cancel, timing.capture_backoff).await {
                    break;
                }
                continue;
            }
        };

        let analysis = analyze(
            raw,
            ctx.settings.confidence_threshold(),
            &ctx.prohibited,
            ctx.person_class,
        );
        ctx.session.lock().record_frame(session_id, analysis.person_count);
        debug!(
            "Frame analysed: {} detections, {} persons",
            analysis.detections.len(),
            analysis.person_count
        );

        if analysis.has_prohibited() && !cancel.is_cancelled() {
            // Numbering re-checks the session under its lock
            let number = ctx.session.lock().record_incident(session_id);
            if let Some(number) = number {
                let incident = Incident::new(session_id, number, &analysis.prohibited());
                handle_incident(&ctx, &deliveries, incident, frame).await;
            }
        }

        if pause(&cancel, timing.idle_interval).await {
            break;
        }
    }

    info!("Monitor loop stopped for session {}", session_id);
}

async fn handle_incident(
    ctx: &Arc<MonitorContext>,
    deliveries: &Deliveries,
    incident: Incident,
    frame: Frame,
) {
    let objects: Vec<&str> = incident.items.iter().map(|item| item.object.as_str()).collect();
    warn!(
        "Incident #{} ({}): {}",
        incident.number,
        incident.severity().as_str(),
        objects.join(", ")
    );

    ctx.actuator.pulse(ctx.timing.alert_hold).await;

    deliveries.lock().spawn(deliver(ctx.clone(), incident, frame));
}

async fn deliver(ctx: Arc<MonitorContext>, incident: Incident, frame: Frame) {
    let number = incident.number;
    let session_id = incident.session_id;

    match tokio::time::timeout(ctx.timing.delivery_timeout, ctx.sink.deliver(&incident, frame.jpeg())).await {
        Ok(report) => {
            if !report.delivered() {
                ctx.session.lock().mark_undelivered(session_id);
            }
            info!(
                "Incident #{} delivered ({} evidence, notification {:?})",
                number,
                report.evidence.kind(),
                report.notify
            );
            ctx.log.push(IncidentRecord::new(&incident, &report));
        }
        Err(_) => {
            warn!(
                "Delivery of incident #{} exceeded {:?}, abandoned",
                number, ctx.timing.delivery_timeout
            );
            ctx.session.lock().mark_undelivered(session_id);
        }
    }
}
