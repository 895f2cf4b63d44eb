// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Scripted collaborators and helpers for unit tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::core::Components;
use crate::detection::{BoundingBox, Detection, Detector, DetectorError};
use crate::device::{Actuator, ActuatorError, CaptureError, Frame, FrameSource};
use crate::incident::{DeliveryReport, EvidenceRef, Incident, IncidentSink, NotifyOutcome};

/// Serve `app` on an ephemeral local port, returning `127.0.0.1:<port>`
pub async fn spawn_http(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

/// Poll `condition` every few milliseconds until it holds or `limit` passes
pub async fn wait_until<F: Fn() -> bool>(limit: Duration, condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

pub fn test_frame() -> Frame {
    Frame::from_jpeg(vec![0xff, 0xd8, 0xff, 0xd9], 4, 4)
}

pub fn detection(class_id: u32, label: &str, confidence: f64) -> Detection {
    Detection::new(class_id, label, confidence, BoundingBox { x1: 10, y1: 10, x2: 60, y2: 90 })
}

/// Config with intervals short enough for tests
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.monitor.idle_interval_ms = 10;
    config.monitor.capture_backoff_ms = 10;
    config.monitor.inactive_poll_ms = 10;
    config.monitor.alert_hold_ms = 1;
    config.monitor.delivery_timeout_ms = 1_000;
    config.monitor.shutdown_grace_ms = 1_000;
    config
}

#[derive(Debug, Clone, Copy)]
pub enum CameraStep {
    Frame,
    Fail,
    /// Never answers within a test's lifetime
    Hang,
}

pub struct ScriptedCamera {
    steps: Mutex<VecDeque<CameraStep>>,
    fallback: CameraStep,
    pub reachable: AtomicBool,
    pub captures: AtomicUsize,
    pub failures: AtomicUsize,
    pub hangs: AtomicUsize,
}

impl ScriptedCamera {
    pub fn new(steps: Vec<CameraStep>, fallback: CameraStep) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback,
            reachable: AtomicBool::new(true),
            captures: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
            hangs: AtomicUsize::new(0),
        }
    }

    pub fn always_ok() -> Self {
        Self::new(Vec::new(), CameraStep::Frame)
    }
}

#[async_trait]
impl FrameSource for ScriptedCamera {
    async fn capture(&self) -> Result<Frame, CaptureError> {
        let step = self.steps.lock().pop_front().unwrap_or(self.fallback);
        match step {
            CameraStep::Frame => {
                self.captures.fetch_add(1, Ordering::SeqCst);
                Ok(test_frame())
            }
            CameraStep::Fail => {
                self.failures.fetch_add(1, Ordering::SeqCst);
                Err(CaptureError::Timeout(Duration::from_millis(1)))
            }
            CameraStep::Hang => {
                self.hangs.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(CaptureError::Timeout(Duration::from_secs(30)))
            }
        }
    }

    async fn probe(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}

/// Returns scripted detection sets, then nothing
pub struct ScriptedDetector {
    frames: Mutex<VecDeque<Vec<Detection>>>,
    pub calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new(frames: Vec<Vec<Detection>>) -> Self {
        Self {
            frames: Mutex::new(frames.into()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    fn model_name(&self) -> &str {
        "scripted"
    }

    fn label(&self, _class_id: u32) -> Option<&str> {
        None
    }

    async fn detect(&self, _frame: &Frame) -> Result<Vec<Detection>, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.frames.lock().pop_front().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct RecordingActuator {
    pub fail: AtomicBool,
    pub commands: Mutex<Vec<bool>>,
}

#[async_trait]
impl Actuator for RecordingActuator {
    async fn set_alert(&self, on: bool) -> Result<(), ActuatorError> {
        self.commands.lock().push(on);
        if self.fail.load(Ordering::SeqCst) {
            Err(ActuatorError::Unreachable("scripted".into()))
        } else {
            Ok(())
        }
    }
}

pub struct RecordingSink {
    pub durable: bool,
    pub notify: NotifyOutcome,
    pub delay: Duration,
    pub delivered: Mutex<Vec<Incident>>,
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self {
            durable: false,
            notify: NotifyOutcome::Sent,
            delay: Duration::ZERO,
            delivered: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingSink {
    pub fn numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<_> = self.delivered.lock().iter().map(|i| i.number).collect();
        numbers.sort_unstable();
        numbers
    }
}

#[async_trait]
impl IncidentSink for RecordingSink {
    async fn deliver(&self, incident: &Incident, jpeg: &[u8]) -> DeliveryReport {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.delivered.lock().push(incident.clone());
        DeliveryReport {
            evidence: EvidenceRef::Inline(crate::device::jpeg_data_url(jpeg)),
            notify: self.notify,
        }
    }

    fn durable_available(&self) -> bool {
        self.durable
    }
}

/// Fakes wired into engine components, with handles kept for assertions
pub struct Fakes {
    pub camera: Arc<ScriptedCamera>,
    pub detector: Arc<ScriptedDetector>,
    pub actuator: Arc<RecordingActuator>,
    pub sink: Arc<RecordingSink>,
}

impl Fakes {
    pub fn new(camera: ScriptedCamera, detector: ScriptedDetector) -> Self {
        Self::with_sink(camera, detector, RecordingSink::default())
    }

    pub fn with_sink(camera: ScriptedCamera, detector: ScriptedDetector, sink: RecordingSink) -> Self {
        Self {
            camera: Arc::new(camera),
            detector: Arc::new(detector),
            actuator: Arc::new(RecordingActuator::default()),
            sink: Arc::new(sink),
        }
    }

    pub fn components(&self) -> Components {
        Components {
            camera: self.camera.clone(),
            detector: self.detector.clone(),
            actuator: self.actuator.clone(),
            sink: self.sink.clone(),
        }
    }
}
