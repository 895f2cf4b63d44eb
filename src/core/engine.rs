// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Exam engine - control operations over the session and its monitor loop

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::scheduler::{MonitorContext, MonitorHandle, MonitorTiming};
use super::session::{SessionHandle, SessionStarted, SessionStatus, SessionSummary};
use crate::config::{Config, DeviceAddress, RuntimeSettings};
use crate::detection::{Detector, HttpDetector, ProhibitedClasses};
use crate::device::{Actuator, Frame, FrameSource, HttpActuator, HttpCamera};
use crate::error::ExamError;
use crate::incident::{IncidentDispatcher, IncidentLog, IncidentRecord, IncidentSink};

/// Collaborators the engine drives
pub struct Components {
    pub camera: Arc<dyn FrameSource>,
    pub detector: Arc<dyn Detector>,
    pub actuator: Arc<dyn Actuator>,
    pub sink: Arc<dyn IncidentSink>,
}

impl Components {
    /// HTTP adapters for the configured camera board, detector and sinks.
    /// Fails when the detector model cannot be loaded.
    pub async fn from_config(config: &Config, settings: Arc<RuntimeSettings>) -> Result<Self> {
        let camera = HttpCamera::new(settings.clone(), &config.device)?;
        let actuator = HttpActuator::new(settings, &config.device)?;
        let detector = HttpDetector::connect(&config.detection).await?;
        let sink = IncidentDispatcher::from_config(&config.sink)?;

        Ok(Self {
            camera: Arc::new(camera),
            detector: Arc::new(detector),
            actuator: Arc::new(actuator),
            sink: Arc::new(sink),
        })
    }
}

#[derive(Debug, Clone)]
pub struct StartReport {
    pub session: SessionStarted,
    pub device: DeviceAddress,
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub model_loaded: bool,
    pub model: String,
    pub sink_available: bool,
    pub actuator_available: bool,
    pub active: bool,
}

#[derive(Debug, Clone)]
pub struct ConfigView {
    pub device: DeviceAddress,
    pub confidence_threshold: f64,
    pub prohibited: ProhibitedClasses,
    pub sink_bucket: Option<String>,
}

/// Partial update of the runtime parameters
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub confidence: Option<f64>,
    pub device_address: Option<String>,
}

pub struct ExamEngine {
    config: Arc<Config>,
    settings: Arc<RuntimeSettings>,
    session: SessionHandle,
    context: Arc<MonitorContext>,
    // Serialises start and stop so only one loop ever runs
    monitor: Mutex<Option<MonitorHandle>>,
    actuator_available: bool,
}

impl ExamEngine {
    pub async fn from_config(config: Config) -> Result<Self> {
        let settings = Arc::new(RuntimeSettings::from_config(&config));
        let components = Components::from_config(&config, settings.clone()).await?;
        Ok(Self::new(config, settings, components).await)
    }

    pub async fn new(config: Config, settings: Arc<RuntimeSettings>, components: Components) -> Self {
        let actuator_available = components.actuator.probe().await;
        if !actuator_available {
            warn!("Alert LED not reachable, pulses will be attempted anyway");
        }

        let session = SessionHandle::default();
        let context = Arc::new(MonitorContext {
            session: session.clone(),
            camera: components.camera,
            detector: components.detector,
            actuator: components.actuator,
            sink: components.sink,
            log: Arc::new(IncidentLog::new(config.monitor.recent_incidents)),
            settings: settings.clone(),
            prohibited: ProhibitedClasses::from_config(&config.detection.prohibited),
            person_class: config.detection.person_class,
            timing: MonitorTiming::from(&config.monitor),
        });

        info!(
            "Exam engine ready: model '{}', {} prohibited classes, device {}",
            context.detector.model_name(),
            config.detection.prohibited.len(),
            settings.device().as_str()
        );

        Self {
            config: Arc::new(config),
            settings,
            session,
            context,
            monitor: Mutex::new(None),
            actuator_available,
        }
    }

    pub async fn start(&self) -> Result<StartReport, ExamError> {
        let mut monitor = self.monitor.lock().await;

        if self.session.lock().is_active() {
            return Err(ExamError::AlreadyActive);
        }

        let device = self.settings.device();
        if !self.context.camera.probe().await {
            warn!("Start refused, device {} not reachable", device.as_str());
            return Err(ExamError::DeviceUnreachable(format!(
                "{} did not answer",
                device.as_str()
            )));
        }

        let started = self.session.lock().begin()?;

        if let Some(stale) = monitor.take() {
            stale.shutdown(self.shutdown_grace(), self.context.timing.delivery_timeout).await;
        }
        *monitor = Some(MonitorHandle::spawn(self.context.clone(), started.session_id));

        info!("Exam started: session {} on {}", started.session_id, device.as_str());
        Ok(StartReport {
            session: started,
            device,
        })
    }

    /// Stops the loop and settles its deliveries before the session ends,
    /// so the summary counts every incident outcome.
    pub async fn stop(&self) -> Result<SessionSummary, ExamError> {
        let mut monitor = self.monitor.lock().await;

        if !self.session.lock().is_active() {
            return Err(ExamError::NotActive);
        }

        if let Some(handle) = monitor.take() {
            handle.shutdown(self.shutdown_grace(), self.context.timing.delivery_timeout).await;
        }

        let summary = self.session.lock().end()?;

        info!(
            "Exam stopped: session {}, {:.1}s, {} incidents ({} undelivered)",
            summary.session_id,
            summary.duration.as_secs_f64(),
            summary.incident_count,
            summary.undelivered_count
        );
        Ok(summary)
    }

    /// Never blocks on start/stop in progress
    pub fn status(&self) -> SessionStatus {
        self.session.lock().status()
    }

    pub async fn snapshot(&self) -> Result<Frame, ExamError> {
        self.context.camera.capture().await.map_err(|e| {
            warn!("Snapshot failed: {}", e);
            ExamError::CaptureFailed(e.to_string())
        })
    }

    pub fn config_view(&self) -> ConfigView {
        ConfigView {
            device: self.settings.device(),
            confidence_threshold: self.settings.confidence_threshold(),
            prohibited: self.context.prohibited.clone(),
            sink_bucket: if self.context.sink.durable_available() {
                self.config.sink.bucket.clone()
            } else {
                None
            },
        }
    }

    pub fn update_config(&self, update: ConfigUpdate) -> Result<ConfigView, ExamError> {
        if let Some(confidence) = update.confidence {
            if !confidence.is_finite() {
                return Err(ExamError::InvalidInput(format!(
                    "confidence must be a number, got {}",
                    confidence
                )));
            }
        }
        if let Some(address) = &update.device_address {
            if address.trim().is_empty() {
                return Err(ExamError::InvalidInput("deviceAddress must not be empty".into()));
            }
        }

        if let Some(confidence) = update.confidence {
            self.settings.set_confidence_threshold(confidence);
            info!("Confidence threshold set to {}", confidence);
        }
        if let Some(address) = update.device_address {
            self.settings.set_device_address(&address);
            info!("Device address set to {}", address.trim());
        }

        Ok(self.config_view())
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            model_loaded: true,
            model: self.context.detector.model_name().to_string(),
            sink_available: self.context.sink.durable_available(),
            actuator_available: self.actuator_available,
            active: self.session.lock().is_active(),
        }
    }

    /// Most recently delivered incidents, newest first
    pub fn recent_incidents(&self, limit: usize) -> Vec<IncidentRecord> {
        self.context.log.recent(limit)
    }

    /// Stop an active session, if any, before the process exits
    pub async fn shutdown(&self) {
        match self.stop().await {
            Ok(summary) => info!(
                "Active session {} stopped on shutdown with {} incidents",
                summary.session_id, summary.incident_count
            ),
            Err(ExamError::NotActive) => {}
            Err(e) => warn!("Shutdown stop failed: {}", e),
        }
    }

    fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.config.monitor.shutdown_grace_ms)
    }
}
