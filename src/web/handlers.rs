// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Control API handlers

use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::{ConfigUpdate, ConfigView, ExamEngine};
use crate::detection::ProhibitedClasses;
use crate::error::ExamError;
use crate::incident::IncidentRecord;

type ApiResult<T> = Result<Json<T>, ExamError>;

const DEFAULT_INCIDENT_LIMIT: usize = 20;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub model: String,
    pub sink_available: bool,
    pub actuator_available: bool,
    pub active: bool,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub status: &'static str,
    pub session_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub device_address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResponse {
    pub status: &'static str,
    pub session_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub incident_count: u32,
    pub undelivered_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_seconds: Option<f64>,
    pub incident_count: u32,
    pub undelivered_count: u32,
    pub frames_analyzed: u64,
    pub capture_failures: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_frame_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_person_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub image: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub device_address: String,
    pub confidence_threshold: f64,
    pub prohibited_classes: ProhibitedClasses,
    pub sink_bucket: Option<String>,
}

impl From<ConfigView> for ConfigResponse {
    fn from(view: ConfigView) -> Self {
        Self {
            device_address: view.device.as_str().to_string(),
            confidence_threshold: view.confidence_threshold,
            prohibited_classes: view.prohibited,
            sink_bucket: view.sink_bucket,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdateResponse {
    pub status: &'static str,
    pub confidence: f64,
    pub device_address: String,
}

#[derive(Debug, Deserialize)]
pub struct IncidentsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct IncidentsResponse {
    pub count: usize,
    pub incidents: Vec<IncidentRecord>,
}

pub async fn health(State(engine): State<Arc<ExamEngine>>) -> Json<HealthResponse> {
    let health = engine.health();
    Json(HealthResponse {
        status: "ok",
        model_loaded: health.model_loaded,
        model: health.model,
        sink_available: health.sink_available,
        actuator_available: health.actuator_available,
        active: health.active,
        version: crate::VERSION,
    })
}

pub async fn start_exam(State(engine): State<Arc<ExamEngine>>) -> ApiResult<StartResponse> {
    let report = engine.start().await?;
    Ok(Json(StartResponse {
        status: "started",
        session_id: report.session.session_id,
        start_time: report.session.started_at,
        device_address: report.device.as_str().to_string(),
    }))
}

pub async fn stop_exam(State(engine): State<Arc<ExamEngine>>) -> ApiResult<StopResponse> {
    let summary = engine.stop().await?;
    Ok(Json(StopResponse {
        status: "stopped",
        session_id: summary.session_id,
        start_time: summary.started_at,
        end_time: summary.ended_at,
        duration_seconds: summary.duration.as_secs_f64(),
        incident_count: summary.incident_count,
        undelivered_count: summary.undelivered_count,
    }))
}

pub async fn exam_status(State(engine): State<Arc<ExamEngine>>) -> Json<StatusResponse> {
    let status = engine.status();
    Json(StatusResponse {
        active: status.active,
        session_id: status.session_id,
        start_time: status.started_at,
        elapsed_seconds: status.elapsed.map(|e| e.as_secs_f64()),
        incident_count: status.incident_count,
        undelivered_count: status.undelivered_count,
        frames_analyzed: status.stats.frames_analyzed,
        capture_failures: status.stats.capture_failures,
        last_frame_at: status.stats.last_frame_at,
        last_person_count: status.stats.last_person_count,
    })
}

pub async fn snapshot(State(engine): State<Arc<ExamEngine>>) -> ApiResult<SnapshotResponse> {
    let frame = engine.snapshot().await?;
    Ok(Json(SnapshotResponse {
        image: frame.to_data_url(),
        timestamp: frame.captured_at,
    }))
}

pub async fn recent_incidents(
    State(engine): State<Arc<ExamEngine>>,
    Query(query): Query<IncidentsQuery>,
) -> Json<IncidentsResponse> {
    let incidents = engine.recent_incidents(query.limit.unwrap_or(DEFAULT_INCIDENT_LIMIT));
    Json(IncidentsResponse {
        count: incidents.len(),
        incidents,
    })
}

pub async fn get_config(State(engine): State<Arc<ExamEngine>>) -> Json<ConfigResponse> {
    Json(engine.config_view().into())
}

pub async fn update_config(
    State(engine): State<Arc<ExamEngine>>,
    Json(body): Json<Value>,
) -> ApiResult<ConfigUpdateResponse> {
    let update = parse_update(&body)?;
    let view = engine.update_config(update)?;

    Ok(Json(ConfigUpdateResponse {
        status: "updated",
        confidence: view.confidence_threshold,
        device_address: view.device.as_str().to_string(),
    }))
}

/// Accepts `confidence` as a number or numeric string
fn parse_update(body: &Value) -> Result<ConfigUpdate, ExamError> {
    let object = body
        .as_object()
        .ok_or_else(|| ExamError::InvalidInput("expected a JSON object".into()))?;

    let confidence = match object.get("confidence") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => Some(s.trim().parse::<f64>().map_err(|_| {
            ExamError::InvalidInput(format!("confidence {:?} is not a number", s))
        })?),
        Some(other) => {
            return Err(ExamError::InvalidInput(format!(
                "confidence must be a number, got {}",
                other
            )))
        }
    };

    let device_address = match object.get("deviceAddress") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            return Err(ExamError::InvalidInput(format!(
                "deviceAddress must be a string, got {}",
                other
            )))
        }
    };

    Ok(ConfigUpdate {
        confidence,
        device_address,
    })
}
