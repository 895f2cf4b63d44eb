// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Detection module - classifier access and prohibited-object filtering

mod classification;
mod remote;

pub use classification::{analyze, FrameAnalysis, ProhibitedClasses};
pub use remote::HttpDetector;

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::device::Frame;

/// Axis-aligned box in frame pixel coordinates, always `x1 < x2` and `y1 < y2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    /// Round classifier output to whole pixels; degenerate boxes yield `None`
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Option<Self> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return None;
        }

        let rounded = Self {
            x1: x1.round() as i32,
            y1: y1.round() as i32,
            x2: x2.round() as i32,
            y2: y2.round() as i32,
        };

        if rounded.x1 < rounded.x2 && rounded.y1 < rounded.y2 {
            Some(rounded)
        } else {
            None
        }
    }
}

/// One labelled box reported by the classifier for a single frame
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_id: u32,
    pub label: String,
    pub confidence: f64,
    pub bbox: BoundingBox,
    /// Set by [`analyze`] when the class is configured as prohibited
    pub prohibited: bool,
}

impl Detection {
    pub fn new(class_id: u32, label: impl Into<String>, confidence: f64, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            label: label.into(),
            confidence,
            bbox,
            prohibited: false,
        }
    }
}

/// Why a frame could not be classified
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("detector timed out after {0:?}")]
    Timeout(Duration),

    #[error("detector unreachable: {0}")]
    Unreachable(String),

    #[error("detector answered with HTTP {0}")]
    BadStatus(u16),

    #[error("malformed detector response: {0}")]
    Malformed(String),
}

/// Black-box object classifier
#[async_trait]
pub trait Detector: Send + Sync {
    /// Model identifier, for logs and health
    fn model_name(&self) -> &str;

    /// Human-readable name for a class id, when the model knows it
    fn label(&self, class_id: u32) -> Option<&str>;

    /// Classify one frame
    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, DetectorError>;
}
