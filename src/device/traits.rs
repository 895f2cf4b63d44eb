// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Device traits and failure types

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::Frame;

/// Why a capture produced no frame
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture timed out after {0:?}")]
    Timeout(Duration),

    #[error("device unreachable: {0}")]
    Unreachable(String),

    #[error("device answered with HTTP {0}")]
    BadStatus(u16),

    #[error("frame could not be decoded: {0}")]
    Decode(String),
}

/// Why an actuator command failed
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("actuator timed out after {0:?}")]
    Timeout(Duration),

    #[error("actuator unreachable: {0}")]
    Unreachable(String),

    #[error("actuator answered with HTTP {0}")]
    BadStatus(u16),
}

/// Source of still frames
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Pull a single frame
    async fn capture(&self) -> Result<Frame, CaptureError>;

    /// Check that the device answers at all
    async fn probe(&self) -> bool;
}

/// Remote visual alert (the device LED)
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Switch the alert on or off
    async fn set_alert(&self, on: bool) -> Result<(), ActuatorError>;

    /// Availability check; switches the alert off as a side effect
    async fn probe(&self) -> bool {
        self.set_alert(false).await.is_ok()
    }

    /// On, hold, off. Failures are logged and reported as `false`, never raised.
    async fn pulse(&self, hold: Duration) -> bool {
        let switched_on = match self.set_alert(true).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Alert on failed: {}", e);
                false
            }
        };

        tokio::time::sleep(hold).await;

        match self.set_alert(false).await {
            Ok(()) => {
                debug!("Alert pulse finished after {:?}", hold);
                switched_on
            }
            Err(e) => {
                warn!("Alert off failed: {}", e);
                false
            }
        }
    }
}
