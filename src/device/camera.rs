// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! HTTP still-capture camera (`GET /capture`)

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{CaptureError, Frame, FrameSource};
use crate::config::{DeviceConfig, RuntimeSettings};

/// Camera reached over plain HTTP. The address is re-read from the
/// runtime settings on every call.
pub struct HttpCamera {
    client: reqwest::Client,
    settings: Arc<RuntimeSettings>,
    capture_timeout: Duration,
    probe_timeout: Duration,
}

impl HttpCamera {
    pub fn new(settings: Arc<RuntimeSettings>, config: &DeviceConfig) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            settings,
            capture_timeout: Duration::from_millis(config.capture_timeout_ms),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
        })
    }

    fn classify(&self, err: reqwest::Error, timeout: Duration) -> CaptureError {
        if err.is_timeout() {
            CaptureError::Timeout(timeout)
        } else {
            CaptureError::Unreachable(err.to_string())
        }
    }
}

#[async_trait]
impl FrameSource for HttpCamera {
    async fn capture(&self) -> Result<Frame, CaptureError> {
        let url = self.settings.device().endpoint("capture");

        let response = self
            .client
            .get(&url)
            .timeout(self.capture_timeout)
            .send()
            .await
            .map_err(|e| self.classify(e, self.capture_timeout))?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(CaptureError::BadStatus(response.status().as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(e, self.capture_timeout))?;

        let frame = Frame::decode(body.to_vec()).await?;
        debug!("Captured {}x{} frame ({} bytes) from {}", frame.width, frame.height, frame.jpeg().len(), url);
        Ok(frame)
    }

    async fn probe(&self) -> bool {
        let url = self.settings.device().endpoint("");

        match self.client.get(&url).timeout(self.probe_timeout).send().await {
            Ok(response) => response.status() == reqwest::StatusCode::OK,
            Err(e) => {
                debug!("Probe of {} failed: {}", url, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::frame::encode_test_image;
    use crate::testing::spawn_http;
    use axum::{http::StatusCode, routing::get, Router};
    use image::ImageFormat;

    fn camera_for(addr: &str) -> HttpCamera {
        let settings = Arc::new(RuntimeSettings::new(0.45, addr));
        let config = DeviceConfig {
            address: addr.to_string(),
            capture_timeout_ms: 500,
            actuator_timeout_ms: 200,
            probe_timeout_ms: 500,
        };
        HttpCamera::new(settings, &config).unwrap()
    }

    #[tokio::test]
    async fn test_capture_and_probe() {
        let png = encode_test_image(20, 10, ImageFormat::Png);
        let app = Router::new()
            .route("/", get(|| async { "ESP32-CAM" }))
            .route("/capture", get(move || async move { png.clone() }));
        let addr = spawn_http(app).await;

        let camera = camera_for(&addr);
        assert!(camera.probe().await);

        let frame = camera.capture().await.unwrap();
        assert_eq!((frame.width, frame.height), (20, 10));
        assert_eq!(image::guess_format(frame.jpeg()).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_non_200_capture_is_bad_status() {
        let app = Router::new().route(
            "/capture",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "busy") }),
        );
        let addr = spawn_http(app).await;

        let result = camera_for(&addr).capture().await;
        assert!(matches!(result, Err(CaptureError::BadStatus(503))));
    }

    #[tokio::test]
    async fn test_slow_device_times_out() {
        let app = Router::new().route(
            "/capture",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        );
        let addr = spawn_http(app).await;

        let result = camera_for(&addr).capture().await;
        assert!(matches!(result, Err(CaptureError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_probe_of_closed_port_fails() {
        let camera = camera_for("127.0.0.1:1");
        assert!(!camera.probe().await);
        assert!(matches!(
            camera.capture().await,
            Err(CaptureError::Unreachable(_))
        ));
    }
}
