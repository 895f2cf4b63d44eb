// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! LED actuator on the camera board (`GET /led?state=1|0`)

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::{Actuator, ActuatorError};
use crate::config::{DeviceConfig, RuntimeSettings};

pub struct HttpActuator {
    client: reqwest::Client,
    settings: Arc<RuntimeSettings>,
    timeout: Duration,
}

impl HttpActuator {
    pub fn new(settings: Arc<RuntimeSettings>, config: &DeviceConfig) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            settings,
            timeout: Duration::from_millis(config.actuator_timeout_ms),
        })
    }
}

#[async_trait]
impl Actuator for HttpActuator {
    async fn set_alert(&self, on: bool) -> Result<(), ActuatorError> {
        let path = if on { "led?state=1" } else { "led?state=0" };
        let url = self.settings.device().endpoint(path);

        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ActuatorError::Timeout(self.timeout)
                } else {
                    ActuatorError::Unreachable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ActuatorError::BadStatus(response.status().as_u16()));
        }

        debug!("LED {}", if on { "on" } else { "off" });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_http;
    use axum::{extract::Query, routing::get, Router};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    fn actuator_for(addr: &str) -> HttpActuator {
        let settings = Arc::new(RuntimeSettings::new(0.45, addr));
        let config = DeviceConfig {
            address: addr.to_string(),
            capture_timeout_ms: 500,
            actuator_timeout_ms: 300,
            probe_timeout_ms: 500,
        };
        HttpActuator::new(settings, &config).unwrap()
    }

    #[tokio::test]
    async fn test_pulse_switches_on_then_off() {
        let states = Arc::new(Mutex::new(Vec::<String>::new()));
        let seen = states.clone();
        let app = Router::new().route(
            "/led",
            get(move |Query(q): Query<HashMap<String, String>>| {
                let seen = seen.clone();
                async move {
                    seen.lock().push(q.get("state").cloned().unwrap_or_default());
                    "ok"
                }
            }),
        );
        let addr = spawn_http(app).await;

        let actuator = actuator_for(&addr);
        assert!(actuator.pulse(Duration::from_millis(20)).await);
        assert_eq!(*states.lock(), vec!["1".to_string(), "0".to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_actuator_is_not_fatal() {
        let actuator = actuator_for("127.0.0.1:1");
        assert!(!actuator.probe().await);
        assert!(!actuator.pulse(Duration::from_millis(5)).await);
    }
}
