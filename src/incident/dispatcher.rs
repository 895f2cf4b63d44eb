// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Evidence upload with inline fallback, followed by backend notification

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::storage;
use super::{
    AlertNotifier, AlertPayload, BackendNotifier, DeliveryReport, EvidenceRef, EvidenceStore,
    Incident, IncidentSink, NotifyOutcome,
};
use crate::config::SinkConfig;
use crate::device::jpeg_data_url;

pub struct IncidentDispatcher {
    store: Option<Arc<dyn EvidenceStore>>,
    notifier: Option<Arc<dyn AlertNotifier>>,
}

impl IncidentDispatcher {
    pub fn new(store: Option<Arc<dyn EvidenceStore>>, notifier: Option<Arc<dyn AlertNotifier>>) -> Self {
        Self { store, notifier }
    }

    pub fn from_config(config: &SinkConfig) -> Result<Self> {
        let store = storage::from_config(config)?;

        let notifier: Option<Arc<dyn AlertNotifier>> = match &config.backend_url {
            Some(url) => {
                let notifier = BackendNotifier::new(url, Duration::from_millis(config.notify_timeout_ms))?;
                info!("Incident alerts go to {}", notifier.url());
                Some(Arc::new(notifier))
            }
            None => {
                warn!("No backend URL configured, incident alerts are not sent");
                None
            }
        };

        Ok(Self::new(store, notifier))
    }

    async fn store_evidence(&self, incident: &Incident, jpeg: &[u8]) -> EvidenceRef {
        if let Some(store) = &self.store {
            match store.put(&incident.file_name(), jpeg).await {
                Ok(url) => return EvidenceRef::Url(url),
                Err(e) => warn!(
                    "Evidence upload to {} failed for incident #{}: {}, using inline image",
                    store.name(),
                    incident.number,
                    e
                ),
            }
        }

        EvidenceRef::Inline(jpeg_data_url(jpeg))
    }
}

#[async_trait]
impl IncidentSink for IncidentDispatcher {
    async fn deliver(&self, incident: &Incident, jpeg: &[u8]) -> DeliveryReport {
        let evidence = self.store_evidence(incident, jpeg).await;

        let notify = match &self.notifier {
            Some(notifier) => {
                let payload = AlertPayload::new(incident, &evidence);
                match notifier.notify(&payload).await {
                    Ok(()) => NotifyOutcome::Sent,
                    Err(e) => {
                        warn!("Backend notification for incident #{} failed: {}", incident.number, e);
                        NotifyOutcome::Failed
                    }
                }
            }
            None => NotifyOutcome::Disabled,
        };

        DeliveryReport { evidence, notify }
    }

    fn durable_available(&self) -> bool {
        self.store.is_some()
    }
}
