//! Critical-drift alert sinks
//!
//! The trigger (any CRITICAL discrepancy) lives in the auditor; sinks only
//! decide where the alert goes.

use std::sync::Arc;

use shared::audit::AuditAlert;
use tokio::sync::broadcast;

pub trait AlertSink: Send + Sync {
    fn raise(&self, alert: &AuditAlert);
}

/// Structured `error!` on the `audit` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn raise(&self, alert: &AuditAlert) {
        let discrepancies = serde_json::to_string(&alert.discrepancies)
            .unwrap_or_else(|e| format!("<unserializable: {}>", e));
        tracing::error!(
            target: "audit",
            from = %alert.from,
            to = %alert.to,
            count = alert.discrepancies.len(),
            discrepancies = %discrepancies,
            raised_at = alert.raised_at,
            "{}",
            alert.message
        );
    }
}

/// Publishes alerts on an in-process broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastAlertSink {
    tx: broadcast::Sender<AuditAlert>,
}

impl BroadcastAlertSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuditAlert> {
        self.tx.subscribe()
    }
}

impl AlertSink for BroadcastAlertSink {
    fn raise(&self, alert: &AuditAlert) {
        if self.tx.send(alert.clone()).is_err() {
            tracing::debug!(target: "audit", "No alert subscribers");
        }
    }
}

/// Forwards every alert to each inner sink
#[derive(Clone, Default)]
pub struct FanoutAlertSink {
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl FanoutAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl AlertSink for FanoutAlertSink {
    fn raise(&self, alert: &AuditAlert) {
        for sink in &self.sinks {
            sink.raise(alert);
        }
    }
}
