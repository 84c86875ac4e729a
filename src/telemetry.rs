use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{BenchError, Result};

/// Installs the global `tracing` subscriber. Logs go to stderr because
/// stdout carries the measurement output other tools parse.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|err| BenchError::Config(format!("invalid log filter: {err}")))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| BenchError::Config(format!("failed to install subscriber: {err}")))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub kind: String,
    pub timestamp: SystemTime,
    pub detail: serde_json::Value,
}

/// A data point that did not produce a number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailureRecord {
    pub implementation: String,
    pub method: String,
    pub n: u32,
    pub sentinel: String,
    pub error: String,
}

#[derive(Default, Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    failures: Arc<Mutex<Vec<FailureRecord>>>,
}

impl TelemetryCollector {
    pub fn record(&self, kind: impl Into<String>, detail: serde_json::Value) {
        if let Ok(mut events) = self.events.lock() {
            events.push(TelemetryEvent {
                kind: kind.into(),
                timestamp: SystemTime::now(),
                detail,
            });
        }
    }

    pub fn record_failure(&self, failure: FailureRecord) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(failure);
        }
    }

    pub fn failure_count(&self) -> usize {
        self.failures.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn drain(&self) -> (Vec<TelemetryEvent>, Vec<FailureRecord>) {
        let events = self
            .events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default();
        let failures = self
            .failures
            .lock()
            .map(|mut f| std::mem::take(&mut *f))
            .unwrap_or_default();
        (events, failures)
    }
}
