use std::sync::{Mutex, PoisonError};

/// Value carried by a [`MetricEvent`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Text(String),
}

impl From<u32> for MetricValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// A named observation such as `file/video/width`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct MetricEvent {
    pub path: &'static str,
    pub value: MetricValue,
}

impl MetricEvent {
    pub fn new(path: &'static str, value: impl Into<MetricValue>) -> Self {
        Self {
            path,
            value: value.into(),
        }
    }
}

/// Receives observational events. Nothing a sink does may feed back into decoding or mixing.
pub trait MetricsSink: Send + Sync {
    fn send(&self, event: MetricEvent);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn send(&self, _event: MetricEvent) {}
}

/// Forwards events to `tracing` at debug level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn send(&self, event: MetricEvent) {
        match &event.value {
            MetricValue::Int(v) => tracing::debug!(path = event.path, value = *v, "metric"),
            MetricValue::Text(v) => tracing::debug!(path = event.path, value = %v, "metric"),
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MetricsLog {
    events: Mutex<Vec<MetricEvent>>,
}

impl MetricsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MetricEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent value recorded for `path`.
    pub fn last(&self, path: &str) -> Option<MetricValue> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|e| e.path == path)
            .map(|e| e.value.clone())
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetricsSink for MetricsLog {
    fn send(&self, event: MetricEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/monitor/events.rs"]
mod tests;
