//! Timing and attributes for circuit task spans.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Attributes describing one task invocation inside a circuit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSpanAttributes {
    /// Circuit name.
    pub circuit: String,
    /// Task name.
    pub task: String,
    /// Name of the end event the task finished in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_event: Option<String>,
    /// Role of that end event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Duration in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<f64>,
    /// Error message if the task failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskSpanAttributes {
    /// Creates attributes for a task of a circuit.
    #[must_use]
    pub fn new(circuit: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            circuit: circuit.into(),
            task: task.into(),
            ..Default::default()
        }
    }

    /// Sets the end event and its role.
    #[must_use]
    pub fn with_end(mut self, end_event: impl Into<String>, role: impl Into<String>) -> Self {
        self.end_event = Some(end_event.into());
        self.role = Some(role.into());
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Converts to event data, stamped with the current time.
    #[must_use]
    pub fn to_event_data(&self) -> serde_json::Value {
        let mut data = serde_json::to_value(self).unwrap_or_default();
        if let Some(map) = data.as_object_mut() {
            map.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        data
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_span_attributes() {
        let data = TaskSpanAttributes::new("outer", "validate")
            .with_end("End.success", "success")
            .with_duration_ms(1.5)
            .to_event_data();

        assert_eq!(data["circuit"], "outer");
        assert_eq!(data["task"], "validate");
        assert_eq!(data["role"], "success");
        assert_eq!(data["duration_ms"], 1.5);
        assert!(data.get("error").is_none());
        assert!(data["timestamp"].is_string());
    }

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(timer.elapsed_ms() >= 5.0);
    }
}
