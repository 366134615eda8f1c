//! Served-asset log format module
//!
//! Supports two formats:
//! - `text`: `Served asset /app.js - 200 OK (3ms)`
//! - `json`: one JSON object per line

use chrono::{Local, SecondsFormat};
use std::time::Duration;

/// Output format for served-asset lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse a configured format name, falling back to text
    pub fn parse(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// One served request
#[derive(Debug, Clone)]
pub struct ServedEntry {
    pub time: chrono::DateTime<Local>,
    /// Request path as received
    pub path: String,
    pub status: u16,
    /// Outcome classification, e.g. `304 Not Modified`
    pub outcome: String,
    pub elapsed: Duration,
}

impl ServedEntry {
    pub fn new(path: &str, status: u16, outcome: &str, elapsed: Duration) -> Self {
        Self {
            time: Local::now(),
            path: path.to_string(),
            status,
            outcome: outcome.to_string(),
            elapsed,
        }
    }

    pub fn format(&self, format: LogFormat) -> String {
        match format {
            LogFormat::Text => self.format_text(),
            LogFormat::Json => self.format_json(),
        }
    }

    fn format_text(&self) -> String {
        format!(
            "Served asset {} - {} ({}ms)",
            self.path,
            self.outcome,
            self.elapsed.as_millis()
        )
    }

    fn format_json(&self) -> String {
        serde_json::json!({
            "time": self.time.to_rfc3339_opts(SecondsFormat::Millis, false),
            "path": self.path,
            "status": self.status,
            "outcome": self.outcome,
            "elapsed_ms": self.elapsed.as_secs_f64() * 1000.0,
        })
        .to_string()
    }
}
