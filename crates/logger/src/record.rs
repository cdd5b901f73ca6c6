//! The finished log line handed to sinks.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single finished log line.
///
/// Records are append-only: once emitted to a sink they are never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// When the line was emitted.
    pub timestamp: DateTime<Utc>,
    /// Slash-separated origin of the line (e.g. `kind/create`).
    pub prefix: String,
    /// Line content with the terminating newline stripped.
    pub message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {}",
            self.timestamp.format("%H:%M:%S"),
            self.prefix,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn display_frames_timestamp_and_prefix() {
        let record = LogRecord {
            timestamp: Utc.with_ymd_and_hms(2026, 1, 2, 15, 4, 5).unwrap(),
            prefix: "kind".to_string(),
            message: "ready".to_string(),
        };

        assert_eq!(record.to_string(), "15:04:05 | kind | ready");
    }
}
