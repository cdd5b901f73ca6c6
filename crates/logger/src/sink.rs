//! Downstream consumers of finished log records.

use parking_lot::Mutex;
use tracing::info;

use crate::record::LogRecord;

/// Receives finished log records.
///
/// Sinks are infallible on purpose: logging must never abort the operation it
/// is observing, so a sink that cannot accept a record drops it silently.
pub trait LogSink: Send + Sync {
    /// Accept one finished record.
    fn emit(&self, record: LogRecord);
}

/// Routes records through the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: LogRecord) {
        info!(target: "cluster", "{record}");
    }
}

/// Captures records in memory so tests can assert on them afterwards.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    /// Create an empty capture sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All records captured so far, in emission order.
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Just the messages, in emission order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|record| record.message.clone())
            .collect()
    }

    /// Drop everything captured so far.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: LogRecord) {
        self.records.lock().push(record);
    }
}
