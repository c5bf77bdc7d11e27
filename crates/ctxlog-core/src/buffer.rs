//! Aggregate buffering
//!
//! In aggregate mode every request gets its own [`LogBuffer`]. Header
//! annotations and ordinary log lines are collected there instead of being
//! emitted one by one, and the whole buffer is handed to a shared
//! [`AggregateSink`] once the request is done. The sink is the only object
//! shared across requests; its implementations do their own locking.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// One ordinary log line captured while in aggregate mode
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BufferedLine {
    /// Level name (`INFO`, `WARN`, ...)
    pub level: String,
    /// Log message
    pub message: String,
    /// Fields attached to the logger that produced the line
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<(String, String)>,
    /// Milliseconds since the buffer was created
    pub elapsed_ms: u64,
}

/// Everything a request accumulated, as handed to the sink
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AggregateRecord {
    /// Header annotations (last write wins)
    pub header: BTreeMap<String, Value>,
    /// Log lines in emission order
    pub lines: Vec<BufferedLine>,
}

/// Shared destination for flushed request buffers
pub trait AggregateSink: Send + Sync + 'static {
    /// Accept the record of one finished request
    fn write(&self, record: AggregateRecord);
}

/// Per-request aggregate buffer
pub struct LogBuffer {
    header: Mutex<BTreeMap<String, Value>>,
    lines: Mutex<Vec<BufferedLine>>,
    started: Instant,
    sink: Arc<dyn AggregateSink>,
}

impl LogBuffer {
    /// Create an empty buffer that flushes into `sink`
    pub fn new(sink: Arc<dyn AggregateSink>) -> Self {
        Self {
            header: Mutex::new(BTreeMap::new()),
            lines: Mutex::new(Vec::new()),
            started: Instant::now(),
            sink,
        }
    }

    /// Set a header annotation, replacing any previous value for `name`
    pub fn set_header(&self, name: impl Into<String>, value: impl Into<Value>) {
        lock(&self.header).insert(name.into(), value.into());
    }

    /// Current value of a header annotation
    pub fn header(&self, name: &str) -> Option<Value> {
        lock(&self.header).get(name).cloned()
    }

    /// Copy of all header annotations
    pub fn header_snapshot(&self) -> BTreeMap<String, Value> {
        lock(&self.header).clone()
    }

    /// Append a log line
    pub fn push_line(&self, level: &str, message: impl Into<String>, fields: &[(String, String)]) {
        let line = BufferedLine {
            level: level.to_string(),
            message: message.into(),
            fields: fields.to_vec(),
            elapsed_ms: self.started.elapsed().as_millis() as u64,
        };
        lock(&self.lines).push(line);
    }

    /// Copy of the buffered log lines
    pub fn lines(&self) -> Vec<BufferedLine> {
        lock(&self.lines).clone()
    }

    /// Drain the buffer into a record, leaving it empty
    pub fn take_record(&self) -> AggregateRecord {
        AggregateRecord {
            header: std::mem::take(&mut *lock(&self.header)),
            lines: std::mem::take(&mut *lock(&self.lines)),
        }
    }

    /// Drain the buffer and hand the record to the shared sink
    ///
    /// An empty buffer still produces a record.
    pub fn flush(&self) {
        let record = self.take_record();
        self.sink.write(record);
    }
}

impl std::fmt::Debug for LogBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogBuffer")
            .field("header", &*lock(&self.header))
            .field("lines", &lock(&self.lines).len())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Target for records emitted by [`TracingSink`]
pub const AGGREGATE_TARGET: &str = "ctxlog::aggregate";

/// Sink that emits each record as a single JSON event through `tracing`
#[derive(Clone, Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Create a new tracing sink
    pub fn new() -> Self {
        Self
    }
}

impl AggregateSink for TracingSink {
    fn write(&self, record: AggregateRecord) {
        match serde_json::to_string(&record) {
            Ok(json) => tracing::info!(target: AGGREGATE_TARGET, "{}", json),
            Err(err) => tracing::error!(
                target: AGGREGATE_TARGET,
                error = %err,
                "failed to serialize aggregate record"
            ),
        }
    }
}

/// Bounded in-memory sink (for development/testing)
///
/// Once `max_records` is reached the oldest record is evicted.
pub struct MemorySink {
    records: Mutex<VecDeque<AggregateRecord>>,
    max_records: usize,
}

impl MemorySink {
    /// Create a memory sink holding up to 10 000 records
    pub fn new() -> Self {
        Self::bounded(10_000)
    }

    /// Create a memory sink with the given capacity
    pub fn bounded(max_records: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(max_records.min(1000))),
            max_records: max_records.max(1),
        }
    }

    /// Copy of the stored records, oldest first
    pub fn records(&self) -> Vec<AggregateRecord> {
        lock(&self.records).iter().cloned().collect()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    /// Whether no record has been stored
    pub fn is_empty(&self) -> bool {
        lock(&self.records).is_empty()
    }

    /// Drop all stored records
    pub fn clear(&self) {
        lock(&self.records).clear();
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateSink for MemorySink {
    fn write(&self, record: AggregateRecord) {
        let mut records = lock(&self.records);
        while records.len() >= self.max_records {
            records.pop_front();
        }
        records.push_back(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::capture;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_header_last_write_wins() {
        let buffer = LogBuffer::new(Arc::new(MemorySink::new()));
        buffer.set_header("x", 5);
        buffer.set_header("x", 6);
        assert_eq!(buffer.header("x"), Some(json!(6)));
        assert_eq!(buffer.header_snapshot().len(), 1);
    }

    #[test]
    fn test_lines_keep_order() {
        let buffer = LogBuffer::new(Arc::new(MemorySink::new()));
        buffer.push_line("INFO", "first", &[]);
        buffer.push_line("WARN", "second", &[("k".to_string(), "v".to_string())]);

        let lines = buffer.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].message, "first");
        assert_eq!(lines[1].level, "WARN");
        assert_eq!(lines[1].fields, vec![("k".to_string(), "v".to_string())]);
    }

    #[test]
    fn test_flush_drains_into_sink() {
        let sink = Arc::new(MemorySink::new());
        let buffer = LogBuffer::new(sink.clone());
        buffer.set_header("user", "alice");
        buffer.push_line("INFO", "hello", &[]);
        buffer.flush();

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].header.get("user"), Some(&json!("alice")));
        assert_eq!(records[0].lines.len(), 1);

        assert!(buffer.header_snapshot().is_empty());
        assert!(buffer.lines().is_empty());
    }

    #[test]
    fn test_empty_flush_still_records() {
        let sink = Arc::new(MemorySink::new());
        LogBuffer::new(sink.clone()).flush();
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.records()[0], AggregateRecord::default());
    }

    #[test]
    fn test_memory_sink_evicts_oldest() {
        let sink = MemorySink::bounded(2);
        for i in 0..3 {
            let mut record = AggregateRecord::default();
            record.header.insert("n".to_string(), json!(i));
            sink.write(record);
        }

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].header.get("n"), Some(&json!(1)));
        assert_eq!(records[1].header.get("n"), Some(&json!(2)));

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_tracing_sink_emits_one_json_event_per_record() {
        let (capture, _guard) = capture();
        let buffer = LogBuffer::new(Arc::new(TracingSink::new()));
        buffer.set_header("x", 5);
        buffer.push_line("INFO", "first".to_string(), &[("k".to_string(), "v".to_string())]);
        buffer.push_line("WARN", "second".to_string(), &[]);

        buffer.flush();

        let events = capture.events_for(AGGREGATE_TARGET);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, tracing::Level::INFO);

        let record: serde_json::Value = serde_json::from_str(events[0].message()).unwrap();
        assert_eq!(record["header"]["x"], json!(5));
        assert_eq!(record["lines"][0]["message"], json!("first"));
        assert_eq!(record["lines"][0]["fields"], json!([["k", "v"]]));
        assert_eq!(record["lines"][1]["level"], json!("WARN"));
        assert!(record["lines"][1].get("fields").is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_header_holds_last_value(
            name in "[a-z]{1,8}",
            values in proptest::collection::vec(any::<i64>(), 1..20),
        ) {
            let buffer = LogBuffer::new(Arc::new(MemorySink::new()));
            for value in &values {
                buffer.set_header(name.clone(), *value);
            }
            let last = *values.last().unwrap();
            prop_assert_eq!(buffer.header(&name), Some(json!(last)));
            prop_assert_eq!(buffer.header_snapshot().len(), 1);
        }
    }
}
