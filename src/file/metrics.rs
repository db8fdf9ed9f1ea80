use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Hooks for counting columnar file activity.
///
/// Implementations must be cheap; every row write and every entry append
/// calls into them.
pub trait FileMetrics: Send + Sync {
    /// Records a completed row write touching `columns` columns.
    fn row_written(&self, columns: usize);

    /// Records one entry of `bytes` total bytes appended to a column.
    fn entry_appended(&self, bytes: usize);

    /// Records a serialization producing `bytes` bytes.
    fn file_serialized(&self, bytes: usize);

    /// Records a successful parse that found `columns` columns.
    fn file_parsed(&self, columns: usize);
}

/// A [`FileMetrics`] that discards everything.
#[derive(Default)]
pub struct NoopMetrics;

impl FileMetrics for NoopMetrics {
    fn row_written(&self, _columns: usize) {}
    fn entry_appended(&self, _bytes: usize) {}
    fn file_serialized(&self, _bytes: usize) {}
    fn file_parsed(&self, _columns: usize) {}
}

/// A thread-safe counter-based implementation of [`FileMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Row writes completed.
    pub rows_written: AtomicU64,

    /// Entries appended across all columns.
    pub entries_appended: AtomicU64,

    /// Entry bytes appended, framing included.
    pub entry_bytes: AtomicU64,

    /// Files serialized.
    pub files_serialized: AtomicU64,

    /// Bytes produced by serialization.
    pub serialized_bytes: AtomicU64,

    /// Files parsed.
    pub files_parsed: AtomicU64,

    /// Columns found while parsing.
    pub columns_parsed: AtomicU64,
}

/// Point-in-time copy of a [`CounterMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// See [`CounterMetrics::rows_written`].
    pub rows_written: u64,
    /// See [`CounterMetrics::entries_appended`].
    pub entries_appended: u64,
    /// See [`CounterMetrics::entry_bytes`].
    pub entry_bytes: u64,
    /// See [`CounterMetrics::files_serialized`].
    pub files_serialized: u64,
    /// See [`CounterMetrics::serialized_bytes`].
    pub serialized_bytes: u64,
    /// See [`CounterMetrics::files_parsed`].
    pub files_parsed: u64,
    /// See [`CounterMetrics::columns_parsed`].
    pub columns_parsed: u64,
}

impl CounterMetrics {
    /// Reads every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rows_written: self.rows_written.load(Ordering::Relaxed),
            entries_appended: self.entries_appended.load(Ordering::Relaxed),
            entry_bytes: self.entry_bytes.load(Ordering::Relaxed),
            files_serialized: self.files_serialized.load(Ordering::Relaxed),
            serialized_bytes: self.serialized_bytes.load(Ordering::Relaxed),
            files_parsed: self.files_parsed.load(Ordering::Relaxed),
            columns_parsed: self.columns_parsed.load(Ordering::Relaxed),
        }
    }
}

impl FileMetrics for CounterMetrics {
    fn row_written(&self, _columns: usize) {
        self.rows_written.fetch_add(1, Ordering::Relaxed);
    }

    fn entry_appended(&self, bytes: usize) {
        self.entries_appended.fetch_add(1, Ordering::Relaxed);
        self.entry_bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn file_serialized(&self, bytes: usize) {
        self.files_serialized.fetch_add(1, Ordering::Relaxed);
        self.serialized_bytes
            .fetch_add(bytes as u64, Ordering::Relaxed);
    }

    fn file_parsed(&self, columns: usize) {
        self.files_parsed.fetch_add(1, Ordering::Relaxed);
        self.columns_parsed
            .fetch_add(columns as u64, Ordering::Relaxed);
    }
}

/// Returns the default metrics implementation, a [`NoopMetrics`].
pub fn default_metrics() -> Arc<dyn FileMetrics> {
    Arc::new(NoopMetrics)
}
