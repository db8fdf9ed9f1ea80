use std::fmt;
use std::sync::Arc;

use super::metrics::{default_metrics, FileMetrics};

/// Configuration supplied when creating or loading a [`super::ColumnFile`].
#[derive(Clone)]
pub struct FileOptions {
    /// Reject writes whose value type differs from the column's type.
    pub strict_types: bool,
    /// Require column blocks to tile the data area exactly when parsing.
    pub strict_layout: bool,
    /// Whether flushing syncs the file to stable storage before renaming.
    pub sync_on_flush: bool,
    /// Metrics sink.
    pub metrics: Arc<dyn FileMetrics>,
}

impl FileOptions {
    /// Creates options with the default settings.
    pub fn new() -> Self {
        Self {
            strict_types: true,
            strict_layout: true,
            sync_on_flush: true,
            metrics: default_metrics(),
        }
    }

    /// Enables or disables type checking on row writes.
    pub fn strict_types(mut self, enabled: bool) -> Self {
        self.strict_types = enabled;
        self
    }

    /// Enables or disables exact layout checks on parse.
    pub fn strict_layout(mut self, enabled: bool) -> Self {
        self.strict_layout = enabled;
        self
    }

    /// Enables or disables fsync on flush.
    pub fn sync_on_flush(mut self, enabled: bool) -> Self {
        self.sync_on_flush = enabled;
        self
    }

    /// Sets the metrics collection implementation.
    pub fn metrics(mut self, metrics: Arc<dyn FileMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

impl Default for FileOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileOptions")
            .field("strict_types", &self.strict_types)
            .field("strict_layout", &self.strict_layout)
            .field("sync_on_flush", &self.sync_on_flush)
            .finish_non_exhaustive()
    }
}
