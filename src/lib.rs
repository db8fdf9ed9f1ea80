//! Self-describing binary columnar files.
//!
//! Rows are written as sets of named, typed values. Each column accumulates
//! its own run of length-framed entries tagged with the global row index,
//! and serialization lays the columns out behind a small directory so a
//! reader needs nothing but the file to recover every value.

#![warn(missing_docs)]

pub mod codec;
pub mod column;
pub mod file;
pub mod format;
pub mod primitives;
pub mod types;

pub use codec::{DType, Value};
pub use column::{Column, Entries, Entry, Values};
pub use file::{ColumnFile, CounterMetrics, FileMetrics, FileOptions, NoopMetrics};
pub use types::{ColumnarError, Result, RowId};
