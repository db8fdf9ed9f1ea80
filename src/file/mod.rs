//! The columnar file: row writes, serialization and parsing.

mod metrics;
mod options;

use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::Path;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::codec::{DType, Value};
use crate::column::{Column, ENTRY_HEADER_LEN};
use crate::format::Directory;
use crate::primitives::io;
use crate::types::{ColumnarError, Result, RowId};

pub use metrics::{default_metrics, CounterMetrics, FileMetrics, MetricsSnapshot, NoopMetrics};
pub use options::FileOptions;

/// A set of named columns that share one row counter.
///
/// Files built in memory accept row writes; files parsed from bytes are
/// read-only views whose column data shares the input buffer.
#[derive(Debug)]
pub struct ColumnFile {
    name: String,
    columns: BTreeMap<String, Column>,
    next_row: u64,
    read_only: bool,
    options: FileOptions,
}

impl ColumnFile {
    /// Creates an empty file with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, FileOptions::default())
    }

    /// Creates an empty file.
    pub fn with_options(name: impl Into<String>, options: FileOptions) -> Self {
        Self {
            name: name.into(),
            columns: BTreeMap::new(),
            next_row: 0,
            read_only: false,
            options,
        }
    }

    /// Name of the file; [`ColumnFile::flush`] writes to this path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Options in effect.
    pub fn options(&self) -> &FileOptions {
        &self.options
    }

    /// Whether this file was parsed from bytes.
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Number of row writes performed through this handle.
    ///
    /// Parsed files start at zero; the row indices stored in their entries
    /// are available through [`Column::row_ids`].
    pub fn rows_written(&self) -> u64 {
        self.next_row
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// All columns, ordered by name.
    pub fn columns(&self) -> impl Iterator<Item = &Column> + '_ {
        self.columns.values()
    }

    /// All column names, in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when no column has been written.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Writes one row made of any subset of columns.
    ///
    /// Every value is checked and encoded before any column is touched, so a
    /// failed call leaves the file unchanged and does not advance the row
    /// counter. Columns are created on first use with the type of the value.
    pub fn write<I, K>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        if self.read_only {
            return Err(ColumnarError::ReadOnly(self.name.clone()));
        }
        let row_id = RowId(self.next_row);
        let next_row = self
            .next_row
            .checked_add(1)
            .ok_or(ColumnarError::Invalid("row counter exhausted"))?;

        let mut seen = HashSet::new();
        let mut staged: Vec<(String, DType, Vec<u8>)> = Vec::new();
        for (name, value) in row {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(ColumnarError::Invalid("column repeated within one row"));
            }
            let dtype = value.dtype();
            if let Some(existing) = self.columns.get(&name) {
                if existing.dtype() != dtype {
                    if self.options.strict_types {
                        return Err(ColumnarError::Format(format!(
                            "column {name:?} holds {} values, got {dtype}",
                            existing.dtype()
                        )));
                    }
                    debug!(
                        column = %name,
                        expected = %existing.dtype(),
                        got = %dtype,
                        "colfile.write.type_mismatch"
                    );
                }
            }
            trace!(row = %row_id, column = %name, %value, "colfile.write.value");
            let encoded = value.encode()?;
            staged.push((name, dtype, encoded));
        }

        let touched = staged.len();
        for (name, dtype, encoded) in staged {
            let column = self
                .columns
                .entry(name)
                .or_insert_with_key(|name| Column::new(name.clone(), dtype));
            column.append(row_id, &encoded)?;
            self.options
                .metrics
                .entry_appended(ENTRY_HEADER_LEN + encoded.len());
        }
        self.next_row = next_row;
        self.options.metrics.row_written(touched);
        debug!(row = %row_id, columns = touched, "colfile.write.row");
        Ok(())
    }

    /// Serializes the file into one buffer.
    ///
    /// Serializing an unchanged file twice yields identical bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let directory = Directory::build(self.columns.values());
        let data_len = usize::try_from(directory.data_len())
            .map_err(|_| ColumnarError::Encode("column data exceeds address space".into()))?;
        let mut out = Vec::with_capacity(data_len + 64 * (self.columns.len() + 1));
        let header_len = directory.encode_into(&mut out)?;
        for column in self.columns.values() {
            out.extend_from_slice(column.data());
        }
        self.options.metrics.file_serialized(out.len());
        debug!(
            file = %self.name,
            columns = self.columns.len(),
            header_len,
            len = out.len(),
            "colfile.serialize.done"
        );
        Ok(out)
    }

    /// Serializes into `sink`. Any sink error aborts the write.
    pub fn write_to<W: Write>(&self, sink: &mut W) -> Result<()> {
        let bytes = self.to_bytes()?;
        sink.write_all(&bytes)?;
        sink.flush()?;
        Ok(())
    }

    /// Writes the file to the path given by its name.
    pub fn flush(&self) -> Result<()> {
        self.save(&self.name)
    }

    /// Writes the file to `path`, replacing any existing file atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        io::write_file(path, &bytes, self.options.sync_on_flush)
    }

    /// Parses a serialized file with default options.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Result<Self> {
        Self::from_bytes_with_options(name, data, FileOptions::default())
    }

    /// Parses a serialized file.
    ///
    /// Only the prologue and directory are decoded; each column keeps a
    /// shared slice of `data` that is walked on iteration.
    pub fn from_bytes_with_options(
        name: impl Into<String>,
        data: impl Into<Bytes>,
        options: FileOptions,
    ) -> Result<Self> {
        let name = name.into();
        let data = data.into();
        let (directory, header_len) = Directory::parse(&data)?;
        let columns: BTreeMap<String, Column> = directory
            .columns(&data, header_len, options.strict_layout)?
            .into_iter()
            .map(|column| (column.name().to_owned(), column))
            .collect();
        options.metrics.file_parsed(columns.len());
        debug!(
            file = %name,
            columns = columns.len(),
            header_len,
            len = data.len(),
            "colfile.parse.done"
        );
        Ok(Self {
            name,
            columns,
            next_row: 0,
            read_only: true,
            options,
        })
    }

    /// Reads and parses the file at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, FileOptions::default())
    }

    /// Reads and parses the file at `path`.
    pub fn open_with_options(path: impl AsRef<Path>, options: FileOptions) -> Result<Self> {
        let path = path.as_ref();
        let data = io::read_file(path)?;
        Self::from_bytes_with_options(path.to_string_lossy(), data, options)
    }
}
