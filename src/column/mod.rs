//! Per-column entry buffers and the iterators that walk them.
//!
//! A column's data is a plain concatenation of entries:
//! `[value_len: u64][row: u64][value: value_len bytes]`.

use bytes::{Bytes, BytesMut};

use crate::codec::{DType, Value};
use crate::primitives::bytes::{buf::Cursor, le, U64_LEN};
use crate::types::{ColumnarError, Result, RowId};

/// Fixed framing preceding every encoded value.
pub const ENTRY_HEADER_LEN: usize = 2 * U64_LEN;

#[derive(Debug, Clone)]
enum ColumnData {
    Building(BytesMut),
    Loaded(Bytes),
}

/// A named, typed, append-only sequence of entries.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    dtype: DType,
    data: ColumnData,
}

impl Column {
    /// Creates an empty column ready for appends.
    pub fn new(name: impl Into<String>, dtype: DType) -> Self {
        Self {
            name: name.into(),
            dtype,
            data: ColumnData::Building(BytesMut::new()),
        }
    }

    /// Wraps a region of a parsed file. The bytes are shared, not copied.
    pub fn loaded(name: impl Into<String>, dtype: DType, data: Bytes) -> Self {
        Self {
            name: name.into(),
            dtype,
            data: ColumnData::Loaded(data),
        }
    }

    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type fixed when the column was created.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Raw entry bytes.
    pub fn data(&self) -> &[u8] {
        match &self.data {
            ColumnData::Building(buf) => buf,
            ColumnData::Loaded(buf) => buf,
        }
    }

    /// Byte length of the column data block.
    pub fn byte_len(&self) -> usize {
        self.data().len()
    }

    /// Returns true for columns backed by a parsed file.
    pub fn is_loaded(&self) -> bool {
        matches!(self.data, ColumnData::Loaded(_))
    }

    /// Appends one framed entry.
    ///
    /// Space for the framing and payload is reserved up front so the entry
    /// lands in one piece.
    pub fn append(&mut self, row: RowId, encoded: &[u8]) -> Result<()> {
        let ColumnData::Building(buf) = &mut self.data else {
            return Err(ColumnarError::ReadOnly(self.name.clone()));
        };
        let value_len = u64::try_from(encoded.len())
            .map_err(|_| ColumnarError::Encode("entry length exceeds u64".into()))?;
        buf.reserve(ENTRY_HEADER_LEN + encoded.len());
        buf.extend_from_slice(&value_len.to_le_bytes());
        buf.extend_from_slice(&row.0.to_le_bytes());
        buf.extend_from_slice(encoded);
        Ok(())
    }

    /// Iterates the raw entries of this column.
    pub fn entries(&self) -> Entries<'_> {
        Entries::new(self.data())
    }

    /// Iterates decoded values in write order.
    pub fn values(&self) -> Values<'_> {
        Values {
            dtype: self.dtype,
            entries: self.entries(),
        }
    }

    /// Counts entries, failing on a malformed tail.
    pub fn entry_count(&self) -> Result<usize> {
        self.entries().try_fold(0usize, |n, entry| entry.map(|_| n + 1))
    }

    /// Row indices of every entry, in write order.
    pub fn row_ids(&self) -> Result<Vec<RowId>> {
        self.entries().map(|entry| entry.map(|e| e.row)).collect()
    }
}

/// One framed value inside a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'a> {
    /// Global row counter at the time of the write.
    pub row: RowId,
    /// Encoded value bytes.
    pub payload: &'a [u8],
}

/// Iterator over the entries of a column block.
///
/// Ends cleanly only at an entry boundary. A partial trailing entry yields a
/// single [`ColumnarError::Truncated`] and then the iterator is exhausted.
#[derive(Debug)]
pub struct Entries<'a> {
    cur: Cursor<'a>,
    failed: bool,
}

impl<'a> Entries<'a> {
    /// Starts iterating at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            cur: Cursor::new(data),
            failed: false,
        }
    }

    fn read_entry(&mut self) -> Result<Entry<'a>> {
        let header = self.cur.take(ENTRY_HEADER_LEN, "entry header")?;
        let value_len = le::get_u64(header);
        let row = RowId(le::get_u64(&header[U64_LEN..]));
        let len = usize::try_from(value_len)
            .ok()
            .filter(|&len| len <= self.cur.remaining())
            .ok_or(ColumnarError::Truncated {
                context: "entry value",
                needed: value_len,
                remaining: self.cur.remaining() as u64,
            })?;
        let payload = self.cur.take(len, "entry value")?;
        Ok(Entry { row, payload })
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Result<Entry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cur.is_empty() {
            return None;
        }
        let entry = self.read_entry();
        self.failed = entry.is_err();
        Some(entry)
    }
}

/// Iterator decoding each entry of a column into a [`Value`].
#[derive(Debug)]
pub struct Values<'a> {
    dtype: DType,
    entries: Entries<'a>,
}

impl<'a> Values<'a> {
    /// Yields `(row, value)` pairs instead of bare values.
    pub fn with_rows(self) -> impl Iterator<Item = Result<(RowId, Value)>> + 'a {
        let dtype = self.dtype;
        self.entries
            .map(move |entry| entry.and_then(|e| Ok((e.row, Value::decode(dtype, e.payload)?))))
    }
}

impl<'a> Iterator for Values<'a> {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let dtype = self.dtype;
        self.entries
            .next()
            .map(|entry| entry.and_then(|e| Value::decode(dtype, e.payload)))
    }
}
