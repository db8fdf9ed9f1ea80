//! On-disk prologue and column directory.
//!
//! ```text
//! 0   magic                 u64
//! 8   format version        u64
//! 16  header-table version  u64
//! 24  column count          u64
//! 32  header length         u64   absolute start of the column data area
//! 40  records               count x [record_len u64][record]
//! ..  column data           blocks in record order, no padding
//! ```
//!
//! A record is `[dtype u64][offset u64][len u64][name_len u64][name]`, where
//! `offset` is relative to the start of the column data area.

use std::collections::HashSet;

use bytes::Bytes;
use tracing::warn;

use crate::codec::DType;
use crate::column::Column;
use crate::primitives::bytes::{buf::Cursor, le, U64_LEN};
use crate::types::{ColumnarError, Result};

/// Identifies a columnar file.
pub const MAGIC: u64 = 0xCACA_CACA;
/// Version of the overall layout.
pub const FORMAT_VERSION: u64 = 1;
/// Version of the column record encoding.
pub const HEADER_TABLE_VERSION: u64 = 1;
/// Bytes preceding the first column record.
pub const PROLOGUE_LEN: usize = 5 * U64_LEN;
/// Fixed part of a column record, before the name bytes.
pub const RECORD_FIXED_LEN: usize = 4 * U64_LEN;

/// Directory entry describing one column block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeader {
    /// Column value type.
    pub dtype: DType,
    /// Offset of the block from the start of the column data area.
    pub offset: u64,
    /// Length of the block in bytes.
    pub len: u64,
    /// Column name.
    pub name: String,
}

impl ColumnHeader {
    /// Encodes the record body, without its length prefix.
    pub fn encode(&self) -> Vec<u8> {
        let name = self.name.as_bytes();
        let mut out = Vec::with_capacity(RECORD_FIXED_LEN + name.len());
        le::put_u64(&mut out, self.dtype.ordinal());
        le::put_u64(&mut out, self.offset);
        le::put_u64(&mut out, self.len);
        le::put_u64(&mut out, name.len() as u64);
        out.extend_from_slice(name);
        out
    }

    /// Decodes a record body that must span exactly `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(bytes);
        let dtype = DType::try_from(cur.read_u64("column record")?)?;
        let offset = cur.read_u64("column record")?;
        let len = cur.read_u64("column record")?;
        let name_len = cur.read_len("column name")?;
        let name = cur.take(name_len, "column name")?;
        if !cur.is_empty() {
            return Err(ColumnarError::Format(format!(
                "{} trailing bytes in column record",
                cur.remaining()
            )));
        }
        let name = String::from_utf8(name.to_vec())
            .map_err(|_| ColumnarError::Format("column name is not UTF-8".into()))?;
        Ok(Self {
            dtype,
            offset,
            len,
            name,
        })
    }
}

/// The column directory of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    /// Records in the order their blocks appear.
    pub headers: Vec<ColumnHeader>,
}

impl Directory {
    /// Lays out `columns` back to back in iteration order.
    pub fn build<'a>(columns: impl IntoIterator<Item = &'a Column>) -> Self {
        let mut offset = 0u64;
        let headers = columns
            .into_iter()
            .map(|col| {
                let len = col.byte_len() as u64;
                let header = ColumnHeader {
                    dtype: col.dtype(),
                    offset,
                    len,
                    name: col.name().to_owned(),
                };
                offset += len;
                header
            })
            .collect();
        Self { headers }
    }

    /// Total bytes of the column data area.
    pub fn data_len(&self) -> u64 {
        self.headers.iter().map(|h| h.len).sum()
    }

    /// Writes the prologue and records, returning the header length.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<u64> {
        let records: Vec<Vec<u8>> = self.headers.iter().map(ColumnHeader::encode).collect();
        let header_len = records
            .iter()
            .try_fold(PROLOGUE_LEN as u64, |acc, r| {
                acc.checked_add(U64_LEN as u64)?.checked_add(r.len() as u64)
            })
            .ok_or_else(|| ColumnarError::Encode("column directory too large".into()))?;
        le::put_u64(out, MAGIC);
        le::put_u64(out, FORMAT_VERSION);
        le::put_u64(out, HEADER_TABLE_VERSION);
        le::put_u64(out, self.headers.len() as u64);
        le::put_u64(out, header_len);
        for record in &records {
            le::put_u64(out, record.len() as u64);
            out.extend_from_slice(record);
        }
        Ok(header_len)
    }

    /// Parses the prologue and records at the start of `buf`.
    ///
    /// Returns the directory and the header length.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize)> {
        let mut cur = Cursor::new(buf);
        let magic = cur.read_u64("prologue")?;
        if magic != MAGIC {
            return Err(reject(format!("not a columnar file (magic {magic:#x})")));
        }
        let version = cur.read_u64("prologue")?;
        if version != FORMAT_VERSION {
            return Err(reject(format!("unsupported format version {version}")));
        }
        let table_version = cur.read_u64("prologue")?;
        if table_version != HEADER_TABLE_VERSION {
            return Err(reject(format!(
                "unsupported header table version {table_version}"
            )));
        }
        let count = cur.read_u64("prologue")?;
        let header_len = cur.read_u64("prologue")?;
        let header_len = usize::try_from(header_len)
            .ok()
            .filter(|&len| len >= PROLOGUE_LEN)
            .ok_or_else(|| reject(format!("invalid header length {header_len}")))?;
        if header_len > buf.len() {
            return Err(ColumnarError::truncated("header block", header_len, buf.len()));
        }
        // Each record takes at least its prefix plus the fixed fields.
        let min_record = (U64_LEN + RECORD_FIXED_LEN) as u64;
        if count > ((header_len - PROLOGUE_LEN) as u64) / min_record {
            return Err(reject(format!(
                "{count} column records do not fit a {header_len}-byte header"
            )));
        }

        let mut records = Cursor::new(&buf[PROLOGUE_LEN..header_len]);
        let mut headers = Vec::with_capacity(count as usize);
        let mut seen = HashSet::with_capacity(count as usize);
        for _ in 0..count {
            let record_len = records.read_len("column record")?;
            let header = ColumnHeader::decode(records.take(record_len, "column record")?)?;
            if !seen.insert(header.name.clone()) {
                return Err(reject(format!("duplicate column {:?}", header.name)));
            }
            headers.push(header);
        }
        if !records.is_empty() {
            return Err(reject(format!(
                "{} unused bytes in header block",
                records.remaining()
            )));
        }
        Ok((Self { headers }, header_len))
    }

    /// Slices every column out of `buf` without copying.
    ///
    /// With `strict_layout` the blocks must tile the data area exactly, from
    /// the end of the header to the end of the buffer.
    pub fn columns(
        &self,
        buf: &Bytes,
        header_len: usize,
        strict_layout: bool,
    ) -> Result<Vec<Column>> {
        let Some(data_len) = buf.len().checked_sub(header_len) else {
            return Err(ColumnarError::truncated("header block", header_len, buf.len()));
        };
        let data_len = data_len as u64;
        let mut expected = 0u64;
        let mut columns = Vec::with_capacity(self.headers.len());
        for header in &self.headers {
            if strict_layout && header.offset != expected {
                return Err(reject(format!(
                    "column {:?} starts at offset {} instead of {expected}",
                    header.name, header.offset
                )));
            }
            let (start, end) = block_range(header, header_len)
                .ok_or_else(|| reject(format!("column {:?} range overflows", header.name)))?;
            if end > buf.len() {
                return Err(ColumnarError::Truncated {
                    context: "column data",
                    needed: (end - start) as u64,
                    remaining: buf.len().saturating_sub(start) as u64,
                });
            }
            expected = header.offset + header.len;
            columns.push(Column::loaded(
                header.name.clone(),
                header.dtype,
                buf.slice(start..end),
            ));
        }
        if strict_layout {
            if expected != data_len {
                return Err(reject(format!(
                    "column data covers {expected} of {data_len} bytes"
                )));
            }
        }
        Ok(columns)
    }
}

fn block_range(header: &ColumnHeader, header_len: usize) -> Option<(usize, usize)> {
    let start = usize::try_from(header.offset).ok()?.checked_add(header_len)?;
    let end = start.checked_add(usize::try_from(header.len).ok()?)?;
    Some((start, end))
}

fn reject(reason: String) -> ColumnarError {
    warn!(%reason, "colfile.parse.reject");
    ColumnarError::Format(reason)
}
