#![forbid(unsafe_code)]
//! Error taxonomy and identifiers shared by every layer of the file format.

use std::fmt;

/// Global row index recorded alongside every entry in a column.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RowId {
    fn from(value: u64) -> Self {
        RowId(value)
    }
}

impl From<RowId> for u64 {
    fn from(value: RowId) -> Self {
        value.0
    }
}

/// Errors raised while building, serializing, parsing or decoding a columnar file.
#[derive(thiserror::Error, Debug)]
pub enum ColumnarError {
    /// The underlying source or sink failed.
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    /// The bytes are not a columnar file this build understands.
    #[error("format: {0}")]
    Format(String),
    /// A length prefix asked for more bytes than the buffer holds.
    #[error("truncated {context}: need {needed} bytes, {remaining} remaining")]
    Truncated {
        /// What was being read when the buffer ran out.
        context: &'static str,
        /// Bytes required by the prefix.
        needed: u64,
        /// Bytes actually left.
        remaining: u64,
    },
    /// A value could not be encoded.
    #[error("encode: {0}")]
    Encode(String),
    /// A value payload is malformed.
    #[error("decode: {0}")]
    Decode(String),
    /// A row write was attempted on a file loaded from bytes.
    #[error("file {0} is read-only")]
    ReadOnly(String),
    /// The caller passed an argument the format cannot represent.
    #[error("invalid argument: {0}")]
    Invalid(&'static str),
}

impl ColumnarError {
    pub(crate) fn truncated(context: &'static str, needed: usize, remaining: usize) -> Self {
        ColumnarError::Truncated {
            context,
            needed: needed as u64,
            remaining: remaining as u64,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ColumnarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_message_names_context() {
        let err = ColumnarError::truncated("entry header", 16, 3);
        assert_eq!(
            err.to_string(),
            "truncated entry header: need 16 bytes, 3 remaining"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ColumnarError = io.into();
        assert!(matches!(err, ColumnarError::Io(_)));
    }

    #[test]
    fn row_id_displays_inner_value() {
        assert_eq!(RowId(42).to_string(), "42");
        assert_eq!(u64::from(RowId::from(7)), 7);
    }
}
