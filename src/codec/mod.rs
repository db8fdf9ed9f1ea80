//! Typed value codec.
//!
//! Every value is encoded to a fixed little-endian representation. Scalars
//! carry no framing of their own; list types embed an eight-byte element
//! count (and, for strings, a per-element byte length) so they decode
//! without outside help.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::primitives::bytes::{buf::Cursor, le, U64_LEN};
use crate::types::{ColumnarError, Result};

/// Column value type. The ordinal is written to disk; never renumber.
#[repr(u64)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// Raw byte string.
    String = 1,
    /// Signed 64-bit integer.
    Int = 2,
    /// IEEE-754 double.
    Float = 3,
    /// List of signed 64-bit integers.
    Ints = 4,
    /// List of byte strings.
    Strings = 5,
}

impl DType {
    /// Ordinal persisted in the column directory.
    pub const fn ordinal(self) -> u64 {
        self as u64
    }

    /// Lowercase name of the type.
    pub const fn name(self) -> &'static str {
        match self {
            DType::String => "string",
            DType::Int => "int",
            DType::Float => "float",
            DType::Ints => "ints",
            DType::Strings => "strings",
        }
    }
}

impl TryFrom<u64> for DType {
    type Error = ColumnarError;

    fn try_from(value: u64) -> Result<Self> {
        match value {
            1 => Ok(DType::String),
            2 => Ok(DType::Int),
            3 => Ok(DType::Float),
            4 => Ok(DType::Ints),
            5 => Ok(DType::Strings),
            other => Err(ColumnarError::Format(format!(
                "unknown column type ordinal {other}"
            ))),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = ColumnarError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "string" => Ok(DType::String),
            "int" => Ok(DType::Int),
            "float" => Ok(DType::Float),
            "ints" => Ok(DType::Ints),
            "strings" => Ok(DType::Strings),
            _ => Err(ColumnarError::Invalid("unknown type name")),
        }
    }
}

/// A typed value stored in a column.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Signed 64-bit integer.
    Int(i64),
    /// IEEE-754 double, stored by bit pattern.
    Float(f64),
    /// Raw bytes; usually UTF-8 but not required to be.
    String(Vec<u8>),
    /// Ordered integers.
    Ints(Vec<i64>),
    /// Ordered byte strings.
    Strings(Vec<Vec<u8>>),
}

impl Value {
    /// Type tag of this value.
    pub fn dtype(&self) -> DType {
        match self {
            Value::Int(_) => DType::Int,
            Value::Float(_) => DType::Float,
            Value::String(_) => DType::String,
            Value::Ints(_) => DType::Ints,
            Value::Strings(_) => DType::Strings,
        }
    }

    /// Number of bytes [`Value::encode`] produces.
    pub fn encoded_len(&self) -> Result<usize> {
        let len = match self {
            Value::Int(_) | Value::Float(_) => Some(U64_LEN),
            Value::String(s) => Some(s.len()),
            Value::Ints(xs) => xs
                .len()
                .checked_mul(U64_LEN)
                .and_then(|n| n.checked_add(U64_LEN)),
            Value::Strings(xs) => xs.iter().try_fold(U64_LEN, |acc, s| {
                acc.checked_add(U64_LEN)?.checked_add(s.len())
            }),
        };
        len.ok_or_else(|| ColumnarError::Encode(format!("{} value too large", self.dtype())))
    }

    /// Encodes the value into a fresh buffer.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.encoded_len()?);
        self.encode_into(&mut out)?;
        Ok(out)
    }

    /// Appends the encoded value to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Value::Int(v) => le::put_u64(out, *v as u64),
            Value::Float(v) => le::put_u64(out, v.to_bits()),
            Value::String(s) => out.extend_from_slice(s),
            Value::Ints(xs) => {
                le::put_u64(out, count(xs.len())?);
                for &x in xs {
                    le::put_u64(out, x as u64);
                }
            }
            Value::Strings(xs) => {
                le::put_u64(out, count(xs.len())?);
                for s in xs {
                    le::put_u64(out, count(s.len())?);
                    out.extend_from_slice(s);
                }
            }
        }
        Ok(())
    }

    /// Decodes a value of type `dtype` from exactly `bytes`.
    pub fn decode(dtype: DType, bytes: &[u8]) -> Result<Value> {
        match dtype {
            DType::Int => Ok(Value::Int(scalar(bytes, dtype)? as i64)),
            DType::Float => Ok(Value::Float(f64::from_bits(scalar(bytes, dtype)?))),
            DType::String => Ok(Value::String(bytes.to_vec())),
            DType::Ints => decode_ints(bytes).map(Value::Ints),
            DType::Strings => decode_strings(bytes).map(Value::Strings),
        }
    }

    /// Replaces `self` with the value decoded from `bytes`, keeping the variant.
    pub fn decode_in_place(&mut self, bytes: &[u8]) -> Result<()> {
        *self = Value::decode(self.dtype(), bytes)?;
        Ok(())
    }

    /// Returns the integer if this is an [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the float if this is a [`Value::Float`].
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string if this is a [`Value::String`] holding valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => std::str::from_utf8(s).ok(),
            _ => None,
        }
    }
}

fn count(len: usize) -> Result<u64> {
    u64::try_from(len).map_err(|_| ColumnarError::Encode("length exceeds u64".into()))
}

fn scalar(bytes: &[u8], dtype: DType) -> Result<u64> {
    if bytes.len() != U64_LEN {
        return Err(ColumnarError::Decode(format!(
            "{dtype} payload must be {U64_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(le::get_u64(bytes))
}

fn decode_ints(bytes: &[u8]) -> Result<Vec<i64>> {
    let mut cur = Cursor::new(bytes);
    let n = cur.read_u64("ints count").map_err(to_decode)?;
    let needed = usize::try_from(n)
        .ok()
        .and_then(|n| n.checked_mul(U64_LEN))
        .filter(|&needed| needed <= cur.remaining())
        .ok_or_else(|| {
            ColumnarError::Decode(format!(
                "ints count {n} exceeds {} payload bytes",
                cur.remaining()
            ))
        })?;
    let body = cur.take(needed, "ints body").map_err(to_decode)?;
    finish(&cur, DType::Ints)?;
    Ok(body
        .chunks_exact(U64_LEN)
        .map(|chunk| le::get_u64(chunk) as i64)
        .collect())
}

fn decode_strings(bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut cur = Cursor::new(bytes);
    let n = cur.read_u64("strings count").map_err(to_decode)?;
    // Every element needs at least its length prefix.
    if n > (cur.remaining() / U64_LEN) as u64 {
        return Err(ColumnarError::Decode(format!(
            "strings count {n} exceeds {} payload bytes",
            cur.remaining()
        )));
    }
    let mut out = Vec::with_capacity(n as usize);
    for _ in 0..n {
        let len = cur.read_len("string element").map_err(to_decode)?;
        out.push(cur.take(len, "string element").map_err(to_decode)?.to_vec());
    }
    finish(&cur, DType::Strings)?;
    Ok(out)
}

fn finish(cur: &Cursor<'_>, dtype: DType) -> Result<()> {
    if !cur.is_empty() {
        return Err(ColumnarError::Decode(format!(
            "{} trailing bytes after {dtype} payload",
            cur.remaining()
        )));
    }
    Ok(())
}

fn to_decode(err: ColumnarError) -> ColumnarError {
    match err {
        ColumnarError::Truncated { .. } => ColumnarError::Decode(err.to_string()),
        other => other,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => f.write_str(&String::from_utf8_lossy(s)),
            Value::Ints(xs) => {
                f.write_str("[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{x}")?;
                }
                f.write_str("]")
            }
            Value::Strings(xs) => {
                f.write_str("[")?;
                for (i, s) in xs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}", String::from_utf8_lossy(s))?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v.into_bytes())
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::Ints(v)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::Strings(v.into_iter().map(String::into_bytes).collect())
    }
}
