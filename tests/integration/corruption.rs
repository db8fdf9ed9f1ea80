#![allow(missing_docs)]

use colfile::format::{PROLOGUE_LEN, RECORD_FIXED_LEN};
use colfile::{ColumnFile, ColumnarError, FileOptions, Result, Value};

fn sample() -> Result<Vec<u8>> {
    let mut file = ColumnFile::new("sample");
    file.write([("n", Value::Int(1)), ("s", Value::from("abc"))])?;
    file.write([("n", Value::Int(2))])?;
    file.to_bytes()
}

#[test]
fn flipped_magic_is_a_format_error() -> Result<()> {
    let mut bytes = sample()?;
    for b in &mut bytes[..8] {
        *b = !*b;
    }
    let err = ColumnFile::from_bytes("bad", bytes).unwrap_err();
    assert!(matches!(err, ColumnarError::Format(_)), "{err}");
    Ok(())
}

#[test]
fn unsupported_versions_are_rejected() -> Result<()> {
    let good = sample()?;
    for field in [8usize, 16] {
        let mut bytes = good.clone();
        bytes[field..field + 8].copy_from_slice(&2u64.to_le_bytes());
        let err = ColumnFile::from_bytes("bad", bytes).unwrap_err();
        assert!(matches!(err, ColumnarError::Format(_)), "{err}");
    }
    Ok(())
}

#[test]
fn every_proper_prefix_fails_to_parse() -> Result<()> {
    let bytes = sample()?;
    for cut in 0..bytes.len() {
        let result = ColumnFile::from_bytes("cut", bytes[..cut].to_vec());
        assert!(result.is_err(), "prefix of {cut} bytes parsed");
    }
    Ok(())
}

#[test]
fn truncated_data_area_is_a_truncation_error() -> Result<()> {
    let mut bytes = sample()?;
    bytes.pop();
    let err = ColumnFile::from_bytes("cut", bytes).unwrap_err();
    assert!(matches!(err, ColumnarError::Truncated { .. }), "{err}");
    Ok(())
}

#[test]
fn trailing_garbage_depends_on_layout_mode() -> Result<()> {
    let mut bytes = sample()?;
    bytes.extend_from_slice(b"junk");
    assert!(matches!(
        ColumnFile::from_bytes("junk", bytes.clone()),
        Err(ColumnarError::Format(_))
    ));
    let lenient = ColumnFile::from_bytes_with_options(
        "junk",
        bytes,
        FileOptions::new().strict_layout(false),
    )?;
    let values: Vec<Value> = lenient
        .column("n")
        .expect("n")
        .values()
        .collect::<Result<_>>()?;
    assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
    Ok(())
}

#[test]
fn corrupt_entry_length_surfaces_during_iteration() -> Result<()> {
    let mut file = ColumnFile::new("one");
    file.write([("s", Value::from("abcdef"))])?;
    let mut bytes = file.to_bytes()?;

    // The single column's data starts right after the one record.
    let data_start = PROLOGUE_LEN + 8 + RECORD_FIXED_LEN + 1;
    bytes[data_start..data_start + 8].copy_from_slice(&100u64.to_le_bytes());

    let parsed = ColumnFile::from_bytes("one", bytes)?;
    let mut values = parsed.column("s").expect("s").values();
    assert!(matches!(
        values.next(),
        Some(Err(ColumnarError::Truncated { .. }))
    ));
    assert!(values.next().is_none());
    Ok(())
}

#[test]
fn unknown_dtype_ordinal_is_rejected() -> Result<()> {
    let mut file = ColumnFile::new("one");
    file.write([("n", Value::Int(5))])?;
    let mut bytes = file.to_bytes()?;
    let dtype_at = PROLOGUE_LEN + 8;
    bytes[dtype_at..dtype_at + 8].copy_from_slice(&99u64.to_le_bytes());
    let err = ColumnFile::from_bytes("one", bytes).unwrap_err();
    assert!(matches!(err, ColumnarError::Format(_)), "{err}");
    Ok(())
}
