#![allow(missing_docs)]

use std::collections::HashMap;
use std::sync::Once;

use colfile::{ColumnFile, DType, FileOptions, Result, RowId, Value};
use tempfile::tempdir;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("colfile=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .try_init();
    });
}

fn decoded(file: &ColumnFile, name: &str) -> Result<Vec<Value>> {
    file.column(name)
        .expect("column present")
        .values()
        .collect()
}

#[test]
fn flush_and_open_roundtrip() -> Result<()> {
    init_tracing();
    let dir = tempdir()?;
    let path = dir.path().join("abc.xyz");

    let mut file = ColumnFile::new(path.to_string_lossy());
    file.write([
        ("intfname", Value::Int(123)),
        ("floatfname", Value::Float(123.456)),
    ])?;
    file.flush()?;

    let reader = ColumnFile::open(&path)?;
    assert_eq!(reader.len(), 2);
    assert_eq!(decoded(&reader, "intfname")?, vec![Value::Int(123)]);
    let floats = decoded(&reader, "floatfname")?;
    assert_eq!(floats.len(), 1);
    assert_eq!(
        floats[0].as_float().expect("float").to_bits(),
        123.456f64.to_bits()
    );
    Ok(())
}

#[test]
fn sparse_rows_keep_global_row_indices() -> Result<()> {
    init_tracing();
    let mut file = ColumnFile::new("sparse");
    file.write([("a", Value::Int(1)), ("b", Value::from("only"))])?;
    file.write([("a", Value::Int(2))])?;

    let parsed = ColumnFile::from_bytes("sparse", file.to_bytes()?)?;
    assert_eq!(parsed.column("b").expect("b").row_ids()?, vec![RowId(0)]);
    assert_eq!(
        parsed.column("a").expect("a").row_ids()?,
        vec![RowId(0), RowId(1)]
    );
    Ok(())
}

#[test]
fn every_type_survives_a_save() -> Result<()> {
    init_tracing();
    let dir = tempdir()?;
    let path = dir.path().join("types.col");

    let rows: Vec<Vec<(&str, Value)>> = vec![
        vec![
            ("s", Value::from("héllo")),
            ("i", Value::Int(i64::MIN)),
            ("f", Value::Float(-0.0)),
            ("is", Value::Ints(vec![])),
            ("ss", Value::from(vec!["a".to_string(), String::new()])),
        ],
        vec![
            ("i", Value::Int(i64::MAX)),
            ("f", Value::Float(f64::INFINITY)),
            ("is", Value::Ints(vec![-1, 0, 1])),
            ("s", Value::String(vec![0xFF, 0x00])),
        ],
    ];
    let mut file = ColumnFile::with_options("types", FileOptions::new().sync_on_flush(false));
    let mut expected: HashMap<&str, Vec<Value>> = HashMap::new();
    for row in rows {
        for (name, value) in &row {
            expected.entry(*name).or_default().push(value.clone());
        }
        file.write(row)?;
    }
    file.save(&path)?;

    let parsed = ColumnFile::open(&path)?;
    let types: HashMap<&str, DType> = parsed.columns().map(|c| (c.name(), c.dtype())).collect();
    assert_eq!(types["s"], DType::String);
    assert_eq!(types["i"], DType::Int);
    assert_eq!(types["f"], DType::Float);
    assert_eq!(types["is"], DType::Ints);
    assert_eq!(types["ss"], DType::Strings);
    for (name, values) in &expected {
        assert_eq!(&decoded(&parsed, name)?, values, "column {name}");
    }
    let zero = decoded(&parsed, "f")?[0].as_float().expect("float");
    assert!(zero.is_sign_negative());
    Ok(())
}

#[test]
fn directory_order_matches_data_order() -> Result<()> {
    let mut file = ColumnFile::new("order");
    file.write([
        ("zeta", Value::Int(1)),
        ("alpha", Value::from("xyz")),
        ("mid", Value::Ints(vec![7])),
    ])?;
    let bytes = file.to_bytes()?;
    let parsed = ColumnFile::from_bytes("order", bytes.clone())?;

    // Blocks are contiguous and appear in the same order as the records.
    let base = bytes.len() - parsed.columns().map(|c| c.byte_len()).sum::<usize>();
    let mut offset = base;
    for column in parsed.columns() {
        assert_eq!(&bytes[offset..offset + column.byte_len()], column.data());
        offset += column.byte_len();
    }
    assert_eq!(offset, bytes.len());
    Ok(())
}

#[test]
fn rewriting_a_path_replaces_the_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("replace.col");

    let mut big = ColumnFile::new("big");
    for i in 0..100 {
        big.write([("n", Value::Int(i))])?;
    }
    big.save(&path)?;

    let mut small = ColumnFile::new("small");
    small.write([("n", Value::Int(1))])?;
    small.save(&path)?;

    let parsed = ColumnFile::open(&path)?;
    assert_eq!(decoded(&parsed, "n")?, vec![Value::Int(1)]);
    Ok(())
}

#[test]
fn opening_a_missing_file_is_an_io_error() {
    let dir = tempdir().expect("tempdir");
    let err = ColumnFile::open(dir.path().join("missing.col")).unwrap_err();
    assert!(matches!(err, colfile::ColumnarError::Io(_)));
}
