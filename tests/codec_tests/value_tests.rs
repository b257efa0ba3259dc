//! Tests for the value codec
//!
//! These tests verify:
//! - Every supported primitive round-trips through a Value
//! - Fixed widths for numbers, booleans and timestamps
//! - Empty values refuse to decode under any type
//! - Tag mismatches and unsupported types are reported
//! - Reading values out of a stream (`consume`) and back (`write_to`)

use std::io::{Cursor as IoCursor, Seek, SeekFrom};

use chrono::{DateTime, TimeZone, Utc};
use sectiondb::codec::Primitive;
use sectiondb::{DataType, Datum, StoreError, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn sample_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 29, 13, 45, 10).unwrap()
}

fn stream_of(bytes: &[u8]) -> IoCursor<Vec<u8>> {
    IoCursor::new(bytes.to_vec())
}

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_number_round_trip() {
    for n in [0i64, 1, -1, 42, i64::MIN, i64::MAX] {
        let value = Value::from_number(n);
        assert_eq!(value.data_type(), DataType::Number);
        assert_eq!(value.len(), 8);
        assert_eq!(value.to::<i64>().unwrap(), n);
    }
}

#[test]
fn test_number_is_little_endian() {
    let value = Value::from_number(0x0102);
    assert_eq!(value.as_bytes(), &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn test_i32_decodes_from_number() {
    let value = Value::from_primitive(&-7i32);
    assert_eq!(value.data_type(), DataType::Number);
    assert_eq!(value.to::<i32>().unwrap(), -7);

    let too_wide = Value::from_number(i64::from(i32::MAX) + 1);
    assert!(matches!(too_wide.to::<i32>(), Err(StoreError::InvalidEncoding(_))));
}

#[test]
fn test_boolean_round_trip() {
    for b in [true, false] {
        let value = Value::from_boolean(b);
        assert_eq!(value.len(), 1);
        assert_eq!(value.to::<bool>().unwrap(), b);
    }
}

#[test]
fn test_text_round_trip() {
    let value = Value::from_text("héllo");

    assert_eq!(value.data_type(), DataType::Text);
    assert_eq!(value.as_bytes(), "héllo".as_bytes());
    assert_eq!(value.len(), 6);
    assert_eq!(value.to::<String>().unwrap(), "héllo");
}

#[test]
fn test_invalid_utf8_text() {
    let value = Value::from_raw(vec![0xff, 0xfe], DataType::Text).unwrap();
    assert!(matches!(value.to::<String>(), Err(StoreError::InvalidEncoding(_))));
}

#[test]
fn test_date_time_round_trip() {
    let value = Value::from_date_time(sample_time());

    assert_eq!(value.data_type(), DataType::DateTime);
    assert_eq!(value.len(), 8);
    assert_eq!(value.to::<DateTime<Utc>>().unwrap(), sample_time());
}

#[test]
fn test_bytes_round_trip() {
    let payload = vec![0u8, 1, 2, 254, 255];
    let value = Value::from_bytes(payload.clone());

    assert_eq!(value.data_type(), DataType::Bytes);
    assert_eq!(value.to::<Vec<u8>>().unwrap(), payload);
}

#[test]
fn test_datum_conversion() {
    let datums = vec![
        Datum::Text("doc".to_string()),
        Datum::Number(-99),
        Datum::Boolean(true),
        Datum::DateTime(sample_time()),
        Datum::Bytes(vec![9, 8, 7]),
    ];

    for datum in datums {
        let value = Value::from(datum.clone());
        assert_eq!(value.data_type(), datum.data_type());
        assert_eq!(value.to_datum().unwrap(), datum);
    }
}

// =============================================================================
// Error Tests
// =============================================================================

#[test]
fn test_empty_value_fails_for_every_type() {
    let value = Value::empty();

    assert!(value.is_empty());
    assert_eq!(value.data_type(), DataType::Unknown);
    assert!(matches!(value.to::<String>(), Err(StoreError::EmptyValue)));
    assert!(matches!(value.to::<i64>(), Err(StoreError::EmptyValue)));
    assert!(matches!(value.to::<bool>(), Err(StoreError::EmptyValue)));
    assert!(matches!(value.to::<DateTime<Utc>>(), Err(StoreError::EmptyValue)));
    assert!(matches!(value.to::<Vec<u8>>(), Err(StoreError::EmptyValue)));
    assert!(matches!(value.to_datum(), Err(StoreError::EmptyValue)));
}

#[test]
fn test_empty_tagged_value_is_still_empty() {
    let value = Value::from_text("");
    assert!(matches!(value.to::<String>(), Err(StoreError::EmptyValue)));

    let value = Value::from_bytes(Vec::new());
    assert!(matches!(value.to::<Vec<u8>>(), Err(StoreError::EmptyValue)));
}

#[test]
fn test_type_mismatch() {
    let value = Value::from_number(5);

    match value.to::<String>() {
        Err(StoreError::TypeMismatch { expected, actual }) => {
            assert_eq!(expected, DataType::Text);
            assert_eq!(actual, DataType::Number);
        }
        other => panic!("expected TypeMismatch, got {:?}", other),
    }
}

#[test]
fn test_unknown_tag_with_content_is_rejected() {
    let result = Value::from_raw(vec![1, 2, 3], DataType::Unknown);
    assert!(matches!(result, Err(StoreError::UnsupportedType(DataType::Unknown))));
}

#[test]
fn test_from_raw_checks_fixed_width() {
    assert!(matches!(
        Value::from_raw(vec![1, 2, 3], DataType::Number),
        Err(StoreError::InvalidEncoding(_))
    ));
    assert!(matches!(
        Value::from_raw(vec![1, 0], DataType::Boolean),
        Err(StoreError::InvalidEncoding(_))
    ));

    let value = Value::from_raw(7i64.to_le_bytes().to_vec(), DataType::Number).unwrap();
    assert_eq!(value.to::<i64>().unwrap(), 7);
}

#[test]
fn test_debug_hides_payload() {
    let value = Value::from_text("secret-token");
    let printed = format!("{:?}", value);

    assert!(printed.contains("Text"));
    assert!(!printed.contains("secret-token"));
}

// =============================================================================
// DataType Tests
// =============================================================================

#[test]
fn test_data_type_of_rust_types() {
    assert_eq!(DataType::of::<String>(), DataType::Text);
    assert_eq!(DataType::of::<str>(), DataType::Text);
    assert_eq!(DataType::of::<i64>(), DataType::Number);
    assert_eq!(DataType::of::<i32>(), DataType::Number);
    assert_eq!(DataType::of::<bool>(), DataType::Boolean);
    assert_eq!(DataType::of::<DateTime<Utc>>(), DataType::DateTime);
    assert_eq!(DataType::of::<Vec<u8>>(), DataType::Bytes);
    assert_eq!(DataType::of::<f64>(), DataType::Unknown);
    assert_eq!(DataType::of::<Vec<String>>(), DataType::Unknown);
}

#[test]
fn test_data_type_matches_primitive_tag() {
    assert_eq!(DataType::of::<String>(), String::DATA_TYPE);
    assert_eq!(DataType::of::<i64>(), i64::DATA_TYPE);
    assert_eq!(DataType::of::<bool>(), bool::DATA_TYPE);
    assert_eq!(DataType::of::<Vec<u8>>(), <Vec<u8>>::DATA_TYPE);
}

#[test]
fn test_data_type_tags() {
    for tag in 0u8..=5 {
        let data_type = DataType::from_tag(tag).unwrap();
        assert_eq!(data_type.tag(), tag);
    }
    assert_eq!(DataType::from_tag(6), None);
    assert_eq!(DataType::from_tag(0xff), None);
}

#[test]
fn test_data_type_from_str() {
    assert_eq!("text".parse::<DataType>().unwrap(), DataType::Text);
    assert_eq!("Number".parse::<DataType>().unwrap(), DataType::Number);
    assert_eq!("bool".parse::<DataType>().unwrap(), DataType::Boolean);
    assert_eq!("datetime".parse::<DataType>().unwrap(), DataType::DateTime);
    assert_eq!("BYTES".parse::<DataType>().unwrap(), DataType::Bytes);
    assert!(matches!("float".parse::<DataType>(), Err(StoreError::Config(_))));
}

// =============================================================================
// Stream Tests
// =============================================================================

#[test]
fn test_consume_reads_exact_length_from_position() {
    let mut stream = stream_of(b"xxhello world");
    stream.seek(SeekFrom::Start(2)).unwrap();

    let value = Value::consume(&mut stream, DataType::Text, 5).unwrap();

    assert_eq!(value.to::<String>().unwrap(), "hello");
    assert_eq!(stream.position(), 7);
}

#[test]
fn test_consume_zero_length_reads_remainder() {
    let mut stream = stream_of(b"xxhello world");
    stream.seek(SeekFrom::Start(2)).unwrap();

    let value = Value::consume(&mut stream, DataType::Text, 0).unwrap();

    assert_eq!(value.to::<String>().unwrap(), "hello world");
}

#[test]
fn test_consume_negative_or_oversized_length_reads_remainder() {
    let mut stream = stream_of(b"abc");
    let value = Value::consume(&mut stream, DataType::Bytes, -1).unwrap();
    assert_eq!(value.as_bytes(), b"abc");

    let mut stream = stream_of(b"abc");
    let value = Value::consume(&mut stream, DataType::Bytes, 1_000).unwrap();
    assert_eq!(value.as_bytes(), b"abc");
}

#[test]
fn test_consume_at_end_is_empty() {
    let mut stream = stream_of(b"abc");
    stream.seek(SeekFrom::End(0)).unwrap();

    let value = Value::consume(&mut stream, DataType::Text, 0).unwrap();

    assert!(value.is_empty());
    assert!(matches!(value.to::<String>(), Err(StoreError::EmptyValue)));
}

#[test]
fn test_consume_validates_fixed_width() {
    let mut stream = stream_of(&[1, 2, 3]);

    let result = Value::consume(&mut stream, DataType::Number, 0);

    assert!(matches!(result, Err(StoreError::InvalidEncoding(_))));
}

#[test]
fn test_write_to_then_consume() {
    let original = Value::from_number(-123_456);
    let mut stream = IoCursor::new(Vec::new());

    original.write_to(&mut stream).unwrap();
    stream.set_position(0);
    let read_back = Value::consume(&mut stream, DataType::Number, 8).unwrap();

    assert_eq!(stream.get_ref().len(), 8);
    assert_eq!(read_back.to::<i64>().unwrap(), -123_456);
}
