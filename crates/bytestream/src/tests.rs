use super::*;
use proptest::prelude::*;

// -------------------- Byte order tokens --------------------

#[test]
fn byte_order_tokens_roundtrip() {
    assert_eq!("Big_Endian".parse::<ByteOrder>().unwrap(), ByteOrder::BigEndian);
    assert_eq!("Little_Endian".parse::<ByteOrder>().unwrap(), ByteOrder::LittleEndian);
    assert_eq!(ByteOrder::BigEndian.to_string(), "Big_Endian");
    assert_eq!(ByteOrder::LittleEndian.to_string(), "Little_Endian");
}

#[test]
fn unknown_byte_order_token_is_rejected() {
    let err = "Middle_Endian".parse::<ByteOrder>().unwrap_err();
    assert_eq!(err, StreamError::UnknownByteOrder("Middle_Endian".to_string()));
}

#[test]
fn machine_order_resolves_to_host() {
    let resolved = ByteOrder::Machine.resolve();
    if cfg!(target_endian = "little") {
        assert_eq!(resolved, ByteOrder::LittleEndian);
    } else {
        assert_eq!(resolved, ByteOrder::BigEndian);
    }
    assert_eq!(EndianWriter::new(ByteOrder::Machine).byte_order(), resolved);
    assert_ne!(ByteOrder::Machine.as_str(), "Machine");
}

// -------------------- Layout --------------------

#[test]
fn int_layout_follows_byte_order() {
    let mut big = EndianWriter::new(ByteOrder::BigEndian);
    big.write_i32(1);
    assert_eq!(big.as_bytes(), &[0, 0, 0, 1]);

    let mut little = EndianWriter::new(ByteOrder::LittleEndian);
    little.write_i32(1);
    assert_eq!(little.as_bytes(), &[1, 0, 0, 0]);
}

#[test]
fn string_is_length_prefixed() {
    let mut w = EndianWriter::new(ByteOrder::BigEndian);
    w.write_string("ab");
    assert_eq!(w.as_bytes(), &[0, 0, 0, 2, b'a', b'b']);
}

#[test]
fn nested_arrays_decode() {
    let grid = vec![vec![1.5f64, 2.5], vec![], vec![-3.0]];
    let mut w = EndianWriter::new(ByteOrder::LittleEndian);
    w.write(&grid);
    let bytes = w.into_bytes();

    let mut r = EndianReader::new(&bytes, ByteOrder::LittleEndian);
    let back: Vec<Vec<f64>> = r.read().unwrap();
    assert_eq!(back, grid);
    assert!(r.is_exhausted());
}

// -------------------- Failures --------------------

#[test]
fn truncated_int_reports_offset() {
    let bytes = [0u8, 0, 0, 5, 0, 0];
    let mut r = EndianReader::new(&bytes, ByteOrder::BigEndian);
    assert_eq!(r.read_i32().unwrap(), 5);
    let err = r.read_i32().unwrap_err();
    assert_eq!(
        err,
        StreamError::Truncated {
            needed: 4,
            remaining: 2,
            offset: 4
        }
    );
}

#[test]
fn truncated_string_body() {
    let mut w = EndianWriter::new(ByteOrder::BigEndian);
    w.write_i32(10);
    w.write_raw(b"abc");
    let bytes = w.into_bytes();
    let mut r = EndianReader::new(&bytes, ByteOrder::BigEndian);
    assert!(matches!(r.read_string(), Err(StreamError::Truncated { needed: 10, .. })));
}

#[test]
fn negative_length_is_rejected() {
    let mut w = EndianWriter::new(ByteOrder::LittleEndian);
    w.write_i32(-3);
    let bytes = w.into_bytes();
    let mut r = EndianReader::new(&bytes, ByteOrder::LittleEndian);
    assert_eq!(
        r.read_array::<i32>().unwrap_err(),
        StreamError::NegativeLength { len: -3, offset: 0 }
    );
}

#[test]
fn invalid_utf8_is_rejected() {
    let mut w = EndianWriter::new(ByteOrder::BigEndian);
    w.write_i32(2);
    w.write_raw(&[0xff, 0xfe]);
    let bytes = w.into_bytes();
    let mut r = EndianReader::new(&bytes, ByteOrder::BigEndian);
    assert_eq!(r.read_string().unwrap_err(), StreamError::InvalidString { offset: 4 });
}

#[test]
fn huge_count_fails_without_allocating() {
    let mut w = EndianWriter::new(ByteOrder::BigEndian);
    w.write_i32(i32::MAX);
    let bytes = w.into_bytes();
    let mut r = EndianReader::new(&bytes, ByteOrder::BigEndian);
    assert!(matches!(r.read_array::<i64>(), Err(StreamError::Truncated { .. })));
}

// -------------------- Symmetry --------------------

proptest! {
    #[test]
    fn decoding_is_symmetric_in_byte_order(
        n in any::<i64>(),
        x in any::<f64>().prop_filter("NaN never compares equal", |x| !x.is_nan()),
        s in ".{0,24}",
        flags in proptest::collection::vec(any::<bool>(), 0..8),
        big in any::<bool>(),
    ) {
        let order = if big { ByteOrder::BigEndian } else { ByteOrder::LittleEndian };
        let mut w = EndianWriter::new(order);
        w.write_i64(n);
        w.write_f64(x);
        w.write_string(&s);
        w.write_array(&flags);
        let bytes = w.into_bytes();

        let mut r = EndianReader::new(&bytes, order);
        prop_assert_eq!(r.read_i64()?, n);
        prop_assert_eq!(r.read_f64()?, x);
        prop_assert_eq!(r.read_string()?, s);
        prop_assert_eq!(r.read_array::<bool>()?, flags);
        prop_assert!(r.is_exhausted());
    }
}
