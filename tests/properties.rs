//! Property tests for the wire encodings.

use markser::codec::{Codec, DoubleCodec, IntCodec, LongCodec, StringCodec};
use markser::wire::size::{self, TIER1_START, TIER2_START, TIER3_START};
use markser::wire::{ByteReader, ByteWriter};
use markser::{CodecConfig, Deserializer, Registry, Serializer, Value};
use proptest::prelude::*;

/// Bytes a two's-complement value needs, sign bit included.
fn expected_width(value: i64) -> usize {
    (1..=8)
        .find(|width| {
            let shift = 64 - 8 * width;
            (value << shift) >> shift == value
        })
        .unwrap_or(8)
}

fn size_strategy() -> impl Strategy<Value = usize> {
    prop_oneof![
        0..TIER1_START,
        (TIER1_START - 2)..(TIER1_START + 2),
        (TIER2_START - 2)..(TIER2_START + 2),
        (TIER3_START - 2)..(TIER3_START + 2),
        TIER3_START..=size::MAX_SIZE,
    ]
}

proptest! {
    #[test]
    fn prop_long_roundtrip_minimal_width(value in any::<i64>()) {
        let registry = Registry::new();
        let codec = LongCodec::new(0).unwrap();
        let mut out = ByteWriter::new();
        codec.write(&registry, &mut out, Some(&value)).unwrap();

        let width = expected_width(value);
        prop_assert_eq!(out.len(), 1 + width);
        prop_assert_eq!(out.as_slice()[0] as usize, width - 1);

        let mut input = ByteReader::new(out.as_slice());
        prop_assert_eq!(codec.read(&registry, &mut input).unwrap(), Some(value));
        prop_assert!(input.is_empty());
    }

    #[test]
    fn prop_int_never_wider_than_four_bytes(value in any::<i32>()) {
        let registry = Registry::new();
        let codec = IntCodec::new(10).unwrap();
        let mut out = ByteWriter::new();
        codec.write(&registry, &mut out, Some(&value)).unwrap();
        prop_assert!(out.len() <= 5);
        let mut input = ByteReader::new(out.as_slice());
        prop_assert_eq!(codec.read(&registry, &mut input).unwrap(), Some(value));
    }

    #[test]
    fn prop_double_keeps_bits(bits in any::<u64>()) {
        let value = f64::from_bits(bits);
        let registry = Registry::new();
        let codec = DoubleCodec::new(-20).unwrap();
        let mut out = ByteWriter::new();
        codec.write(&registry, &mut out, Some(&value)).unwrap();
        let mut input = ByteReader::new(out.as_slice());
        let decoded = codec.read(&registry, &mut input).unwrap().unwrap();
        prop_assert_eq!(decoded.to_bits(), bits);
    }

    #[test]
    fn prop_size_roundtrip(value in size_strategy()) {
        let mut out = ByteWriter::new();
        size::write_size(&mut out, 40, value).unwrap();
        prop_assert_eq!(out.len(), size::encoded_len(value));

        let mut input = ByteReader::new(out.as_slice());
        prop_assert_eq!(size::read_size(&mut input, 40, "size").unwrap(), Some(value));
        prop_assert!(input.is_empty());
    }

    #[test]
    fn prop_string_roundtrip(value in any::<String>(), optimized in 0u8..=32) {
        let registry = Registry::new();
        let codec = StringCodec::new(0, optimized).unwrap();
        let mut out = ByteWriter::new();
        codec.write(&registry, &mut out, Some(&value)).unwrap();
        let mut input = ByteReader::new(out.as_slice());
        prop_assert_eq!(codec.read(&registry, &mut input).unwrap(), Some(value));
    }

    #[test]
    fn prop_long_list_roundtrip(items in prop::collection::vec(any::<i64>(), 0..300)) {
        let registry = Registry::standard(&CodecConfig::default()).unwrap();
        let value = Value::List(items.into_iter().map(Value::Long).collect());
        let mut serializer = Serializer::new(&registry);
        serializer.append(&value).unwrap();
        let mut deserializer = Deserializer::new(&registry, serializer.as_bytes());
        prop_assert_eq!(deserializer.read().unwrap(), value);
        prop_assert!(deserializer.is_empty());
    }
}

#[test]
fn test_expected_width_boundaries() {
    assert_eq!(expected_width(0), 1);
    assert_eq!(expected_width(127), 1);
    assert_eq!(expected_width(128), 2);
    assert_eq!(expected_width(-128), 1);
    assert_eq!(expected_width(-129), 2);
    assert_eq!(expected_width(i64::MIN), 8);
}
