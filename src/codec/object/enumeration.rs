//! Enum codec: one marker and the variant ordinal in a single byte.

use std::any::{type_name, Any};

use crate::codec::{Codec, DynCodec};
use crate::error::{MarkserError, Result};
use crate::registry::Registry;
use crate::value::{ObjectValue, Record, RecordType, Value, ValueType};
use crate::wire::{ByteReader, ByteWriter, Marker, MarkerRange, NULL_MARKER};

/// Most variants an enum codec can number in its one payload byte.
pub const MAX_VARIANTS: usize = 256;

/// Codec for a fieldless enum (or any closed set of values) of type `T`.
///
/// Variants are numbered in the order given; the payload is the ordinal
/// shifted by `-128` into a signed byte.
pub struct EnumCodec<T: Record> {
    markers: MarkerRange,
    record_type: RecordType,
    variants: Vec<T>,
}

impl<T: Record> EnumCodec<T> {
    /// Claim `marker` for the given variants, in ordinal order.
    pub fn new(marker: Marker, variants: impl IntoIterator<Item = T>) -> Result<Self> {
        let variants: Vec<T> = variants.into_iter().collect();
        if variants.len() > MAX_VARIANTS {
            return Err(MarkserError::CodecGeneration(format!(
                "{} has {} variants, at most {MAX_VARIANTS} fit in one byte",
                type_name::<T>(),
                variants.len()
            )));
        }
        Ok(Self {
            markers: MarkerRange::single(marker)?,
            record_type: RecordType::of::<T>(),
            variants,
        })
    }

    pub fn marker_range(&self) -> MarkerRange {
        self.markers
    }

    /// Ordinal of `value`, if it is one of the variants.
    pub fn ordinal(&self, value: &T) -> Option<usize> {
        self.variants.iter().position(|variant| variant == value)
    }
}

impl<T: Record> Codec for EnumCodec<T> {
    type Value = T;

    fn read(&self, _: &Registry, input: &mut ByteReader<'_>) -> Result<Option<T>> {
        let marker = input.read_marker()?;
        if marker == NULL_MARKER {
            return Ok(None);
        }
        let target = self.record_type.name();
        if marker != self.markers.base() {
            return Err(MarkserError::Decode { target, marker });
        }
        let ordinal = (input.read_signed(1)? + 128) as usize;
        self.variants
            .get(ordinal)
            .cloned()
            .map(Some)
            .ok_or(MarkserError::Decode { target, marker })
    }

    fn write(&self, _: &Registry, output: &mut ByteWriter, value: Option<&T>) -> Result<()> {
        let Some(value) = value else {
            output.put_marker(NULL_MARKER);
            return Ok(());
        };
        let ordinal = self.ordinal(value).ok_or_else(|| MarkserError::TypeMismatch {
            codec: self.record_type.name(),
            found: format!("{value:?}"),
        })?;
        output.put_marker_and(self.markers.base(), ordinal as i64 - 128, 1);
        Ok(())
    }
}

impl_record_dyn_codec!(EnumCodec);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Suit {
        Clubs,
        Diamonds,
        Hearts,
        Spades,
    }

    impl Record for Suit {}

    #[derive(Debug, Clone, PartialEq)]
    struct Level(u16);

    impl Record for Level {}

    fn codec() -> EnumCodec<Suit> {
        EnumCodec::new(
            40,
            [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades],
        )
        .unwrap()
    }

    #[test]
    fn test_ordinal_payload() {
        let registry = Registry::new();
        let codec = codec();
        let mut out = ByteWriter::new();
        codec.write(&registry, &mut out, Some(&Suit::Hearts)).unwrap();
        assert_eq!(out.as_slice(), &[40, 2u8.wrapping_sub(128)]);

        let mut input = ByteReader::new(out.as_slice());
        assert_eq!(codec.read(&registry, &mut input).unwrap(), Some(Suit::Hearts));
    }

    #[test]
    fn test_dyn_roundtrip() {
        let mut registry = Registry::new();
        registry.register(codec()).unwrap();
        let value = Value::object(Suit::Spades);
        let mut out = ByteWriter::new();
        registry.write_any(&mut out, &value).unwrap();
        let mut input = ByteReader::new(out.as_slice());
        assert_eq!(registry.read_any(&mut input).unwrap(), value);
    }

    #[test]
    fn test_unknown_ordinal_rejected() {
        let registry = Registry::new();
        let data = [40u8, 9u8.wrapping_sub(128)];
        let mut input = ByteReader::new(&data);
        assert!(matches!(
            codec().read(&registry, &mut input),
            Err(MarkserError::Decode { marker: 40, .. })
        ));
    }

    #[test]
    fn test_variant_limit() {
        assert!(EnumCodec::new(0, (0..256).map(Level)).is_ok());
        assert!(matches!(
            EnumCodec::new(0, (0..257).map(Level)),
            Err(MarkserError::CodecGeneration(_))
        ));
    }

    #[test]
    fn test_last_of_256_variants() {
        let registry = Registry::new();
        let codec = EnumCodec::new(0, (0..256).map(Level)).unwrap();
        let mut out = ByteWriter::new();
        codec.write(&registry, &mut out, Some(&Level(255))).unwrap();
        assert_eq!(out.as_slice(), &[0, 127]);
        let mut input = ByteReader::new(out.as_slice());
        assert_eq!(codec.read(&registry, &mut input).unwrap(), Some(Level(255)));
    }
}
