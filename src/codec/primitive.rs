//! Primitive codecs with minimal-width encoding.
//!
//! A primitive codec owns one marker per payload width. The value is written
//! with the narrowest big-endian two's-complement width that holds it, and the
//! marker `base + width - 1` records which width was used:
//! ```text
//! long 1234 at base 0:  [01] [04 D2]
//! long -1   at base 0:  [00] [FF]
//! ```
//! Floats and doubles write their raw IEEE-754 bits the same way, so NaN
//! payloads survive bit for bit.

use crate::error::{MarkserError, Result};
use crate::registry::Registry;
use crate::wire::{ByteReader, ByteWriter, Marker, MarkerRange, NULL_MARKER};

use super::Codec;

/// Smallest number of bytes (1 to 8) holding `value` as signed big-endian.
#[inline]
pub(crate) fn min_width(value: i64) -> usize {
    let significant = if value < 0 {
        64 - value.leading_ones() as usize
    } else {
        64 - value.leading_zeros() as usize
    };
    // One extra bit for the sign, rounded up to whole bytes.
    (significant + 1).div_ceil(8).max(1)
}

/// Write `value` at its minimal width, using the tier markers of `markers`.
#[inline]
fn put_minimal(markers: MarkerRange, output: &mut ByteWriter, value: i64) {
    let width = min_width(value);
    debug_assert!(width <= markers.count() as usize);
    output.put_marker_and(markers.at(width as u8 - 1), value, width);
}

/// Read a minimal-width value, or `None` for the null marker.
#[inline]
fn take_minimal(
    markers: MarkerRange,
    input: &mut ByteReader<'_>,
    target: &'static str,
) -> Result<Option<i64>> {
    let marker = input.read_marker()?;
    if marker == NULL_MARKER {
        return Ok(None);
    }
    match markers.offset_of(marker) {
        Some(offset) => input.read_signed(offset as usize + 1).map(Some),
        None => Err(MarkserError::Decode { target, marker }),
    }
}

macro_rules! minimal_width_codec {
    (
        $(#[$meta:meta])*
        $codec:ident, $ty:ty, $tiers:expr, $name:literal, $variant:ident,
        |$enc:ident| $to_bits:expr,
        |$dec:ident| $from_bits:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $codec {
            markers: MarkerRange,
        }

        impl $codec {
            /// Markers claimed: one per payload width.
            pub const TIERS: u8 = $tiers;

            /// Claim the markers starting at `base`.
            pub fn new(base: Marker) -> Result<Self> {
                Ok(Self {
                    markers: MarkerRange::new(base, Self::TIERS)?,
                })
            }

            /// Markers this codec claims.
            pub fn marker_range(&self) -> MarkerRange {
                self.markers
            }

            /// Write a non-null value.
            #[inline]
            pub fn encode(&self, output: &mut ByteWriter, $enc: $ty) {
                put_minimal(self.markers, output, $to_bits);
            }

            /// Read a value, or `None` for the null marker.
            #[inline]
            pub fn decode(&self, input: &mut ByteReader<'_>) -> Result<Option<$ty>> {
                Ok(take_minimal(self.markers, input, $name)?.map(|$dec| $from_bits))
            }
        }

        impl Codec for $codec {
            type Value = $ty;

            fn read(&self, _: &Registry, input: &mut ByteReader<'_>) -> Result<Option<$ty>> {
                self.decode(input)
            }

            fn write(&self, _: &Registry, output: &mut ByteWriter, value: Option<&$ty>) -> Result<()> {
                match value {
                    Some(v) => self.encode(output, *v),
                    None => output.put_marker(NULL_MARKER),
                }
                Ok(())
            }
        }

        impl_dyn_codec!($codec, $name, $variant);
    };
}

minimal_width_codec!(
    /// Codec for `i8`: one marker, one payload byte.
    ByteCodec, i8, 1, "byte", Byte,
    |v| v as i64,
    |v| v as i8
);

minimal_width_codec!(
    /// Codec for `i16` in 1 or 2 bytes.
    ShortCodec, i16, 2, "short", Short,
    |v| v as i64,
    |v| v as i16
);

minimal_width_codec!(
    /// Codec for `i32` in 1 to 4 bytes.
    IntCodec, i32, 4, "int", Int,
    |v| v as i64,
    |v| v as i32
);

minimal_width_codec!(
    /// Codec for `i64` in 1 to 8 bytes.
    LongCodec, i64, 8, "long", Long,
    |v| v,
    |v| v
);

minimal_width_codec!(
    /// Codec for `f32` bit patterns in 1 to 4 bytes.
    FloatCodec, f32, 4, "float", Float,
    |v| v.to_bits() as i32 as i64,
    |v| f32::from_bits(v as i32 as u32)
);

minimal_width_codec!(
    /// Codec for `f64` bit patterns in 1 to 8 bytes.
    DoubleCodec, f64, 8, "double", Double,
    |v| v.to_bits() as i64,
    |v| f64::from_bits(v as u64)
);

/// Codec for `char`: the code point in 1 to 3 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCodec {
    markers: MarkerRange,
}

impl CharCodec {
    /// Markers claimed: one per payload width.
    pub const TIERS: u8 = 3;

    /// Claim the markers starting at `base`.
    pub fn new(base: Marker) -> Result<Self> {
        Ok(Self {
            markers: MarkerRange::new(base, Self::TIERS)?,
        })
    }

    /// Markers this codec claims.
    pub fn marker_range(&self) -> MarkerRange {
        self.markers
    }

    /// Write a non-null value.
    #[inline]
    pub fn encode(&self, output: &mut ByteWriter, value: char) {
        put_minimal(self.markers, output, value as u32 as i64);
    }

    /// Read a char, or `None` for the null marker.
    ///
    /// Fails with [`MarkserError::InvalidChar`] for surrogates and values past
    /// `0x10FFFF`.
    pub fn decode(&self, input: &mut ByteReader<'_>) -> Result<Option<char>> {
        match take_minimal(self.markers, input, "char")? {
            Some(code) => {
                let code = code as u32;
                char::from_u32(code).map(Some).ok_or(MarkserError::InvalidChar(code))
            }
            None => Ok(None),
        }
    }
}

impl Codec for CharCodec {
    type Value = char;

    fn read(&self, _: &Registry, input: &mut ByteReader<'_>) -> Result<Option<char>> {
        self.decode(input)
    }

    fn write(&self, _: &Registry, output: &mut ByteWriter, value: Option<&char>) -> Result<()> {
        match value {
            Some(v) => self.encode(output, *v),
            None => output.put_marker(NULL_MARKER),
        }
        Ok(())
    }
}

impl_dyn_codec!(CharCodec, "char", Char);

/// Codec for `bool`: `true` and `false` each get a marker, no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolCodec {
    markers: MarkerRange,
}

impl BoolCodec {
    /// Claim the markers starting at `base`.
    pub fn new(base: Marker) -> Result<Self> {
        Ok(Self {
            markers: MarkerRange::new(base, 2)?,
        })
    }

    /// Markers this codec claims.
    pub fn marker_range(&self) -> MarkerRange {
        self.markers
    }

    /// Write a non-null value.
    #[inline]
    pub fn encode(&self, output: &mut ByteWriter, value: bool) {
        output.put_marker(self.markers.at(if value { 0 } else { 1 }));
    }

    /// Read a value, or `None` for the null marker.
    pub fn decode(&self, input: &mut ByteReader<'_>) -> Result<Option<bool>> {
        let marker = input.read_marker()?;
        match self.markers.offset_of(marker) {
            Some(0) => Ok(Some(true)),
            Some(_) => Ok(Some(false)),
            None if marker == NULL_MARKER => Ok(None),
            None => Err(MarkserError::Decode {
                target: "bool",
                marker,
            }),
        }
    }
}

impl Codec for BoolCodec {
    type Value = bool;

    fn read(&self, _: &Registry, input: &mut ByteReader<'_>) -> Result<Option<bool>> {
        self.decode(input)
    }

    fn write(&self, _: &Registry, output: &mut ByteWriter, value: Option<&bool>) -> Result<()> {
        match value {
            Some(v) => self.encode(output, *v),
            None => output.put_marker(NULL_MARKER),
        }
        Ok(())
    }
}

impl_dyn_codec!(BoolCodec, "bool", Bool);
