//! Primitive array codecs.
//!
//! Every array codec owns four size-tier markers. The size is followed by:
//! - `bool[]`: the elements packed 8 per byte, most significant bit first;
//! - `byte[]`: the raw bytes;
//! - `char[]`: the UTF-8 encoding of the chars (the size counts bytes);
//! - numeric arrays: one minimal-width element per entry, each with its own
//!   marker from an element codec based at marker `0`.

use crate::error::{MarkserError, Result};
use crate::registry::Registry;
use crate::wire::{size, ByteReader, ByteWriter, Marker, MarkerRange, NULL_MARKER, SIZE_MARKERS};

use super::primitive::{DoubleCodec, FloatCodec, IntCodec, LongCodec, ShortCodec};
use super::Codec;

fn size_markers(base: Marker) -> Result<MarkerRange> {
    MarkerRange::new(base, SIZE_MARKERS)
}

/// Codec for `Vec<bool>`, bit-packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoolArrayCodec {
    markers: MarkerRange,
}

impl BoolArrayCodec {
    /// Claim the size-tier markers starting at `base`.
    pub fn new(base: Marker) -> Result<Self> {
        Ok(Self {
            markers: size_markers(base)?,
        })
    }

    /// Markers this codec claims.
    pub fn marker_range(&self) -> MarkerRange {
        self.markers
    }

    /// Write a non-null array.
    pub fn encode(&self, output: &mut ByteWriter, value: &[bool]) -> Result<()> {
        size::write_size(output, self.markers.base(), value.len())?;
        for chunk in value.chunks(8) {
            let byte = chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, bit)| acc | ((*bit as u8) << (7 - i)));
            output.put_bytes(&[byte]);
        }
        Ok(())
    }

    /// Read an array, or `None` for the null marker.
    pub fn decode(&self, input: &mut ByteReader<'_>) -> Result<Option<Vec<bool>>> {
        let Some(len) = size::read_size(input, self.markers.base(), "bool[]")? else {
            return Ok(None);
        };
        let packed = input.read_bytes(len.div_ceil(8))?;
        let bits = packed
            .iter()
            .flat_map(|byte| (0..8).rev().map(move |i| byte >> i & 1 == 1))
            .take(len)
            .collect();
        Ok(Some(bits))
    }
}

/// Codec for `Vec<u8>`, stored raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteArrayCodec {
    markers: MarkerRange,
}

impl ByteArrayCodec {
    /// Claim the size-tier markers starting at `base`.
    pub fn new(base: Marker) -> Result<Self> {
        Ok(Self {
            markers: size_markers(base)?,
        })
    }

    /// Markers this codec claims.
    pub fn marker_range(&self) -> MarkerRange {
        self.markers
    }

    /// Write a non-null array.
    pub fn encode(&self, output: &mut ByteWriter, value: &[u8]) -> Result<()> {
        size::write_size(output, self.markers.base(), value.len())?;
        output.put_bytes(value);
        Ok(())
    }

    /// Read an array, or `None` for the null marker.
    pub fn decode(&self, input: &mut ByteReader<'_>) -> Result<Option<Vec<u8>>> {
        match size::read_size(input, self.markers.base(), "byte[]")? {
            Some(len) => Ok(Some(input.read_bytes(len)?.to_vec())),
            None => Ok(None),
        }
    }
}

/// Codec for `Vec<char>`, stored as UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharArrayCodec {
    markers: MarkerRange,
}

impl CharArrayCodec {
    /// Claim the size-tier markers starting at `base`.
    pub fn new(base: Marker) -> Result<Self> {
        Ok(Self {
            markers: size_markers(base)?,
        })
    }

    /// Markers this codec claims.
    pub fn marker_range(&self) -> MarkerRange {
        self.markers
    }

    /// Write a non-null array.
    pub fn encode(&self, output: &mut ByteWriter, value: &[char]) -> Result<()> {
        let text: String = value.iter().collect();
        size::write_size(output, self.markers.base(), text.len())?;
        output.put_bytes(text.as_bytes());
        Ok(())
    }

    /// Read an array, or `None` for the null marker.
    pub fn decode(&self, input: &mut ByteReader<'_>) -> Result<Option<Vec<char>>> {
        let Some(len) = size::read_size(input, self.markers.base(), "char[]")? else {
            return Ok(None);
        };
        let text = std::str::from_utf8(input.read_bytes(len)?)?;
        Ok(Some(text.chars().collect()))
    }
}

macro_rules! array_codec_impls {
    ($($codec:ident => $ty:ty, $name:literal, $variant:ident;)*) => {
        $(
            impl Codec for $codec {
                type Value = Vec<$ty>;

                fn read(&self, _: &Registry, input: &mut ByteReader<'_>) -> Result<Option<Vec<$ty>>> {
                    self.decode(input)
                }

                fn write(
                    &self,
                    _: &Registry,
                    output: &mut ByteWriter,
                    value: Option<&Vec<$ty>>,
                ) -> Result<()> {
                    match value {
                        Some(v) => self.encode(output, v),
                        None => {
                            output.put_marker(NULL_MARKER);
                            Ok(())
                        }
                    }
                }
            }

            impl_dyn_codec!($codec, $name, $variant);
        )*
    };
}

macro_rules! numeric_array_codec {
    ($(#[$meta:meta])* $codec:ident, $element:ident, $ty:ty, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $codec {
            markers: MarkerRange,
            element: $element,
        }

        impl $codec {
            /// Claim the size-tier markers starting at `base`.
            pub fn new(base: Marker) -> Result<Self> {
                Ok(Self {
                    markers: size_markers(base)?,
                    element: $element::new(0)?,
                })
            }

            /// Markers this codec claims.
            pub fn marker_range(&self) -> MarkerRange {
                self.markers
            }

            /// Write a non-null array.
            pub fn encode(&self, output: &mut ByteWriter, value: &[$ty]) -> Result<()> {
                size::write_size(output, self.markers.base(), value.len())?;
                for v in value {
                    self.element.encode(output, *v);
                }
                Ok(())
            }

            /// Read an array, or `None` for the null marker.
            pub fn decode(&self, input: &mut ByteReader<'_>) -> Result<Option<Vec<$ty>>> {
                let Some(len) = size::read_size(input, self.markers.base(), $name)? else {
                    return Ok(None);
                };
                let mut items = Vec::with_capacity(len.min(input.remaining()));
                for _ in 0..len {
                    let item = self
                        .element
                        .decode(input)?
                        .ok_or(MarkserError::UnexpectedNull { target: $name })?;
                    items.push(item);
                }
                Ok(Some(items))
            }
        }
    };
}

numeric_array_codec!(
    /// Codec for `Vec<i16>`.
    ShortArrayCodec, ShortCodec, i16, "short[]"
);
numeric_array_codec!(
    /// Codec for `Vec<i32>`.
    IntArrayCodec, IntCodec, i32, "int[]"
);
numeric_array_codec!(
    /// Codec for `Vec<i64>`.
    LongArrayCodec, LongCodec, i64, "long[]"
);
numeric_array_codec!(
    /// Codec for `Vec<f32>`.
    FloatArrayCodec, FloatCodec, f32, "float[]"
);
numeric_array_codec!(
    /// Codec for `Vec<f64>`.
    DoubleArrayCodec, DoubleCodec, f64, "double[]"
);

array_codec_impls! {
    BoolArrayCodec => bool, "bool[]", BoolArray;
    ByteArrayCodec => u8, "byte[]", ByteArray;
    CharArrayCodec => char, "char[]", CharArray;
    ShortArrayCodec => i16, "short[]", ShortArray;
    IntArrayCodec => i32, "int[]", IntArray;
    LongArrayCodec => i64, "long[]", LongArray;
    FloatArrayCodec => f32, "float[]", FloatArray;
    DoubleArrayCodec => f64, "double[]", DoubleArray;
}
