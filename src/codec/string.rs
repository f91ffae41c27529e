//! UTF-8 string codec.
//!
//! Short strings carry their byte length in the marker itself:
//! ```text
//! ┌──────────────────────┬──────────────────────┐
//! │ base .. base+N-1     │ base+N .. base+N+3   │
//! │ length 0..N-1 inline │ size tiers           │
//! └──────────────────────┴──────────────────────┘
//! ```
//! followed by the UTF-8 bytes.

use crate::error::{MarkserError, Result};
use crate::registry::Registry;
use crate::wire::{size, ByteReader, ByteWriter, Marker, MarkerRange, NULL_MARKER, SIZE_MARKERS};

use super::Codec;

/// Codec for `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringCodec {
    markers: MarkerRange,
    optimized: u8,
}

impl StringCodec {
    /// Claim `optimized` inline-length markers plus four size tiers, starting
    /// at `base`.
    pub fn new(base: Marker, optimized: u8) -> Result<Self> {
        let count = optimized
            .checked_add(SIZE_MARKERS)
            .ok_or(MarkserError::MarkerOverflow {
                base,
                count: optimized,
            })?;
        Ok(Self {
            markers: MarkerRange::new(base, count)?,
            optimized,
        })
    }

    pub fn marker_range(&self) -> MarkerRange {
        self.markers
    }

    /// Number of inline-length markers.
    pub fn optimized(&self) -> u8 {
        self.optimized
    }

    fn size_base(&self) -> Marker {
        self.markers.at(self.optimized)
    }

    /// Write a non-null string.
    pub fn encode(&self, output: &mut ByteWriter, value: &str) -> Result<()> {
        let len = value.len();
        if len < self.optimized as usize {
            output.put_marker(self.markers.at(len as u8));
        } else {
            size::write_size(output, self.size_base(), len)?;
        }
        output.put_bytes(value.as_bytes());
        Ok(())
    }

    /// Read a string, or `None` for the null marker.
    pub fn decode(&self, input: &mut ByteReader<'_>) -> Result<Option<String>> {
        let marker = input.read_marker()?;
        if marker == NULL_MARKER {
            return Ok(None);
        }
        let len = match self.markers.offset_of(marker) {
            Some(offset) if offset < self.optimized => offset as usize,
            Some(_) => size::read_size_payload(input, marker, self.size_base(), "string")?,
            None => {
                return Err(MarkserError::Decode {
                    target: "string",
                    marker,
                })
            }
        };
        let bytes = input.read_bytes(len)?;
        Ok(Some(std::str::from_utf8(bytes)?.to_owned()))
    }
}

impl Codec for StringCodec {
    type Value = String;

    fn read(&self, _: &Registry, input: &mut ByteReader<'_>) -> Result<Option<String>> {
        self.decode(input)
    }

    fn write(&self, _: &Registry, output: &mut ByteWriter, value: Option<&String>) -> Result<()> {
        match value {
            Some(v) => self.encode(output, v),
            None => {
                output.put_marker(NULL_MARKER);
                Ok(())
            }
        }
    }
}

impl_dyn_codec!(StringCodec, "string", String);
