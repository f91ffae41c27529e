//! Tiered size encoding for lengths and counts.
//!
//! A size is written relative to a base marker `m` owned by the calling codec:
//! ```text
//! ┌────────┬──────────────────────┬─────────┬─────────────────┐
//! │ Marker │ Sizes                │ Payload │ Stored value    │
//! ├────────┼──────────────────────┼─────────┼─────────────────┤
//! │ m      │ [0, 256)             │ 1 byte  │ size - 128      │
//! │ m + 1  │ [256, 65792)         │ 2 bytes │ size - 33024    │
//! │ m + 2  │ [65792, 16843008)    │ 3 bytes │ size - 8454400  │
//! │ m + 3  │ [16843008, i32::MAX] │ 4 bytes │ size            │
//! └────────┴──────────────────────┴─────────┴─────────────────┘
//! ```
//!
//! Each stored value is signed big-endian, so every tier uses its full signed
//! range and starts where the previous one ends.

use crate::error::{MarkserError, Result};

use super::marker::{Marker, NULL_MARKER};
use super::reader::ByteReader;
use super::writer::ByteWriter;

/// Markers a size-prefixed codec reserves for its size tiers.
pub const SIZE_MARKERS: u8 = 4;

/// First size of tier 1.
pub const TIER1_START: usize = 256;
/// First size of tier 2.
pub const TIER2_START: usize = TIER1_START + (1 << 16);
/// First size of tier 3.
pub const TIER3_START: usize = TIER2_START + (1 << 24);

const TIER0_OFFSET: i64 = 128;
const TIER1_OFFSET: i64 = TIER1_START as i64 + (1 << 15);
const TIER2_OFFSET: i64 = TIER2_START as i64 + (1 << 23);

/// Largest size the widest tier can carry.
pub const MAX_SIZE: usize = i32::MAX as usize;

/// Number of bytes `write_size` emits for `size`, marker included.
pub fn encoded_len(size: usize) -> usize {
    match size {
        s if s < TIER1_START => 2,
        s if s < TIER2_START => 3,
        s if s < TIER3_START => 4,
        _ => 5,
    }
}

/// Write `size` using the tier markers starting at `base`.
pub fn write_size(output: &mut ByteWriter, base: Marker, size: usize) -> Result<()> {
    if size > MAX_SIZE {
        return Err(MarkserError::SizeOverflow(size));
    }
    let value = size as i64;
    if size < TIER1_START {
        output.put_marker_and(base, value - TIER0_OFFSET, 1);
    } else if size < TIER2_START {
        output.put_marker_and(base.wrapping_add(1), value - TIER1_OFFSET, 2);
    } else if size < TIER3_START {
        output.put_marker_and(base.wrapping_add(2), value - TIER2_OFFSET, 3);
    } else {
        output.put_marker_and(base.wrapping_add(3), value, 4);
    }
    Ok(())
}

/// Read a size whose tier markers start at `base`.
///
/// Returns `None` for the null marker. Any other marker outside the four tiers
/// is a decode error naming `target`.
pub fn read_size(input: &mut ByteReader<'_>, base: Marker, target: &'static str) -> Result<Option<usize>> {
    let marker = input.read_marker()?;
    if marker == NULL_MARKER {
        return Ok(None);
    }
    read_size_payload(input, marker, base, target).map(Some)
}

/// Read the payload of a size whose marker has already been consumed.
pub fn read_size_payload(
    input: &mut ByteReader<'_>,
    marker: Marker,
    base: Marker,
    target: &'static str,
) -> Result<usize> {
    let size = match marker as i16 - base as i16 {
        0 => input.read_signed(1)? + TIER0_OFFSET,
        1 => input.read_signed(2)? + TIER1_OFFSET,
        2 => input.read_signed(3)? + TIER2_OFFSET,
        3 => input.read_signed(4)?,
        _ => return Err(MarkserError::Decode { target, marker }),
    };
    if size < 0 {
        return Err(MarkserError::Decode { target, marker });
    }
    Ok(size as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(size: usize) -> (usize, usize) {
        let mut out = ByteWriter::new();
        write_size(&mut out, 10, size).unwrap();
        let written = out.len();
        let mut input = ByteReader::new(out.as_slice());
        let read = read_size(&mut input, 10, "size").unwrap().unwrap();
        assert!(input.is_empty());
        (read, written)
    }

    #[test]
    fn test_tier_boundaries() {
        let cases = [
            (0, 2),
            (1, 2),
            (127, 2),
            (128, 2),
            (255, 2),
            (256, 3),
            (65791, 3),
            (65792, 4),
            (16843007, 4),
            (16843008, 5),
            (MAX_SIZE, 5),
        ];
        for (size, len) in cases {
            assert_eq!(roundtrip(size), (size, len), "size {size}");
            assert_eq!(encoded_len(size), len);
        }
    }

    #[test]
    fn test_tier_markers() {
        let mut out = ByteWriter::new();
        write_size(&mut out, 10, 0).unwrap();
        write_size(&mut out, 10, 300).unwrap();
        write_size(&mut out, 10, 70_000).unwrap();
        write_size(&mut out, 10, 20_000_000).unwrap();
        let bytes = out.as_slice();
        assert_eq!(bytes[0], 10);
        assert_eq!(bytes[1], 0x80);
        assert_eq!(bytes[2], 11);
        assert_eq!(bytes[5], 12);
        assert_eq!(bytes[9], 13);
        assert_eq!(&bytes[10..], &20_000_000i32.to_be_bytes());
    }

    #[test]
    fn test_null_marker_reads_none() {
        let data = [0x80u8];
        let mut input = ByteReader::new(&data);
        assert_eq!(read_size(&mut input, 10, "size").unwrap(), None);
        assert!(input.is_empty());
    }

    #[test]
    fn test_foreign_marker_is_decode_error() {
        let data = [14u8, 0];
        let mut input = ByteReader::new(&data);
        let err = read_size(&mut input, 10, "string").unwrap_err();
        assert!(matches!(
            err,
            MarkserError::Decode {
                target: "string",
                marker: 14
            }
        ));
    }

    #[test]
    fn test_negative_raw_size_rejected() {
        let mut out = ByteWriter::new();
        out.put_marker_and(13, -1, 4);
        let mut input = ByteReader::new(out.as_slice());
        assert!(read_size(&mut input, 10, "size").is_err());
    }

    #[test]
    fn test_size_overflow() {
        let mut out = ByteWriter::new();
        let err = write_size(&mut out, 10, MAX_SIZE + 1).unwrap_err();
        assert!(matches!(err, MarkserError::SizeOverflow(_)));
        assert!(out.is_empty());
    }
}
