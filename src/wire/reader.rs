//! Bounded input cursor over caller-owned bytes.

use crate::error::{MarkserError, Result};

use super::marker::Marker;

/// Read cursor over a borrowed byte slice.
///
/// The reader never mutates the backing bytes; it only narrows a view with an
/// offset and a length.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Read all of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Read `len` bytes of `data` starting at `offset`.
    ///
    /// Fails with [`MarkserError::BufferUnderflow`] if the window runs past the
    /// end of `data`.
    pub fn with_range(data: &'a [u8], offset: usize, len: usize) -> Result<Self> {
        let end = offset.checked_add(len).filter(|end| *end <= data.len());
        match end {
            Some(end) => Ok(Self {
                data: &data[offset..end],
                pos: 0,
            }),
            None => Err(MarkserError::BufferUnderflow {
                needed: offset.saturating_add(len),
                available: data.len(),
            }),
        }
    }

    /// Bytes not consumed yet.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether every byte has been consumed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Bytes consumed so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.remaining() < needed {
            return Err(MarkserError::BufferUnderflow {
                needed,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Look at the next marker without consuming it.
    #[inline]
    pub fn peek_marker(&self) -> Result<Marker> {
        self.ensure(1)?;
        Ok(self.data[self.pos] as Marker)
    }

    /// Consume the next marker.
    #[inline]
    pub fn read_marker(&mut self) -> Result<Marker> {
        let marker = self.peek_marker()?;
        self.pos += 1;
        Ok(marker)
    }

    /// Consume `width` bytes (1 to 8) as a big-endian two's-complement value,
    /// sign-extended to 64 bits.
    pub fn read_signed(&mut self, width: usize) -> Result<i64> {
        debug_assert!((1..=8).contains(&width));
        self.ensure(width)?;
        let bytes = &self.data[self.pos..self.pos + width];
        let mut buf = if bytes[0] & 0x80 != 0 { [0xFF; 8] } else { [0; 8] };
        buf[8 - width..].copy_from_slice(bytes);
        self.pos += width;
        Ok(i64::from_be_bytes(buf))
    }

    /// Consume exactly `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Consume everything left.
    pub fn skip_to_end(&mut self) {
        self.pos = self.data.len();
    }
}
