//! Growable output buffer.

use bytes::{BufMut, Bytes, BytesMut};

use super::marker::Marker;

/// Append-only output buffer backed by [`BytesMut`].
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: BytesMut,
}

impl ByteWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with room for `capacity` bytes before growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append one marker byte.
    #[inline]
    pub fn put_marker(&mut self, marker: Marker) {
        self.buf.put_i8(marker);
    }

    /// Append raw bytes.
    #[inline]
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    /// Append the low `width` bytes (1 to 8) of `value`, big-endian.
    #[inline]
    pub fn put_signed(&mut self, value: i64, width: usize) {
        debug_assert!((1..=8).contains(&width));
        self.buf.put_slice(&value.to_be_bytes()[8 - width..]);
    }

    /// Append a marker followed by the low `width` bytes of `value`.
    #[inline]
    pub fn put_marker_and(&mut self, marker: Marker, value: i64, width: usize) {
        self.buf.reserve(1 + width);
        self.put_marker(marker);
        self.put_signed(value, width);
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Zero-copy view of the written bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Trimmed copy of the written bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.buf.to_vec()
    }

    /// Drop everything written, keeping the allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Drop everything written after the first `len` bytes.
    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    /// Convert into immutable [`Bytes`] without copying.
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}
