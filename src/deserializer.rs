//! Deserializer: reads values back one at a time from borrowed bytes.

use std::sync::Arc;

use crate::codec::Codec;
use crate::error::Result;
use crate::registry::Registry;
use crate::value::Value;
use crate::wire::ByteReader;

/// Reads marker-prefixed values from a caller-owned byte window.
///
/// The bytes are never copied or modified. A failed read leaves the cursor
/// where it was before the call.
#[derive(Debug, Clone)]
pub struct Deserializer<'r, 'a> {
    registry: &'r Registry,
    input: ByteReader<'a>,
}

impl<'r, 'a> Deserializer<'r, 'a> {
    /// Read all of `bytes`.
    pub fn new(registry: &'r Registry, bytes: &'a [u8]) -> Self {
        Self {
            registry,
            input: ByteReader::new(bytes),
        }
    }

    /// Read the `len` bytes of `bytes` starting at `offset`.
    pub fn with_range(
        registry: &'r Registry,
        bytes: &'a [u8],
        offset: usize,
        len: usize,
    ) -> Result<Self> {
        Ok(Self {
            registry,
            input: ByteReader::with_range(bytes, offset, len)?,
        })
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Read the next value, dispatching on its marker. Null reads as
    /// [`Value::Null`].
    pub fn read(&mut self) -> Result<Value> {
        let registry = self.registry;
        self.guarded(|input| registry.read_any(input))
    }

    /// Read the next value with an explicit codec.
    pub fn read_with<C: Codec>(&mut self, codec: &C) -> Result<Option<C::Value>> {
        let registry = self.registry;
        self.guarded(|input| codec.read(registry, input))
    }

    fn guarded<T>(&mut self, read: impl FnOnce(&mut ByteReader<'a>) -> Result<T>) -> Result<T> {
        let start = self.input.clone();
        let result = read(&mut self.input);
        if result.is_err() {
            self.input = start;
        }
        result
    }

    /// Bytes left to read.
    pub fn available(&self) -> usize {
        self.input.remaining()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.input.position()
    }
}

impl Iterator for Deserializer<'_, '_> {
    type Item = Result<Value>;

    /// Yields values until the input is exhausted, then stops after the first
    /// error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.is_empty() {
            return None;
        }
        let result = self.read();
        if result.is_err() {
            self.input.skip_to_end();
        }
        Some(result)
    }
}

/// Hands out deserializers bound to a shared registry.
#[derive(Debug, Clone)]
pub struct DeserializerFactory {
    registry: Arc<Registry>,
}

impl DeserializerFactory {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// A deserializer over all of `bytes`.
    pub fn deserializer<'a>(&'a self, bytes: &'a [u8]) -> Deserializer<'a, 'a> {
        Deserializer::new(&self.registry, bytes)
    }

    /// A deserializer over `len` bytes of `bytes` starting at `offset`.
    pub fn deserializer_range<'a>(
        &'a self,
        bytes: &'a [u8],
        offset: usize,
        len: usize,
    ) -> Result<Deserializer<'a, 'a>> {
        Deserializer::with_range(&self.registry, bytes, offset, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{LongCodec, StringCodec};
    use crate::config::CodecConfig;
    use crate::error::MarkserError;

    fn standard() -> Registry {
        Registry::standard(&CodecConfig::default()).unwrap()
    }

    #[test]
    fn test_read_with_explicit_codec() {
        let registry = Registry::new();
        let codec = LongCodec::new(0).unwrap();
        let bytes = [1, 0x04, 0xD2, 0x80];
        let mut deserializer = Deserializer::new(&registry, &bytes);
        assert_eq!(deserializer.read_with(&codec).unwrap(), Some(1234));
        assert_eq!(deserializer.read_with(&codec).unwrap(), None);
        assert!(deserializer.is_empty());
    }

    #[test]
    fn test_null_reads_as_null() {
        let registry = standard();
        let mut deserializer = Deserializer::new(&registry, &[0x80]);
        assert_eq!(deserializer.read().unwrap(), Value::Null);
        assert_eq!(deserializer.available(), 0);
    }

    #[test]
    fn test_with_range_reads_window_only() {
        let registry = Registry::new();
        let codec = StringCodec::new(0, 16).unwrap();
        // Garbage, "hi", garbage.
        let bytes = [0x7F, 2, b'h', b'i', 0x7F];
        let mut deserializer = Deserializer::with_range(&registry, &bytes, 1, 3).unwrap();
        assert_eq!(deserializer.read_with(&codec).unwrap().as_deref(), Some("hi"));
        assert_eq!(deserializer.available(), 0);
    }

    #[test]
    fn test_with_range_out_of_bounds() {
        let registry = Registry::new();
        assert!(matches!(
            Deserializer::with_range(&registry, &[1, 2, 3], 2, 5),
            Err(MarkserError::BufferUnderflow { .. })
        ));
    }

    #[test]
    fn test_failed_read_keeps_position() {
        let registry = standard();
        // A long marker claiming two payload bytes with only one present.
        let marker = registry.codec_for(&Value::Long(0)).unwrap().markers().base();
        let bytes = [(marker + 1) as u8, 0x04];
        let mut deserializer = Deserializer::new(&registry, &bytes);
        assert!(matches!(
            deserializer.read(),
            Err(MarkserError::BufferUnderflow { .. })
        ));
        assert_eq!(deserializer.position(), 0);
        assert_eq!(deserializer.available(), 2);
    }

    #[test]
    fn test_unknown_marker() {
        let registry = Registry::new();
        let mut deserializer = Deserializer::new(&registry, &[5]);
        assert!(matches!(
            deserializer.read(),
            Err(MarkserError::UnknownMarker(5))
        ));
    }

    #[test]
    fn test_iterates_until_exhausted() {
        let registry = standard();
        let mut out = crate::serializer::Serializer::new(&registry);
        out.append(&Value::Long(1)).unwrap();
        out.append(&Value::from("two")).unwrap();
        out.append(&Value::Null).unwrap();
        let values: Result<Vec<Value>> = Deserializer::new(&registry, out.as_bytes()).collect();
        assert_eq!(
            values.unwrap(),
            vec![Value::Long(1), Value::from("two"), Value::Null]
        );
    }

    #[test]
    fn test_iteration_stops_after_error() {
        let registry = Registry::new();
        let mut deserializer = Deserializer::new(&registry, &[5, 6, 7]);
        assert!(deserializer.next().unwrap().is_err());
        assert!(deserializer.next().is_none());
    }

    #[test]
    fn test_factory() {
        let factory = DeserializerFactory::new(Arc::new(standard()));
        let codec = factory.registry().codec_for(&Value::Bool(true)).unwrap();
        let bytes = [codec.markers().base() as u8];
        let mut deserializer = factory.deserializer(&bytes);
        assert_eq!(deserializer.read().unwrap(), Value::Bool(true));
        let mut ranged = factory.deserializer_range(&bytes, 1, 0).unwrap();
        assert!(ranged.is_empty());
        assert!(ranged.read().is_err());
    }
}
