//! Serializer: a sequence of values appended to one output buffer.

use std::sync::Arc;

use bytes::Bytes;

use crate::codec::Codec;
use crate::config::{CodecConfig, DEFAULT_INITIAL_BUFFER_CAPACITY};
use crate::error::Result;
use crate::registry::Registry;
use crate::value::Value;
use crate::wire::ByteWriter;

/// Appends marker-prefixed values to a growable buffer it owns.
///
/// A failed append leaves the buffer as it was before the call.
///
/// # Example
///
/// ```
/// use markser::{CodecConfig, Deserializer, Registry, Serializer, Value};
///
/// let registry = Registry::standard(&CodecConfig::default()).unwrap();
/// let mut serializer = Serializer::new(&registry);
/// serializer.append(&Value::Long(1234)).unwrap();
/// serializer.append(&Value::from("test")).unwrap();
///
/// let mut deserializer = Deserializer::new(&registry, serializer.as_bytes());
/// assert_eq!(deserializer.read().unwrap(), Value::Long(1234));
/// assert_eq!(deserializer.read().unwrap(), Value::from("test"));
/// assert_eq!(deserializer.available(), 0);
/// ```
#[derive(Debug)]
pub struct Serializer<'r> {
    registry: &'r Registry,
    output: ByteWriter,
}

impl<'r> Serializer<'r> {
    /// Create a serializer with the default buffer capacity.
    pub fn new(registry: &'r Registry) -> Self {
        Self::with_capacity(registry, DEFAULT_INITIAL_BUFFER_CAPACITY)
    }

    /// Create a serializer reserving `capacity` bytes up front.
    pub fn with_capacity(registry: &'r Registry, capacity: usize) -> Self {
        Self {
            registry,
            output: ByteWriter::with_capacity(capacity),
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Append `value` with the codec registered for its type.
    pub fn append(&mut self, value: &Value) -> Result<()> {
        let registry = self.registry;
        self.guarded(|output| registry.write_any(output, value))
    }

    /// Append `value` with an explicit codec, skipping type resolution.
    pub fn append_with<C: Codec>(&mut self, codec: &C, value: Option<&C::Value>) -> Result<()> {
        let registry = self.registry;
        self.guarded(|output| codec.write(registry, output, value))
    }

    fn guarded(&mut self, write: impl FnOnce(&mut ByteWriter) -> Result<()>) -> Result<()> {
        let start = self.output.len();
        let result = write(&mut self.output);
        if result.is_err() {
            self.output.truncate(start);
        }
        result
    }

    /// Bytes written so far.
    pub fn current_size(&self) -> usize {
        self.output.len()
    }

    /// Zero-copy view of the bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        self.output.as_slice()
    }

    /// Trimmed copy of the bytes written so far.
    pub fn to_vec(&self) -> Vec<u8> {
        self.output.to_vec()
    }

    /// Finish, handing over the buffer without copying.
    pub fn into_bytes(self) -> Bytes {
        self.output.freeze()
    }

    /// Forget everything written, keeping the allocation for reuse.
    pub fn clear(&mut self) {
        self.output.clear();
    }
}

/// Hands out serializers bound to a shared registry and config.
#[derive(Debug, Clone)]
pub struct SerializerFactory {
    registry: Arc<Registry>,
    config: CodecConfig,
}

impl SerializerFactory {
    pub fn new(registry: Arc<Registry>, config: CodecConfig) -> Self {
        Self { registry, config }
    }

    /// Factory over a fresh standard registry built from `config`.
    pub fn standard(config: CodecConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(Registry::standard(&config)?), config))
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// A serializer with the configured initial capacity.
    pub fn serializer(&self) -> Serializer<'_> {
        Serializer::with_capacity(&self.registry, self.config.initial_buffer_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::LongCodec;
    use crate::error::MarkserError;
    use crate::value::ObjectArray;
    use crate::value::ValueType;

    #[test]
    fn test_append_with_explicit_codec() {
        let registry = Registry::new();
        let codec = LongCodec::new(0).unwrap();
        let mut serializer = Serializer::new(&registry);
        serializer.append_with(&codec, Some(&1234)).unwrap();
        serializer.append_with(&codec, None).unwrap();
        assert_eq!(serializer.as_bytes(), &[1, 0x04, 0xD2, 0x80]);
        assert_eq!(serializer.current_size(), 4);
    }

    #[test]
    fn test_failed_append_rolls_back() {
        let registry = Registry::standard(&CodecConfig::default()).unwrap();
        let mut serializer = Serializer::new(&registry);
        serializer.append(&Value::Int(1)).unwrap();
        let size = serializer.current_size();

        // The list codec writes its size and first element before failing.
        let unsupported = Value::List(vec![
            Value::Int(2),
            Value::Array(ObjectArray::new(ValueType::Int, vec![])),
        ]);
        assert!(matches!(
            serializer.append(&unsupported),
            Err(MarkserError::MissingCodec(_))
        ));
        assert_eq!(serializer.current_size(), size);
    }

    #[test]
    fn test_output_views() {
        let registry = Registry::standard(&CodecConfig::default()).unwrap();
        let mut serializer = Serializer::with_capacity(&registry, 4);
        serializer.append(&Value::from("a longer string than four bytes")).unwrap();
        let copy = serializer.to_vec();
        assert_eq!(copy.as_slice(), serializer.as_bytes());
        let bytes = serializer.into_bytes();
        assert_eq!(&bytes[..], copy.as_slice());
    }

    #[test]
    fn test_clear() {
        let registry = Registry::standard(&CodecConfig::default()).unwrap();
        let mut serializer = Serializer::new(&registry);
        serializer.append(&Value::Bool(true)).unwrap();
        serializer.clear();
        assert_eq!(serializer.current_size(), 0);
    }

    #[test]
    fn test_factory() {
        let config = CodecConfig {
            initial_buffer_capacity: 16,
            ..CodecConfig::default()
        };
        let factory = SerializerFactory::standard(config).unwrap();
        assert_eq!(factory.config(), &config);
        let mut serializer = factory.serializer();
        serializer.append(&Value::Long(7)).unwrap();
        assert_eq!(serializer.current_size(), 2);
    }
}
