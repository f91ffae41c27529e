//! Polymorphic codec dispatching through the registry.

use crate::error::Result;
use crate::registry::Registry;
use crate::value::Value;
use crate::wire::{ByteReader, ByteWriter, NULL_MARKER};

use super::Codec;

/// Reads whatever the next marker announces and writes any value with the
/// codec registered for its type.
///
/// Used for elements of unknown or mixed type. Null travels in-band as
/// [`Value::Null`], so reads always return `Some`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnyCodec;

impl Codec for AnyCodec {
    type Value = Value;

    fn read(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Option<Value>> {
        let marker = input.peek_marker()?;
        if marker == NULL_MARKER {
            input.read_marker()?;
            return Ok(Some(Value::Null));
        }
        registry
            .codec_for_marker(marker)?
            .read_value(registry, input)
            .map(Some)
    }

    fn write(&self, registry: &Registry, output: &mut ByteWriter, value: Option<&Value>) -> Result<()> {
        match value {
            None | Some(Value::Null) => {
                output.put_marker(NULL_MARKER);
                Ok(())
            }
            Some(value) => registry.codec_for(value)?.write_value(registry, output, value),
        }
    }
}
