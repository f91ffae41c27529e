//! Arrays of one declared element type.

use std::any::Any;
use std::sync::Arc;

use crate::codec::{Codec, DynCodec};
use crate::error::{MarkserError, Result};
use crate::registry::Registry;
use crate::value::{ObjectArray, Value, ValueType};
use crate::wire::{size, ByteReader, ByteWriter, Marker, MarkerRange, NULL_MARKER};

/// Codec for [`ObjectArray`]s of one element type.
///
/// Wire layout: the marker, a raw 4-byte big-endian element count, then
/// each element through the element type's codec (null elements allowed).
pub struct ObjectArrayCodec {
    markers: MarkerRange,
    element: ValueType,
    element_codec: Option<Arc<dyn DynCodec>>,
}

impl ObjectArrayCodec {
    /// Claim `marker` for arrays of `element`, resolving the element codec in
    /// `registry`. [`ValueType::Any`] elements dispatch per element.
    pub fn new(marker: Marker, element: ValueType, registry: &Registry) -> Result<Self> {
        let element_codec = match element {
            ValueType::Any => None,
            ref ty => Some(registry.codec_for_type(ty)?),
        };
        Ok(Self {
            markers: MarkerRange::single(marker)?,
            element,
            element_codec,
        })
    }

    pub fn marker_range(&self) -> MarkerRange {
        self.markers
    }

    /// Declared element type.
    pub fn element(&self) -> &ValueType {
        &self.element
    }

    fn write_item(&self, registry: &Registry, output: &mut ByteWriter, item: &Value) -> Result<()> {
        match &self.element_codec {
            Some(codec) => codec.write_value(registry, output, item),
            None => registry.write_any(output, item),
        }
    }

    fn read_item(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Value> {
        match &self.element_codec {
            Some(codec) => codec.read_value(registry, input),
            None => registry.read_any(input),
        }
    }
}

impl Codec for ObjectArrayCodec {
    type Value = ObjectArray;

    fn read(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Option<ObjectArray>> {
        let marker = input.read_marker()?;
        if marker == NULL_MARKER {
            return Ok(None);
        }
        if marker != self.markers.base() {
            return Err(MarkserError::Decode {
                target: "array",
                marker,
            });
        }
        let count = input.read_signed(4)?;
        if count < 0 {
            return Err(MarkserError::Decode {
                target: "array",
                marker,
            });
        }
        let count = count as usize;
        let mut items = Vec::with_capacity(count.min(input.remaining()));
        for _ in 0..count {
            items.push(self.read_item(registry, input)?);
        }
        Ok(Some(ObjectArray::new(self.element.clone(), items)))
    }

    fn write(
        &self,
        registry: &Registry,
        output: &mut ByteWriter,
        value: Option<&ObjectArray>,
    ) -> Result<()> {
        let Some(array) = value else {
            output.put_marker(NULL_MARKER);
            return Ok(());
        };
        if array.element != self.element {
            return Err(MarkserError::TypeMismatch {
                codec: "array",
                found: ValueType::Array(Box::new(array.element.clone())).to_string(),
            });
        }
        let count = array.items.len();
        if count > size::MAX_SIZE {
            return Err(MarkserError::SizeOverflow(count));
        }
        output.put_marker_and(self.markers.base(), count as i64, 4);
        for item in &array.items {
            self.write_item(registry, output, item)?;
        }
        Ok(())
    }
}

impl DynCodec for ObjectArrayCodec {
    fn name(&self) -> &'static str {
        "array"
    }

    fn markers(&self) -> MarkerRange {
        self.markers
    }

    fn writes(&self, ty: &ValueType) -> bool {
        matches!(ty, ValueType::Array(element) if **element == self.element)
    }

    fn read_value(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Value> {
        Ok(Codec::read(self, registry, input)?.map_or(Value::Null, Value::Array))
    }

    fn write_value(&self, registry: &Registry, output: &mut ByteWriter, value: &Value) -> Result<()> {
        match value {
            Value::Null => Codec::write(self, registry, output, None),
            Value::Array(array) => Codec::write(self, registry, output, Some(array)),
            other => Err(MarkserError::mismatch("array", other)),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
