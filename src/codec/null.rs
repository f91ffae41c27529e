//! The fixed codec at the null marker.

use std::any::Any;

use crate::error::{MarkserError, Result};
use crate::registry::Registry;
use crate::value::{Value, ValueType};
use crate::wire::{ByteReader, ByteWriter, MarkerRange, NULL_MARKER};

use super::DynCodec;

/// Codec owning marker `-128`. Every registry holds exactly one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCodec;

impl DynCodec for NullCodec {
    fn name(&self) -> &'static str {
        "null"
    }

    fn markers(&self) -> MarkerRange {
        MarkerRange::NULL
    }

    fn writes(&self, ty: &ValueType) -> bool {
        *ty == ValueType::Null
    }

    fn read_value(&self, _: &Registry, input: &mut ByteReader<'_>) -> Result<Value> {
        match input.read_marker()? {
            NULL_MARKER => Ok(Value::Null),
            marker => Err(MarkserError::Decode {
                target: "null",
                marker,
            }),
        }
    }

    fn write_value(&self, _: &Registry, output: &mut ByteWriter, value: &Value) -> Result<()> {
        match value {
            Value::Null => {
                output.put_marker(NULL_MARKER);
                Ok(())
            }
            other => Err(MarkserError::mismatch("null", other)),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
