//! Codecs: marker-prefixed encoders and decoders for each value kind.
//!
//! A codec claims a contiguous run of markers and owns everything written
//! after one of them. Two views exist for each codec:
//!
//! - [`Codec`] - statically typed (`LongCodec` reads and writes `i64`). Typed
//!   fast paths and object fields use this view to skip registry lookups.
//! - [`DynCodec`] - type-erased over [`Value`], stored in the [`Registry`] and
//!   used for polymorphic dispatch.
//!
//! Codecs hold no reference to the registry. Composite codecs receive it as a
//! call argument and recurse through it for nested elements.
//!
//! # Example
//!
//! ```
//! use markser::codec::{Codec, LongCodec};
//! use markser::wire::{ByteReader, ByteWriter};
//! use markser::Registry;
//!
//! let registry = Registry::new();
//! let codec = LongCodec::new(0).unwrap();
//!
//! let mut out = ByteWriter::new();
//! codec.write(&registry, &mut out, Some(&1234)).unwrap();
//! assert_eq!(out.as_slice(), &[1, 0x04, 0xD2]);
//!
//! let mut input = ByteReader::new(out.as_slice());
//! assert_eq!(codec.read(&registry, &mut input).unwrap(), Some(1234));
//! ```

use std::any::Any;
use std::sync::Arc;

use crate::error::Result;
use crate::registry::Registry;
use crate::value::{Value, ValueType};
use crate::wire::{ByteReader, ByteWriter, MarkerRange};

/// Implements [`DynCodec`] for a codec whose [`Codec::Value`] is the payload
/// of one `Value` variant with a same-named `ValueType`.
macro_rules! impl_dyn_codec {
    ($codec:ty, $name:literal, $variant:ident) => {
        impl $crate::codec::DynCodec for $codec {
            fn name(&self) -> &'static str {
                $name
            }

            fn markers(&self) -> $crate::wire::MarkerRange {
                self.marker_range()
            }

            fn writes(&self, ty: &$crate::value::ValueType) -> bool {
                *ty == $crate::value::ValueType::$variant
            }

            fn read_value(
                &self,
                registry: &$crate::registry::Registry,
                input: &mut $crate::wire::ByteReader<'_>,
            ) -> $crate::error::Result<$crate::value::Value> {
                Ok($crate::codec::Codec::read(self, registry, input)?
                    .map_or($crate::value::Value::Null, $crate::value::Value::$variant))
            }

            fn write_value(
                &self,
                registry: &$crate::registry::Registry,
                output: &mut $crate::wire::ByteWriter,
                value: &$crate::value::Value,
            ) -> $crate::error::Result<()> {
                match value {
                    $crate::value::Value::Null => {
                        $crate::codec::Codec::write(self, registry, output, None)
                    }
                    $crate::value::Value::$variant(v) => {
                        $crate::codec::Codec::write(self, registry, output, Some(v))
                    }
                    other => Err($crate::error::MarkserError::mismatch($name, other)),
                }
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };
}

mod any;
mod array;
mod collection;
mod map;
mod null;
pub mod object;
mod primitive;
mod string;

pub use any::AnyCodec;
pub use array::{
    BoolArrayCodec, ByteArrayCodec, CharArrayCodec, DoubleArrayCodec, FloatArrayCodec,
    IntArrayCodec, LongArrayCodec, ShortArrayCodec,
};
pub use collection::{
    CollectionCodec, ListCodec, QueueCodec, SetCodec, TypedCollection, TypedList, TypedQueue,
    TypedSet,
};
pub use map::{MapCodec, TypedMap};
pub use null::NullCodec;
pub use object::{EnumCodec, ObjectArrayCodec, ObjectCodec, ObjectCodecBuilder};
pub use primitive::{
    BoolCodec, ByteCodec, CharCodec, DoubleCodec, FloatCodec, IntCodec, LongCodec, ShortCodec,
};
pub use string::StringCodec;

/// Statically typed codec.
///
/// Writing `None` emits the null marker and nothing else; reading the null
/// marker yields `None` without consuming further bytes.
pub trait Codec: Send + Sync {
    /// Type read and written by this codec.
    type Value;

    /// Read one value.
    fn read(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Option<Self::Value>>;

    /// Write one value, or the null marker for `None`.
    fn write(
        &self,
        registry: &Registry,
        output: &mut ByteWriter,
        value: Option<&Self::Value>,
    ) -> Result<()>;
}

/// Type-erased codec, as stored in a [`Registry`].
pub trait DynCodec: Send + Sync + 'static {
    /// Short name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Markers claimed by this codec.
    fn markers(&self) -> MarkerRange;

    /// Whether this codec writes values of type `ty`.
    fn writes(&self, ty: &ValueType) -> bool;

    /// Read one value; the null marker reads as [`Value::Null`].
    fn read_value(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Value>;

    /// Write one value; [`Value::Null`] writes the null marker.
    fn write_value(&self, registry: &Registry, output: &mut ByteWriter, value: &Value) -> Result<()>;

    /// Concrete codec, for recovering a typed fast path.
    fn as_any(&self) -> &dyn Any;
}

/// A registered codec used as an element codec. Null travels in-band as
/// [`Value::Null`], so reads always return `Some`.
impl Codec for Arc<dyn DynCodec> {
    type Value = Value;

    fn read(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Option<Value>> {
        self.read_value(registry, input).map(Some)
    }

    fn write(&self, registry: &Registry, output: &mut ByteWriter, value: Option<&Value>) -> Result<()> {
        self.write_value(registry, output, value.unwrap_or(&Value::Null))
    }
}

/// Capacity to reserve for a hashed container announced with `size` entries.
///
/// Bounded by the bytes left in the input, since every entry takes at least
/// one byte.
pub(crate) fn capacity_hint(size: usize, remaining: usize) -> usize {
    const MAX_CAPACITY: usize = 1 << 30;
    let size = size.min(remaining);
    if size < MAX_CAPACITY / 4 * 3 {
        size + size / 3
    } else {
        MAX_CAPACITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_hint() {
        assert_eq!(capacity_hint(0, 100), 0);
        assert_eq!(capacity_hint(30, 100), 40);
        assert_eq!(capacity_hint(1_000_000, 9), 12);
        assert_eq!(capacity_hint(usize::MAX, usize::MAX), 1 << 30);
    }
}
