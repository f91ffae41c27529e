//! Sequence codecs: list, set, queue and the sentinel-delimited collection.
//!
//! List, set and queue write their element count with the size tiers, then
//! each element:
//! ```text
//! [size marker][size payload][element]...
//! ```
//! The generic collection codec brackets its elements with start and end
//! markers instead, for sources that cannot report a size up front:
//! ```text
//! [start][element]...[end]
//! ```
//! Untyped codecs dispatch every element through the registry. Each has a
//! typed fast path bound to one element codec; the typed variant shares the
//! owner's markers and is never registered itself.

use std::any::Any;
use std::collections::VecDeque;
use std::hash::Hash;

use indexmap::IndexSet;

use crate::error::{MarkserError, Result};
use crate::registry::Registry;
use crate::value::{Value, ValueType};
use crate::wire::{size, ByteReader, ByteWriter, Marker, MarkerRange, NULL_MARKER, SIZE_MARKERS};

use super::{capacity_hint, AnyCodec, Codec, DynCodec};

pub(crate) fn write_sized<'v, C>(
    registry: &Registry,
    output: &mut ByteWriter,
    base: Marker,
    element: &C,
    items: impl ExactSizeIterator<Item = &'v C::Value>,
) -> Result<()>
where
    C: Codec,
    C::Value: 'v,
{
    size::write_size(output, base, items.len())?;
    for item in items {
        element.write(registry, output, Some(item))?;
    }
    Ok(())
}

pub(crate) fn read_element<C: Codec>(
    registry: &Registry,
    input: &mut ByteReader<'_>,
    element: &C,
    target: &'static str,
) -> Result<C::Value> {
    element
        .read(registry, input)?
        .ok_or(MarkserError::UnexpectedNull { target })
}

fn read_sized<C: Codec, B>(
    registry: &Registry,
    input: &mut ByteReader<'_>,
    base: Marker,
    target: &'static str,
    element: &C,
    with_capacity: impl FnOnce(usize) -> B,
    mut push: impl FnMut(&mut B, C::Value),
) -> Result<Option<B>> {
    let Some(len) = size::read_size(input, base, target)? else {
        return Ok(None);
    };
    let mut items = with_capacity(len.min(input.remaining()));
    for _ in 0..len {
        push(&mut items, read_element(registry, input, element, target)?);
    }
    Ok(Some(items))
}

macro_rules! sized_sequence {
    (
        $(#[$meta:meta])*
        $codec:ident, $typed:ident, $container:ident, $name:literal, $variant:ident,
        |$n:ident| $alloc:expr,
        |$items:ident, $item:ident| $push:expr
        $(, where $($bound:tt)+)?
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $codec {
            markers: MarkerRange,
        }

        impl $codec {
            pub fn new(base: Marker) -> Result<Self> {
                Ok(Self {
                    markers: MarkerRange::new(base, SIZE_MARKERS)?,
                })
            }

            pub fn marker_range(&self) -> MarkerRange {
                self.markers
            }

            /// Fast path bound to `element`, sharing this codec's markers.
            pub fn typed<C: Codec>(&self, element: C) -> $typed<C> {
                $typed {
                    markers: self.markers,
                    element,
                }
            }
        }

        impl Codec for $codec {
            type Value = $container<Value>;

            fn read(
                &self,
                registry: &Registry,
                input: &mut ByteReader<'_>,
            ) -> Result<Option<$container<Value>>> {
                self.typed(AnyCodec).read(registry, input)
            }

            fn write(
                &self,
                registry: &Registry,
                output: &mut ByteWriter,
                value: Option<&$container<Value>>,
            ) -> Result<()> {
                self.typed(AnyCodec).write(registry, output, value)
            }
        }

        impl_dyn_codec!($codec, $name, $variant);

        #[doc = concat!("Typed ", $name, " bound to one element codec.")]
        #[derive(Debug, Clone)]
        pub struct $typed<C> {
            markers: MarkerRange,
            element: C,
        }

        impl<C: Codec> Codec for $typed<C>
        $(where $($bound)+)?
        {
            type Value = $container<C::Value>;

            fn read(
                &self,
                registry: &Registry,
                input: &mut ByteReader<'_>,
            ) -> Result<Option<Self::Value>> {
                read_sized(
                    registry,
                    input,
                    self.markers.base(),
                    $name,
                    &self.element,
                    |$n| $alloc,
                    |$items, $item| $push,
                )
            }

            fn write(
                &self,
                registry: &Registry,
                output: &mut ByteWriter,
                value: Option<&Self::Value>,
            ) -> Result<()> {
                match value {
                    Some(items) => {
                        write_sized(registry, output, self.markers.base(), &self.element, items.iter())
                    }
                    None => {
                        output.put_marker(NULL_MARKER);
                        Ok(())
                    }
                }
            }
        }
    };
}

sized_sequence!(
    /// Codec for `Vec<Value>`.
    ListCodec, TypedList, Vec, "list", List,
    |n| Vec::with_capacity(n),
    |items, item| items.push(item)
);

sized_sequence!(
    /// Codec for insertion-ordered `IndexSet<Value>`.
    SetCodec, TypedSet, IndexSet, "set", Set,
    |n| IndexSet::with_capacity(capacity_hint(n, n)),
    |items, item| {
        items.insert(item);
    },
    where C::Value: Hash + Eq
);

sized_sequence!(
    /// Codec for FIFO `VecDeque<Value>`.
    QueueCodec, TypedQueue, VecDeque, "queue", Queue,
    |n| VecDeque::with_capacity(n),
    |items, item| items.push_back(item)
);

fn write_delimited<'v, C>(
    registry: &Registry,
    output: &mut ByteWriter,
    markers: MarkerRange,
    element: &C,
    items: impl Iterator<Item = &'v C::Value>,
) -> Result<()>
where
    C: Codec,
    C::Value: 'v,
{
    output.put_marker(markers.at(0));
    for item in items {
        element.write(registry, output, Some(item))?;
    }
    output.put_marker(markers.at(1));
    Ok(())
}

fn read_delimited<C: Codec>(
    registry: &Registry,
    input: &mut ByteReader<'_>,
    markers: MarkerRange,
    element: &C,
) -> Result<Option<Vec<C::Value>>> {
    let marker = input.read_marker()?;
    if marker == NULL_MARKER {
        return Ok(None);
    }
    if marker != markers.at(0) {
        return Err(MarkserError::Decode {
            target: "collection",
            marker,
        });
    }
    let mut items = Vec::new();
    while input.peek_marker()? != markers.at(1) {
        items.push(read_element(registry, input, element, "collection")?);
    }
    input.read_marker()?;
    Ok(Some(items))
}

/// Codec for any sequence (list, set or queue), delimited by start and end
/// markers. Reads back as a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionCodec {
    markers: MarkerRange,
}

impl CollectionCodec {
    /// Claim the start marker `base` and the end marker `base + 1`.
    pub fn new(base: Marker) -> Result<Self> {
        Ok(Self {
            markers: MarkerRange::new(base, 2)?,
        })
    }

    pub fn marker_range(&self) -> MarkerRange {
        self.markers
    }

    /// Fast path bound to `element`, sharing this codec's markers.
    pub fn typed<C: Codec>(&self, element: C) -> TypedCollection<C> {
        TypedCollection {
            markers: self.markers,
            element,
        }
    }

    /// Write borrowed elements of any sequence kind.
    pub(crate) fn write_items<'v>(
        &self,
        registry: &Registry,
        output: &mut ByteWriter,
        items: impl Iterator<Item = &'v Value>,
    ) -> Result<()> {
        write_delimited(registry, output, self.markers, &AnyCodec, items)
    }
}

impl Codec for CollectionCodec {
    type Value = Vec<Value>;

    fn read(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Option<Vec<Value>>> {
        read_delimited(registry, input, self.markers, &AnyCodec)
    }

    fn write(
        &self,
        registry: &Registry,
        output: &mut ByteWriter,
        value: Option<&Vec<Value>>,
    ) -> Result<()> {
        match value {
            Some(items) => write_delimited(registry, output, self.markers, &AnyCodec, items.iter()),
            None => {
                output.put_marker(NULL_MARKER);
                Ok(())
            }
        }
    }
}

impl DynCodec for CollectionCodec {
    fn name(&self) -> &'static str {
        "collection"
    }

    fn markers(&self) -> MarkerRange {
        self.markers
    }

    fn writes(&self, ty: &ValueType) -> bool {
        matches!(ty, ValueType::List | ValueType::Set | ValueType::Queue)
    }

    fn read_value(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Value> {
        Ok(Codec::read(self, registry, input)?.map_or(Value::Null, Value::List))
    }

    fn write_value(&self, registry: &Registry, output: &mut ByteWriter, value: &Value) -> Result<()> {
        match value {
            Value::Null => Codec::write(self, registry, output, None),
            Value::List(items) => self.write_items(registry, output, items.iter()),
            Value::Set(items) => self.write_items(registry, output, items.iter()),
            Value::Queue(items) => self.write_items(registry, output, items.iter()),
            other => Err(MarkserError::mismatch("collection", other)),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Typed collection bound to one element codec.
#[derive(Debug, Clone)]
pub struct TypedCollection<C> {
    markers: MarkerRange,
    element: C,
}

impl<C: Codec> Codec for TypedCollection<C> {
    type Value = Vec<C::Value>;

    fn read(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Option<Self::Value>> {
        read_delimited(registry, input, self.markers, &self.element)
    }

    fn write(
        &self,
        registry: &Registry,
        output: &mut ByteWriter,
        value: Option<&Self::Value>,
    ) -> Result<()> {
        match value {
            Some(items) => write_delimited(registry, output, self.markers, &self.element, items.iter()),
            None => {
                output.put_marker(NULL_MARKER);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{LongCodec, StringCodec};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(LongCodec::new(0).unwrap()).unwrap();
        registry.register(StringCodec::new(8, 4).unwrap()).unwrap();
        registry.register(ListCodec::new(20).unwrap()).unwrap();
        registry
    }

    #[test]
    fn test_list_roundtrip_through_registry() {
        let registry = registry();
        let codec = ListCodec::new(20).unwrap();
        let list = vec![Value::Long(7), Value::from("hi"), Value::Null, Value::List(vec![])];

        let mut out = ByteWriter::new();
        codec.write(&registry, &mut out, Some(&list)).unwrap();
        let mut input = ByteReader::new(out.as_slice());
        assert_eq!(codec.read(&registry, &mut input).unwrap(), Some(list));
        assert!(input.is_empty());
    }

    #[test]
    fn test_typed_list_skips_registry() {
        let registry = Registry::new();
        let codec = ListCodec::new(20).unwrap().typed(LongCodec::new(0).unwrap());
        let list = vec![1i64, -1, 1234];

        let mut out = ByteWriter::new();
        codec.write(&registry, &mut out, Some(&list)).unwrap();
        assert_eq!(out.as_slice()[0], 20);
        let mut input = ByteReader::new(out.as_slice());
        assert_eq!(codec.read(&registry, &mut input).unwrap(), Some(list));
    }

    #[test]
    fn test_typed_list_rejects_null_element() {
        let registry = Registry::new();
        let codec = ListCodec::new(20).unwrap().typed(LongCodec::new(0).unwrap());
        let data = [20u8, 1u8.wrapping_sub(128), 0x80];
        let mut input = ByteReader::new(&data);
        assert!(matches!(
            codec.read(&registry, &mut input),
            Err(MarkserError::UnexpectedNull { target: "list" })
        ));
    }

    #[test]
    fn test_typed_set_and_queue() {
        let registry = Registry::new();
        let strings = StringCodec::new(0, 4).unwrap();
        let set_codec = SetCodec::new(10).unwrap().typed(strings);
        let queue_codec = QueueCodec::new(14).unwrap().typed(strings);

        let set: IndexSet<String> = ["b", "a"].into_iter().map(String::from).collect();
        let queue: VecDeque<String> = ["x", "y", "x"].into_iter().map(String::from).collect();

        let mut out = ByteWriter::new();
        set_codec.write(&registry, &mut out, Some(&set)).unwrap();
        queue_codec.write(&registry, &mut out, Some(&queue)).unwrap();
        let mut input = ByteReader::new(out.as_slice());
        let read_set = set_codec.read(&registry, &mut input).unwrap().unwrap();
        assert_eq!(read_set.iter().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(queue_codec.read(&registry, &mut input).unwrap(), Some(queue));
    }

    #[test]
    fn test_collection_sentinels() {
        let registry = registry();
        let codec = CollectionCodec::new(30).unwrap();
        let mut out = ByteWriter::new();
        let set: IndexSet<Value> = [Value::Long(1), Value::Long(2)].into_iter().collect();
        codec.write_value(&registry, &mut out, &Value::Set(set)).unwrap();
        assert_eq!(out.as_slice(), &[30, 0, 1, 0, 2, 31]);

        let mut input = ByteReader::new(out.as_slice());
        assert_eq!(
            codec.read_value(&registry, &mut input).unwrap(),
            Value::List(vec![Value::Long(1), Value::Long(2)])
        );
    }

    #[test]
    fn test_collection_missing_end_underflows() {
        let registry = registry();
        let codec = CollectionCodec::new(30).unwrap();
        let data = [30u8, 0, 1];
        let mut input = ByteReader::new(&data);
        assert!(matches!(
            codec.read_value(&registry, &mut input),
            Err(MarkserError::BufferUnderflow { .. })
        ));
    }

    #[test]
    fn test_typed_collection() {
        let registry = Registry::new();
        let codec = CollectionCodec::new(30).unwrap().typed(LongCodec::new(0).unwrap());
        let mut out = ByteWriter::new();
        codec.write(&registry, &mut out, Some(&vec![5, 6])).unwrap();
        codec.write(&registry, &mut out, None).unwrap();
        let mut input = ByteReader::new(out.as_slice());
        assert_eq!(codec.read(&registry, &mut input).unwrap(), Some(vec![5, 6]));
        assert_eq!(codec.read(&registry, &mut input).unwrap(), None);
    }

    #[test]
    fn test_list_codec_rejects_map_value() {
        let registry = registry();
        let codec = ListCodec::new(20).unwrap();
        let mut out = ByteWriter::new();
        let err = codec
            .write_value(&registry, &mut out, &Value::Map(Default::default()))
            .unwrap_err();
        assert!(matches!(err, MarkserError::TypeMismatch { codec: "list", .. }));
    }
}
