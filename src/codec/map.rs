//! Map codec: the entry count, then key and value for each entry.

use std::hash::Hash;

use indexmap::IndexMap;

use crate::error::Result;
use crate::registry::Registry;
use crate::value::Value;
use crate::wire::{size, ByteReader, ByteWriter, Marker, MarkerRange, NULL_MARKER, SIZE_MARKERS};

use super::collection::read_element;
use super::{capacity_hint, AnyCodec, Codec};

/// Codec for insertion-ordered `IndexMap<Value, Value>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapCodec {
    markers: MarkerRange,
}

impl MapCodec {
    pub fn new(base: Marker) -> Result<Self> {
        Ok(Self {
            markers: MarkerRange::new(base, SIZE_MARKERS)?,
        })
    }

    pub fn marker_range(&self) -> MarkerRange {
        self.markers
    }

    /// Fast path with both key and value codecs bound.
    pub fn as_typed_map<K: Codec, V: Codec>(&self, keys: K, values: V) -> TypedMap<K, V> {
        TypedMap {
            markers: self.markers,
            keys,
            values,
        }
    }

    /// Fast path with typed keys; values still dispatch through the registry.
    pub fn with_typed_keys<K: Codec>(&self, keys: K) -> TypedMap<K, AnyCodec> {
        self.as_typed_map(keys, AnyCodec)
    }

    /// Fast path with typed values; keys still dispatch through the registry.
    pub fn with_typed_values<V: Codec>(&self, values: V) -> TypedMap<AnyCodec, V> {
        self.as_typed_map(AnyCodec, values)
    }
}

impl Codec for MapCodec {
    type Value = IndexMap<Value, Value>;

    fn read(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Option<Self::Value>> {
        self.as_typed_map(AnyCodec, AnyCodec).read(registry, input)
    }

    fn write(
        &self,
        registry: &Registry,
        output: &mut ByteWriter,
        value: Option<&Self::Value>,
    ) -> Result<()> {
        self.as_typed_map(AnyCodec, AnyCodec).write(registry, output, value)
    }
}

impl_dyn_codec!(MapCodec, "map", Map);

/// Map bound to a key codec and a value codec. Shares the owner's markers.
#[derive(Debug, Clone)]
pub struct TypedMap<K, V> {
    markers: MarkerRange,
    keys: K,
    values: V,
}

impl<K, V> Codec for TypedMap<K, V>
where
    K: Codec,
    V: Codec,
    K::Value: Hash + Eq,
{
    type Value = IndexMap<K::Value, V::Value>;

    fn read(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Option<Self::Value>> {
        let Some(len) = size::read_size(input, self.markers.base(), "map")? else {
            return Ok(None);
        };
        let mut map = IndexMap::with_capacity(capacity_hint(len, input.remaining()));
        for _ in 0..len {
            let key = read_element(registry, input, &self.keys, "map key")?;
            let value = read_element(registry, input, &self.values, "map value")?;
            map.insert(key, value);
        }
        Ok(Some(map))
    }

    fn write(
        &self,
        registry: &Registry,
        output: &mut ByteWriter,
        value: Option<&Self::Value>,
    ) -> Result<()> {
        let Some(map) = value else {
            output.put_marker(NULL_MARKER);
            return Ok(());
        };
        size::write_size(output, self.markers.base(), map.len())?;
        for (key, value) in map {
            self.keys.write(registry, output, Some(key))?;
            self.values.write(registry, output, Some(value))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{IntCodec, ListCodec, StringCodec};
    use crate::error::MarkserError;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(IntCodec::new(0).unwrap()).unwrap();
        registry.register(StringCodec::new(4, 8).unwrap()).unwrap();
        registry.register(ListCodec::new(20).unwrap()).unwrap();
        registry.register(MapCodec::new(24).unwrap()).unwrap();
        registry
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let registry = registry();
        let codec = MapCodec::new(24).unwrap();
        let mut map = IndexMap::new();
        map.insert(Value::from("z"), Value::Int(1));
        map.insert(Value::Int(2), Value::List(vec![Value::from("nested")]));
        map.insert(Value::from("a"), Value::Null);

        let mut out = ByteWriter::new();
        codec.write(&registry, &mut out, Some(&map)).unwrap();
        let mut input = ByteReader::new(out.as_slice());
        let read = codec.read(&registry, &mut input).unwrap().unwrap();
        assert_eq!(read.keys().collect::<Vec<_>>(), map.keys().collect::<Vec<_>>());
        assert_eq!(read, map);
    }

    #[test]
    fn test_nested_map_in_list() {
        let registry = registry();
        let mut inner = IndexMap::new();
        inner.insert(Value::from("k"), Value::from("v"));
        let value = Value::List(vec![Value::Map(inner)]);

        let list = registry.codec_for(&value).unwrap();
        let mut out = ByteWriter::new();
        list.write_value(&registry, &mut out, &value).unwrap();
        let mut input = ByteReader::new(out.as_slice());
        assert_eq!(registry.read_any(&mut input).unwrap(), value);
    }

    #[test]
    fn test_typed_map() {
        let registry = Registry::new();
        let codec = MapCodec::new(24)
            .unwrap()
            .as_typed_map(StringCodec::new(4, 8).unwrap(), IntCodec::new(0).unwrap());
        let mut map = IndexMap::new();
        map.insert("one".to_string(), 1);
        map.insert("two".to_string(), 2);

        let mut out = ByteWriter::new();
        codec.write(&registry, &mut out, Some(&map)).unwrap();
        let mut input = ByteReader::new(out.as_slice());
        assert_eq!(codec.read(&registry, &mut input).unwrap(), Some(map));
    }

    #[test]
    fn test_typed_keys_with_any_values() {
        let registry = registry();
        let codec = MapCodec::new(24).unwrap().with_typed_keys(IntCodec::new(0).unwrap());
        let mut map = IndexMap::new();
        map.insert(1, Value::from("x"));
        map.insert(2, Value::Null);

        let mut out = ByteWriter::new();
        codec.write(&registry, &mut out, Some(&map)).unwrap();
        let mut input = ByteReader::new(out.as_slice());
        assert_eq!(codec.read(&registry, &mut input).unwrap(), Some(map));
    }

    #[test]
    fn test_typed_values_reject_null() {
        let registry = registry();
        let codec = MapCodec::new(24).unwrap().with_typed_values(IntCodec::new(0).unwrap());
        // One entry: key "k", value null.
        let data = [24u8, 1u8.wrapping_sub(128), 5, b'k', 0x80];
        let mut input = ByteReader::new(&data);
        assert!(matches!(
            codec.read(&registry, &mut input),
            Err(MarkserError::UnexpectedNull { target: "map value" })
        ));
    }
}
