//! Codecs for user records: objects, enums and object arrays.
//!
//! An [`ObjectCodec`] is generated once per record type from closures that
//! reach each field. Fields are written after the record's single marker in
//! lexicographic order of their names:
//! ```text
//! [marker][field a][field b]...
//! ```
//!
//! # Example
//!
//! ```
//! use markser::codec::ObjectCodec;
//! use markser::{CodecConfig, Deserializer, Record, Registry, Serializer, Value};
//!
//! #[derive(Debug, Clone, PartialEq, Default)]
//! struct Node {
//!     label: String,
//!     weight: i64,
//!     next: Option<Box<Node>>,
//! }
//!
//! impl Record for Node {}
//!
//! let mut registry = Registry::standard(&CodecConfig::default()).unwrap();
//! let marker = registry.next_free_marker().unwrap();
//! ObjectCodec::<Node>::builder(marker)
//!     .field("label", |n: &Node| &n.label, |n: &mut Node| &mut n.label)
//!     .field("weight", |n: &Node| &n.weight, |n: &mut Node| &mut n.weight)
//!     .field("next", |n: &Node| &n.next, |n: &mut Node| &mut n.next)
//!     .default_constructor()
//!     .register(&mut registry)
//!     .unwrap();
//!
//! let node = Node { label: "a".into(), weight: 3, next: None };
//! let mut serializer = Serializer::new(&registry);
//! serializer.append(&Value::object(node.clone())).unwrap();
//!
//! let mut deserializer = Deserializer::new(&registry, serializer.as_bytes());
//! assert_eq!(deserializer.read().unwrap().as_record::<Node>(), Some(&node));
//! ```

use std::any::{type_name, Any};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{MarkserError, Result};
use crate::registry::Registry;
use crate::value::{ObjectValue, Record, RecordType, Value, ValueType};
use crate::wire::{ByteReader, ByteWriter, Marker, MarkerRange, NULL_MARKER};

use super::{Codec, DynCodec};

/// Implements [`DynCodec`] for a codec generic over a record type `T`, with
/// `markers` and `record_type` fields and a [`Codec`] impl for `T`.
macro_rules! impl_record_dyn_codec {
    ($codec:ident) => {
        impl<T: Record> DynCodec for $codec<T> {
            fn name(&self) -> &'static str {
                self.record_type.name()
            }

            fn markers(&self) -> MarkerRange {
                self.markers
            }

            fn writes(&self, ty: &ValueType) -> bool {
                *ty == ValueType::Object(self.record_type)
            }

            fn read_value(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Value> {
                Ok(Codec::read(self, registry, input)?
                    .map_or(Value::Null, |record| Value::Object(ObjectValue::new(record))))
            }

            fn write_value(
                &self,
                registry: &Registry,
                output: &mut ByteWriter,
                value: &Value,
            ) -> Result<()> {
                match value {
                    Value::Null => Codec::write(self, registry, output, None),
                    Value::Object(object) => match object.downcast_ref::<T>() {
                        Some(record) => Codec::write(self, registry, output, Some(record)),
                        None => Err(MarkserError::mismatch(self.record_type.name(), value)),
                    },
                    other => Err(MarkserError::mismatch(self.record_type.name(), other)),
                }
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

mod array;
mod enumeration;
mod field;

pub use array::ObjectArrayCodec;
pub use enumeration::EnumCodec;
pub use field::{bind_boxed, record_from_value, write_record, Binding, FieldValue};

use field::{AccessorField, DirectField, FieldCodec, Getter, Setter};

/// Codec for a record type `T`, built by [`ObjectCodecBuilder`].
pub struct ObjectCodec<T: Record> {
    markers: MarkerRange,
    record_type: RecordType,
    fields: Vec<Box<dyn FieldCodec<T>>>,
    constructor: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T: Record> ObjectCodec<T> {
    /// Start a field plan for `T` at `marker`.
    pub fn builder(marker: Marker) -> ObjectCodecBuilder<T> {
        ObjectCodecBuilder {
            marker,
            fields: Vec::new(),
            setters: Vec::new(),
            constructor: None,
        }
    }

    pub fn marker_range(&self) -> MarkerRange {
        self.markers
    }

    /// Field names in encoding order.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name())
    }
}

impl<T: Record> Codec for ObjectCodec<T> {
    type Value = T;

    fn read(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Option<T>> {
        let marker = input.read_marker()?;
        if marker == NULL_MARKER {
            return Ok(None);
        }
        if marker != self.markers.base() {
            return Err(MarkserError::Decode {
                target: self.record_type.name(),
                marker,
            });
        }
        let mut record = (self.constructor)();
        for field in &self.fields {
            field.read(registry, self, input, &mut record)?;
        }
        Ok(Some(record))
    }

    fn write(&self, registry: &Registry, output: &mut ByteWriter, value: Option<&T>) -> Result<()> {
        let Some(record) = value else {
            output.put_marker(NULL_MARKER);
            return Ok(());
        };
        output.put_marker(self.markers.base());
        for field in &self.fields {
            field.write(registry, self, output, record)?;
        }
        Ok(())
    }
}

impl_record_dyn_codec!(ObjectCodec);

type MakeField<T> =
    Box<dyn FnOnce(&Registry, &ValueType, Option<Box<dyn Any>>) -> Result<Box<dyn FieldCodec<T>>>>;

enum Access {
    Direct,
    Accessor,
}

struct PendingField<T> {
    name: &'static str,
    access: Access,
    make: MakeField<T>,
}

struct PendingSetter {
    name: &'static str,
    setter: Box<dyn Any>,
}

/// Collects the field plan of an [`ObjectCodec`].
///
/// Getters and setters pair up by canonical name: ASCII-lowercased with
/// underscores removed, so `getter("first_name", ..)` pairs with
/// `setter("firstName", ..)`.
pub struct ObjectCodecBuilder<T: Record> {
    marker: Marker,
    fields: Vec<PendingField<T>>,
    setters: Vec<PendingSetter>,
    constructor: Option<Box<dyn Fn() -> T + Send + Sync>>,
}

fn canonical(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn generation_error(message: String) -> MarkserError {
    MarkserError::CodecGeneration(message)
}

impl<T: Record> ObjectCodecBuilder<T> {
    /// A field reached directly through references into the record.
    pub fn field<F: FieldValue>(
        mut self,
        name: &'static str,
        get: impl Fn(&T) -> &F + Send + Sync + 'static,
        get_mut: impl Fn(&mut T) -> &mut F + Send + Sync + 'static,
    ) -> Self {
        let make: MakeField<T> = Box::new(move |registry, building, _| {
            Ok(Box::new(DirectField {
                name,
                get: Box::new(get),
                get_mut: Box::new(get_mut),
                binding: F::bind(registry, building)?,
            }) as Box<dyn FieldCodec<T>>)
        });
        self.fields.push(PendingField {
            name,
            access: Access::Direct,
            make,
        });
        self
    }

    /// The read half of an accessor pair. Needs a matching [`setter`](Self::setter).
    pub fn getter<F: FieldValue>(
        mut self,
        name: &'static str,
        get: impl Fn(&T) -> F + Send + Sync + 'static,
    ) -> Self {
        let make: MakeField<T> = Box::new(move |registry, building, setter| {
            let setter = setter
                .ok_or_else(|| generation_error(format!("field `{name}` has no setter")))?
                .downcast::<Setter<T, F>>()
                .map_err(|_| {
                    generation_error(format!(
                        "getter and setter of field `{name}` on {} disagree on its type",
                        type_name::<T>()
                    ))
                })?;
            let getter: Getter<T, F> = Box::new(get);
            Ok(Box::new(AccessorField {
                name,
                getter,
                setter: *setter,
                binding: F::bind(registry, building)?,
            }) as Box<dyn FieldCodec<T>>)
        });
        self.fields.push(PendingField {
            name,
            access: Access::Accessor,
            make,
        });
        self
    }

    /// The write half of an accessor pair. Needs a matching [`getter`](Self::getter).
    pub fn setter<F: FieldValue>(
        mut self,
        name: &'static str,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self {
        let setter: Setter<T, F> = Box::new(set);
        self.setters.push(PendingSetter {
            name,
            setter: Box::new(setter),
        });
        self
    }

    /// How fresh records are allocated before their fields are read.
    pub fn constructor(mut self, constructor: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.constructor = Some(Box::new(constructor));
        self
    }

    /// Allocate fresh records with [`Default`].
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// Resolve every field's codec against `registry`.
    ///
    /// A field whose type is `T` itself (usually `Option<Box<T>>`) is bound to
    /// the codec being built, so recursive records need no prior registration.
    pub fn build(self, registry: &Registry) -> Result<ObjectCodec<T>> {
        let record_name = type_name::<T>();
        let constructor = self
            .constructor
            .ok_or_else(|| generation_error(format!("{record_name} has no constructor")))?;
        let markers = MarkerRange::single(self.marker)?;

        let mut setters = HashMap::new();
        for setter in self.setters {
            let key = canonical(setter.name);
            if let Some(previous) = setters.insert(key, setter) {
                return Err(generation_error(format!(
                    "duplicate setter `{}` on {record_name}",
                    previous.name
                )));
            }
        }

        let mut seen = HashSet::new();
        let mut pending = Vec::with_capacity(self.fields.len());
        for field in self.fields {
            let key = canonical(field.name);
            if !seen.insert(key.clone()) {
                return Err(generation_error(format!(
                    "duplicate field `{}` on {record_name}",
                    field.name
                )));
            }
            let setter = match field.access {
                Access::Direct => None,
                Access::Accessor => match setters.remove(&key) {
                    Some(setter) => Some(setter.setter),
                    None => {
                        return Err(generation_error(format!(
                            "field `{}` on {record_name} is immutable",
                            field.name
                        )))
                    }
                },
            };
            pending.push((field, setter));
        }
        if let Some(orphan) = setters.values().map(|setter| setter.name).min() {
            return Err(generation_error(format!(
                "setter `{orphan}` on {record_name} has no getter"
            )));
        }

        pending.sort_by(|(a, _), (b, _)| a.name.cmp(b.name));
        let record_type = RecordType::of::<T>();
        let building = ValueType::Object(record_type);
        let fields = pending
            .into_iter()
            .map(|(field, setter)| (field.make)(registry, &building, setter))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            "Generated object codec for {} at {} with {} fields",
            record_name,
            markers,
            fields.len()
        );
        Ok(ObjectCodec {
            markers,
            record_type,
            fields,
            constructor,
        })
    }

    /// Build and register in one step. Nothing is registered on failure.
    pub fn register(self, registry: &mut Registry) -> Result<Arc<ObjectCodec<T>>> {
        let codec = self.build(registry)?;
        registry.register(codec)
    }
}
