//! Field plans for object codecs.
//!
//! Each field of a record is bound once, when its codec is generated, to one
//! of four strategies (see [`Binding`]). Per-record encoding then only
//! invokes the chosen closure and codec.

use std::any::type_name;
use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::codec::{
    BoolArrayCodec, BoolCodec, ByteArrayCodec, ByteCodec, CharArrayCodec, CharCodec, Codec,
    CollectionCodec, DoubleArrayCodec, DoubleCodec, DynCodec, FloatArrayCodec, FloatCodec, IntArrayCodec, IntCodec,
    ListCodec, LongArrayCodec, LongCodec, MapCodec, QueueCodec, SetCodec, ShortArrayCodec,
    ShortCodec, StringCodec,
};
use crate::error::{MarkserError, Result};
use crate::registry::Registry;
use crate::value::{Record, RecordType, Value, ValueType};
use crate::wire::{ByteReader, ByteWriter};

use super::{EnumCodec, ObjectCodec};

/// How a field's value is written and read.
pub enum Binding<F> {
    /// A concrete codec for `F`, with no conversion through [`Value`].
    Typed(Arc<dyn Codec<Value = F>>),
    /// A registered codec, written through [`FieldValue::write_boxed`].
    Boxed(Arc<dyn DynCodec>),
    /// Any value, dispatched through the registry per write.
    Any,
    /// The codec of the record being defined.
    SelfRef,
}

impl<F: FieldValue> Binding<F> {
    /// The same strategy for a nullable field.
    pub fn optional(self) -> Binding<Option<F>> {
        match self {
            Binding::Typed(codec) => Binding::Typed(Arc::new(Nullable(codec))),
            Binding::Boxed(codec) => Binding::Boxed(codec),
            Binding::Any => Binding::Any,
            Binding::SelfRef => Binding::SelfRef,
        }
    }

    pub(crate) fn write(
        &self,
        registry: &Registry,
        this: &dyn DynCodec,
        output: &mut ByteWriter,
        value: &F,
    ) -> Result<()> {
        match self {
            Binding::Typed(codec) => codec.write(registry, output, Some(value)),
            Binding::Boxed(codec) => value.write_boxed(registry, codec.as_ref(), output),
            Binding::Any => value.write_any(registry, output),
            Binding::SelfRef => value.write_boxed(registry, this, output),
        }
    }

    pub(crate) fn read(
        &self,
        registry: &Registry,
        this: &dyn DynCodec,
        input: &mut ByteReader<'_>,
        field: &'static str,
    ) -> Result<F> {
        match self {
            Binding::Typed(codec) => codec
                .read(registry, input)?
                .ok_or(MarkserError::UnexpectedNull { target: field }),
            Binding::Boxed(codec) => F::from_value(codec.read_value(registry, input)?),
            Binding::Any => F::from_value(registry.read_any(input)?),
            Binding::SelfRef => F::from_value(this.read_value(registry, input)?),
        }
    }
}

/// Lifts a codec for `F` to `Option<F>`; null reads as `Some(None)`.
struct Nullable<F>(Arc<dyn Codec<Value = F>>);

impl<F> Codec for Nullable<F> {
    type Value = Option<F>;

    fn read(&self, registry: &Registry, input: &mut ByteReader<'_>) -> Result<Option<Option<F>>> {
        self.0.read(registry, input).map(Some)
    }

    fn write(
        &self,
        registry: &Registry,
        output: &mut ByteWriter,
        value: Option<&Option<F>>,
    ) -> Result<()> {
        self.0.write(registry, output, value.and_then(Option::as_ref))
    }
}

/// A Rust type usable as a record field.
pub trait FieldValue: Sized + Send + Sync + 'static {
    /// Runtime type used to find the field's codec.
    fn value_type() -> ValueType;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;

    /// Choose how this field is encoded. `building` is the type whose codec
    /// is being generated.
    fn bind(registry: &Registry, building: &ValueType) -> Result<Binding<Self>> {
        bind_boxed(registry, building)
    }

    /// Write through a registered codec. The default goes through
    /// [`FieldValue::to_value`]; implementors override it to write by
    /// reference.
    fn write_boxed(
        &self,
        registry: &Registry,
        codec: &dyn DynCodec,
        output: &mut ByteWriter,
    ) -> Result<()> {
        codec.write_value(registry, output, &self.to_value())
    }

    /// Write with codec selection per value.
    fn write_any(&self, registry: &Registry, output: &mut ByteWriter) -> Result<()> {
        registry.write_any(output, &self.to_value())
    }
}

/// Bind `F` through the registry by its [`FieldValue::value_type`].
pub fn bind_boxed<F: FieldValue>(registry: &Registry, building: &ValueType) -> Result<Binding<F>> {
    let ty = F::value_type();
    if ty == *building {
        return Ok(Binding::SelfRef);
    }
    if ty == ValueType::Any {
        return Ok(Binding::Any);
    }
    registry.codec_for_type(&ty).map(Binding::Boxed)
}

/// Bind `F` to the concrete codec `C` when the registry resolves its type to
/// one, falling back to [`bind_boxed`].
fn bind_typed<F, C>(registry: &Registry, building: &ValueType) -> Result<Binding<F>>
where
    F: FieldValue,
    C: Codec<Value = F> + Clone + 'static,
{
    match registry.typed::<C>(&F::value_type()) {
        Ok(codec) => Ok(Binding::Typed(Arc::new(codec))),
        Err(_) => bind_boxed(registry, building),
    }
}

fn field_mismatch<F>(value: &Value) -> MarkserError {
    MarkserError::TypeMismatch {
        codec: type_name::<F>(),
        found: value.value_type().to_string(),
    }
}

/// Write `record` through `codec` by reference when it is the object or enum
/// codec of `T`.
pub fn write_record<T: Record>(
    record: &T,
    registry: &Registry,
    codec: &dyn DynCodec,
    output: &mut ByteWriter,
) -> Result<()> {
    let any = codec.as_any();
    if let Some(object) = any.downcast_ref::<ObjectCodec<T>>() {
        return Codec::write(object, registry, output, Some(record));
    }
    if let Some(enumeration) = any.downcast_ref::<EnumCodec<T>>() {
        return Codec::write(enumeration, registry, output, Some(record));
    }
    codec.write_value(registry, output, &Value::object(record.clone()))
}

/// Write sequence elements by reference when `codec` is the collection codec.
fn write_sequence<'v>(
    items: impl Iterator<Item = &'v Value>,
    to_value: impl FnOnce() -> Value,
    registry: &Registry,
    codec: &dyn DynCodec,
    output: &mut ByteWriter,
) -> Result<()> {
    match codec.as_any().downcast_ref::<CollectionCodec>() {
        Some(collection) => collection.write_items(registry, output, items),
        None => codec.write_value(registry, output, &to_value()),
    }
}

/// Recover a `T` from a [`Value::Object`].
pub fn record_from_value<T: Record>(value: Value) -> Result<T> {
    match value {
        Value::Object(object) => {
            let found = object.record_type().name();
            object
                .into_record::<T>()
                .ok_or_else(|| MarkserError::TypeMismatch {
                    codec: type_name::<T>(),
                    found: found.to_string(),
                })
        }
        other => Err(field_mismatch::<T>(&other)),
    }
}

macro_rules! typed_field {
    ($($ty:ty => $codec:ty, $variant:ident;)*) => {
        $(
            impl FieldValue for $ty {
                fn value_type() -> ValueType {
                    ValueType::$variant
                }

                fn to_value(&self) -> Value {
                    Value::$variant(self.clone())
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(field_mismatch::<Self>(&other)),
                    }
                }

                fn bind(registry: &Registry, building: &ValueType) -> Result<Binding<Self>> {
                    bind_typed::<Self, $codec>(registry, building)
                }
            }
        )*
    };
}

typed_field! {
    bool => BoolCodec, Bool;
    i8 => ByteCodec, Byte;
    char => CharCodec, Char;
    i16 => ShortCodec, Short;
    i32 => IntCodec, Int;
    i64 => LongCodec, Long;
    f32 => FloatCodec, Float;
    f64 => DoubleCodec, Double;
    String => StringCodec, String;
    Vec<bool> => BoolArrayCodec, BoolArray;
    Vec<u8> => ByteArrayCodec, ByteArray;
    Vec<char> => CharArrayCodec, CharArray;
    Vec<i16> => ShortArrayCodec, ShortArray;
    Vec<i32> => IntArrayCodec, IntArray;
    Vec<i64> => LongArrayCodec, LongArray;
    Vec<f32> => FloatArrayCodec, FloatArray;
    Vec<f64> => DoubleArrayCodec, DoubleArray;
    IndexMap<Value, Value> => MapCodec, Map;
}

// Sequence fields accept any sequence kind, since a collection codec may be
// the one registered for their type and always reads back a list.

impl FieldValue for Vec<Value> {
    fn value_type() -> ValueType {
        ValueType::List
    }

    fn to_value(&self) -> Value {
        Value::List(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(v) => Ok(v),
            Value::Queue(v) => Ok(v.into()),
            Value::Set(v) => Ok(v.into_iter().collect()),
            other => Err(field_mismatch::<Self>(&other)),
        }
    }

    fn bind(registry: &Registry, building: &ValueType) -> Result<Binding<Self>> {
        bind_typed::<Self, ListCodec>(registry, building)
    }

    fn write_boxed(
        &self,
        registry: &Registry,
        codec: &dyn DynCodec,
        output: &mut ByteWriter,
    ) -> Result<()> {
        write_sequence(self.iter(), || self.to_value(), registry, codec, output)
    }
}

impl FieldValue for VecDeque<Value> {
    fn value_type() -> ValueType {
        ValueType::Queue
    }

    fn to_value(&self) -> Value {
        Value::Queue(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Queue(v) => Ok(v),
            Value::List(v) => Ok(v.into()),
            Value::Set(v) => Ok(v.into_iter().collect()),
            other => Err(field_mismatch::<Self>(&other)),
        }
    }

    fn bind(registry: &Registry, building: &ValueType) -> Result<Binding<Self>> {
        bind_typed::<Self, QueueCodec>(registry, building)
    }

    fn write_boxed(
        &self,
        registry: &Registry,
        codec: &dyn DynCodec,
        output: &mut ByteWriter,
    ) -> Result<()> {
        write_sequence(self.iter(), || self.to_value(), registry, codec, output)
    }
}

impl FieldValue for IndexSet<Value> {
    fn value_type() -> ValueType {
        ValueType::Set
    }

    fn to_value(&self) -> Value {
        Value::Set(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Set(v) => Ok(v),
            Value::List(v) => Ok(v.into_iter().collect()),
            Value::Queue(v) => Ok(v.into_iter().collect()),
            other => Err(field_mismatch::<Self>(&other)),
        }
    }

    fn bind(registry: &Registry, building: &ValueType) -> Result<Binding<Self>> {
        bind_typed::<Self, SetCodec>(registry, building)
    }

    fn write_boxed(
        &self,
        registry: &Registry,
        codec: &dyn DynCodec,
        output: &mut ByteWriter,
    ) -> Result<()> {
        write_sequence(self.iter(), || self.to_value(), registry, codec, output)
    }
}

impl FieldValue for Value {
    fn value_type() -> ValueType {
        ValueType::Any
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }

    fn write_boxed(
        &self,
        registry: &Registry,
        codec: &dyn DynCodec,
        output: &mut ByteWriter,
    ) -> Result<()> {
        codec.write_value(registry, output, self)
    }

    fn write_any(&self, registry: &Registry, output: &mut ByteWriter) -> Result<()> {
        registry.write_any(output, self)
    }
}

impl<F: FieldValue> FieldValue for Option<F> {
    fn value_type() -> ValueType {
        F::value_type()
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, F::to_value)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            value => F::from_value(value).map(Some),
        }
    }

    fn bind(registry: &Registry, building: &ValueType) -> Result<Binding<Self>> {
        F::bind(registry, building).map(Binding::optional)
    }

    fn write_boxed(
        &self,
        registry: &Registry,
        codec: &dyn DynCodec,
        output: &mut ByteWriter,
    ) -> Result<()> {
        match self {
            Some(value) => value.write_boxed(registry, codec, output),
            None => codec.write_value(registry, output, &Value::Null),
        }
    }

    fn write_any(&self, registry: &Registry, output: &mut ByteWriter) -> Result<()> {
        match self {
            Some(value) => value.write_any(registry, output),
            None => registry.write_any(output, &Value::Null),
        }
    }
}

/// Boxed records, including a record's own type for recursive structures.
impl<T: Record> FieldValue for Box<T> {
    fn value_type() -> ValueType {
        ValueType::Object(RecordType::of::<T>())
    }

    fn to_value(&self) -> Value {
        Value::object(T::clone(self))
    }

    fn from_value(value: Value) -> Result<Self> {
        record_from_value(value).map(Box::new)
    }

    fn write_boxed(
        &self,
        registry: &Registry,
        codec: &dyn DynCodec,
        output: &mut ByteWriter,
    ) -> Result<()> {
        write_record::<T>(self, registry, codec, output)
    }
}

/// Use records (typically enums) directly as field types.
///
/// ```
/// use markser::{record_field, Record};
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum Color {
///     Red,
///     Green,
/// }
///
/// impl Record for Color {}
/// record_field!(Color);
/// ```
#[macro_export]
macro_rules! record_field {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::codec::object::FieldValue for $ty {
                fn value_type() -> $crate::ValueType {
                    $crate::ValueType::Object($crate::value::RecordType::of::<$ty>())
                }

                fn to_value(&self) -> $crate::Value {
                    $crate::Value::object(::std::clone::Clone::clone(self))
                }

                fn from_value(value: $crate::Value) -> $crate::error::Result<Self> {
                    $crate::codec::object::record_from_value(value)
                }

                fn write_boxed(
                    &self,
                    registry: &$crate::Registry,
                    codec: &dyn $crate::codec::DynCodec,
                    output: &mut $crate::wire::ByteWriter,
                ) -> $crate::error::Result<()> {
                    $crate::codec::object::write_record(self, registry, codec, output)
                }
            }
        )+
    };
}

/// One generated field of a record of type `T`.
pub(crate) trait FieldCodec<T>: Send + Sync {
    fn name(&self) -> &'static str;

    fn write(
        &self,
        registry: &Registry,
        this: &dyn DynCodec,
        output: &mut ByteWriter,
        record: &T,
    ) -> Result<()>;

    fn read(
        &self,
        registry: &Registry,
        this: &dyn DynCodec,
        input: &mut ByteReader<'_>,
        record: &mut T,
    ) -> Result<()>;
}

pub(crate) type Getter<T, F> = Box<dyn Fn(&T) -> F + Send + Sync>;
pub(crate) type Setter<T, F> = Box<dyn Fn(&mut T, F) + Send + Sync>;

/// Field reached through references into the record.
pub(crate) struct DirectField<T, F> {
    pub(crate) name: &'static str,
    pub(crate) get: Box<dyn Fn(&T) -> &F + Send + Sync>,
    pub(crate) get_mut: Box<dyn Fn(&mut T) -> &mut F + Send + Sync>,
    pub(crate) binding: Binding<F>,
}

impl<T, F: FieldValue> FieldCodec<T> for DirectField<T, F> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn write(
        &self,
        registry: &Registry,
        this: &dyn DynCodec,
        output: &mut ByteWriter,
        record: &T,
    ) -> Result<()> {
        self.binding.write(registry, this, output, (self.get)(record))
    }

    fn read(
        &self,
        registry: &Registry,
        this: &dyn DynCodec,
        input: &mut ByteReader<'_>,
        record: &mut T,
    ) -> Result<()> {
        *(self.get_mut)(record) = self.binding.read(registry, this, input, self.name)?;
        Ok(())
    }
}

/// Field reached through a getter and setter pair.
pub(crate) struct AccessorField<T, F> {
    pub(crate) name: &'static str,
    pub(crate) getter: Getter<T, F>,
    pub(crate) setter: Setter<T, F>,
    pub(crate) binding: Binding<F>,
}

impl<T, F: FieldValue> FieldCodec<T> for AccessorField<T, F> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn write(
        &self,
        registry: &Registry,
        this: &dyn DynCodec,
        output: &mut ByteWriter,
        record: &T,
    ) -> Result<()> {
        self.binding.write(registry, this, output, &(self.getter)(record))
    }

    fn read(
        &self,
        registry: &Registry,
        this: &dyn DynCodec,
        input: &mut ByteReader<'_>,
        record: &mut T,
    ) -> Result<()> {
        let value = self.binding.read(registry, this, input, self.name)?;
        (self.setter)(record, value);
        Ok(())
    }
}
