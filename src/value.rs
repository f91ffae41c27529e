//! Dynamic value model.
//!
//! [`Value`] is the sum type over every kind the registry can carry, and
//! [`ValueType`] is its runtime type identity, used to pick the codec that
//! writes a value. User records and enums travel as [`ObjectValue`].

use std::any::{Any, TypeId};
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::{IndexMap, IndexSet};

/// A user type that object and enum codecs can carry inside a [`Value`].
///
/// ```
/// use markser::Record;
///
/// #[derive(Debug, Clone, PartialEq, Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Record for Point {}
/// ```
pub trait Record: Any + Clone + fmt::Debug + PartialEq + Send + Sync {}

/// Runtime identity of a [`Record`] type.
#[derive(Debug, Clone, Copy)]
pub struct RecordType {
    id: TypeId,
    name: &'static str,
}

impl RecordType {
    /// Identity of `T`.
    pub fn of<T: Record>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Full type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RecordType {}

impl Hash for RecordType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Runtime type of a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Bool,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    BoolArray,
    ByteArray,
    CharArray,
    ShortArray,
    IntArray,
    LongArray,
    FloatArray,
    DoubleArray,
    List,
    Set,
    Map,
    Queue,
    /// Array of elements of one type.
    Array(Box<ValueType>),
    /// A user record or enum.
    Object(RecordType),
    /// Any value; resolved per value through the registry.
    Any,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Byte => "byte",
            ValueType::Char => "char",
            ValueType::Short => "short",
            ValueType::Int => "int",
            ValueType::Long => "long",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::BoolArray => "bool[]",
            ValueType::ByteArray => "byte[]",
            ValueType::CharArray => "char[]",
            ValueType::ShortArray => "short[]",
            ValueType::IntArray => "int[]",
            ValueType::LongArray => "long[]",
            ValueType::FloatArray => "float[]",
            ValueType::DoubleArray => "double[]",
            ValueType::List => "list",
            ValueType::Set => "set",
            ValueType::Map => "map",
            ValueType::Queue => "queue",
            ValueType::Array(element) => return write!(f, "{element}[]"),
            ValueType::Object(record) => record.name(),
            ValueType::Any => "any",
        };
        f.write_str(name)
    }
}

trait ErasedRecord: Send + Sync {
    fn clone_boxed(&self) -> Box<dyn ErasedRecord>;
    fn eq_erased(&self, other: &dyn ErasedRecord) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T: Record> ErasedRecord for T {
    fn clone_boxed(&self) -> Box<dyn ErasedRecord> {
        Box::new(self.clone())
    }

    fn eq_erased(&self, other: &dyn ErasedRecord) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A type-erased [`Record`] instance.
pub struct ObjectValue {
    ty: RecordType,
    inner: Box<dyn ErasedRecord>,
}

impl ObjectValue {
    /// Erase `record`.
    pub fn new<T: Record>(record: T) -> Self {
        Self {
            ty: RecordType::of::<T>(),
            inner: Box::new(record),
        }
    }

    /// Type of the wrapped record.
    pub fn record_type(&self) -> RecordType {
        self.ty
    }

    /// Borrow the record if it is a `T`.
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }

    /// Take the record out if it is a `T`.
    pub fn into_record<T: Record>(self) -> Option<T> {
        self.inner.into_any().downcast::<T>().ok().map(|record| *record)
    }
}

impl Clone for ObjectValue {
    fn clone(&self) -> Self {
        Self {
            ty: self.ty,
            inner: self.inner.clone_boxed(),
        }
    }
}

impl PartialEq for ObjectValue {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && self.inner.eq_erased(other.inner.as_ref())
    }
}

impl fmt::Debug for ObjectValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt_debug(f)
    }
}

/// An array whose elements share one declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectArray {
    /// Declared element type.
    pub element: ValueType,
    /// Elements; `Value::Null` marks an empty slot.
    pub items: Vec<Value>,
}

impl ObjectArray {
    /// An array of `element` values.
    pub fn new(element: ValueType, items: Vec<Value>) -> Self {
        Self { element, items }
    }
}

/// A dynamically typed value.
///
/// Floats compare and hash by bit pattern, so `Value` is `Eq + Hash` and can
/// be used as a map key or set element.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    BoolArray(Vec<bool>),
    ByteArray(Vec<u8>),
    CharArray(Vec<char>),
    ShortArray(Vec<i16>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    List(Vec<Value>),
    Set(IndexSet<Value>),
    Map(IndexMap<Value, Value>),
    Queue(VecDeque<Value>),
    Array(ObjectArray),
    Object(ObjectValue),
}

impl Value {
    /// Wrap a user record.
    pub fn object<T: Record>(record: T) -> Self {
        Value::Object(ObjectValue::new(record))
    }

    /// Runtime type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Byte(_) => ValueType::Byte,
            Value::Char(_) => ValueType::Char,
            Value::Short(_) => ValueType::Short,
            Value::Int(_) => ValueType::Int,
            Value::Long(_) => ValueType::Long,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::BoolArray(_) => ValueType::BoolArray,
            Value::ByteArray(_) => ValueType::ByteArray,
            Value::CharArray(_) => ValueType::CharArray,
            Value::ShortArray(_) => ValueType::ShortArray,
            Value::IntArray(_) => ValueType::IntArray,
            Value::LongArray(_) => ValueType::LongArray,
            Value::FloatArray(_) => ValueType::FloatArray,
            Value::DoubleArray(_) => ValueType::DoubleArray,
            Value::List(_) => ValueType::List,
            Value::Set(_) => ValueType::Set,
            Value::Map(_) => ValueType::Map,
            Value::Queue(_) => ValueType::Queue,
            Value::Array(array) => ValueType::Array(Box::new(array.element.clone())),
            Value::Object(object) => ValueType::Object(object.record_type()),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The inner bool, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integer kind widened to `i64`.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(*v as i64),
            Value::Short(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// The inner string slice, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Borrow the record if this is an object holding a `T`.
    pub fn as_record<T: Record>(&self) -> Option<&T> {
        match self {
            Value::Object(object) => object.downcast_ref(),
            _ => None,
        }
    }
}

fn bits_eq<T: Copy, B: PartialEq>(a: &[T], b: &[T], bits: impl Fn(T) -> B) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| bits(*x) == bits(*y))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (String(a), String(b)) => a == b,
            (BoolArray(a), BoolArray(b)) => a == b,
            (ByteArray(a), ByteArray(b)) => a == b,
            (CharArray(a), CharArray(b)) => a == b,
            (ShortArray(a), ShortArray(b)) => a == b,
            (IntArray(a), IntArray(b)) => a == b,
            (LongArray(a), LongArray(b)) => a == b,
            (FloatArray(a), FloatArray(b)) => bits_eq(a, b, f32::to_bits),
            (DoubleArray(a), DoubleArray(b)) => bits_eq(a, b, f64::to_bits),
            (List(a), List(b)) => a == b,
            (Set(a), Set(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            (Queue(a), Queue(b)) => a == b,
            (Array(a), Array(b)) => a == b,
            (Object(a), Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::Byte(v) => v.hash(state),
            Value::Char(v) => v.hash(state),
            Value::Short(v) => v.hash(state),
            Value::Int(v) => v.hash(state),
            Value::Long(v) => v.hash(state),
            Value::Float(v) => v.to_bits().hash(state),
            Value::Double(v) => v.to_bits().hash(state),
            Value::String(v) => v.hash(state),
            Value::BoolArray(v) => v.hash(state),
            Value::ByteArray(v) => v.hash(state),
            Value::CharArray(v) => v.hash(state),
            Value::ShortArray(v) => v.hash(state),
            Value::IntArray(v) => v.hash(state),
            Value::LongArray(v) => v.hash(state),
            Value::FloatArray(v) => v.iter().for_each(|x| x.to_bits().hash(state)),
            Value::DoubleArray(v) => v.iter().for_each(|x| x.to_bits().hash(state)),
            Value::List(v) => v.hash(state),
            // Set and map equality ignores order.
            Value::Set(v) => v.len().hash(state),
            Value::Map(v) => v.len().hash(state),
            Value::Queue(v) => v.hash(state),
            Value::Array(v) => {
                v.element.hash(state);
                v.items.hash(state);
            }
            Value::Object(v) => v.record_type().hash(state),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i8 => Byte,
    char => Char,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => String,
    Vec<Value> => List,
    IndexSet<Value> => Set,
    IndexMap<Value, Value> => Map,
    VecDeque<Value> => Queue,
    ObjectArray => Array,
    ObjectValue => Object,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i32,
    }

    impl Record for Point {}

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_ne!(Value::Double(0.0), Value::Double(-0.0));
        assert_eq!(
            Value::FloatArray(vec![f32::NAN]),
            Value::FloatArray(vec![f32::NAN])
        );
    }

    #[test]
    fn test_values_key_maps() {
        let mut map = IndexMap::new();
        map.insert(Value::from("a"), Value::Long(1));
        map.insert(Value::Double(1.5), Value::Null);
        assert_eq!(map.get(&Value::from("a")), Some(&Value::Long(1)));
        assert_eq!(map.get(&Value::Double(1.5)), Some(&Value::Null));
    }

    #[test]
    fn test_set_equality_ignores_order() {
        let a: IndexSet<Value> = [Value::Int(1), Value::Int(2)].into_iter().collect();
        let b: IndexSet<Value> = [Value::Int(2), Value::Int(1)].into_iter().collect();
        assert_eq!(Value::Set(a), Value::Set(b));
    }

    #[test]
    fn test_value_type_display() {
        assert_eq!(Value::Long(1).value_type().to_string(), "long");
        assert_eq!(Value::IntArray(vec![]).value_type().to_string(), "int[]");
        let array = ObjectArray::new(ValueType::String, vec![]);
        assert_eq!(Value::Array(array).value_type().to_string(), "string[]");
    }

    #[test]
    fn test_object_value_downcast() {
        let value = Value::object(Point { x: 3 });
        assert_eq!(value.value_type(), ValueType::Object(RecordType::of::<Point>()));
        assert_eq!(value.as_record::<Point>(), Some(&Point { x: 3 }));
        assert_eq!(value.clone(), value);

        let Value::Object(object) = value else {
            panic!("expected object");
        };
        assert!(object.downcast_ref::<Point>().is_some());
        assert_eq!(object.into_record::<Point>(), Some(Point { x: 3 }));
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(5i64)), Value::Long(5));
    }
}
