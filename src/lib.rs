//! # markser
//!
//! Self-describing binary serialization built on one-byte markers.
//!
//! Every encoded value starts with a signed marker byte that identifies the
//! codec which wrote it, and often carries part of the value too (a payload
//! width, a short string length, a boolean). Marker `-128` is reserved for
//! null in every context.
//!
//! ## Architecture
//!
//! - **Wire** ([`wire`]): marker ranges, byte cursors, variable-width sizes
//! - **Codecs** ([`codec`]): typed [`codec::Codec`]s plus the type-erased
//!   [`codec::DynCodec`] view used for dispatch
//! - **Registry** ([`Registry`]): marker and type lookup, priority order
//! - **Streams** ([`Serializer`], [`Deserializer`]): sequences of values
//!
//! ## Example
//!
//! ```
//! use markser::{CodecConfig, Deserializer, Registry, Serializer, Value};
//!
//! let registry = Registry::standard(&CodecConfig::default()).unwrap();
//!
//! let list = Value::List(vec![
//!     Value::Long(1),
//!     Value::Bool(false),
//!     Value::List(vec![]),
//!     Value::Map(Default::default()),
//!     Value::from("test"),
//! ]);
//! let mut serializer = Serializer::new(&registry);
//! serializer.append(&list).unwrap();
//! serializer.append(&Value::Null).unwrap();
//!
//! let mut deserializer = Deserializer::new(&registry, serializer.as_bytes());
//! assert_eq!(deserializer.read().unwrap(), list);
//! assert_eq!(deserializer.read().unwrap(), Value::Null);
//! assert!(deserializer.is_empty());
//! ```

pub mod codec;
pub mod config;
pub mod deserializer;
pub mod error;
pub mod registry;
pub mod serializer;
pub mod value;
pub mod wire;

pub use config::CodecConfig;
pub use deserializer::{Deserializer, DeserializerFactory};
pub use error::{MarkserError, Result};
pub use registry::Registry;
pub use serializer::{Serializer, SerializerFactory};
pub use value::{ObjectArray, ObjectValue, Record, RecordType, Value, ValueType};
