//! Codec registry: marker → codec and type → codec resolution.
//!
//! The registry owns a 256-slot table indexed by marker, a priority list of
//! codecs in registration order, and a cache of resolved value types.
//! Marker `-128` always belongs to the null codec.
//!
//! Registration takes `&mut self` and must finish before the registry is
//! shared. Lookups take `&self` and are safe from many threads at once; the
//! type cache is filled on first use and every racing lookup agrees on the
//! result, since resolution only depends on the frozen priority list.
//!
//! # Example
//!
//! ```
//! use markser::codec::{LongCodec, StringCodec};
//! use markser::{Registry, ValueType};
//!
//! let mut registry = Registry::new();
//! let marker = registry.next_free_marker().unwrap();
//! registry.register(LongCodec::new(marker).unwrap()).unwrap();
//!
//! let marker = registry.next_free_marker().unwrap();
//! registry.register(StringCodec::new(marker, 16).unwrap()).unwrap();
//!
//! assert_eq!(registry.codec_for_type(&ValueType::Long).unwrap().name(), "long");
//! assert!(registry.codec_for_type(&ValueType::Bool).is_err());
//! ```

use std::sync::Arc;

use dashmap::DashMap;

use crate::codec::{
    AnyCodec, BoolArrayCodec, BoolCodec, ByteArrayCodec, ByteCodec, CharArrayCodec, CharCodec,
    Codec, CollectionCodec, DoubleArrayCodec, DoubleCodec, DynCodec, FloatArrayCodec, FloatCodec,
    IntArrayCodec, IntCodec, ListCodec, LongArrayCodec, LongCodec, MapCodec, NullCodec,
    QueueCodec, SetCodec, ShortArrayCodec, ShortCodec, StringCodec,
};
use crate::config::CodecConfig;
use crate::error::{MarkserError, Result};
use crate::value::{Value, ValueType};
use crate::wire::{slot_index, slot_marker, ByteReader, ByteWriter, Marker, MARKER_SLOTS, NULL_MARKER};

/// Registry of codecs, shared by every codec that recurses into nested values.
pub struct Registry {
    /// Codec owning each marker, indexed by `marker + 128`.
    slots: Vec<Option<Arc<dyn DynCodec>>>,
    /// Registered codecs in priority order.
    ordered: Vec<Arc<dyn DynCodec>>,
    /// Type resolutions found so far.
    resolved: DashMap<ValueType, Arc<dyn DynCodec>>,
    null: Arc<dyn DynCodec>,
}

impl Registry {
    /// Create a registry holding only the null codec.
    pub fn new() -> Self {
        let null: Arc<dyn DynCodec> = Arc::new(NullCodec);
        let mut slots = vec![None; MARKER_SLOTS];
        slots[slot_index(NULL_MARKER)] = Some(Arc::clone(&null));
        Self {
            slots,
            ordered: Vec::new(),
            resolved: DashMap::new(),
            null,
        }
    }

    /// Create a registry with every built-in codec, each claiming the next
    /// free markers in this order:
    ///
    /// bool, byte, char, double, float, int, long, short, string, the
    /// primitive arrays in the same order, map, queue, set, list, collection.
    ///
    /// The sentinel-delimited collection codec comes last so list, set and
    /// queue values keep their size-prefixed codecs.
    pub fn standard(config: &CodecConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(BoolCodec::new(registry.next_free_marker()?)?)?;
        registry.register(ByteCodec::new(registry.next_free_marker()?)?)?;
        registry.register(CharCodec::new(registry.next_free_marker()?)?)?;
        registry.register(DoubleCodec::new(registry.next_free_marker()?)?)?;
        registry.register(FloatCodec::new(registry.next_free_marker()?)?)?;
        registry.register(IntCodec::new(registry.next_free_marker()?)?)?;
        registry.register(LongCodec::new(registry.next_free_marker()?)?)?;
        registry.register(ShortCodec::new(registry.next_free_marker()?)?)?;
        registry.register(StringCodec::new(
            registry.next_free_marker()?,
            config.optimized_string_markers,
        )?)?;
        registry.register(BoolArrayCodec::new(registry.next_free_marker()?)?)?;
        registry.register(ByteArrayCodec::new(registry.next_free_marker()?)?)?;
        registry.register(CharArrayCodec::new(registry.next_free_marker()?)?)?;
        registry.register(DoubleArrayCodec::new(registry.next_free_marker()?)?)?;
        registry.register(FloatArrayCodec::new(registry.next_free_marker()?)?)?;
        registry.register(IntArrayCodec::new(registry.next_free_marker()?)?)?;
        registry.register(LongArrayCodec::new(registry.next_free_marker()?)?)?;
        registry.register(ShortArrayCodec::new(registry.next_free_marker()?)?)?;
        registry.register(MapCodec::new(registry.next_free_marker()?)?)?;
        registry.register(QueueCodec::new(registry.next_free_marker()?)?)?;
        registry.register(SetCodec::new(registry.next_free_marker()?)?)?;
        registry.register(ListCodec::new(registry.next_free_marker()?)?)?;
        registry.register(CollectionCodec::new(registry.next_free_marker()?)?)?;
        tracing::debug!(
            "Built standard registry: {} codecs, next free marker {:?}",
            registry.len(),
            registry.next_free_marker().ok()
        );
        Ok(registry)
    }

    /// Claim every marker of `codec` and append it to the priority list.
    ///
    /// Fails with [`MarkserError::MarkerCollision`] if any marker is already
    /// taken, leaving the registry unchanged.
    pub fn register<C: DynCodec>(&mut self, codec: C) -> Result<Arc<C>> {
        let markers = codec.markers();
        for marker in markers.iter() {
            if let Some(owner) = &self.slots[slot_index(marker)] {
                tracing::warn!(
                    "Rejected codec {}: marker {} already registered by {}",
                    codec.name(),
                    marker,
                    owner.name()
                );
                return Err(MarkserError::MarkerCollision {
                    marker,
                    owner: owner.name(),
                });
            }
        }

        let codec = Arc::new(codec);
        let shared: Arc<dyn DynCodec> = codec.clone();
        for marker in markers.iter() {
            self.slots[slot_index(marker)] = Some(Arc::clone(&shared));
        }
        self.ordered.push(shared);
        tracing::debug!("Registered codec {} at markers {}", codec.name(), markers);
        Ok(codec)
    }

    /// Lowest marker no codec has claimed.
    pub fn next_free_marker(&self) -> Result<Marker> {
        self.slots
            .iter()
            .position(Option::is_none)
            .map(slot_marker)
            .ok_or(MarkserError::MarkersExhausted)
    }

    /// Codec owning `marker`, if any.
    #[inline]
    pub fn get(&self, marker: Marker) -> Option<&Arc<dyn DynCodec>> {
        self.slots[slot_index(marker)].as_ref()
    }

    /// Codec owning `marker`, or [`MarkserError::UnknownMarker`].
    #[inline]
    pub fn codec_for_marker(&self, marker: Marker) -> Result<&Arc<dyn DynCodec>> {
        self.get(marker).ok_or(MarkserError::UnknownMarker(marker))
    }

    /// First registered codec that writes `ty`.
    pub fn codec_for_type(&self, ty: &ValueType) -> Result<Arc<dyn DynCodec>> {
        if *ty == ValueType::Null {
            return Ok(Arc::clone(&self.null));
        }
        if let Some(found) = self.resolved.get(ty) {
            return Ok(Arc::clone(found.value()));
        }

        let found = self
            .ordered
            .iter()
            .find(|codec| codec.writes(ty))
            .ok_or_else(|| MarkserError::MissingCodec(ty.to_string()))?;
        let entry = self.resolved.entry(ty.clone()).or_insert_with(|| {
            tracing::trace!("Resolved {} to codec {}", ty, found.name());
            Arc::clone(found)
        });
        Ok(Arc::clone(entry.value()))
    }

    /// Codec for the runtime type of `value`.
    pub fn codec_for(&self, value: &Value) -> Result<Arc<dyn DynCodec>> {
        match value {
            Value::Null => Ok(Arc::clone(&self.null)),
            value => self.codec_for_type(&value.value_type()),
        }
    }

    /// The registered codec for `ty`, as its concrete type `C`.
    ///
    /// Used to bind typed fast paths to built-in codecs.
    pub fn typed<C: Clone + 'static>(&self, ty: &ValueType) -> Result<C> {
        let codec = self.codec_for_type(ty)?;
        let found = codec.as_any().downcast_ref::<C>().cloned();
        found.ok_or_else(|| {
            MarkserError::MissingCodec(format!("{ty} as {}", std::any::type_name::<C>()))
        })
    }

    /// The polymorphic codec dispatching through this registry.
    pub fn any_codec(&self) -> AnyCodec {
        AnyCodec
    }

    /// Read one value of any registered type.
    pub fn read_any(&self, input: &mut ByteReader<'_>) -> Result<Value> {
        Ok(AnyCodec.read(self, input)?.unwrap_or(Value::Null))
    }

    /// Write one value with the codec registered for its type.
    pub fn write_any(&self, output: &mut ByteWriter, value: &Value) -> Result<()> {
        AnyCodec.write(self, output, Some(value))
    }

    /// Registered codecs in priority order, the null codec excluded.
    pub fn codecs(&self) -> impl Iterator<Item = &Arc<dyn DynCodec>> {
        self.ordered.iter()
    }

    /// Number of registered codecs, the null codec excluded.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether no codec besides null is registered.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field(
                "codecs",
                &self
                    .ordered
                    .iter()
                    .map(|codec| format!("{} {}", codec.name(), codec.markers()))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
