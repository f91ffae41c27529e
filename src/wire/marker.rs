//! Marker bytes and contiguous marker runs.
//!
//! Every encoded value starts with a signed marker byte:
//! ```text
//! ┌────────┬──────────────────────┐
//! │ Marker │ Payload              │
//! │ 1 byte │ owned by the codec   │
//! │ i8     │ that claims marker   │
//! └────────┴──────────────────────┘
//! ```
//!
//! `-128` is reserved for null in every codec.

use crate::error::{MarkserError, Result};

/// A signed marker byte.
pub type Marker = i8;

/// Universal null marker, understood by every codec.
pub const NULL_MARKER: Marker = i8::MIN;

/// Number of slots in a marker table (one per byte value).
pub const MARKER_SLOTS: usize = 256;

/// Index of `marker` in a 256-slot marker table.
#[inline]
pub fn slot_index(marker: Marker) -> usize {
    (marker as i16 + 128) as usize
}

/// Marker stored at `index` of a 256-slot marker table.
#[inline]
pub fn slot_marker(index: usize) -> Marker {
    (index as i16 - 128) as Marker
}

/// A contiguous run of markers claimed by one codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerRange {
    base: Marker,
    count: u8,
}

impl MarkerRange {
    /// The run holding only the null marker, owned by the null codec.
    pub const NULL: MarkerRange = MarkerRange {
        base: NULL_MARKER,
        count: 1,
    };

    /// Build a run of `count` markers starting at `base`.
    ///
    /// Fails with [`MarkserError::MarkerOverflow`] if the run is empty, covers
    /// the null marker, or runs past `127`.
    pub fn new(base: Marker, count: u8) -> Result<Self> {
        let last = base as i16 + count as i16 - 1;
        if count == 0 || base == NULL_MARKER || last > i8::MAX as i16 {
            return Err(MarkserError::MarkerOverflow { base, count });
        }
        Ok(Self { base, count })
    }

    /// A run holding just `marker`.
    pub fn single(marker: Marker) -> Result<Self> {
        Self::new(marker, 1)
    }

    /// First marker of the run.
    #[inline]
    pub fn base(&self) -> Marker {
        self.base
    }

    /// Number of markers in the run.
    #[inline]
    pub fn count(&self) -> u8 {
        self.count
    }

    /// Last marker of the run.
    #[inline]
    pub fn last(&self) -> Marker {
        (self.base as i16 + self.count as i16 - 1) as Marker
    }

    /// Whether `marker` belongs to this run.
    #[inline]
    pub fn contains(&self, marker: Marker) -> bool {
        marker >= self.base && marker <= self.last()
    }

    /// Offset of `marker` from the base, if the run holds it.
    #[inline]
    pub fn offset_of(&self, marker: Marker) -> Option<u8> {
        self.contains(marker)
            .then(|| (marker as i16 - self.base as i16) as u8)
    }

    /// Marker at `offset` from the base.
    ///
    /// Callers only pass offsets below `count`.
    #[inline]
    pub fn at(&self, offset: u8) -> Marker {
        debug_assert!(offset < self.count);
        (self.base as i16 + offset as i16) as Marker
    }

    /// Iterate over every marker of the run.
    pub fn iter(&self) -> impl Iterator<Item = Marker> {
        (self.base as i16..=self.last() as i16).map(|m| m as Marker)
    }
}

impl std::fmt::Display for MarkerRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 1 {
            write!(f, "[{}]", self.base)
        } else {
            write!(f, "[{}..={}]", self.base, self.last())
        }
    }
}
