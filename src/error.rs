//! Error types for markser.

use thiserror::Error;

use crate::value::Value;
use crate::wire::Marker;

/// Main error type for all encode, decode and registration operations.
#[derive(Debug, Error)]
pub enum MarkserError {
    /// The marker byte does not belong to the codec reading it.
    #[error("Could not deserialize as {target}: unexpected marker {marker}")]
    Decode {
        /// What the codec was trying to read.
        target: &'static str,
        /// The offending marker.
        marker: Marker,
    },

    /// Fewer bytes remain in the input than the codec needs.
    #[error("Buffer underflow: needed {needed} bytes, only {available} available")]
    BufferUnderflow {
        /// Bytes requested.
        needed: usize,
        /// Bytes left in the input.
        available: usize,
    },

    /// No registered codec handles the given type.
    #[error("No registered codec for: {0}")]
    MissingCodec(String),

    /// The stream carries a marker no codec claimed.
    #[error("No codec registered for marker {0}")]
    UnknownMarker(Marker),

    /// A codec tried to claim a marker that is already taken.
    #[error("Marker {marker} already registered by {owner}")]
    MarkerCollision {
        /// First colliding marker.
        marker: Marker,
        /// Name of the codec owning it.
        owner: &'static str,
    },

    /// Every one of the 255 usable markers is claimed.
    #[error("The codec registry is full")]
    MarkersExhausted,

    /// A contiguous marker run would leave the signed byte range or cover the null marker.
    #[error("{count} markers starting at {base} do not fit in the marker space")]
    MarkerOverflow {
        /// First marker of the run.
        base: Marker,
        /// Length of the run.
        count: u8,
    },

    /// An object codec could not be generated for a type.
    #[error("Codec generation failed: {0}")]
    CodecGeneration(String),

    /// A codec was handed a value of a kind it does not write.
    #[error("{codec} codec cannot write a value of type {found}")]
    TypeMismatch {
        /// Name of the codec.
        codec: &'static str,
        /// Type of the rejected value.
        found: String,
    },

    /// String or char-array payload is not valid UTF-8.
    #[error("Invalid UTF-8 payload: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Char payload is not a Unicode scalar value.
    #[error("Invalid char code point: {0:#x}")]
    InvalidChar(u32),

    /// Size does not fit the widest size tier (signed 32 bits).
    #[error("Size {0} exceeds the maximum encodable size")]
    SizeOverflow(usize),

    /// A null was read where the target type cannot hold one.
    #[error("Unexpected null while reading {target}")]
    UnexpectedNull {
        /// What was being read.
        target: &'static str,
    },
}

impl MarkserError {
    /// Build a [`MarkserError::TypeMismatch`] for `value`.
    pub(crate) fn mismatch(codec: &'static str, value: &Value) -> Self {
        MarkserError::TypeMismatch {
            codec,
            found: value.value_type().to_string(),
        }
    }
}

/// Result type alias using MarkserError.
pub type Result<T> = std::result::Result<T, MarkserError>;
