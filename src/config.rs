//! Codec configuration.
//!
//! # Example
//!
//! ```
//! use markser::{CodecConfig, Registry};
//!
//! let config = CodecConfig {
//!     optimized_string_markers: 32,
//!     ..CodecConfig::default()
//! };
//! let registry = Registry::standard(&config).unwrap();
//! assert_eq!(registry.len(), 22);
//! ```

use serde::{Deserialize, Serialize};

/// Default number of inline-length string markers.
pub const DEFAULT_OPTIMIZED_STRING_MARKERS: u8 = 16;

/// Default starting capacity of a serializer's output buffer.
pub const DEFAULT_INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Settings for the standard registry and the serializer factory.
///
/// Missing fields take their defaults when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CodecConfig {
    /// Strings shorter than this many UTF-8 bytes carry their length in the
    /// marker. May be zero.
    pub optimized_string_markers: u8,
    /// Bytes reserved up front by each serializer.
    pub initial_buffer_capacity: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            optimized_string_markers: DEFAULT_OPTIMIZED_STRING_MARKERS,
            initial_buffer_capacity: DEFAULT_INITIAL_BUFFER_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CodecConfig::default();
        assert_eq!(config.optimized_string_markers, 16);
        assert_eq!(config.initial_buffer_capacity, 1024);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = CodecConfig {
            optimized_string_markers: 8,
            initial_buffer_capacity: 64,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"optimizedStringMarkers\":8"));
        let parsed: CodecConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let parsed: CodecConfig = serde_json::from_str(r#"{"initialBufferCapacity": 10}"#).unwrap();
        assert_eq!(parsed.optimized_string_markers, DEFAULT_OPTIMIZED_STRING_MARKERS);
        assert_eq!(parsed.initial_buffer_capacity, 10);
    }
}
