//! Byte-level wire format: markers, size tiers and the byte cursors.

mod marker;
mod reader;
pub mod size;
mod writer;

pub use marker::{slot_index, slot_marker, Marker, MarkerRange, MARKER_SLOTS, NULL_MARKER};
pub use reader::ByteReader;
pub use size::{read_size, write_size, SIZE_MARKERS};
pub use writer::ByteWriter;
