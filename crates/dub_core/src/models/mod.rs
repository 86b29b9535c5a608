//! Data models for the dubbing timeline.

pub mod enums;
pub mod segment;

pub use enums::RegionKind;
pub use segment::{RecognizedUtterance, Segment, SegmentStore, StoreError};
