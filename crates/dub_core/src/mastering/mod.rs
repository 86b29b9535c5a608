//! Mastering: loudness normalization and instrumental mixing.

pub mod loudness;
pub mod mix;

pub use loudness::{integrated_loudness, normalize_loudness};
pub use mix::{master_track, MasterReport};
