//! Audio buffers, ffmpeg-backed I/O, and time stretching.

pub mod clip;
pub mod io;
pub mod stretch;

pub use clip::AudioClip;
pub use io::AudioError;
pub use stretch::{FfmpegStretcher, StretchError, TimeStretcher};
