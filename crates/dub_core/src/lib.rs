//! Dub Core - Adaptive timeline synchronization for video dubbing
//!
//! This crate contains the engine that fits translated, synthesized
//! speech back onto a source video's timeline: the audio pacer, the
//! video re-timer, mastering, and the job pipeline around them. It has
//! no UI dependencies and is driven by the CLI crate.

pub mod audio;
pub mod config;
pub mod logging;
pub mod mastering;
pub mod models;
pub mod orchestrator;
pub mod timeline;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
