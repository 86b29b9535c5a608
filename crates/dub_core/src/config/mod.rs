//! Configuration loading and persistence.

pub mod manager;
pub mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    AudioSettings, LoggingSettings, PathSettings, Settings, TimelineSettings, VideoSettings,
};
