//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Every field carries a serde default so partial config files load
//! cleanly.

use serde::{Deserialize, Serialize};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Path-related settings.
    #[serde(default)]
    pub paths: PathSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Timeline pacing and re-timing bounds.
    #[serde(default)]
    pub timeline: TimelineSettings,

    /// Audio mastering settings.
    #[serde(default)]
    pub audio: AudioSettings,

    /// Video passthrough settings for the muxing collaborator.
    #[serde(default)]
    pub video: VideoSettings,
}

impl Settings {
    /// Clamp out-of-range values to their documented bounds.
    pub fn sanitize(&mut self) {
        self.timeline.sanitize();
        if self.audio.sample_rate == 0 {
            self.audio.sample_rate = default_sample_rate();
        }
    }
}

/// Path configuration for output, temp, and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Output folder for finished deliverables.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Root folder for temporary files.
    #[serde(default = "default_temp_root")]
    pub temp_root: String,

    /// Folder for log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_output_folder() -> String {
    "dub_output".to_string()
}

fn default_temp_root() -> String {
    ".temp".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output_folder: default_output_folder(),
            temp_root: default_temp_root(),
            logs_folder: default_logs_folder(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Use compact log format.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of recent lines kept for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Show timestamps in log output.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_true() -> bool {
    true
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: true,
        }
    }
}

/// Bounds for the audio pacer and video re-timer.
///
/// `min_speed_factor` / `max_speed_factor` are duration ratios applied to
/// a single clip: 0.5 allows compressing to half length (2x speed-up),
/// 1.35 allows lengthening by 35%.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineSettings {
    /// Minimum silence inserted between consecutive output segments (seconds).
    #[serde(default = "default_min_gap")]
    pub min_gap: f64,

    /// Hard ceiling on how much any single video region may be slowed down.
    #[serde(default = "default_max_pts_factor")]
    pub max_pts_factor: f64,

    /// Lower bound on the per-clip duration ratio.
    #[serde(default = "default_min_speed_factor")]
    pub min_speed_factor: f64,

    /// Upper bound on the per-clip duration ratio.
    #[serde(default = "default_max_speed_factor")]
    pub max_speed_factor: f64,

    /// Threshold on `ideal / raw_clip_duration` above which the pacer
    /// targets real-time sync instead of the hard limit. A perceptibility
    /// heuristic, deliberately tunable.
    #[serde(default = "default_ideal_ratio_threshold")]
    pub ideal_ratio_threshold: f64,
}

fn default_min_gap() -> f64 {
    0.1
}

fn default_max_pts_factor() -> f64 {
    1.43
}

fn default_min_speed_factor() -> f64 {
    0.5
}

fn default_max_speed_factor() -> f64 {
    1.35
}

fn default_ideal_ratio_threshold() -> f64 {
    0.5
}

impl TimelineSettings {
    /// Clamp values to their documented bounds.
    pub fn sanitize(&mut self) {
        if !self.min_gap.is_finite() || self.min_gap < 0.0 {
            self.min_gap = 0.0;
        }
        if !self.max_pts_factor.is_finite() || self.max_pts_factor < 1.0 {
            self.max_pts_factor = 1.0;
        }
        if !self.min_speed_factor.is_finite() || self.min_speed_factor <= 0.0 {
            self.min_speed_factor = default_min_speed_factor();
        }
        if !self.max_speed_factor.is_finite() || self.max_speed_factor < self.min_speed_factor {
            self.max_speed_factor = self.min_speed_factor;
        }
        if !self.ideal_ratio_threshold.is_finite() || self.ideal_ratio_threshold <= 0.0 {
            self.ideal_ratio_threshold = default_ideal_ratio_threshold();
        }
    }
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            min_gap: default_min_gap(),
            max_pts_factor: default_max_pts_factor(),
            min_speed_factor: default_min_speed_factor(),
            max_speed_factor: default_max_speed_factor(),
            ideal_ratio_threshold: default_ideal_ratio_threshold(),
        }
    }
}

/// Audio mastering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Engine sample rate in Hz (the synthesis collaborator's rate).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Integrated loudness target in LUFS.
    #[serde(default = "default_target_lufs")]
    pub target_lufs: f64,

    /// Gain applied to the instrumental track when mixing.
    #[serde(default = "default_instrumental_gain")]
    pub instrumental_gain: f64,
}

fn default_sample_rate() -> u32 {
    24000
}

fn default_target_lufs() -> f64 {
    -23.0
}

fn default_instrumental_gain() -> f64 {
    1.0
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            target_lufs: default_target_lufs(),
            instrumental_gain: default_instrumental_gain(),
        }
    }
}

/// Video settings passed through to the muxing collaborator.
///
/// The engine itself only reads these to decide whether the stream-copy
/// fast path is allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSettings {
    /// Target frame rate.
    #[serde(default = "default_fps")]
    pub fps: f64,

    /// Target resolution label (e.g. "1080p").
    #[serde(default = "default_resolution")]
    pub resolution: String,

    /// Burn subtitles into the video.
    #[serde(default)]
    pub burn_subtitles: bool,

    /// Watermark image path (empty = none).
    #[serde(default)]
    pub watermark_path: String,

    /// Global playback speed override (1.0 = none).
    #[serde(default = "default_speed_override")]
    pub speed_override: f64,
}

fn default_fps() -> f64 {
    30.0
}

fn default_resolution() -> String {
    "1080p".to_string()
}

fn default_speed_override() -> f64 {
    1.0
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            resolution: default_resolution(),
            burn_subtitles: false,
            watermark_path: String::new(),
            speed_override: default_speed_override(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.audio.sample_rate, 24000);
        assert!((settings.timeline.max_pts_factor - 1.43).abs() < 1e-9);
        assert!((settings.timeline.ideal_ratio_threshold - 0.5).abs() < 1e-9);
        assert!(!settings.video.burn_subtitles);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str("[timeline]\nmin_gap = 0.0\n").unwrap();
        assert_eq!(settings.timeline.min_gap, 0.0);
        assert!((settings.timeline.max_pts_factor - 1.43).abs() < 1e-9);
        assert_eq!(settings.paths.output_folder, "dub_output");
    }

    #[test]
    fn sanitize_clamps_invalid_values() {
        let mut settings = Settings::default();
        settings.timeline.min_gap = -1.0;
        settings.timeline.max_pts_factor = 0.5;
        settings.timeline.max_speed_factor = 0.1;
        settings.sanitize();
        assert_eq!(settings.timeline.min_gap, 0.0);
        assert_eq!(settings.timeline.max_pts_factor, 1.0);
        assert!(settings.timeline.max_speed_factor >= settings.timeline.min_speed_factor);
    }
}
