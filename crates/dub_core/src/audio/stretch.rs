//! Time stretching (duration change without pitch change).
//!
//! The pacer talks to a `TimeStretcher` trait; the production
//! implementation shells out to ffmpeg's `atempo` filter over raw f64
//! pipes. Tests substitute a deterministic stretcher.

use std::io::{Read, Write};
use std::process::{Command, Stdio};

use thiserror::Error;

use super::clip::AudioClip;
use super::io::{bytes_to_f64_samples, f64_samples_to_bytes};

/// Errors from the time-stretch backend.
#[derive(Error, Debug)]
pub enum StretchError {
    #[error("Invalid stretch ratio: {0}")]
    InvalidRatio(f64),

    #[error("ffmpeg error: {0}")]
    FfmpegError(String),

    #[error("Stretch produced no samples")]
    EmptyOutput,
}

/// Alters a clip's duration without changing its pitch.
///
/// `ratio` is a duration ratio: 2.0 doubles the clip length (half-speed
/// playback), 0.5 halves it. Implementations return the stretched clip;
/// the caller decides how to handle a result that misses the target.
pub trait TimeStretcher: Send + Sync {
    fn stretch(&self, clip: &AudioClip, ratio: f64) -> Result<AudioClip, StretchError>;
}

/// Ratios this close to 1.0 skip the backend entirely.
const UNITY_RATIO_EPSILON: f64 = 1e-4;

/// Time stretcher backed by ffmpeg's `atempo` filter.
///
/// `atempo` takes a tempo (speed) factor limited to [0.5, 2.0] per
/// instance, so larger changes are expressed as a filter chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegStretcher;

impl FfmpegStretcher {
    pub fn new() -> Self {
        Self
    }
}

impl TimeStretcher for FfmpegStretcher {
    fn stretch(&self, clip: &AudioClip, ratio: f64) -> Result<AudioClip, StretchError> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(StretchError::InvalidRatio(ratio));
        }
        if (ratio - 1.0).abs() < UNITY_RATIO_EPSILON || clip.is_empty() {
            return Ok(clip.clone());
        }

        // atempo is a speed factor; duration ratio is its inverse.
        let tempo = 1.0 / ratio;
        let filter = atempo_chain(tempo)
            .iter()
            .map(|t| format!("atempo={:.6}", t))
            .collect::<Vec<_>>()
            .join(",");

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-f")
            .arg("f64le")
            .arg("-ar")
            .arg(clip.sample_rate.to_string())
            .arg("-ac")
            .arg("1")
            .arg("-i")
            .arg("pipe:0")
            .arg("-filter:a")
            .arg(&filter)
            .arg("-f")
            .arg("f64le")
            .arg("pipe:1");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        tracing::debug!("Running ffmpeg stretch ({}): {:?}", filter, cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| StretchError::FfmpegError(format!("Failed to spawn ffmpeg: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| StretchError::FfmpegError("Failed to open ffmpeg stdin".to_string()))?;
        let mut stdout = child.stdout.take().ok_or_else(|| {
            StretchError::FfmpegError("Failed to capture ffmpeg stdout".to_string())
        })?;

        let bytes = f64_samples_to_bytes(&clip.samples);
        // Writer thread keeps the pipes from deadlocking on long clips.
        let writer = std::thread::spawn(move || {
            let _ = stdin.write_all(&bytes);
        });

        let mut buffer = Vec::new();
        stdout
            .read_to_end(&mut buffer)
            .map_err(|e| StretchError::FfmpegError(format!("Failed to read ffmpeg output: {}", e)))?;

        let status = child
            .wait()
            .map_err(|e| StretchError::FfmpegError(format!("ffmpeg process error: {}", e)))?;
        let _ = writer.join();

        if !status.success() {
            return Err(StretchError::FfmpegError(format!(
                "ffmpeg exited with code: {:?}",
                status.code()
            )));
        }

        let samples = bytes_to_f64_samples(&buffer);
        if samples.is_empty() {
            return Err(StretchError::EmptyOutput);
        }

        Ok(AudioClip::new(samples, clip.sample_rate))
    }
}

/// Decompose a tempo factor into a chain of per-instance factors within
/// atempo's [0.5, 2.0] range. The product of the returned factors equals
/// the requested tempo.
fn atempo_chain(tempo: f64) -> Vec<f64> {
    let mut factors = Vec::new();
    let mut remaining = tempo;
    while remaining > 2.0 {
        factors.push(2.0);
        remaining /= 2.0;
    }
    while remaining < 0.5 {
        factors.push(0.5);
        remaining /= 0.5;
    }
    factors.push(remaining);
    factors
}
