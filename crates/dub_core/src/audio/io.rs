//! FFmpeg-backed audio decode/encode.
//!
//! Decodes any input ffmpeg can read into mono f64 samples at the engine
//! sample rate, and encodes finished tracks back to WAV. Raw samples
//! travel over pipes; no intermediate files.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use thiserror::Error;

use super::clip::AudioClip;

/// Errors from ffmpeg-backed audio I/O.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("ffmpeg error: {0}")]
    FfmpegError(String),

    #[error("ffprobe error: {0}")]
    FfprobeError(String),

    #[error("No audio samples decoded from {0}")]
    EmptyDecode(String),
}

/// Result type for audio I/O operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Decode an audio file to a mono clip at the given sample rate.
pub fn decode_audio(input_path: &Path, sample_rate: u32) -> AudioResult<AudioClip> {
    if !input_path.exists() {
        return Err(AudioError::FileNotFound(input_path.display().to_string()));
    }

    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-i")
        .arg(input_path)
        .arg("-vn")
        .arg("-ac")
        .arg("1")
        .arg("-ar")
        .arg(sample_rate.to_string())
        .arg("-f")
        .arg("f64le")
        .arg("-acodec")
        .arg("pcm_f64le")
        .arg("pipe:1");
    cmd.stderr(Stdio::null()).stdout(Stdio::piped());

    tracing::debug!("Running ffmpeg: {:?}", cmd);

    let mut child = cmd
        .spawn()
        .map_err(|e| AudioError::FfmpegError(format!("Failed to spawn ffmpeg: {}", e)))?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| AudioError::FfmpegError("Failed to capture ffmpeg stdout".to_string()))?;

    let mut buffer = Vec::new();
    stdout
        .read_to_end(&mut buffer)
        .map_err(|e| AudioError::FfmpegError(format!("Failed to read ffmpeg output: {}", e)))?;

    let status = child
        .wait()
        .map_err(|e| AudioError::FfmpegError(format!("ffmpeg process error: {}", e)))?;

    if !status.success() {
        return Err(AudioError::FfmpegError(format!(
            "ffmpeg exited with code: {:?}",
            status.code()
        )));
    }

    let samples = bytes_to_f64_samples(&buffer);
    if samples.is_empty() {
        return Err(AudioError::EmptyDecode(input_path.display().to_string()));
    }

    tracing::debug!(
        "Decoded {} samples ({:.2}s) from {}",
        samples.len(),
        samples.len() as f64 / sample_rate as f64,
        input_path.display()
    );

    Ok(AudioClip::new(samples, sample_rate))
}

/// Encode a clip to a 16-bit PCM WAV file.
pub fn encode_wav(clip: &AudioClip, output_path: &Path) -> AudioResult<()> {
    let mut cmd = Command::new("ffmpeg");
    cmd.arg("-f")
        .arg("f64le")
        .arg("-ar")
        .arg(clip.sample_rate.to_string())
        .arg("-ac")
        .arg("1")
        .arg("-i")
        .arg("pipe:0")
        .arg("-c:a")
        .arg("pcm_s16le")
        .arg("-y")
        .arg(output_path);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    tracing::debug!("Running ffmpeg: {:?}", cmd);

    let mut child = cmd
        .spawn()
        .map_err(|e| AudioError::FfmpegError(format!("Failed to spawn ffmpeg: {}", e)))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| AudioError::FfmpegError("Failed to open ffmpeg stdin".to_string()))?;

    let bytes = f64_samples_to_bytes(&clip.samples);
    // Writer thread so the encoder's stdin can't back up against us.
    let writer = std::thread::spawn(move || stdin.write_all(&bytes));

    let status = child
        .wait()
        .map_err(|e| AudioError::FfmpegError(format!("ffmpeg process error: {}", e)))?;

    match writer.join() {
        Ok(Ok(())) => {}
        // Broken pipe here means ffmpeg died first; the status check reports it.
        Ok(Err(e)) if status.success() => {
            return Err(AudioError::FfmpegError(format!(
                "Failed to write samples to ffmpeg: {}",
                e
            )));
        }
        Ok(Err(_)) => {}
        Err(_) => {
            return Err(AudioError::FfmpegError(
                "Sample writer thread panicked".to_string(),
            ));
        }
    }

    if !status.success() {
        return Err(AudioError::FfmpegError(format!(
            "ffmpeg exited with code: {:?}",
            status.code()
        )));
    }

    Ok(())
}

/// Get the duration of a media file in seconds using ffprobe.
pub fn probe_duration(input_path: &Path) -> AudioResult<f64> {
    if !input_path.exists() {
        return Err(AudioError::FileNotFound(input_path.display().to_string()));
    }

    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("error")
        .arg("-show_entries")
        .arg("format=duration")
        .arg("-of")
        .arg("default=noprint_wrappers=1:nokey=1")
        .arg(input_path)
        .output()
        .map_err(|e| AudioError::FfprobeError(format!("Failed to run ffprobe: {}", e)))?;

    if !output.status.success() {
        return Err(AudioError::FfprobeError(
            "ffprobe failed to get duration".to_string(),
        ));
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    duration_str
        .trim()
        .parse::<f64>()
        .map_err(|e| AudioError::FfprobeError(format!("Failed to parse duration: {}", e)))
}

/// Convert raw bytes to f64 samples (little-endian).
pub(crate) fn bytes_to_f64_samples(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let arr: [u8; 8] = chunk.try_into().unwrap();
            f64::from_le_bytes(arr)
        })
        .collect()
}

/// Convert f64 samples to raw little-endian bytes.
pub(crate) fn f64_samples_to_bytes(samples: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 8);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}
