//! Audio pacer: places synthesized clips on the output timeline.
//!
//! Walks segments strictly in id order, maintaining the current output
//! end. Each segment's placement depends on the previous one, so the
//! loop is inherently sequential. Every anomaly (missing clip, stretch
//! backend failure) degrades to a worse-but-valid timeline; nothing here
//! aborts a run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::audio::{io, AudioClip, StretchError, TimeStretcher};
use crate::config::TimelineSettings;
use crate::models::Segment;

/// Floor on any stretch target, in seconds. Shorter targets produce
/// unusable audio and degenerate pts factors.
const MIN_STRETCH_TARGET: f64 = 0.2;

/// Provides the synthesized clip for a segment id, or `None` when
/// synthesis failed (the pacer substitutes silence).
pub trait ClipSource {
    fn load_clip(&self, id: u32) -> Option<AudioClip>;
}

/// Clip source reading per-segment WAV files from a directory.
///
/// Files are named by zero-padded segment id (`0000.wav`), the layout
/// the synthesis collaborator writes.
pub struct WavDirClips {
    dir: PathBuf,
    sample_rate: u32,
}

impl WavDirClips {
    pub fn new(dir: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            dir: dir.into(),
            sample_rate,
        }
    }
}

impl ClipSource for WavDirClips {
    fn load_clip(&self, id: u32) -> Option<AudioClip> {
        let path = self.dir.join(format!("{:04}.wav", id));
        if !path.exists() {
            return None;
        }
        match io::decode_audio(&path, self.sample_rate) {
            Ok(clip) if !clip.is_empty() => Some(clip),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Failed to decode clip {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Summary of one pacing run, for operator visibility.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PacingReport {
    /// Segments processed.
    pub segments_paced: usize,
    /// Segment ids whose clip was missing and replaced with silence.
    pub silence_substituted: Vec<u32>,
    /// Segment ids where the stretch backend failed and the raw clip
    /// was truncated/padded instead.
    pub stretch_fallbacks: Vec<u32>,
    /// Total leading silence inserted between segments (seconds).
    pub inserted_silence_secs: f64,
}

/// Result of pacing: the continuous vocal track plus the run summary.
/// Segment timing updates land in the segment list itself.
pub struct PacedTrack {
    pub track: AudioClip,
    pub report: PacingReport,
}

/// Place every segment's clip on a continuous output track.
///
/// For each segment in id order:
/// 1. Start no earlier than the original start, and no earlier than the
///    previous output end plus the configured minimum gap.
/// 2. Fill the lead-in with silence.
/// 3. Stretch the clip toward either the real-time ideal duration or the
///    drift-budget hard limit, whichever the decision rule picks.
/// 4. Record sample-accurate adjusted timing on the segment.
///
/// A clip shorter than its target after the ratio clamp is padded with
/// trailing silence; slowing it further sounds unnatural.
pub fn pace(
    segments: &mut [Segment],
    clips: &dyn ClipSource,
    stretcher: &dyn TimeStretcher,
    cfg: &TimelineSettings,
    sample_rate: u32,
) -> PacedTrack {
    let mut track = AudioClip::empty(sample_rate);
    let mut report = PacingReport::default();
    let mut current_output_end = 0.0_f64;

    for seg in segments.iter_mut() {
        let source_duration = seg.source_duration();
        let target_start = seg.original_start.max(current_output_end + cfg.min_gap);

        // Lead-in silence, measured against the actual track length so
        // placement stays sample-accurate across segments.
        let track_len = track.duration_secs();
        if target_start > track_len {
            track.append_silence(target_start - track_len);
            report.inserted_silence_secs += target_start - track_len;
        }

        let adjusted_start = track.duration_secs();

        let rendered = match clips.load_clip(seg.id) {
            Some(raw) if !raw.is_empty() => {
                seg.raw_clip_duration = raw.duration_secs();
                pace_clip(seg, raw, target_start, stretcher, cfg, &mut report)
            }
            _ => {
                seg.raw_clip_duration = 0.0;
                tracing::warn!(
                    "Segment {}: no synthesized clip, substituting {:.3}s of silence",
                    seg.id,
                    source_duration
                );
                report.silence_substituted.push(seg.id);
                AudioClip::silence(source_duration, sample_rate)
            }
        };

        // Silence substitution must yield adjusted_duration == source_duration
        // exactly, independent of sample rounding.
        let rendered_secs = if seg.raw_clip_duration == 0.0 {
            source_duration
        } else {
            rendered.duration_secs()
        };

        track.append(&rendered);
        seg.adjusted_start = Some(adjusted_start);
        seg.adjusted_end = Some(adjusted_start + rendered_secs);
        current_output_end = adjusted_start + rendered_secs;
        report.segments_paced += 1;
    }

    PacedTrack { track, report }
}

/// Stretch one clip toward its target duration.
///
/// Three candidate targets bound the stretch:
/// - `max_local`: this segment alone must not stretch the video past the
///   pts ceiling;
/// - `max_global`: cumulative drift, measured against this segment's
///   original end time, must not exceed the ceiling either;
/// - `ideal`: the duration that lands playback back on real time at the
///   segment's end.
///
/// When the ideal is reachable without speeding the clip up past the
/// perceptibility threshold, it wins; otherwise the hard limit does.
fn pace_clip(
    seg: &Segment,
    raw: AudioClip,
    target_start: f64,
    stretcher: &dyn TimeStretcher,
    cfg: &TimelineSettings,
    report: &mut PacingReport,
) -> AudioClip {
    let source_duration = seg.source_duration();
    let raw_duration = raw.duration_secs();

    let max_local = source_duration * cfg.max_pts_factor;
    let max_global = seg.original_end * cfg.max_pts_factor - target_start;
    let ideal = seg.original_end - target_start;
    let hard_limit = MIN_STRETCH_TARGET.max(max_local.min(max_global));

    let stretch_target = if ideal / raw_duration >= cfg.ideal_ratio_threshold {
        ideal.max(MIN_STRETCH_TARGET)
    } else {
        hard_limit
    };

    let ratio = (stretch_target / raw_duration).clamp(cfg.min_speed_factor, cfg.max_speed_factor);

    tracing::debug!(
        "Segment {}: raw {:.3}s, ideal {:.3}s, hard limit {:.3}s, target {:.3}s, ratio {:.3}",
        seg.id,
        raw_duration,
        ideal,
        hard_limit,
        stretch_target,
        ratio
    );

    let mut rendered = match stretcher.stretch(&raw, ratio) {
        Ok(clip) if !clip.is_empty() => clip,
        Ok(_) => stretch_fallback(seg.id, &raw, stretch_target, StretchError::EmptyOutput, report),
        Err(e) => stretch_fallback(seg.id, &raw, stretch_target, e, report),
    };

    // Shorter than the target (ratio clamp, or backend fell short):
    // trailing silence, never more slowdown.
    rendered.pad_to(stretch_target);
    rendered
}

/// Non-fatal stretch failure: truncate the raw clip to the target (the
/// pad-to-target pass afterwards covers the short side).
fn stretch_fallback(
    id: u32,
    raw: &AudioClip,
    stretch_target: f64,
    error: StretchError,
    report: &mut PacingReport,
) -> AudioClip {
    tracing::warn!(
        "Segment {}: time-stretch failed ({}), falling back to truncated/padded clip",
        id,
        error
    );
    report.stretch_fallbacks.push(id);
    let mut clip = raw.clone();
    clip.truncate_to(stretch_target);
    clip
}
