//! Final mixdown: normalize the vocal track, fold in the instrumental
//! bed, and pad out to the planned output duration.

use serde::{Deserialize, Serialize};

use crate::audio::AudioClip;
use crate::config::AudioSettings;

use super::loudness::normalize_loudness;

/// What the mastering pass did, persisted with the job state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MasterReport {
    /// Measured integrated loudness before normalization, when it was
    /// measurable.
    pub measured_lufs: Option<f64>,
    /// Whether an instrumental bed was mixed in.
    pub instrumental_mixed: bool,
    /// Trailing silence added to reach the plan duration, in seconds.
    pub padded_secs: f64,
    /// Final track duration in seconds.
    pub final_secs: f64,
}

/// Mix two tracks sample-by-sample, padding the shorter with silence so
/// no tail is lost. `gain` applies to the second track only.
fn mix_into(base: &mut AudioClip, other: &AudioClip, gain: f64) {
    if other.len() > base.len() {
        let secs = other.len() as f64 / base.sample_rate as f64;
        base.pad_to(secs);
    }
    for (dst, &src) in base.samples.iter_mut().zip(other.samples.iter()) {
        *dst += src * gain;
    }
}

/// Master the paced vocal track into the deliverable audio.
///
/// Normalizes the vocal to the target loudness (skipped when the track
/// is silence-dominated), sums in the instrumental bed when one was
/// extracted, and pads with trailing silence up to `plan_duration` so
/// audio never runs short of the video. A vocal track already longer
/// than the plan is left alone.
pub fn master_track(
    mut vocal: AudioClip,
    instrumental: Option<AudioClip>,
    plan_duration: f64,
    cfg: &AudioSettings,
) -> (AudioClip, MasterReport) {
    let mut report = MasterReport::default();

    report.measured_lufs = normalize_loudness(&mut vocal, cfg.target_lufs);
    if report.measured_lufs.is_none() {
        tracing::warn!("Vocal loudness unmeasurable, skipping normalization");
    }

    if let Some(bed) = instrumental {
        mix_into(&mut vocal, &bed, cfg.instrumental_gain);
        report.instrumental_mixed = true;
    }

    report.padded_secs = vocal.pad_to(plan_duration);
    report.final_secs = vocal.duration_secs();

    tracing::info!(
        "Mastered track: {:.2}s (padded {:.2}s, instrumental: {})",
        report.final_secs,
        report.padded_secs,
        report.instrumental_mixed
    );

    (vocal, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 24000;

    fn cfg() -> AudioSettings {
        AudioSettings {
            sample_rate: SR,
            target_lufs: -23.0,
            instrumental_gain: 1.0,
        }
    }

    fn constant(value: f64, secs: f64) -> AudioClip {
        let n = (secs * SR as f64) as usize;
        AudioClip::new(vec![value; n], SR)
    }

    #[test]
    fn pads_to_plan_duration() {
        let vocal = AudioClip::silence(2.0, SR);
        let (out, report) = master_track(vocal, None, 5.0, &cfg());
        assert!((out.duration_secs() - 5.0).abs() < 1e-3);
        assert!((report.padded_secs - 3.0).abs() < 1e-3);
        assert!(!report.instrumental_mixed);
    }

    #[test]
    fn longer_vocal_is_not_truncated() {
        let vocal = AudioClip::silence(6.0, SR);
        let (out, report) = master_track(vocal, None, 5.0, &cfg());
        assert!((out.duration_secs() - 6.0).abs() < 1e-3);
        assert_eq!(report.padded_secs, 0.0);
    }

    #[test]
    fn mixes_longer_instrumental_without_losing_tail() {
        let vocal = constant(0.25, 2.0);
        let bed = constant(0.5, 4.0);
        let (out, report) = master_track(vocal, Some(bed), 0.0, &cfg());
        assert!(report.instrumental_mixed);
        assert!(out.duration_secs() >= 4.0 - 1e-3);
        // The bed alone carries past the vocal's end.
        let tail_idx = (3.5 * SR as f64) as usize;
        assert!((out.samples[tail_idx] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn instrumental_gain_scales_bed_only() {
        let mut settings = cfg();
        settings.instrumental_gain = 0.5;
        let vocal = AudioClip::silence(1.0, SR);
        let bed = constant(0.8, 1.0);
        let (out, _) = master_track(vocal, Some(bed), 0.0, &settings);
        assert!((out.samples[100] - 0.4).abs() < 1e-9);
    }

    #[test]
    fn silent_vocal_skips_normalization() {
        let vocal = AudioClip::silence(3.0, SR);
        let (_, report) = master_track(vocal, None, 3.0, &cfg());
        assert_eq!(report.measured_lufs, None);
    }
}
