//! Integrated loudness measurement and normalization (ITU-R BS.1770).
//!
//! K-weighting runs through two biquad stages (high shelf, then
//! high-pass), energy is averaged over 400ms blocks with 75% overlap,
//! and blocks are gated absolutely at -70 LUFS and relatively at -10 LU
//! below the first-pass mean.

use biquad::{Biquad, Coefficients, DirectForm2Transposed, ToHertz, Type};

use crate::audio::AudioClip;

/// Absolute gate threshold (LUFS).
const ABSOLUTE_GATE_LUFS: f64 = -70.0;

/// Relative gate offset below the ungated mean (LU).
const RELATIVE_GATE_LU: f64 = 10.0;

/// Gating block length in seconds.
const BLOCK_SECS: f64 = 0.4;

/// Block hop in seconds (75% overlap).
const HOP_SECS: f64 = 0.1;

/// K-weighting pre-filter: high shelf boosting the head's acoustic
/// response, then a high-pass removing inaudible rumble. Parameters per
/// BS.1770; the biquad design tracks the clip's sample rate.
fn k_weight(clip: &AudioClip) -> Option<Vec<f64>> {
    let fs = (clip.sample_rate as f64).hz();

    let shelf = Coefficients::<f64>::from_params(
        Type::HighShelf(3.999843853973347),
        fs,
        1681.974450955533.hz(),
        0.7071752369554196,
    )
    .ok()?;
    let highpass = Coefficients::<f64>::from_params(
        Type::HighPass,
        fs,
        38.13547087602444.hz(),
        0.5003270373238773,
    )
    .ok()?;

    let mut stage1 = DirectForm2Transposed::<f64>::new(shelf);
    let mut stage2 = DirectForm2Transposed::<f64>::new(highpass);

    Some(
        clip.samples
            .iter()
            .map(|&s| stage2.run(stage1.run(s)))
            .collect(),
    )
}

/// Loudness of one block from its mean-square energy.
fn block_loudness(energy: f64) -> f64 {
    -0.691 + 10.0 * energy.log10()
}

/// Measure integrated loudness in LUFS.
///
/// Returns `None` when loudness is undefined: the clip is shorter than
/// one gating block, or silence-dominated (every block gated out).
pub fn integrated_loudness(clip: &AudioClip) -> Option<f64> {
    let block_len = (BLOCK_SECS * clip.sample_rate as f64) as usize;
    let hop = (HOP_SECS * clip.sample_rate as f64) as usize;
    if block_len == 0 || hop == 0 || clip.len() < block_len {
        return None;
    }

    let weighted = k_weight(clip)?;

    let mut energies = Vec::new();
    let mut start = 0;
    while start + block_len <= weighted.len() {
        let block = &weighted[start..start + block_len];
        let energy = block.iter().map(|s| s * s).sum::<f64>() / block_len as f64;
        energies.push(energy);
        start += hop;
    }

    // Absolute gate.
    let above_absolute: Vec<f64> = energies
        .iter()
        .copied()
        .filter(|&e| block_loudness(e) > ABSOLUTE_GATE_LUFS)
        .collect();
    if above_absolute.is_empty() {
        return None;
    }

    // Relative gate at -10 LU below the mean of absolutely-gated blocks.
    let mean = above_absolute.iter().sum::<f64>() / above_absolute.len() as f64;
    let relative_threshold = block_loudness(mean) - RELATIVE_GATE_LU;

    let gated: Vec<f64> = above_absolute
        .into_iter()
        .filter(|&e| block_loudness(e) > relative_threshold)
        .collect();
    if gated.is_empty() {
        return None;
    }

    let loudness = block_loudness(gated.iter().sum::<f64>() / gated.len() as f64);
    loudness.is_finite().then_some(loudness)
}

/// Normalize the clip to the target integrated loudness.
///
/// Returns the measured loudness, or `None` when it was unmeasurable
/// and normalization was skipped (never an error; a silence-dominated
/// track is a valid deliverable).
pub fn normalize_loudness(clip: &mut AudioClip, target_lufs: f64) -> Option<f64> {
    let measured = integrated_loudness(clip)?;
    let gain = 10f64.powf((target_lufs - measured) / 20.0);
    clip.apply_gain(gain);
    tracing::debug!(
        "Normalized loudness {:.2} LUFS -> {:.2} LUFS (gain {:.4})",
        measured,
        target_lufs,
        gain
    );
    Some(measured)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 24000;

    fn sine(freq: f64, amplitude: f64, secs: f64) -> AudioClip {
        let n = (secs * SR as f64) as usize;
        let samples = (0..n)
            .map(|i| amplitude * (2.0 * std::f64::consts::PI * freq * i as f64 / SR as f64).sin())
            .collect();
        AudioClip::new(samples, SR)
    }

    #[test]
    fn silence_is_unmeasurable() {
        let clip = AudioClip::silence(5.0, SR);
        assert_eq!(integrated_loudness(&clip), None);
    }

    #[test]
    fn too_short_clip_is_unmeasurable() {
        let clip = sine(440.0, 0.5, 0.2);
        assert_eq!(integrated_loudness(&clip), None);
    }

    #[test]
    fn sine_is_measurable_and_louder_is_louder() {
        let quiet = integrated_loudness(&sine(440.0, 0.05, 3.0)).unwrap();
        let loud = integrated_loudness(&sine(440.0, 0.5, 3.0)).unwrap();
        // 20 dB amplitude difference carries straight through.
        assert!((loud - quiet - 20.0).abs() < 0.5, "{} vs {}", loud, quiet);
    }

    #[test]
    fn normalize_reaches_target() {
        let mut clip = sine(440.0, 0.1, 3.0);
        normalize_loudness(&mut clip, -23.0).unwrap();
        let after = integrated_loudness(&clip).unwrap();
        assert!((after - -23.0).abs() < 0.5, "got {}", after);
    }

    #[test]
    fn normalize_skips_silence() {
        let mut clip = AudioClip::silence(5.0, SR);
        assert_eq!(normalize_loudness(&mut clip, -23.0), None);
        assert!(clip.samples.iter().all(|&s| s == 0.0));
    }
}
