//! In-memory mono audio clip.

/// Mono audio samples at a fixed sample rate.
///
/// All engine audio is mono f64; channel layout and encoding are handled
/// at the ffmpeg boundary.
#[derive(Debug, Clone, Default)]
pub struct AudioClip {
    /// Audio samples as f64, mono.
    pub samples: Vec<f64>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioClip {
    /// Create a clip from samples.
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Create an empty clip at the given sample rate.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    /// Create a clip of silence with the given duration.
    pub fn silence(duration_secs: f64, sample_rate: u32) -> Self {
        let n = (duration_secs * sample_rate as f64).round().max(0.0) as usize;
        Self::new(vec![0.0; n], sample_rate)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the clip holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Append another clip's samples. Sample rates must match.
    pub fn append(&mut self, other: &AudioClip) {
        debug_assert_eq!(self.sample_rate, other.sample_rate);
        self.samples.extend_from_slice(&other.samples);
    }

    /// Append silence, rounding up to whole samples so the new length
    /// never falls short of the requested duration.
    pub fn append_silence(&mut self, duration_secs: f64) {
        if duration_secs <= 0.0 {
            return;
        }
        let n = (duration_secs * self.sample_rate as f64).ceil() as usize;
        self.samples.resize(self.samples.len() + n, 0.0);
    }

    /// Pad with trailing silence up to the given duration. No-op when
    /// already long enough. Returns the seconds of silence added.
    pub fn pad_to(&mut self, duration_secs: f64) -> f64 {
        let target = (duration_secs * self.sample_rate as f64).round() as usize;
        if target <= self.samples.len() {
            return 0.0;
        }
        let added = target - self.samples.len();
        self.samples.resize(target, 0.0);
        added as f64 / self.sample_rate as f64
    }

    /// Truncate to the given duration. No-op when already short enough.
    pub fn truncate_to(&mut self, duration_secs: f64) {
        let target = (duration_secs * self.sample_rate as f64).round() as usize;
        if target < self.samples.len() {
            self.samples.truncate(target);
        }
    }

    /// Apply a linear gain to every sample.
    pub fn apply_gain(&mut self, gain: f64) {
        for sample in &mut self.samples {
            *sample *= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_has_requested_duration() {
        let clip = AudioClip::silence(1.5, 24000);
        assert_eq!(clip.len(), 36000);
        assert!((clip.duration_secs() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn append_silence_rounds_up() {
        let mut clip = AudioClip::empty(24000);
        // Just over one sample's worth
        clip.append_silence(1.5 / 24000.0);
        assert_eq!(clip.len(), 2);
    }

    #[test]
    fn pad_to_extends_but_never_shrinks() {
        let mut clip = AudioClip::silence(1.0, 24000);
        let added = clip.pad_to(2.0);
        assert!((added - 1.0).abs() < 1e-6);
        assert_eq!(clip.len(), 48000);

        let added = clip.pad_to(0.5);
        assert_eq!(added, 0.0);
        assert_eq!(clip.len(), 48000);
    }

    #[test]
    fn truncate_to_shortens_but_never_grows() {
        let mut clip = AudioClip::silence(2.0, 24000);
        clip.truncate_to(0.5);
        assert_eq!(clip.len(), 12000);
        clip.truncate_to(3.0);
        assert_eq!(clip.len(), 12000);
    }

    #[test]
    fn apply_gain_scales_samples() {
        let mut clip = AudioClip::new(vec![0.5, -0.25], 24000);
        clip.apply_gain(2.0);
        assert!((clip.samples[0] - 1.0).abs() < 1e-12);
        assert!((clip.samples[1] + 0.5).abs() < 1e-12);
    }
}
