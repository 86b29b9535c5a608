//! Video re-timer: derives the piecewise time-remap plan.
//!
//! A pure function over the finalized segment list. Classifies the
//! source video into gap/speech/tail regions and assigns each a
//! playback-speed ratio, or recognizes the degenerate case where the
//! muxer can stream-copy the video untouched.

use thiserror::Error;

use crate::config::{TimelineSettings, VideoSettings};
use crate::models::{RegionKind, Segment};

use super::plan::{Region, VideoTimePlan};

/// Tolerance around 1.0 within which a pts factor counts as "no change".
pub const PTS_EPSILON: f64 = 1e-3;

/// Lower clamp for speech pts factors (guards against zero-duration math).
const MIN_SPEECH_PTS: f64 = 1e-6;

/// Lower clamp for gap pts factors.
const MIN_GAP_PTS: f64 = 0.2;

/// Source gaps shorter than this are absorbed into the neighboring
/// regions instead of becoming their own region.
const MIN_GAP_REGION_SECS: f64 = 1e-6;

/// Errors from plan construction.
#[derive(Error, Debug)]
pub enum PlanError {
    /// A segment is missing adjusted timing (the pacer has not run).
    #[error("Segment {0} has no adjusted timing")]
    MissingAdjustedTiming(u32),

    /// A segment has a non-positive source duration.
    #[error("Segment {0} has non-positive source duration")]
    EmptySourceDuration(u32),
}

/// Post-processing requested downstream of the engine.
///
/// Any requested post-processing forces a re-encode, which disables the
/// stream-copy fast path even when timing is untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostProcessing {
    pub burn_subtitles: bool,
    pub watermark: bool,
    pub speed_override: bool,
    pub background_burn_in: bool,
    /// Resolution or frame-rate change requested. Set by the caller;
    /// the engine does not probe the source's video streams itself.
    pub reformat: bool,
}

impl PostProcessing {
    /// Derive the flags from video settings.
    pub fn from_video_settings(video: &VideoSettings) -> Self {
        Self {
            burn_subtitles: video.burn_subtitles,
            watermark: !video.watermark_path.is_empty(),
            speed_override: (video.speed_override - 1.0).abs() > PTS_EPSILON,
            background_burn_in: false,
            reformat: false,
        }
    }

    /// Whether any post-processing is requested.
    pub fn any(&self) -> bool {
        self.burn_subtitles
            || self.watermark
            || self.speed_override
            || self.background_burn_in
            || self.reformat
    }
}

/// Build the video time plan from paced segments.
///
/// Records each speech segment's `pts_factor` on the segment itself.
///
/// When a speech region's factor must be clamped below the value implied
/// by its adjusted duration, the visual segment plays faster than its
/// paired audio and a bounded residual A/V offset remains for that
/// segment. That is deliberate: the audio track is sample-accurate and
/// is never distorted past the configured bounds to chase the video.
pub fn build_time_plan(
    segments: &mut [Segment],
    source_video_duration: f64,
    cfg: &TimelineSettings,
    post: &PostProcessing,
) -> Result<VideoTimePlan, PlanError> {
    // First pass: per-segment pts factors.
    for seg in segments.iter_mut() {
        let adjusted = seg
            .adjusted_duration()
            .ok_or(PlanError::MissingAdjustedTiming(seg.id))?;
        let source = seg.source_duration();
        if source <= 0.0 {
            return Err(PlanError::EmptySourceDuration(seg.id));
        }
        seg.pts_factor = Some((adjusted / source).clamp(MIN_SPEECH_PTS, cfg.max_pts_factor));
    }

    // Fast path: nothing moved and nothing needs burning in, so the
    // muxer can stream-copy. This is the dominant real-world case when
    // translations land close to source timing.
    let unchanged = segments.iter().all(|seg| {
        let adjusted = seg.adjusted_duration().unwrap_or(0.0);
        (adjusted - seg.source_duration()).abs() <= PTS_EPSILON
    });
    if unchanged && !post.any() {
        tracing::info!("All segments within tolerance, requesting stream copy");
        return Ok(VideoTimePlan::Copy);
    }

    let mut regions = Vec::new();
    let mut last_original_end = 0.0_f64;
    let mut last_adjusted_end = 0.0_f64;

    for seg in segments.iter() {
        let adjusted_start = seg.adjusted_start.unwrap_or(0.0);
        let adjusted_end = seg.adjusted_end.unwrap_or(0.0);

        // Gap region: absorbs exactly the silence the pacer inserted
        // before this segment.
        let gap_original = seg.original_start - last_original_end;
        if gap_original > MIN_GAP_REGION_SECS {
            let gap_adjusted = adjusted_start - last_adjusted_end;
            let factor = (gap_adjusted / gap_original).clamp(MIN_GAP_PTS, cfg.max_pts_factor);
            regions.push(Region::new(
                last_original_end,
                seg.original_start,
                factor,
                RegionKind::Gap,
            ));
        }

        let factor = seg.pts_factor.unwrap_or(1.0);
        regions.push(Region::new(
            seg.original_start,
            seg.original_end,
            factor,
            RegionKind::Speech,
        ));

        last_original_end = seg.original_end;
        last_adjusted_end = adjusted_end;
    }

    // Tail after the last utterance plays untouched.
    if source_video_duration > last_original_end {
        regions.push(Region::new(
            last_original_end,
            source_video_duration,
            1.0,
            RegionKind::Tail,
        ));
    }

    tracing::info!(
        "Built time plan with {} regions ({} speech)",
        regions.len(),
        regions.iter().filter(|r| r.kind == RegionKind::Speech).count()
    );

    Ok(VideoTimePlan::Remap { regions })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> TimelineSettings {
        TimelineSettings {
            min_gap: 0.0,
            max_pts_factor: 1.43,
            min_speed_factor: 0.5,
            max_speed_factor: 1.35,
            ideal_ratio_threshold: 0.5,
        }
    }

    fn paced_segment(id: u32, orig: (f64, f64), adjusted: (f64, f64)) -> Segment {
        let mut seg = Segment::new(id, orig.0, orig.1);
        seg.adjusted_start = Some(adjusted.0);
        seg.adjusted_end = Some(adjusted.1);
        seg
    }

    #[test]
    fn fast_path_returns_copy() {
        let mut segments = vec![
            paced_segment(0, (0.0, 2.0), (0.0, 2.0)),
            paced_segment(1, (3.0, 5.0), (3.0, 5.0005)),
        ];
        let plan =
            build_time_plan(&mut segments, 10.0, &cfg(), &PostProcessing::default()).unwrap();
        assert!(plan.is_copy());
    }

    #[test]
    fn post_processing_disables_fast_path() {
        let mut segments = vec![paced_segment(0, (0.0, 2.0), (0.0, 2.0))];
        let post = PostProcessing {
            burn_subtitles: true,
            ..Default::default()
        };
        let plan = build_time_plan(&mut segments, 10.0, &cfg(), &post).unwrap();
        assert!(!plan.is_copy());
    }

    #[test]
    fn builds_gap_speech_tail_regions() {
        let mut segments = vec![
            paced_segment(0, (1.0, 3.0), (1.0, 3.5)),
            paced_segment(1, (5.0, 7.0), (5.5, 8.0)),
        ];
        let plan =
            build_time_plan(&mut segments, 10.0, &cfg(), &PostProcessing::default()).unwrap();

        let regions = plan.regions();
        let kinds: Vec<RegionKind> = regions.iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RegionKind::Gap,
                RegionKind::Speech,
                RegionKind::Gap,
                RegionKind::Speech,
                RegionKind::Tail,
            ]
        );

        // Leading gap [0, 1) absorbs the 1s of leading silence.
        assert!((regions[0].pts_factor - 1.0).abs() < 1e-9);
        // First speech region: 2.5s of audio over 2s of video.
        assert!((regions[1].pts_factor - 1.25).abs() < 1e-9);
        // Mid gap [3, 5): audio gap is 5.5 - 3.5 = 2s over 2s of video.
        assert!((regions[2].pts_factor - 1.0).abs() < 1e-9);
        // Tail plays untouched.
        assert!((regions[4].pts_factor - 1.0).abs() < 1e-9);
        assert!((regions[4].source_end - 10.0).abs() < 1e-9);
    }

    #[test]
    fn speech_pts_factor_is_clamped_to_ceiling() {
        // 4s of audio over 2s of video implies 2.0, above the 1.43 cap.
        let mut segments = vec![paced_segment(0, (0.0, 2.0), (0.0, 4.0))];
        let plan =
            build_time_plan(&mut segments, 2.0, &cfg(), &PostProcessing::default()).unwrap();

        let speech = &plan.regions()[0];
        assert_eq!(speech.kind, RegionKind::Speech);
        assert!((speech.pts_factor - 1.43).abs() < 1e-9);
        assert_eq!(segments[0].pts_factor, Some(1.43));
        // The audio keeps its 4s; the bounded residual offset is policy.
        assert!((segments[0].adjusted_duration().unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn bounded_stretch_for_all_speech_regions() {
        let mut segments = vec![
            paced_segment(0, (0.0, 1.0), (0.0, 3.0)),
            paced_segment(1, (1.0, 2.0), (3.0, 3.1)),
        ];
        let c = cfg();
        let plan = build_time_plan(&mut segments, 2.0, &c, &PostProcessing::default()).unwrap();
        for region in plan.regions() {
            if region.kind == RegionKind::Speech {
                assert!(region.pts_factor >= MIN_SPEECH_PTS);
                assert!(region.pts_factor <= c.max_pts_factor + 1e-12);
            }
        }
    }

    #[test]
    fn unpaced_segment_is_an_error() {
        let mut segments = vec![Segment::new(0, 0.0, 2.0)];
        let result = build_time_plan(&mut segments, 10.0, &cfg(), &PostProcessing::default());
        assert!(matches!(result, Err(PlanError::MissingAdjustedTiming(0))));
    }

    #[test]
    fn no_tail_when_last_segment_reaches_video_end() {
        let mut segments = vec![paced_segment(0, (0.0, 10.0), (0.0, 12.0))];
        let plan =
            build_time_plan(&mut segments, 10.0, &cfg(), &PostProcessing::default()).unwrap();
        assert!(plan
            .regions()
            .iter()
            .all(|r| r.kind != RegionKind::Tail));
    }

    #[test]
    fn plan_duration_matches_adjusted_audio() {
        // With no clamping, the plan's output duration equals the end of
        // the paced audio (plus the untouched tail).
        let mut segments = vec![
            paced_segment(0, (0.0, 2.0), (0.0, 2.5)),
            paced_segment(1, (2.0, 4.0), (2.5, 4.8)),
        ];
        let plan =
            build_time_plan(&mut segments, 6.0, &cfg(), &PostProcessing::default()).unwrap();

        let audio_end = segments[1].adjusted_end.unwrap();
        let tail = 6.0 - 4.0;
        assert!((plan.output_duration(6.0) - (audio_end + tail)).abs() < 1e-9);
    }

    #[test]
    fn from_video_settings_detects_flags() {
        let mut video = VideoSettings::default();
        assert!(!PostProcessing::from_video_settings(&video).any());

        video.watermark_path = "logo.png".to_string();
        assert!(PostProcessing::from_video_settings(&video).any());

        video.watermark_path = String::new();
        video.speed_override = 1.25;
        assert!(PostProcessing::from_video_settings(&video).any());
    }
}
