//! Segment and segment store types.
//!
//! A `Segment` is one timed utterance. The store keeps segments strictly
//! ordered by id and persists them to a timeline JSON file after each
//! pipeline stage so a crashed run can resume without recomputing
//! completed stages.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from segment store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read timeline file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse timeline file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Timeline file not found: {0}")]
    NotFound(PathBuf),

    #[error("Segments out of order: id {0} follows id {1}")]
    OutOfOrder(u32, u32),
}

/// One utterance as delivered by the speech-recognition collaborator.
///
/// The translation collaborator later fills in `translation` for the
/// segment with the same position in the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizedUtterance {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default = "default_speaker")]
    pub speaker: String,
}

fn default_speaker() -> String {
    "SPEAKER_00".to_string()
}

/// One timed utterance with source and (eventually) adjusted timing.
///
/// `original_start` / `original_end` are immutable once first recorded;
/// all drift is measured against them. The `adjusted_*` fields are
/// written by the audio pacer and `pts_factor` by the video re-timer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Stable ordinal; defines playback order. Never re-sorted.
    pub id: u32,
    /// Start time in the source video (seconds).
    pub original_start: f64,
    /// End time in the source video (seconds).
    pub original_end: f64,
    /// Source-language text (opaque to the engine).
    #[serde(default)]
    pub text: String,
    /// Target-language text (opaque to the engine).
    #[serde(default)]
    pub translation: String,
    /// Speaker label (opaque to the engine).
    #[serde(default = "default_speaker")]
    pub speaker: String,
    /// Duration of the synthesized clip before stretching.
    /// Zero when synthesis failed (treated as silence).
    #[serde(default)]
    pub raw_clip_duration: f64,
    /// Placement in the output audio track (seconds), set by the pacer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_start: Option<f64>,
    /// End of placement in the output audio track (seconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_end: Option<f64>,
    /// Playback-speed ratio for the paired video region, set by the re-timer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pts_factor: Option<f64>,
}

impl Segment {
    /// Create a segment from recognized timing.
    pub fn new(id: u32, original_start: f64, original_end: f64) -> Self {
        Self {
            id,
            original_start,
            original_end,
            text: String::new(),
            translation: String::new(),
            speaker: default_speaker(),
            raw_clip_duration: 0.0,
            adjusted_start: None,
            adjusted_end: None,
            pts_factor: None,
        }
    }

    /// Duration of the utterance in the source video.
    pub fn source_duration(&self) -> f64 {
        self.original_end - self.original_start
    }

    /// Duration of the placed utterance in the output track, if paced.
    pub fn adjusted_duration(&self) -> Option<f64> {
        match (self.adjusted_start, self.adjusted_end) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Whether the pacer has placed this segment.
    pub fn is_paced(&self) -> bool {
        self.adjusted_start.is_some() && self.adjusted_end.is_some()
    }
}

/// Ordered table of segments with JSON persistence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentStore {
    segments: Vec<Segment>,
}

impl SegmentStore {
    /// Create a store from already-ordered segments.
    ///
    /// Returns an error if ids are not strictly increasing.
    pub fn new(segments: Vec<Segment>) -> Result<Self, StoreError> {
        for pair in segments.windows(2) {
            if pair[1].id <= pair[0].id {
                return Err(StoreError::OutOfOrder(pair[1].id, pair[0].id));
            }
        }
        Ok(Self { segments })
    }

    /// Build a store from recognition output, assigning sequential ids.
    pub fn from_recognition(utterances: &[RecognizedUtterance]) -> Self {
        let segments = utterances
            .iter()
            .enumerate()
            .map(|(i, u)| {
                let mut seg = Segment::new(i as u32, u.start, u.end);
                seg.text = u.text.clone();
                seg.speaker = u.speaker.clone();
                seg
            })
            .collect();
        Self { segments }
    }

    /// Apply translations by position, preserving segment identity.
    pub fn apply_translations(&mut self, translations: &[String]) {
        for (seg, translation) in self.segments.iter_mut().zip(translations) {
            seg.translation = translation.clone();
        }
    }

    /// Load a store from a timeline JSON file.
    ///
    /// Accepts either the wrapped store form or a bare segment array
    /// (the form the recognition/translation collaborators write).
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        if let Ok(store) = serde_json::from_str::<SegmentStore>(&content) {
            return Ok(store);
        }
        let segments: Vec<Segment> = serde_json::from_str(&content)?;
        Self::new(segments)
    }

    /// Persist the store atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.segments)?;
        let temp_path = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the store holds no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Read-only view of the segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Mutable view of the segments (order must be preserved by callers).
    pub fn segments_mut(&mut self) -> &mut [Segment] {
        &mut self.segments
    }

    /// Whether every segment carries adjusted timing.
    pub fn all_paced(&self) -> bool {
        self.segments.iter().all(Segment::is_paced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn utterances() -> Vec<RecognizedUtterance> {
        vec![
            RecognizedUtterance {
                start: 0.0,
                end: 2.0,
                text: "hello".to_string(),
                speaker: "SPEAKER_00".to_string(),
            },
            RecognizedUtterance {
                start: 2.5,
                end: 4.0,
                text: "world".to_string(),
                speaker: "SPEAKER_01".to_string(),
            },
        ]
    }

    #[test]
    fn from_recognition_assigns_sequential_ids() {
        let store = SegmentStore::from_recognition(&utterances());
        let ids: Vec<u32> = store.segments().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn rejects_out_of_order_ids() {
        let segments = vec![Segment::new(1, 0.0, 1.0), Segment::new(0, 1.0, 2.0)];
        assert!(matches!(
            SegmentStore::new(segments),
            Err(StoreError::OutOfOrder(0, 1))
        ));
    }

    #[test]
    fn apply_translations_preserves_identity() {
        let mut store = SegmentStore::from_recognition(&utterances());
        store.apply_translations(&["xin chào".to_string(), "thế giới".to_string()]);
        assert_eq!(store.segments()[0].translation, "xin chào");
        assert_eq!(store.segments()[0].text, "hello");
        assert_eq!(store.segments()[1].id, 1);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timeline.json");

        let mut store = SegmentStore::from_recognition(&utterances());
        store.segments_mut()[0].adjusted_start = Some(0.0);
        store.segments_mut()[0].adjusted_end = Some(2.2);
        store.save(&path).unwrap();

        let loaded = SegmentStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.segments()[0].adjusted_end, Some(2.2));
        assert!(!loaded.all_paced());
    }

    #[test]
    fn load_accepts_bare_segment_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timeline.json");
        fs::write(
            &path,
            r#"[{"id":0,"original_start":0.0,"original_end":1.5,"text":"a"}]"#,
        )
        .unwrap();

        let store = SegmentStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert!((store.segments()[0].source_duration() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn load_missing_file_errors() {
        let result = SegmentStore::load(Path::new("/nonexistent/timeline.json"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn atomic_save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timeline.json");
        let store = SegmentStore::from_recognition(&utterances());
        store.save(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
    }
}
