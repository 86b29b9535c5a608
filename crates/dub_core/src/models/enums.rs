//! Core enums used throughout the engine.

use serde::{Deserialize, Serialize};

/// Classification of a region in the video time plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    /// Stretch of source video between utterances.
    Gap,
    /// Source video paired with a dubbed utterance.
    Speech,
    /// Source video after the last utterance, played untouched.
    Tail,
}

impl std::fmt::Display for RegionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionKind::Gap => write!(f, "gap"),
            RegionKind::Speech => write!(f, "speech"),
            RegionKind::Tail => write!(f, "tail"),
        }
    }
}
