//! Lip-Sync Data
//!
//! Audio timing data handed to the `explaining` state: a total duration and
//! a list of mouth shapes with their offsets into the clip. The animator
//! turns each phoneme into a timed mouth-shape update and closes the mouth
//! when the clip ends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mouth poses the mascot sprite supports
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouthShape {
    /// Resting, lips together
    Closed,
    /// Normal open vowel
    Open,
    /// Wide open ("ah")
    Wide,
    /// Small rounded ("oo")
    Small,
}

impl MouthShape {
    /// All shapes, in class-clearing order
    pub const ALL: [MouthShape; 4] = [Self::Closed, Self::Open, Self::Wide, Self::Small];

    /// Visual class applied for this shape
    #[must_use]
    pub const fn visual_class(self) -> &'static str {
        match self {
            Self::Closed => "mouth-closed",
            Self::Open => "mouth-open",
            Self::Wide => "mouth-wide",
            Self::Small => "mouth-small",
        }
    }
}

impl fmt::Display for MouthShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::Wide => "wide",
            Self::Small => "small",
        };
        f.write_str(name)
    }
}

impl FromStr for MouthShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "closed" => Ok(Self::Closed),
            "open" => Ok(Self::Open),
            "wide" => Ok(Self::Wide),
            "small" => Ok(Self::Small),
            other => Err(format!("unknown mouth shape '{other}'")),
        }
    }
}

/// One timed mouth-shape change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phoneme {
    /// Shape to show
    pub shape: MouthShape,
    /// Offset from the start of the clip
    #[serde(alias = "timing")]
    pub offset_ms: u64,
}

impl Phoneme {
    /// Create a phoneme event
    #[must_use]
    pub const fn new(shape: MouthShape, offset_ms: u64) -> Self {
        Self { shape, offset_ms }
    }
}

/// Timing data for one spoken clip
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioData {
    /// Total clip length; the mouth closes when it elapses
    #[serde(alias = "duration")]
    pub duration_ms: u64,
    /// Mouth-shape events
    #[serde(default)]
    pub phonemes: Vec<Phoneme>,
}

impl AudioData {
    /// Create timing data for a clip
    #[must_use]
    pub fn new(duration_ms: u64, phonemes: Vec<Phoneme>) -> Self {
        Self {
            duration_ms,
            phonemes,
        }
    }

    /// Parse timing data produced by the audio pipeline
    ///
    /// Accepts both `duration_ms`/`offset_ms` and the shorter
    /// `duration`/`timing` field names.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the payload is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
