//! Collaborator Traits
//!
//! The animator decides WHAT Zap is doing; collaborators decide how that
//! shows up on a surface. A browser host applies CSS classes and vibrates the
//! device, a terminal host prints log lines, tests record calls in memory.
//!
//! Every collaborator is optional. When one is missing the corresponding call
//! is skipped and the transition proceeds.

mod memory;

pub use memory::{MemorySurface, SurfaceSnapshot};

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Applies and removes visual classes on the mascot element
pub trait Renderer: Send {
    /// Add a class to the render target
    fn apply_visual_class(&mut self, class: &str);

    /// Remove a class from the render target
    fn clear_visual_class(&mut self, class: &str);

    /// Remove every class this renderer has applied
    fn clear_all(&mut self);
}

/// Shows transient speech-bubble messages
pub trait Messenger: Send {
    /// Display `text`, styled according to `kind`
    ///
    /// Hiding the bubble again is the messenger's own business; see
    /// [`reading_time`] for the usual timing.
    fn show(&mut self, text: &str, kind: MessageType);
}

/// Best-effort haptic / audio cue keyed by state name
pub trait Feedback: Send {
    /// Fire the cue for `state`; states without a cue are ignored
    fn trigger(&mut self, state: &str);
}

/// Semantic styling for a speech-bubble message
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Plain bubble
    #[default]
    Default,
    /// Positive outcome
    Success,
    /// Negative outcome
    Error,
    /// Neutral information
    Info,
}

impl MessageType {
    /// Speech-bubble class for this type, if any
    #[must_use]
    pub const fn bubble_class(self) -> Option<&'static str> {
        match self {
            Self::Default => None,
            Self::Success => Some("speech-success"),
            Self::Error => Some("speech-error"),
            Self::Info => Some("speech-info"),
        }
    }

    /// All bubble classes a messenger may need to clear
    #[must_use]
    pub const fn all_bubble_classes() -> [&'static str; 3] {
        ["speech-success", "speech-error", "speech-info"]
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        };
        f.write_str(name)
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" | "" => Ok(Self::Default),
            "success" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            "info" => Ok(Self::Info),
            other => Err(format!("unknown message type '{other}'")),
        }
    }
}

/// Minimum time a speech bubble stays visible
pub const MIN_READING_TIME_MS: u64 = 2000;

/// Reading time granted per character
pub const READING_TIME_PER_CHAR_MS: u64 = 50;

/// How long a message should stay on screen before auto-hiding
#[must_use]
pub fn reading_time(text: &str) -> Duration {
    let chars = text.chars().count() as u64;
    Duration::from_millis(MIN_READING_TIME_MS.max(chars * READING_TIME_PER_CHAR_MS))
}
