//! Per-play overrides

use std::fmt;

use crate::collaborators::MessageType;
use crate::lipsync::AudioData;

/// Completion callback, run after the state returns to idle
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Optional overrides for a single `play` call
#[derive(Default)]
pub struct PlayOptions {
    /// Message to show instead of a random pick from the pool
    pub message: Option<String>,

    /// Styling for the speech bubble
    pub message_type: MessageType,

    /// Duration instead of the state's default (0 = until replaced)
    pub duration_ms: Option<u64>,

    /// Lip-sync timing (only used by the explaining state)
    pub audio: Option<AudioData>,

    /// Run once the state has returned to idle
    pub callback: Option<Callback>,
}

impl PlayOptions {
    /// No overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Show this message instead of a random one
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Style the speech bubble
    #[must_use]
    pub fn with_message_type(mut self, kind: MessageType) -> Self {
        self.message_type = kind;
        self
    }

    /// Override the duration
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Attach lip-sync data
    #[must_use]
    pub fn with_audio(mut self, audio: AudioData) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Run `callback` when the state completes
    #[must_use]
    pub fn with_callback(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Override message, ignoring empty strings
    pub(crate) fn message_override(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.is_empty())
    }
}

impl fmt::Debug for PlayOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayOptions")
            .field("message", &self.message)
            .field("message_type", &self.message_type)
            .field("duration_ms", &self.duration_ms)
            .field("audio", &self.audio)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
