//! Haptic Feedback
//!
//! Vibration patterns for the states that deserve a physical nudge. Patterns
//! alternate vibrate / pause durations in milliseconds, the same shape the
//! browser vibration API takes.

use crate::collaborators::Feedback;

/// Vibration pattern for a state, if it has one
#[must_use]
pub fn haptic_pattern(state: &str) -> Option<&'static [u32]> {
    match state {
        "victory" => Some(&[100]),
        "elite_victory" => Some(&[100, 50, 100]),
        "boss_victory" => Some(&[200, 100, 200, 100, 200]),
        "defeat" => Some(&[50]),
        "level_up" => Some(&[100, 50, 100, 50, 100]),
        "loot_found" => Some(&[150]),
        _ => None,
    }
}

/// [`Feedback`] that forwards patterns to a vibration sink
pub struct HapticFeedback<F> {
    vibrate: F,
}

impl<F> HapticFeedback<F>
where
    F: FnMut(&[u32]) + Send,
{
    /// Wrap a sink that drives the device motor
    pub fn new(vibrate: F) -> Self {
        Self { vibrate }
    }
}

impl<F> Feedback for HapticFeedback<F>
where
    F: FnMut(&[u32]) + Send,
{
    fn trigger(&mut self, state: &str) {
        if let Some(pattern) = haptic_pattern(state) {
            tracing::trace!(state, ?pattern, "Haptic pattern");
            (self.vibrate)(pattern);
        }
    }
}
