//! Animation Sequences
//!
//! A sequence is an ordered list of steps played back to back. Each step
//! runs to completion (auto-return or `finish_current`), fires its own
//! callback, waits `delay_ms`, and only then starts the next step.
//!
//! The animator keeps the remaining steps in a [`SequenceQueue`] and advances
//! it from its timer loop; there is no recursion between steps.

use std::collections::VecDeque;

use crate::collaborators::MessageType;
use crate::context::battle_result_state;
use crate::options::PlayOptions;

/// Default pause after a result step
pub const RESULT_STEP_DELAY_MS: u64 = 500;

/// Default pause after a loot step
pub const LOOT_STEP_DELAY_MS: u64 = 1000;

/// One state in a sequence
#[derive(Debug)]
pub struct SequenceStep {
    /// State to play
    pub state: String,
    /// Overrides for this step
    pub options: PlayOptions,
    /// Pause after this step completes, before the next begins
    pub delay_ms: u64,
}

impl SequenceStep {
    /// Step with default options and no delay
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            options: PlayOptions::default(),
            delay_ms: 0,
        }
    }

    /// Set the step's options
    #[must_use]
    pub fn with_options(mut self, options: PlayOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the pause after completion
    #[must_use]
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// Remaining steps of a running sequence
#[derive(Debug, Default)]
pub struct SequenceQueue {
    steps: VecDeque<SequenceStep>,
    played: usize,
}

impl SequenceQueue {
    /// Queue up `steps` in order
    pub fn new(steps: impl IntoIterator<Item = SequenceStep>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            played: 0,
        }
    }

    /// Take the next step
    pub fn next_step(&mut self) -> Option<SequenceStep> {
        let step = self.steps.pop_front()?;
        self.played += 1;
        Some(step)
    }

    /// Steps not yet started
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }

    /// Steps started so far
    #[must_use]
    pub fn played(&self) -> usize {
        self.played
    }

    /// Whether every step has been started
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.steps.is_empty()
    }
}

/// The standard lesson-completion sequence
///
/// Correct answers play the room's victory state, followed by `loot_found`
/// when the room dropped loot. Wrong answers play `defeat`.
#[must_use]
pub fn completion_sequence(correct: bool, room: &str, has_loot: bool) -> Vec<SequenceStep> {
    let result =
        SequenceStep::new(battle_result_state(correct, room)).with_delay_ms(RESULT_STEP_DELAY_MS);

    if !correct {
        return vec![result.with_options(PlayOptions::new().with_message_type(MessageType::Error))];
    }

    let mut steps =
        vec![result.with_options(PlayOptions::new().with_message_type(MessageType::Success))];
    if has_loot {
        steps.push(
            SequenceStep::new("loot_found")
                .with_options(PlayOptions::new().with_message_type(MessageType::Info))
                .with_delay_ms(LOOT_STEP_DELAY_MS),
        );
    }
    steps
}
