//! Cue Scripts
//!
//! A script is a JSON list of timed cues, each one animator call:
//!
//! ```json
//! {
//!   "cues": [
//!     { "at_ms": 0,    "action": "room_entry", "room": "boss" },
//!     { "at_ms": 3500, "action": "battle_result", "correct": true, "room": "boss" },
//!     { "at_ms": 9000, "action": "completion", "correct": true, "room": "elite", "has_loot": true },
//!     { "at_ms": 18000, "action": "play", "state": "explaining",
//!       "audio": { "duration": 1500, "phonemes": [{ "shape": "open", "timing": 0 }] } },
//!     { "at_ms": 20000, "action": "finish" }
//!   ]
//! }
//! ```

use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use zap_core::{
    AudioData, MessageType, MouthShape, Phoneme, PlayOptions, SequenceStep, ZapAnimator,
};

/// One step inside a `sequence` cue
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StepCue {
    pub state: String,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl StepCue {
    fn into_step(self) -> SequenceStep {
        let mut options = PlayOptions::new().with_message_type(self.message_type);
        options.message = self.message;
        options.duration_ms = self.duration_ms;
        SequenceStep::new(self.state)
            .with_options(options)
            .with_delay_ms(self.delay_ms)
    }
}

/// Animator call made by a cue
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Play {
        state: String,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        message_type: MessageType,
        #[serde(default)]
        duration_ms: Option<u64>,
        #[serde(default)]
        audio: Option<AudioData>,
    },
    RoomEntry {
        room: String,
    },
    BattleResult {
        correct: bool,
        #[serde(default = "default_room")]
        room: String,
    },
    Completion {
        correct: bool,
        #[serde(default = "default_room")]
        room: String,
        #[serde(default)]
        has_loot: bool,
    },
    Sequence {
        steps: Vec<StepCue>,
    },
    Finish,
    CancelLipSync,
}

fn default_room() -> String {
    "battle".to_string()
}

impl Action {
    /// Perform the call on `animator`
    pub fn apply(self, animator: &mut ZapAnimator) {
        match self {
            Self::Play {
                state,
                message,
                message_type,
                duration_ms,
                audio,
            } => {
                let mut options = PlayOptions::new().with_message_type(message_type);
                options.message = message;
                options.duration_ms = duration_ms;
                options.audio = audio;
                animator.play(&state, options);
            }
            Self::RoomEntry { room } => {
                animator.play_room_entry(&room);
            }
            Self::BattleResult { correct, room } => {
                animator.play_battle_result(correct, &room);
            }
            Self::Completion {
                correct,
                room,
                has_loot,
            } => animator.play_completion(correct, &room, has_loot),
            Self::Sequence { steps } => {
                animator.play_sequence(steps.into_iter().map(StepCue::into_step));
            }
            Self::Finish => {
                animator.finish_current();
            }
            Self::CancelLipSync => {
                animator.cancel_lip_sync();
            }
        }
    }
}

/// A cue: an action at a point in script time
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Cue {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

/// Ordered list of cues
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Script {
    pub cues: Vec<Cue>,
}

impl Script {
    /// Parse a script from JSON, ordering cues by time
    pub fn from_json(json: &str) -> Result<Self> {
        let mut script: Script = serde_json::from_str(json).context("Invalid cue script")?;
        script.cues.sort_by_key(|c| c.at_ms);
        Ok(script)
    }

    /// Read a script file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cue script: {}", path.display()))?;
        let script = Self::from_json(&json)?;
        info!(path = %path.display(), cues = script.cues.len(), "Loaded cue script");
        Ok(script)
    }

    /// Time of the last cue
    #[must_use]
    pub fn end_ms(&self) -> u64 {
        self.cues.last().map_or(0, |c| c.at_ms)
    }

    /// Built-in tour through the main states
    #[must_use]
    pub fn demo() -> Self {
        let explanation = AudioData::new(
            1500,
            vec![
                Phoneme::new(MouthShape::Open, 0),
                Phoneme::new(MouthShape::Wide, 250),
                Phoneme::new(MouthShape::Small, 600),
                Phoneme::new(MouthShape::Open, 900),
                Phoneme::new(MouthShape::Wide, 1200),
            ],
        );

        let cues = vec![
            Cue {
                at_ms: 0,
                action: Action::RoomEntry {
                    room: "boss".to_string(),
                },
            },
            Cue {
                at_ms: 3500,
                action: Action::BattleResult {
                    correct: true,
                    room: "boss".to_string(),
                },
            },
            Cue {
                at_ms: 9000,
                action: Action::Completion {
                    correct: true,
                    room: "elite".to_string(),
                    has_loot: true,
                },
            },
            Cue {
                at_ms: 18000,
                action: Action::Play {
                    state: "explaining".to_string(),
                    message: Some("Let me explain S3 storage classes...".to_string()),
                    message_type: MessageType::Info,
                    duration_ms: None,
                    audio: Some(explanation),
                },
            },
            Cue {
                at_ms: 20000,
                action: Action::Finish,
            },
            Cue {
                at_ms: 20500,
                action: Action::Play {
                    state: "hint".to_string(),
                    message: None,
                    message_type: MessageType::Info,
                    duration_ms: None,
                    audio: None,
                },
            },
        ];
        Self { cues }
    }
}

/// Feeds cues to an animator as script time passes
#[derive(Debug)]
pub struct ScriptCursor {
    pending: VecDeque<Cue>,
}

impl ScriptCursor {
    pub fn new(script: Script) -> Self {
        Self {
            pending: script.cues.into(),
        }
    }

    /// Fire every cue due by `now_ms`, then advance the animator to `now_ms`
    ///
    /// The animator is moved to each cue's own time before the cue runs, so
    /// a coarse frame interval does not shift cue timing.
    pub fn drive(&mut self, animator: &mut ZapAnimator, now_ms: u64) -> usize {
        let mut fired = 0;
        while self.pending.front().is_some_and(|c| c.at_ms <= now_ms) {
            let Some(cue) = self.pending.pop_front() else {
                break;
            };
            animator.advance_to_ms(cue.at_ms);
            cue.action.apply(animator);
            fired += 1;
        }
        animator.advance_to_ms(now_ms);
        fired
    }

    /// Whether every cue has fired
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use zap_core::MemorySurface;

    use super::*;

    fn animator() -> (ZapAnimator, MemorySurface) {
        let surface = MemorySurface::new();
        let animator = ZapAnimator::builder().surface(&surface).seed(9).build();
        (animator, surface)
    }

    #[test]
    fn test_parse_and_sort() {
        let script = Script::from_json(
            r#"{"cues": [
                {"at_ms": 500, "action": "finish"},
                {"at_ms": 0, "action": "room_entry", "room": "shop"},
                {"at_ms": 100, "action": "battle_result", "correct": false}
            ]}"#,
        )
        .unwrap();

        assert_eq!(
            script.cues,
            vec![
                Cue {
                    at_ms: 0,
                    action: Action::RoomEntry {
                        room: "shop".to_string()
                    }
                },
                Cue {
                    at_ms: 100,
                    action: Action::BattleResult {
                        correct: false,
                        room: "battle".to_string()
                    }
                },
                Cue {
                    at_ms: 500,
                    action: Action::Finish
                },
            ]
        );
        assert_eq!(script.end_ms(), 500);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        assert!(Script::from_json(r#"{"cues": [{"at_ms": 0, "action": "dance"}]}"#).is_err());
    }

    #[test]
    fn test_sequence_cue() {
        let script = Script::from_json(
            r#"{"cues": [{"at_ms": 0, "action": "sequence", "steps": [
                {"state": "hint", "duration_ms": 100, "delay_ms": 50},
                {"state": "curious", "message": "Hmm?", "message_type": "info"}
            ]}]}"#,
        )
        .unwrap();

        let (mut animator, surface) = animator();
        let mut cursor = ScriptCursor::new(script);
        cursor.drive(&mut animator, 0);
        assert_eq!(animator.current_state(), "hint");

        cursor.drive(&mut animator, 150);
        assert_eq!(animator.current_state(), "curious");
        assert_eq!(
            surface.last_message(),
            Some(("Hmm?".to_string(), MessageType::Info))
        );
    }

    #[test]
    fn test_cursor_fires_cues_at_their_own_time() {
        let script = Script::from_json(
            r#"{"cues": [
                {"at_ms": 0, "action": "play", "state": "hint", "duration_ms": 1000},
                {"at_ms": 1200, "action": "play", "state": "curious"}
            ]}"#,
        )
        .unwrap();

        let (mut animator, _surface) = animator();
        let mut cursor = ScriptCursor::new(script);
        assert_eq!(cursor.drive(&mut animator, 0), 1);

        // One coarse frame covering both the auto-return and the next cue
        assert_eq!(cursor.drive(&mut animator, 1500), 1);
        assert_eq!(animator.current_state(), "curious");
        assert!(cursor.is_done());
        assert_eq!(animator.now_ms(), 1500);

        // curious (2000ms) started at 1200, not 1500
        cursor.drive(&mut animator, 3200);
        assert_eq!(animator.current_state(), "idle");
    }

    #[test]
    fn test_demo_runs_to_idle() {
        let (mut animator, surface) = animator();
        let script = Script::demo();
        let end = script.end_ms();
        let mut cursor = ScriptCursor::new(script);

        let mut now = 0;
        while now <= end + 5000 {
            cursor.drive(&mut animator, now);
            now += 100;
        }

        assert!(cursor.is_done());
        assert_eq!(animator.current_state(), "idle");
        assert!(!animator.lip_sync_active());
        assert!(surface.has_class("mouth-closed"));
        let feedback = surface.snapshot().feedback;
        assert!(feedback.contains(&"boss_victory".to_string()));
        assert!(feedback.contains(&"loot_found".to_string()));
    }
}
