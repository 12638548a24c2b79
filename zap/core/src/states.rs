//! State Table
//!
//! The catalog of named presentation states Zap can be in. Each state maps to
//! a visual class applied by the renderer, a default duration, a pool of
//! candidate speech-bubble messages, and (for idle) a pool of cosmetic
//! variations.
//!
//! The table is built once when the animator is constructed and never
//! mutated afterwards.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the resting state every transition eventually returns to
pub const IDLE: &str = "idle";

/// Name of the state that accepts lip-sync audio data
pub const EXPLAINING: &str = "explaining";

/// Visual class of the idle state in the default table
pub const IDLE_CLASS: &str = "zap-idle";

/// Errors raised while assembling a state table
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateTableError {
    /// The table has no `idle` entry to return to
    #[error("state table must define an 'idle' state")]
    MissingIdle,

    /// A state has an empty visual class
    #[error("state '{0}' has an empty visual class")]
    EmptyVisualClass(String),

    /// A state has an empty name
    #[error("state names must not be empty")]
    EmptyName,
}

/// Immutable description of one presentation state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDefinition {
    /// Unique state name (e.g. "victory")
    pub name: String,

    /// Class the renderer applies while this state is active
    pub visual_class: String,

    /// How long the state lasts before returning to idle (0 = until replaced)
    pub default_duration_ms: u64,

    /// Candidate messages, one picked uniformly at random per play
    pub messages: Vec<String>,

    /// Cosmetic variations (only consulted for idle)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variations: Vec<String>,
}

impl StateDefinition {
    /// Create a state with no messages or variations
    pub fn new(name: impl Into<String>, visual_class: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            visual_class: visual_class.into(),
            default_duration_ms: duration_ms,
            messages: Vec::new(),
            variations: Vec::new(),
        }
    }

    /// Set the message pool
    #[must_use]
    pub fn with_messages<I, S>(mut self, messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.messages = messages.into_iter().map(Into::into).collect();
        self
    }

    /// Set the variation pool
    #[must_use]
    pub fn with_variations<I, S>(mut self, variations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variations = variations.into_iter().map(Into::into).collect();
        self
    }
}

/// Read-only lookup table of every known state
#[derive(Clone, Debug)]
pub struct StateTable {
    states: HashMap<String, StateDefinition>,
}

impl StateTable {
    /// Build a table from explicit definitions
    ///
    /// Later definitions with the same name replace earlier ones.
    ///
    /// # Errors
    ///
    /// Fails if there is no idle state or a definition is malformed.
    pub fn new<I>(definitions: I) -> Result<Self, StateTableError>
    where
        I: IntoIterator<Item = StateDefinition>,
    {
        let mut states = HashMap::new();
        for def in definitions {
            if def.name.trim().is_empty() {
                return Err(StateTableError::EmptyName);
            }
            if def.visual_class.trim().is_empty() {
                return Err(StateTableError::EmptyVisualClass(def.name));
            }
            states.insert(def.name.clone(), def);
        }

        if !states.contains_key(IDLE) {
            return Err(StateTableError::MissingIdle);
        }

        Ok(Self { states })
    }

    /// Look up a state by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StateDefinition> {
        self.states.get(name)
    }

    /// Whether a state with this name exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// The idle state (always present)
    #[must_use]
    pub fn idle(&self) -> &StateDefinition {
        // Presence is checked in `new`
        &self.states[IDLE]
    }

    /// Visual classes of every state
    pub fn visual_classes(&self) -> impl Iterator<Item = &str> {
        self.states.values().map(|s| s.visual_class.as_str())
    }

    /// Number of states
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Whether the table is empty (never true for a validated table)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl Default for StateTable {
    fn default() -> Self {
        Self {
            states: default_definitions()
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect(),
        }
    }
}

/// The built-in Zap catalog
#[must_use]
pub fn default_definitions() -> Vec<StateDefinition> {
    vec![
        StateDefinition::new(IDLE, IDLE_CLASS, 0)
            .with_messages([
                "Ready for your next challenge!",
                "What AWS service shall we explore?",
                "Your knowledge grows stronger!",
                "The cloud awaits your mastery!",
            ])
            .with_variations(["idle-default", "idle-blink", "idle-look-around", "idle-nod"]),
        // Battle states
        StateDefinition::new("battle_ready", "zap-battle-ready", 2000).with_messages([
            "Battle stations! Time to test your knowledge!",
            "Ready to face this challenge!",
            "Let's conquer this together!",
        ]),
        StateDefinition::new("victory", "zap-victory", 3000).with_messages([
            "Excellent! You've mastered that concept!",
            "Victory! Your AWS skills are growing!",
            "Outstanding work! Ready for the next challenge?",
            "Perfect! You're becoming a cloud expert!",
        ]),
        StateDefinition::new("defeat", "zap-defeat", 2500).with_messages([
            "Don't worry! Learning comes from trying!",
            "Almost there! You'll get it next time!",
            "Every expert was once a beginner!",
            "Keep going! You're closer than you think!",
        ]),
        StateDefinition::new("elite_victory", "zap-elite-victory", 4000).with_messages([
            "🏆 Elite defeated! You're truly skilled!",
            "👑 Masterful! That was no easy challenge!",
            "⚡ Incredible! You've proven your expertise!",
        ]),
        StateDefinition::new("boss_encounter", "zap-boss-encounter", 3000).with_messages([
            "🐉 Boss battle! This is the ultimate test!",
            "💀 Face your greatest challenge!",
            "👹 The final trial awaits!",
        ]),
        StateDefinition::new("boss_victory", "zap-boss-victory", 5000).with_messages([
            "🎉 BOSS DEFEATED! You are a true AWS champion!",
            "👑 LEGENDARY! You've conquered the ultimate test!",
            "🚀 MASTER ACHIEVED! Your skills are unmatched!",
        ]),
        // Learning states
        StateDefinition::new(EXPLAINING, "zap-explaining", 0).with_messages([
            "Let me explain this concept...",
            "Here's how this works...",
            "This is an important detail...",
        ]),
        StateDefinition::new("hint", "zap-hint", 3000).with_messages([
            "💡 Here's a helpful hint...",
            "🔍 Think about the documentation...",
            "⚡ Remember the best practices!",
            "🎯 Focus on the key concepts!",
        ]),
        // Progression
        StateDefinition::new("level_up", "zap-level-up", 4000).with_messages([
            "🚀 Level up! New abilities unlocked!",
            "⭐ Zap evolved! Your knowledge expands!",
            "🎊 Congratulations! You've advanced!",
        ]),
        StateDefinition::new("streak_celebration", "zap-streak", 3500).with_messages([
            "🔥 Streak unlocked! You're on fire!",
            "⚡ Amazing streak! Keep it going!",
            "🌟 Stellar streak! Unstoppable!",
        ]),
        StateDefinition::new("loot_found", "zap-loot-found", 3000).with_messages([
            "🎁 Treasure found! Check your inventory!",
            "💎 Rare loot discovered!",
            "🏆 Valuable knowledge acquired!",
        ]),
        // Map rooms
        StateDefinition::new("resting", "zap-resting", 2000).with_messages([
            "😴 Taking a well-deserved rest...",
            "🛡️ Shields recharged! Ready to continue!",
            "💤 Rest up! The journey continues!",
        ]),
        StateDefinition::new("shopping", "zap-shopping", 2500).with_messages([
            "🛒 Welcome to the knowledge shop!",
            "💰 Wise investments await!",
            "🏪 Choose your upgrades carefully!",
        ]),
        StateDefinition::new("curious", "zap-curious", 2000).with_messages([
            "🤔 Interesting choice ahead...",
            "❓ What path will you choose?",
            "🎲 Fortune favors the bold!",
        ]),
        StateDefinition::new("confused", "zap-confused", 2000).with_messages([
            "🤔 Hmm, something's not quite right...",
            "❓ Let me think about this...",
            "🔄 Let's try that again!",
        ]),
    ]
}
