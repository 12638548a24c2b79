//! Context Mapping
//!
//! Pure lookups from space-map context to state names. Unknown room names
//! fall back to the plain battle states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kinds of room on the lesson map
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    /// Regular quiz fight
    #[default]
    Battle,
    /// Harder fight
    Elite,
    /// End-of-act fight
    Boss,
    /// Upgrade shop
    Shop,
    /// Random event
    Event,
    /// Rest site
    Rest,
}

impl RoomType {
    /// State played when entering the room
    #[must_use]
    pub const fn entry_state(self) -> &'static str {
        match self {
            Self::Battle | Self::Elite => "battle_ready",
            Self::Boss => "boss_encounter",
            Self::Shop => "shopping",
            Self::Event => "curious",
            Self::Rest => "resting",
        }
    }

    /// State played after answering correctly in this room
    #[must_use]
    pub const fn victory_state(self) -> &'static str {
        match self {
            Self::Elite => "elite_victory",
            Self::Boss => "boss_victory",
            _ => "victory",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Battle => "battle",
            Self::Elite => "elite",
            Self::Boss => "boss",
            Self::Shop => "shop",
            Self::Event => "event",
            Self::Rest => "rest",
        };
        f.write_str(name)
    }
}

impl FromStr for RoomType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "battle" => Ok(Self::Battle),
            "elite" => Ok(Self::Elite),
            "boss" => Ok(Self::Boss),
            "shop" => Ok(Self::Shop),
            "event" => Ok(Self::Event),
            "rest" => Ok(Self::Rest),
            other => Err(format!("unknown room type '{other}'")),
        }
    }
}

/// State for entering a room named `room`, `battle_ready` if unmapped
#[must_use]
pub fn room_entry_state(room: &str) -> &'static str {
    room.parse::<RoomType>()
        .map_or("battle_ready", RoomType::entry_state)
}

/// State for a battle outcome in a room named `room`
///
/// Wrong answers always map to `defeat`; right answers map to the room's
/// victory state, `victory` if unmapped.
#[must_use]
pub fn battle_result_state(correct: bool, room: &str) -> &'static str {
    if !correct {
        return "defeat";
    }
    room.parse::<RoomType>()
        .map_or("victory", RoomType::victory_state)
}
