//! Zap Core - Headless Mascot Animation for Cloud Orbit
//!
//! This crate drives Zap, the lesson-map mascot, as a presentation state
//! machine. It decides which state Zap is in, which message it says, when it
//! returns to idle and when its mouth moves. It does not draw anything:
//! rendering, speech bubbles and haptics are collaborators supplied by the
//! host surface.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     Host surface                          │
//! │   (browser bridge, terminal player, tests)                │
//! │        │ play / play_sequence / advance(delta)            │
//! └────────┼──────────────────────────────────────────────────┘
//!          │
//! ┌────────┼──────────────────────────────────────────────────┐
//! │        ▼                 ZAP CORE                         │
//! │  ┌──────────────┐  ┌────────────┐  ┌───────────────────┐  │
//! │  │ StateTable   │  │ Timeline   │  │ SequenceQueue     │  │
//! │  └──────┬───────┘  └─────┬──────┘  └─────────┬─────────┘  │
//! │         └───────── ZapAnimator ──────────────┘            │
//! │                        │                                  │
//! │       Renderer ◄───────┼───────► Messenger                │
//! │                        ▼                                  │
//! │                    Feedback                               │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//! use zap_core::{MemorySurface, PlayOptions, ZapAnimator};
//!
//! let surface = MemorySurface::new();
//! let mut zap = ZapAnimator::builder().surface(&surface).seed(42).build();
//!
//! zap.play_battle_result(true, "boss");
//! assert_eq!(zap.current_state(), "boss_victory");
//! assert!(surface.has_class("zap-boss-victory"));
//!
//! zap.advance(Duration::from_millis(5000));
//! assert_eq!(zap.current_state(), "idle");
//! ```
//!
//! # Module Overview
//!
//! - [`animator`]: The state controller and its timers
//! - [`states`]: State definitions and the built-in catalog
//! - [`timeline`]: Virtual clock and ordered timers
//! - [`sequence`]: Chained states and the lesson-completion sequence
//! - [`context`]: Room / battle-result to state mapping
//! - [`lipsync`]: Mouth shapes and audio timing data
//! - [`collaborators`]: Renderer, Messenger and Feedback traits
//! - [`feedback`]: Haptic vibration patterns
//! - [`config`]: TOML / environment configuration

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animator;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod feedback;
pub mod lipsync;
pub mod options;
pub mod sequence;
pub mod states;
pub mod timeline;

// Re-exports for convenience
pub use animator::{AnimatorSettings, ZapAnimator, ZapAnimatorBuilder};
pub use collaborators::{
    reading_time, Feedback, MemorySurface, MessageType, Messenger, Renderer, SurfaceSnapshot,
};
pub use context::{battle_result_state, room_entry_state, RoomType};
pub use feedback::{haptic_pattern, HapticFeedback};
pub use lipsync::{AudioData, MouthShape, Phoneme};
pub use options::{Callback, PlayOptions};
pub use sequence::{completion_sequence, SequenceQueue, SequenceStep};
pub use states::{StateDefinition, StateTable, StateTableError, EXPLAINING, IDLE};
pub use timeline::{TimerHandle, Timeline};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, AnimatorConfig, ConfigError,
    ConfigOverrides, ConfigSource, ZapToml,
};
