//! TOML Configuration File Support
//!
//! Loads animator configuration from `~/.config/cloud-orbit/zap.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [animator]
//! idle_tick_ms = 8000
//! idle_variation_ms = 2000
//! seed = 42
//!
//! # Override part of a built-in state
//! [states.victory]
//! duration_ms = 2000
//!
//! # Add a new state
//! [states.sleepy]
//! visual_class = "zap-sleepy"
//! duration_ms = 1500
//! messages = ["Yawn..."]
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animator::AnimatorSettings;
use crate::states::{default_definitions, StateDefinition, StateTable, StateTableError};

/// Environment variable for the RNG seed
pub const ENV_SEED: &str = "ZAP_SEED";

/// Environment variable for the idle tick interval
pub const ENV_IDLE_TICK_MS: &str = "ZAP_IDLE_TICK_MS";

/// Environment variable for the idle variation length
pub const ENV_IDLE_VARIATION_MS: &str = "ZAP_IDLE_VARIATION_MS";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// The resulting state table is unusable
    #[error("Invalid state table: {0}")]
    StateTable(#[from] StateTableError),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// `[animator]` section
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorToml {
    /// Interval between idle-variation ticks (0 disables the cycle)
    pub idle_tick_ms: Option<u64>,

    /// How long a variation stays visible
    pub idle_variation_ms: Option<u64>,

    /// Fixed RNG seed for reproducible message picks
    pub seed: Option<u64>,
}

/// `[states.<name>]` section
///
/// For built-in states every field is optional and only the given ones are
/// replaced. New states must at least name a `visual_class`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateToml {
    /// Class applied while the state is active
    pub visual_class: Option<String>,

    /// Default duration (0 = until replaced)
    pub duration_ms: Option<u64>,

    /// Message pool
    pub messages: Option<Vec<String>>,

    /// Variation pool
    pub variations: Option<Vec<String>>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZapToml {
    /// Animator timing section
    pub animator: AnimatorToml,

    /// State overrides and additions, keyed by state name
    pub states: BTreeMap<String, StateToml>,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved animator configuration
#[derive(Clone, Debug)]
pub struct AnimatorConfig {
    /// Idle-cycle timing
    pub settings: AnimatorSettings,

    /// Fixed RNG seed, if any
    pub seed: Option<u64>,

    /// The state catalog
    pub state_table: StateTable,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            settings: AnimatorSettings::default(),
            seed: None,
            state_table: StateTable::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl AnimatorConfig {
    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check timing values for consistency
    ///
    /// # Errors
    ///
    /// Fails when a variation would outlast the tick that started it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let settings = self.settings;
        if settings.idle_tick_ms > 0 && settings.idle_variation_ms >= settings.idle_tick_ms {
            return Err(ConfigError::ValidationError(format!(
                "idle_variation_ms ({}) must be shorter than idle_tick_ms ({})",
                settings.idle_variation_ms, settings.idle_tick_ms
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/cloud-orbit/zap.toml` or
/// `~/.config/cloud-orbit/zap.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("cloud-orbit").join("zap.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or the
/// result is invalid. A missing config file is not an error.
pub fn load_config() -> Result<AnimatorConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or the resulting configuration is invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<AnimatorConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration, reading environment values through `env`
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<AnimatorConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = AnimatorConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ZapToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                states = config.state_table.len(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

/// Parse a TOML string on top of the defaults (no file, no environment)
///
/// # Errors
///
/// Returns an error on malformed TOML or an invalid result.
pub fn parse_config(toml_content: &str) -> Result<AnimatorConfig, ConfigError> {
    let toml_config: ZapToml = toml::from_str(toml_content)?;
    let mut config = AnimatorConfig::default();
    apply_toml_config(&mut config, &toml_config)?;
    config.source = ConfigSource::File;
    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut AnimatorConfig, toml: &ZapToml) -> Result<(), ConfigError> {
    if let Some(tick) = toml.animator.idle_tick_ms {
        config.settings.idle_tick_ms = tick;
    }
    if let Some(variation) = toml.animator.idle_variation_ms {
        config.settings.idle_variation_ms = variation;
    }
    if toml.animator.seed.is_some() {
        config.seed = toml.animator.seed;
    }

    if !toml.states.is_empty() {
        config.state_table = merge_states(&toml.states)?;
    }
    Ok(())
}

/// Merge `[states.*]` sections into the built-in catalog
fn merge_states(overrides: &BTreeMap<String, StateToml>) -> Result<StateTable, ConfigError> {
    let mut definitions: BTreeMap<String, StateDefinition> = default_definitions()
        .into_iter()
        .map(|d| (d.name.clone(), d))
        .collect();

    for (name, state) in overrides {
        let def = match definitions.remove(name) {
            Some(existing) => existing,
            None => {
                let class = state.visual_class.clone().ok_or_else(|| {
                    ConfigError::ValidationError(format!(
                        "new state '{name}' needs a visual_class"
                    ))
                })?;
                StateDefinition::new(name.clone(), class, 0)
            }
        };
        definitions.insert(name.clone(), apply_state_toml(def, state));
    }

    Ok(StateTable::new(definitions.into_values())?)
}

fn apply_state_toml(mut def: StateDefinition, state: &StateToml) -> StateDefinition {
    if let Some(class) = &state.visual_class {
        def.visual_class.clone_from(class);
    }
    if let Some(duration) = state.duration_ms {
        def.default_duration_ms = duration;
    }
    if let Some(messages) = &state.messages {
        def.messages.clone_from(messages);
    }
    if let Some(variations) = &state.variations {
        def.variations.clone_from(variations);
    }
    def
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut AnimatorConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(seed) = env_u64(&env, ENV_SEED) {
        config.seed = Some(seed);
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = env_u64(&env, ENV_IDLE_TICK_MS) {
        config.settings.idle_tick_ms = ms;
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = env_u64(&env, ENV_IDLE_VARIATION_MS) {
        config.settings.idle_variation_ms = ms;
        config.source = ConfigSource::Env;
    }
}

/// Read a numeric environment value, warning when it does not parse
fn env_u64<F>(env: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let value = env(key)?;
    match value.trim().parse::<u64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key, value = %value, "Ignoring non-numeric environment value");
            None
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Seed override
    pub seed: Option<u64>,

    /// Idle tick interval override (milliseconds)
    pub idle_tick_ms: Option<u64>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set seed override
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set idle tick interval override
    #[must_use]
    pub fn with_idle_tick_ms(mut self, ms: u64) -> Self {
        self.idle_tick_ms = Some(ms);
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Fails if the overridden configuration no longer validates.
    pub fn apply(&self, config: &mut AnimatorConfig) -> Result<(), ConfigError> {
        if self.seed.is_some() || self.idle_tick_ms.is_some() {
            config.source = ConfigSource::Cli;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(ms) = self.idle_tick_ms {
            config.settings.idle_tick_ms = ms;
        }
        config.validate()
    }
}
