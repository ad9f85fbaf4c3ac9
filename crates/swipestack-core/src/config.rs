//! Stack and undo configuration.
//!
//! Configuration is immutable once a controller is built. Both config types
//! deserialize from TOML and are validated on load:
//!
//! ```toml
//! [stack]
//! max_visible = 3
//! swipe_threshold = 0.4
//! preload_threshold = 5
//!
//! [undo]
//! limit = 20
//! replacement_strategy = "preserve_valid"
//! restore_on_launch = "restore"
//! persistence_key = "discover-stack"
//! ```

use serde::{Deserialize, Serialize};

use crate::direction::DirectionScheme;
use crate::errors::ConfigError;

/// Default number of cards materialized in the visible window.
pub const DEFAULT_MAX_VISIBLE: usize = 3;
/// Default fraction of the card width a drag must cross to count as a swipe.
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 0.5;
/// Default remaining-card count at which more cards are requested.
pub const DEFAULT_PRELOAD_THRESHOLD: usize = 3;
/// Default undo history depth.
pub const DEFAULT_UNDO_LIMIT: usize = 10;

/// Core stack behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Cards materialized in the visible window (> 0).
    pub max_visible: usize,
    /// Swipe commit threshold, strictly between 0 and 1.
    pub swipe_threshold: f64,
    /// Request more cards once `remaining_count <= preload_threshold`.
    pub preload_threshold: usize,
    /// Directions the stack accepts.
    pub direction_scheme: DirectionScheme,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            max_visible: DEFAULT_MAX_VISIBLE,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            preload_threshold: DEFAULT_PRELOAD_THRESHOLD,
            direction_scheme: DirectionScheme::default(),
        }
    }
}

impl StackConfig {
    /// Create a validated configuration.
    pub fn new(
        max_visible: usize,
        swipe_threshold: f64,
        preload_threshold: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            max_visible,
            swipe_threshold,
            preload_threshold,
            direction_scheme: DirectionScheme::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the direction scheme.
    #[must_use]
    pub fn with_direction_scheme(mut self, scheme: DirectionScheme) -> Self {
        self.direction_scheme = scheme;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_visible == 0 {
            return Err(ConfigError::ZeroMaxVisible);
        }
        if !(self.swipe_threshold > 0.0 && self.swipe_threshold < 1.0) {
            return Err(ConfigError::SwipeThresholdOutOfRange {
                value: self.swipe_threshold,
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document holding the stack fields.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// How `set_collection` reconciles a non-empty undo history.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementStrategy {
    /// Evict every tombstone and apply the new collection
    #[default]
    ClearTombstones,
    /// Keep tombstones whose card is still in the new collection
    PreserveValid,
    /// Refuse the replacement while any tombstone exists
    BlockIfPresent,
    /// Ask the user; yes behaves like `ClearTombstones`, no like `BlockIfPresent`
    AskUser,
}

/// What happens to persisted tombstones when listening starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreOnLaunch {
    /// Load persisted tombstones and keep them undoable
    #[default]
    Restore,
    /// Load persisted tombstones, evict each one, then clear storage
    ClearGracefully,
    /// Clear storage without loading
    Ignore,
}

/// Serializable part of the undo configuration.
///
/// Callbacks live separately (see `UndoHooks` in `swipestack-app`) so this
/// type stays plain data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndoSettings {
    /// Maximum tombstones retained; `0` makes every swipe final.
    pub limit: usize,
    /// Reconciliation policy for collection replacement.
    pub replacement_strategy: ReplacementStrategy,
    /// Launch-time handling of persisted tombstones.
    pub restore_on_launch: RestoreOnLaunch,
    /// Key under which tombstones are persisted; `None` disables persistence.
    pub persistence_key: Option<String>,
}

impl Default for UndoSettings {
    fn default() -> Self {
        Self {
            limit: DEFAULT_UNDO_LIMIT,
            replacement_strategy: ReplacementStrategy::default(),
            restore_on_launch: RestoreOnLaunch::default(),
            persistence_key: None,
        }
    }
}

impl UndoSettings {
    /// Settings with the given history limit and defaults elsewhere.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Set the replacement strategy.
    #[must_use]
    pub fn replacement_strategy(mut self, strategy: ReplacementStrategy) -> Self {
        self.replacement_strategy = strategy;
        self
    }

    /// Set the launch restore policy.
    #[must_use]
    pub fn restore_on_launch(mut self, policy: RestoreOnLaunch) -> Self {
        self.restore_on_launch = policy;
        self
    }

    /// Set the persistence key.
    #[must_use]
    pub fn persistence_key(mut self, key: impl Into<String>) -> Self {
        self.persistence_key = Some(key.into());
        self
    }
}

/// Combined settings document with `[stack]` and optional `[undo]` tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackSettings {
    /// Stack behaviour
    pub stack: StackConfig,
    /// Undo behaviour; undo is disabled when absent
    pub undo: Option<UndoSettings>,
}

impl StackSettings {
    /// Parse and validate a settings document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        settings.stack.validate()?;
        Ok(settings)
    }
}
