//! Evaluator configuration and per-analysis request options.
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::constants::{
    CACHE_CAPACITY, DEFAULT_TARGET, DEFAULT_TRIALS, MAX_TARGET_TURN, MIN_TARGET_TURN,
    MULTI_ELEMENT_ADD_CAP, RECOMMEND_TRIALS, SINGLE_ELEMENT_ADD_CAP,
};

/// Errors raised when configuration invariants are violated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
    #[error("target must be between 0 and 1 (got {value})")]
    TargetOutOfRange { value: f64 },
    #[error("turn must be between {min} and {max} (got {value})")]
    TurnOutOfRange { min: u8, max: u8, value: i64 },
    #[error("turn must be 'auto' or a number (got '{0}')")]
    InvalidTurn(String),
    #[error("config json is invalid: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tuning for the evaluator, its cache and the recommendation search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    #[serde(default = "EvaluatorConfig::default_trials")]
    pub trials: u32,
    #[serde(default = "EvaluatorConfig::default_recommend_trials")]
    pub recommend_trials: u32,
    #[serde(default = "EvaluatorConfig::default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "EvaluatorConfig::default_single_element_add_cap")]
    pub single_element_add_cap: u32,
    #[serde(default = "EvaluatorConfig::default_multi_element_add_cap")]
    pub multi_element_add_cap: u32,
    /// Fixed seed for reproducible simulation; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Wall-clock budget per simulation, in milliseconds.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
}

impl EvaluatorConfig {
    const fn default_trials() -> u32 {
        DEFAULT_TRIALS
    }

    const fn default_recommend_trials() -> u32 {
        RECOMMEND_TRIALS
    }

    const fn default_cache_capacity() -> usize {
        CACHE_CAPACITY
    }

    const fn default_single_element_add_cap() -> u32 {
        SINGLE_ELEMENT_ADD_CAP
    }

    const fn default_multi_element_add_cap() -> u32 {
        MULTI_ELEMENT_ADD_CAP
    }

    /// Parse from JSON and validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a field is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every count is positive.
    ///
    /// # Errors
    ///
    /// Returns the first zero-valued field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 {
            return Err(ConfigError::Zero { field: "trials" });
        }
        if self.recommend_trials == 0 {
            return Err(ConfigError::Zero {
                field: "recommend_trials",
            });
        }
        if self.cache_capacity == 0 {
            return Err(ConfigError::Zero {
                field: "cache_capacity",
            });
        }
        if self.single_element_add_cap == 0 {
            return Err(ConfigError::Zero {
                field: "single_element_add_cap",
            });
        }
        if self.multi_element_add_cap == 0 {
            return Err(ConfigError::Zero {
                field: "multi_element_add_cap",
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            trials: Self::default_trials(),
            recommend_trials: Self::default_recommend_trials(),
            cache_capacity: Self::default_cache_capacity(),
            single_element_add_cap: Self::default_single_element_add_cap(),
            multi_element_add_cap: Self::default_multi_element_add_cap(),
            seed: None,
            deadline_ms: None,
        }
    }
}

/// Which turn each goal is evaluated at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOverride {
    /// Each goal uses its own target turn.
    #[default]
    Auto,
    /// Every goal is evaluated at this turn.
    Turn(u8),
}

impl TurnOverride {
    /// Validated fixed turn.
    ///
    /// # Errors
    ///
    /// Returns an error when `turn` lies outside `1..=10`.
    pub fn fixed(turn: u8) -> Result<Self, ConfigError> {
        if (MIN_TARGET_TURN..=MAX_TARGET_TURN).contains(&turn) {
            Ok(Self::Turn(turn))
        } else {
            Err(ConfigError::TurnOutOfRange {
                min: MIN_TARGET_TURN,
                max: MAX_TARGET_TURN,
                value: i64::from(turn),
            })
        }
    }

    /// Turn to evaluate a goal whose own target turn is `goal_turn`.
    #[must_use]
    pub const fn resolve(self, goal_turn: u8) -> u8 {
        match self {
            Self::Auto => goal_turn,
            Self::Turn(turn) => turn,
        }
    }
}

impl FromStr for TurnOverride {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        let value: i64 = trimmed
            .parse()
            .map_err(|_| ConfigError::InvalidTurn(trimmed.to_string()))?;
        let turn = u8::try_from(value).map_err(|_| ConfigError::TurnOutOfRange {
            min: MIN_TARGET_TURN,
            max: MAX_TARGET_TURN,
            value,
        })?;
        Self::fixed(turn)
    }
}

impl std::fmt::Display for TurnOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Turn(turn) => write!(f, "{turn}"),
        }
    }
}

/// Options for one analysis pass: reliability target and turn selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub target: f64,
    #[serde(default)]
    pub turn: TurnOverride,
}

impl AnalysisRequest {
    /// Validated request.
    ///
    /// # Errors
    ///
    /// Returns an error when `target` is not within `[0, 1]`.
    pub fn new(target: f64, turn: TurnOverride) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&target) {
            return Err(ConfigError::TargetOutOfRange { value: target });
        }
        Ok(Self { target, turn })
    }
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET,
            turn: TurnOverride::Auto,
        }
    }
}
