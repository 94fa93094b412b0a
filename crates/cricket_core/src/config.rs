//! # Scoring configuration
//!
//! Every policy knob of the engine lives here so that behavior can be
//! switched per deployment without code changes.
//!
//! ```rust
//! use cricket_core::config::{ScoringConfig, StrikePolicy};
//!
//! let config = ScoringConfig::default();
//! assert_eq!(config.strike_policy, StrikePolicy::TrustCaller);
//! let strict = ScoringConfig::strict();
//! assert_eq!(strict.strike_policy, StrikePolicy::Enforce);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Who decides which batter is on strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrikePolicy {
    /// Record the caller's striker/non-striker unconditionally.
    #[default]
    TrustCaller,
    /// Reject deliveries whose striker/non-striker disagree with the
    /// rotation the engine derives from the previous delivery.
    Enforce,
}

/// What to do with a toss naming a team outside the match or no decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TossPolicy {
    #[default]
    Reject,
    /// Substitute a random valid winner/decision.
    Randomize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub strike_policy: StrikePolicy,
    pub toss_policy: TossPolicy,
    /// Reject teams and players the registry does not know.
    pub require_registered_players: bool,
    /// Innings considered by the recent-form statistic.
    pub recent_form_innings: usize,
    /// Deliveries included in a match snapshot.
    pub recent_deliveries: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            strike_policy: StrikePolicy::TrustCaller,
            toss_policy: TossPolicy::Reject,
            require_registered_players: true,
            recent_form_innings: 5,
            recent_deliveries: 12,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {path}")]
    UnsupportedFormat { path: String },

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

impl ScoringConfig {
    /// Engine owns strike and rejects bad toss input.
    pub fn strict() -> Self {
        Self { strike_policy: StrikePolicy::Enforce, ..Self::default() }
    }

    /// Behaves like the scorer front-end historically did: trust the caller
    /// for strike, randomize invalid toss input, accept unregistered players.
    pub fn legacy() -> Self {
        Self {
            strike_policy: StrikePolicy::TrustCaller,
            toss_policy: TossPolicy::Randomize,
            require_registered_players: false,
            ..Self::default()
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text)?,
            Some("json") => Self::from_json_str(&text)?,
            _ => {
                return Err(ConfigError::UnsupportedFormat { path: path.display().to_string() })
            }
        };
        log::info!("Loaded scoring config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.recent_form_innings == 0 {
            return Err(ConfigError::Invalid("recent_form_innings must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_yaml_partial_uses_defaults() {
        let config = ScoringConfig::from_yaml_str("strike_policy: enforce\n").unwrap();
        assert_eq!(config.strike_policy, StrikePolicy::Enforce);
        assert_eq!(config.toss_policy, TossPolicy::Reject);
        assert_eq!(config.recent_form_innings, 5);
    }

    #[test]
    fn test_json_round_trip_of_preset() {
        let text = serde_json::to_string(&ScoringConfig::legacy()).unwrap();
        let parsed = ScoringConfig::from_json_str(&text).unwrap();
        assert_eq!(parsed, ScoringConfig::legacy());
    }

    #[test]
    fn test_rejects_zero_form_window() {
        let err = ScoringConfig::from_yaml_str("recent_form_innings: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_by_extension() {
        let mut file = Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "toss_policy: randomize").unwrap();
        let config = ScoringConfig::load(file.path()).unwrap();
        assert_eq!(config.toss_policy, TossPolicy::Randomize);

        let other = Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            ScoringConfig::load(other.path()),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }
}
