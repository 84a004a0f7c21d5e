use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid configuration in '{path}': {source}")]
    Invalid { path: String, source: ConfigError },
}

/// Which actions the folding environment offers at each cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionSpace {
    /// `Skip` is always offered alongside the legal pairs.
    #[default]
    ExplicitSkip,
    /// Only pairs are offered; an empty legal set makes `step` skip on its own.
    PairsOnly,
}

/// Extra admissibility rule for a candidate pair `(i, j)`, on top of base
/// complementarity and the non-crossing constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case"
)]
pub enum PairRule {
    /// Reject any pair with `j - i < min_separation`.
    MinSeparation { min_separation: usize },
    /// Reject a pair that would close a fresh hairpin of fewer than `min_loop`
    /// bases. Stack extensions and pairs enclosing paired positions are exempt.
    HairpinClosure { min_loop: usize },
}

impl Default for PairRule {
    fn default() -> Self {
        PairRule::MinSeparation { min_separation: 4 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EnvConfig {
    pub action_space: ActionSpace,
    pub pair_rule: PairRule,
}

impl EnvConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let PairRule::MinSeparation { min_separation: 0 } = self.pair_rule {
            return Err(ConfigError::InvalidParameter {
                name: "min_separation",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SearchConfig {
    pub num_simulations: usize,
    pub c_puct: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_simulations: 100,
            c_puct: 1.4,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.c_puct.is_finite() || self.c_puct <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "c_puct",
                reason: format!("must be finite and positive, got {}", self.c_puct),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct SearchConfigBuilder {
    num_simulations: Option<usize>,
    c_puct: Option<f64>,
}

impl SearchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_simulations(mut self, n: usize) -> Self {
        self.num_simulations = Some(n);
        self
    }
    pub fn c_puct(mut self, c: f64) -> Self {
        self.c_puct = Some(c);
        self
    }

    pub fn build(self) -> Result<SearchConfig, ConfigError> {
        let defaults = SearchConfig::default();
        let config = SearchConfig {
            num_simulations: self.num_simulations.unwrap_or(defaults.num_simulations),
            c_puct: self.c_puct.unwrap_or(defaults.c_puct),
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SelfPlayConfig {
    /// Visit-count temperature for move sampling; `0` always plays the most
    /// visited action.
    pub temperature: f64,
    pub seed: u64,
    /// How many distinct lowest-energy structures a batch keeps.
    pub keep_best: usize,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            seed: 0,
            keep_best: 5,
        }
    }
}

impl SelfPlayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "temperature",
                reason: format!("must be finite and non-negative, got {}", self.temperature),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FoldConfig {
    pub environment: EnvConfig,
    pub search: SearchConfig,
    pub self_play: SelfPlayConfig,
}

impl FoldConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let path_str = path.to_string_lossy().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io {
            path: path_str.clone(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigLoadError::Toml {
            path: path_str.clone(),
            source: e,
        })?;
        config.validate().map_err(|e| ConfigLoadError::Invalid {
            path: path_str,
            source: e,
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.environment.validate()?;
        self.search.validate()?;
        self.self_play.validate()
    }
}
