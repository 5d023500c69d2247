use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

use crate::core::{DuplicatePolicy, Matcher, ProfileOptions, RoleSynonyms};
use crate::models::ScoringWeights;

/// Application configuration
///
/// Every field has a default, so an empty configuration is valid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    #[serde(default = "default_skip_existing_teams")]
    pub skip_existing_teams: bool,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub tag_bonus: TagBonusConfig,
    #[serde(default)]
    pub roles: RoleSynonyms,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            duplicate_policy: DuplicatePolicy::default(),
            skip_existing_teams: default_skip_existing_teams(),
            weights: WeightsConfig::default(),
            tag_bonus: TagBonusConfig::default(),
            roles: RoleSynonyms::default(),
        }
    }
}

fn default_delimiter() -> String { ",".to_string() }
fn default_skip_existing_teams() -> bool { true }

impl MatchingSettings {
    pub fn scoring_weights(&self) -> ScoringWeights {
        ScoringWeights {
            major: self.weights.major,
            interests: self.weights.interests,
            idea: self.weights.idea,
            goals: self.weights.goals,
            tag_bonus: self.tag_bonus.weight,
            max_bonus_tags: self.tag_bonus.max_tags,
        }
    }

    pub fn profile_options(&self) -> ProfileOptions {
        ProfileOptions {
            delimiter: self.delimiter.clone(),
            duplicate_policy: self.duplicate_policy,
            skip_existing_teams: self.skip_existing_teams,
            roles: self.roles.clone(),
        }
    }

    /// Matcher configured from these settings
    pub fn matcher(&self) -> Matcher {
        Matcher::new(self.scoring_weights(), self.profile_options())
    }
}

/// Per-category similarity weights
#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_major_weight")]
    pub major: f64,
    #[serde(default = "default_interests_weight")]
    pub interests: f64,
    #[serde(default = "default_idea_weight")]
    pub idea: f64,
    #[serde(default = "default_goals_weight")]
    pub goals: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            major: default_major_weight(),
            interests: default_interests_weight(),
            idea: default_idea_weight(),
            goals: default_goals_weight(),
        }
    }
}

fn default_major_weight() -> f64 { 0.25 }
fn default_interests_weight() -> f64 { 0.30 }
fn default_idea_weight() -> f64 { 0.20 }
fn default_goals_weight() -> f64 { 0.25 }

/// Bonus for identical explicit tags
#[derive(Debug, Clone, Deserialize)]
pub struct TagBonusConfig {
    #[serde(default = "default_tag_weight")]
    pub weight: f64,
    #[serde(default = "default_max_tags")]
    pub max_tags: u32,
}

impl Default for TagBonusConfig {
    fn default() -> Self {
        Self {
            weight: default_tag_weight(),
            max_tags: default_max_tags(),
        }
    }
}

fn default_tag_weight() -> f64 { 0.05 }
fn default_max_tags() -> u32 { 3 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "full".to_string() }

fn environment() -> Environment {
    // e.g., TEAMFORGE__MATCHING__WEIGHTS__IDEA -> matching.weights.idea
    Environment::with_prefix("TEAMFORGE")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with TEAMFORGE__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(environment())
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML document (no environment overrides)
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject weights the scoring stage cannot use
    pub fn validate(&self) -> Result<(), ConfigError> {
        let matching = &self.matching;
        let weights = [
            ("matching.weights.major", matching.weights.major),
            ("matching.weights.interests", matching.weights.interests),
            ("matching.weights.idea", matching.weights.idea),
            ("matching.weights.goals", matching.weights.goals),
            ("matching.tag_bonus.weight", matching.tag_bonus.weight),
        ];

        for (key, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Message(format!(
                    "{} must be a non-negative number, got {}",
                    key, value
                )));
            }
        }

        if matching.delimiter.is_empty() {
            return Err(ConfigError::Message("matching.delimiter must not be empty".to_string()));
        }

        Ok(())
    }
}
