//! Configuration for the relationship memory engine.
//!
//! Maps directly to `rapport.toml`. Every field has a serde default, so an
//! empty file (or no file at all) yields the stock behavior.

use serde::{Deserialize, Serialize};

/// Top-level configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RapportConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Episode formation and capacity.
    #[serde(default)]
    pub episodes: EpisodeConfig,
    /// Prompt rendering settings.
    #[serde(default)]
    pub prompt: PromptConfig,
    /// Persistence settings.
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl RapportConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `RapportError::Config` if the TOML is invalid.
    pub fn from_toml(toml_str: &str) -> crate::error::Result<Self> {
        toml::from_str(toml_str).map_err(|e| crate::RapportError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Episode formation thresholds and the per-user capacity bound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeConfig {
    /// Hard cap on stored episodes per user.
    #[serde(default = "default_100")]
    pub max_episodes_per_user: usize,
    /// Minimum importance for an interaction to become an episode.
    #[serde(default = "default_0_4")]
    pub importance_threshold: f32,
    /// Maximum number of search keywords stored per episode.
    #[serde(default = "default_15")]
    pub max_keywords: usize,
    /// How many of the newest episodes are handed to the prompt generator.
    #[serde(default = "default_5")]
    pub recent_for_prompt: usize,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_episodes_per_user: 100,
            importance_threshold: 0.4,
            max_keywords: 15,
            recent_for_prompt: 5,
        }
    }
}

/// Prompt rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// The adaptation section is only rendered above this profile confidence.
    #[serde(default = "default_0_2")]
    pub adaptation_confidence_threshold: f32,
    /// Safety resources listed in the crisis addendum, one per line.
    #[serde(default = "default_crisis_resources")]
    pub crisis_resources: Vec<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            adaptation_confidence_threshold: 0.2,
            crisis_resources: default_crisis_resources(),
        }
    }
}

/// Persistence settings for the SQLite store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Use WAL mode for concurrent reads.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
    /// Detect corrupted rows via CRC-32 checksums.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            wal_mode: true,
            checksum_enabled: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_crisis_resources() -> Vec<String> {
    vec![
        "Inochi no Denwa: 0570-783-556".to_string(),
        "Yorisoi Hotline: 0120-279-338".to_string(),
    ]
}
fn default_0_2() -> f32 { 0.2 }
fn default_0_4() -> f32 { 0.4 }
fn default_5() -> usize { 5 }
fn default_15() -> usize { 15 }
fn default_100() -> usize { 100 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = RapportConfig::from_toml("").expect("parse");
        assert_eq!(config.episodes.max_episodes_per_user, 100);
        assert!((config.episodes.importance_threshold - 0.4).abs() < f32::EPSILON);
        assert_eq!(config.prompt.crisis_resources.len(), 2);
        assert!(config.persistence.wal_mode);
    }

    #[test]
    fn partial_sections_override_only_named_fields() {
        let config = RapportConfig::from_toml(
            r#"
            [episodes]
            max_episodes_per_user = 20

            [prompt]
            crisis_resources = ["988 Suicide & Crisis Lifeline"]
            "#,
        )
        .expect("parse");
        assert_eq!(config.episodes.max_episodes_per_user, 20);
        assert_eq!(config.episodes.max_keywords, 15);
        assert_eq!(config.prompt.crisis_resources, vec!["988 Suicide & Crisis Lifeline"]);
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = RapportConfig::from_toml("[episodes\nmax = ").expect_err("should fail");
        assert!(matches!(err, crate::RapportError::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rapport.toml");
        std::fs::write(&path, "[general]\nlog_level = \"debug\"\n").expect("write");
        let config = RapportConfig::from_file(&path).expect("load");
        assert_eq!(config.general.log_level, "debug");
    }
}
