use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Gate thresholds for lesson and quiz checks
    #[serde(default)]
    pub gate: GateSettings,

    /// Candidate question generator settings
    #[serde(default)]
    pub generator: GeneratorSettings,

    /// Storage locations
    #[serde(default)]
    pub storage: StorageSettings,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Thresholds the gating pipeline runs with
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GateSettings {
    // @field: Minimum lesson quality score (0-100)
    #[serde(default = "default_min_score")]
    pub min_score: u8,

    // @field: Candidates requested from the generator per attempt
    #[serde(default = "default_candidates_per_attempt")]
    pub candidates_per_attempt: usize,

    // @field: Generation attempts per question replacement
    #[serde(default = "default_replace_attempts")]
    pub replace_attempts: usize,

    // @field: Generation rounds when filling missing questions
    #[serde(default = "default_fill_attempts")]
    pub fill_attempts: usize,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
            candidates_per_attempt: default_candidates_per_attempt(),
            replace_attempts: default_replace_attempts(),
            fill_attempts: default_fill_attempts(),
        }
    }
}

/// Candidate generator service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GeneratorSettings {
    /// Service endpoint URL
    #[serde(default = "default_generator_endpoint")]
    pub endpoint: String,

    /// Model name to generate questions with
    #[serde(default = "default_generator_model")]
    pub model: String,

    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff multiplier for retries (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Fixed random seed forwarded with every generation request
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            endpoint: default_generator_endpoint(),
            model: default_generator_model(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            seed: None,
        }
    }
}

/// Filesystem locations for the store and run artifacts
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StorageSettings {
    /// Database file path; the system data directory is used when unset
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Directory run reports are written under
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// Directory question snapshots are written under
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Lexicon override file; the builtin tables are used when unset
    #[serde(default)]
    pub lexicon_path: Option<PathBuf>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            db_path: None,
            report_dir: default_report_dir(),
            backup_dir: default_backup_dir(),
            lexicon_path: None,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

fn default_min_score() -> u8 {
    70
}

fn default_candidates_per_attempt() -> usize {
    3
}

fn default_replace_attempts() -> usize {
    3
}

fn default_fill_attempts() -> usize {
    4
}

fn default_generator_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_generator_model() -> String {
    "llama3.1".to_string()
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_temperature() -> f32 {
    0.7
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.gate.min_score > 100 {
            return Err(anyhow!(
                "Minimum quality score must be between 0 and 100, got {}",
                self.gate.min_score
            ));
        }

        if self.gate.candidates_per_attempt == 0 {
            return Err(anyhow!("At least one candidate per attempt is required"));
        }

        if self.gate.replace_attempts == 0 || self.gate.fill_attempts == 0 {
            return Err(anyhow!("Replace and fill attempts must both be at least 1"));
        }

        if self.generator.endpoint.is_empty() {
            return Err(anyhow!("Generator endpoint cannot be empty"));
        }

        if self.generator.model.is_empty() {
            return Err(anyhow!("Generator model cannot be empty"));
        }

        if !(0.0..=1.0).contains(&self.generator.temperature) {
            return Err(anyhow!(
                "Generator temperature must be between 0.0 and 1.0, got {}",
                self.generator.temperature
            ));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            gate: GateSettings::default(),
            generator: GeneratorSettings::default(),
            storage: StorageSettings::default(),
            log_level: LogLevel::default(),
        }
    }
}
