/*!
 * Tests for application configuration functionality
 */

use coursewarden::app_config::{Config, GateSettings, GeneratorSettings, LogLevel};

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    // Gate thresholds
    assert_eq!(config.gate.min_score, 70);
    assert_eq!(config.gate.candidates_per_attempt, 3);
    assert_eq!(config.gate.replace_attempts, 3);
    assert_eq!(config.gate.fill_attempts, 4);

    // Generator backend
    assert_eq!(config.generator.endpoint, "http://localhost:11434");
    assert_eq!(config.generator.model, "llama3.1");
    assert_eq!(config.generator.retry_count, 3);
    assert_eq!(config.generator.retry_backoff_ms, 1000);
    assert!((config.generator.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(config.generator.seed, None);

    // Storage paths
    assert_eq!(config.storage.db_path, None);
    assert_eq!(config.storage.report_dir.to_str(), Some("reports"));
    assert_eq!(config.storage.backup_dir.to_str(), Some("backups"));
    assert_eq!(config.storage.lexicon_path, None);

    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    // Start with a valid config
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    // Score above the 0-100 scale
    config.gate.min_score = 101;
    assert!(config.validate().is_err());
    config.gate.min_score = 70;

    // Zero candidates per attempt
    config.gate.candidates_per_attempt = 0;
    assert!(config.validate().is_err());
    config.gate.candidates_per_attempt = 3;

    // Zero replace and fill attempts
    config.gate.replace_attempts = 0;
    assert!(config.validate().is_err());
    config.gate.replace_attempts = 3;

    config.gate.fill_attempts = 0;
    assert!(config.validate().is_err());
    config.gate.fill_attempts = 4;

    // Empty endpoint and model
    config.generator.endpoint = String::new();
    assert!(config.validate().is_err());
    config.generator.endpoint = "http://localhost:11434".to_string();

    config.generator.model = String::new();
    assert!(config.validate().is_err());
    config.generator.model = "llama3.1".to_string();

    // Temperature outside the sampling range
    config.generator.temperature = 1.5;
    assert!(config.validate().is_err());
    config.generator.temperature = -0.1;
    assert!(config.validate().is_err());
    config.generator.temperature = 0.7;

    assert!(config.validate().is_ok());
}

/// Test the boundary values the validator accepts
#[test]
fn test_config_validation_withBoundaryValues_shouldAccept() {
    let mut config = Config::default();

    config.gate.min_score = 0;
    assert!(config.validate().is_ok());
    config.gate.min_score = 100;
    assert!(config.validate().is_ok());

    config.generator.temperature = 0.0;
    assert!(config.validate().is_ok());
    config.generator.temperature = 1.0;
    assert!(config.validate().is_ok());
}

/// Test that gate and generator sections provide reasonable defaults on
/// their own
#[test]
fn test_sectionDefaults_shouldProvideReasonableValues() {
    let gate = GateSettings::default();
    assert!(gate.min_score <= 100);
    assert!(gate.candidates_per_attempt >= 1);
    assert!(gate.replace_attempts >= 1);
    assert!(gate.fill_attempts >= 1);

    let generator = GeneratorSettings::default();
    assert_eq!(generator.retry_count, 3);
    assert_eq!(generator.retry_backoff_ms, 1000);
    assert!(generator.temperature >= 0.0 && generator.temperature <= 1.0);
}

/// Test JSON round trip of a full configuration
#[test]
fn test_config_serde_roundTrip_shouldPreserveValues() {
    let mut config = Config::default();
    config.gate.min_score = 85;
    config.generator.model = "mistral".to_string();
    config.generator.seed = Some(42);
    config.log_level = LogLevel::Debug;

    let json = serde_json::to_string(&config).unwrap();
    let decoded: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(decoded.gate.min_score, 85);
    assert_eq!(decoded.generator.model, "mistral");
    assert_eq!(decoded.generator.seed, Some(42));
    assert_eq!(decoded.log_level, LogLevel::Debug);
}

/// Test that a partial JSON document fills the gaps from the defaults
#[test]
fn test_config_deserialize_withPartialJson_shouldApplyDefaults() {
    let json = r#"{
        "gate": { "min_score": 90 },
        "log_level": "debug"
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.gate.min_score, 90);
    // Untouched fields of a partial section keep their defaults
    assert_eq!(config.gate.candidates_per_attempt, 3);
    // Omitted sections come in whole from the defaults
    assert_eq!(config.generator.model, "llama3.1");
    assert_eq!(config.storage.report_dir.to_str(), Some("reports"));
    assert_eq!(config.log_level, LogLevel::Debug);
}

/// Test that an empty JSON object decodes to the default configuration
#[test]
fn test_config_deserialize_withEmptyJson_shouldMatchDefaults() {
    let config: Config = serde_json::from_str("{}").unwrap();
    let defaults = Config::default();

    assert_eq!(config.gate.min_score, defaults.gate.min_score);
    assert_eq!(config.generator.endpoint, defaults.generator.endpoint);
    assert_eq!(config.storage.backup_dir, defaults.storage.backup_dir);
    assert_eq!(config.log_level, defaults.log_level);
}
