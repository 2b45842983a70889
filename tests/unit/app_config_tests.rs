/*!
 * Tests for application configuration defaults and validation
 */

use esotran::app_config::Config;

#[test]
fn test_config_defaults_shouldMatchDocumentedValues() {
    let config = Config::default();
    assert_eq!(config.endpoint, "http://localhost:8000/v1/chat/completions");
    assert_eq!(config.temperature, 0.1);
    assert_eq!(config.max_tokens, 2048);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.backoff_base_ms, 1000);
    assert_eq!(config.timeout_secs, 300);
    assert_eq!(config.legacy_col, "legacy_code");
    assert_eq!(config.translated_col, "translated_code");
    assert!(config.chrf_endpoint.is_none());
}

#[test]
fn test_config_validate_retriesOfZero_shouldFail() {
    let config = Config { max_retries: 0, ..Config::default() };
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validate_outOfRangeTemperature_shouldFail() {
    let config = Config { temperature: 3.5, ..Config::default() };
    assert!(config.validate().is_err());
}

#[test]
fn test_config_deserialization_missingFields_shouldUseDefaults() {
    let config: Config = serde_json::from_str(r#"{"model": "test-model"}"#).unwrap();
    assert_eq!(config.model, "test-model");
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.endpoint, "http://localhost:8000/v1/chat/completions");
}
