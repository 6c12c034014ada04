/*!
 * Tests for application configuration functionality
 */

use phasewai::app_config::{Config, LogLevel, ProviderConfig, TranslationProvider};
use phasewai::phase::DetectorConfig;
use std::str::FromStr;
use crate::common;

#[test]
fn test_defaultConfig_shouldRoundTripThroughJson() {
    let config = Config::default();

    let json = serde_json::to_string_pretty(&config).unwrap();
    let parsed: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed.batching, config.batching);
    assert_eq!(parsed.phase_detection, config.phase_detection);
    assert_eq!(parsed.log_level, LogLevel::Info);
    assert!(json.contains("\"type\": \"anthropic\""));
}

#[test]
fn test_translationProvider_fromStr_shouldAcceptConfigNames() {
    assert_eq!(TranslationProvider::from_str("LMStudio").unwrap(), TranslationProvider::LMStudio);
    assert_eq!(TranslationProvider::from_str("openai").unwrap(), TranslationProvider::OpenAI);
    assert!(TranslationProvider::from_str("gemini").is_err());
    assert_eq!(TranslationProvider::Ollama.to_string(), "ollama");
}

#[test]
fn test_providerDefaults_shouldMatchServices() {
    let anthropic = ProviderConfig::new(TranslationProvider::Anthropic);
    let lmstudio = ProviderConfig::new(TranslationProvider::LMStudio);

    assert_eq!(anthropic.endpoint, "https://api.anthropic.com");
    assert_eq!(anthropic.rate_limit, Some(45));
    assert_eq!(lmstudio.endpoint, "http://localhost:1234/v1");
    assert_eq!(lmstudio.rate_limit, None);
}

#[test]
fn test_getters_withEmptyProviderFields_shouldFallBackToDefaults() {
    let mut config = common::local_config(35, 5);
    {
        let ollama = config.translation.active_provider_config_mut();
        ollama.model = String::new();
        ollama.endpoint = String::new();
        ollama.timeout_secs = 0;
    }

    assert_eq!(config.translation.get_model(), "qwen2.5:14b");
    assert_eq!(config.translation.get_endpoint(), "http://localhost:11434");
    assert_eq!(config.translation.get_timeout_secs(), 120);
}

#[test]
fn test_validate_withZeroConcurrency_shouldFail() {
    let mut config = common::local_config(35, 5);
    config.batching.concurrent_batches = 0;

    assert!(config.validate().is_err());
}

#[test]
fn test_validateSettings_shouldIgnoreMissingCredentials() {
    let mut config = Config::default();
    config.translation.active_provider_config_mut().api_key = String::new();

    assert!(config.validate_settings().is_ok());
}

#[test]
fn test_detectorConfig_withCustomWeights_shouldWeightBuiltinRows() {
    let mut config = Config::default();
    config.phase_detection.pre_only_weight = 2.5;
    config.phase_detection.window_size = 4;

    let detector = DetectorConfig::try_from(&config.phase_detection).unwrap();
    let evaluation = detector.signals.evaluate("铅笔");

    assert_eq!(detector.window_size, 4);
    assert!((evaluation.score + 2.5).abs() < 1e-9);
}

#[test]
fn test_orchestratorOptions_shouldMirrorBatching() {
    let mut config = Config::default();
    config.batching.concurrent_batches = 4;
    config.batching.strict_coverage = true;

    let options = config.orchestrator_options();

    assert_eq!(options.concurrent_batches, 4);
    assert!(options.strict_coverage);
    assert!(!options.reject_foreign_indices);
}
