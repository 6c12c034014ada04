use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use log::warn;
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::file_utils::FileManager;
use crate::phase::{DetectorConfig, SignalCategory, SignalPattern, SignalTable, SignalWeights};
use crate::translation::batch::PlannerConfig;
use crate::translation::orchestrator::OrchestratorOptions;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Batch planning and merge settings
    #[serde(default)]
    pub batching: BatchingConfig,

    /// Phase detection settings
    #[serde(default)]
    pub phase_detection: PhaseDetectionConfig,

    /// Remote folder sync settings
    #[serde(default)]
    pub drive: DriveConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Anthropic
    #[default]
    Anthropic,
    // @provider: OpenAI
    OpenAI,
    // @provider: Ollama
    Ollama,
    // @provider: LM Studio (OpenAI-compatible local server)
    LMStudio,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Anthropic => "Anthropic",
            Self::OpenAI => "OpenAI",
            Self::Ollama => "Ollama",
            Self::LMStudio => "LM Studio",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Anthropic => "anthropic".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Ollama => "ollama".to_string(),
            Self::LMStudio => "lmstudio".to_string(),
        }
    }

    // @returns: Whether the provider is a hosted API that needs a key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Anthropic | Self::OpenAI)
    }

    // @returns: Environment variable consulted when the config has no key
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Ollama | Self::LMStudio => None,
        }
    }
}

impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            "lmstudio" => Ok(Self::LMStudio),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: String,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Rate limit (requests per minute)
    #[serde(default)]
    pub rate_limit: Option<u32>,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: TranslationProvider) -> Self {
        Self {
            provider_type: provider_type.to_lowercase_string(),
            model: default_model(&provider_type),
            api_key: String::new(),
            endpoint: default_endpoint(&provider_type),
            timeout_secs: default_timeout_secs(),
            rate_limit: default_rate_limit(&provider_type),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Retry count for failed requests
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff before the first retry in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum number of tokens per batch answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Batch planning and merge settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BatchingConfig {
    /// Records per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Records repeated from the previous batch
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Batches in flight at once
    #[serde(default = "default_concurrent_batches")]
    pub concurrent_batches: usize,

    /// Fail when a subtitle is left untranslated
    #[serde(default)]
    pub strict_coverage: bool,

    /// Fail when a response returns indices that were not submitted
    #[serde(default)]
    pub reject_foreign_indices: bool,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            overlap: default_overlap(),
            concurrent_batches: default_concurrent_batches(),
            strict_coverage: false,
            reject_foreign_indices: false,
        }
    }
}

/// Extra signal row supplied by the user
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ExtraSignalConfig {
    // @field: Regular expression
    pub pattern: String,

    // @field: Signal category (explicit_transition, post_context, active_material, pre_only, ambiguous)
    pub category: SignalCategory,

    // @field: Weight; defaults to the category weight
    #[serde(default)]
    pub weight: Option<f64>,

    // @field: Count towards the whole-file density fallback; defaults to true for post_context rows
    #[serde(default)]
    pub counts_for_density: Option<bool>,
}

/// Phase detection settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PhaseDetectionConfig {
    /// Records per scoring window
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Window sum that marks the start of painting
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Share of painting-context records that makes the whole file painting
    #[serde(default = "default_density_threshold")]
    pub density_threshold: f64,

    /// Weight of painting-context terms
    #[serde(default = "default_post_context_weight")]
    pub post_context_weight: f64,

    /// Weight of color and pigment names
    #[serde(default = "default_material_weight")]
    pub material_weight: f64,

    /// Weight subtracted for sketch-only terms
    #[serde(default = "default_pre_only_weight")]
    pub pre_only_weight: f64,

    /// Rows appended to the built-in signal table
    #[serde(default)]
    pub extra_signals: Vec<ExtraSignalConfig>,
}

impl Default for PhaseDetectionConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            threshold: default_threshold(),
            density_threshold: default_density_threshold(),
            post_context_weight: default_post_context_weight(),
            material_weight: default_material_weight(),
            pre_only_weight: default_pre_only_weight(),
            extra_signals: Vec::new(),
        }
    }
}

impl PhaseDetectionConfig {
    pub fn weights(&self) -> SignalWeights {
        SignalWeights {
            post_context: self.post_context_weight,
            active_material: self.material_weight,
            pre_only: self.pre_only_weight,
        }
    }
}

/// Remote folder sync settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DriveConfig {
    /// rclone remote name
    #[serde(default = "default_drive_remote")]
    pub remote: String,

    /// Folder on the remote holding `input/` and `output/`
    #[serde(default = "default_drive_folder")]
    pub folder: String,

    /// Local working directory
    #[serde(default = "default_drive_work_dir")]
    pub work_dir: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            remote: default_drive_remote(),
            folder: default_drive_folder(),
            work_dir: default_drive_work_dir(),
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

impl From<&LogLevel> for log::LevelFilter {
    fn from(level: &LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "zh".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_batch_size() -> usize {
    35
}

fn default_overlap() -> usize {
    5
}

fn default_concurrent_batches() -> usize {
    1
}

fn default_window_size() -> usize {
    8
}

fn default_threshold() -> f64 {
    3.0
}

fn default_density_threshold() -> f64 {
    0.3
}

fn default_post_context_weight() -> f64 {
    1.0
}

fn default_material_weight() -> f64 {
    0.7
}

fn default_pre_only_weight() -> f64 {
    1.0
}

fn default_drive_remote() -> String {
    "gdrive".to_string()
}

fn default_drive_folder() -> String {
    "Watercolor Translations".to_string()
}

fn default_drive_work_dir() -> String {
    "drive_sync".to_string()
}

fn default_model(provider: &TranslationProvider) -> String {
    match provider {
        TranslationProvider::Anthropic => "claude-sonnet-4-20250514".to_string(),
        TranslationProvider::OpenAI => "gpt-4o".to_string(),
        TranslationProvider::Ollama => "qwen2.5:14b".to_string(),
        // Placeholder; users should set to the loaded model name in LM Studio
        TranslationProvider::LMStudio => "local-model".to_string(),
    }
}

fn default_endpoint(provider: &TranslationProvider) -> String {
    match provider {
        TranslationProvider::Anthropic => "https://api.anthropic.com".to_string(),
        TranslationProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        TranslationProvider::Ollama => "http://localhost:11434".to_string(),
        TranslationProvider::LMStudio => "http://localhost:1234/v1".to_string(),
    }
}

fn default_rate_limit(provider: &TranslationProvider) -> Option<u32> {
    match provider {
        // Slightly below the 50 requests per minute API limit
        TranslationProvider::Anthropic => Some(45),
        TranslationProvider::OpenAI => Some(60),
        TranslationProvider::Ollama | TranslationProvider::LMStudio => None,
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.validate_settings()?;

        if self.translation.provider.requires_api_key() && self.translation.get_api_key().is_empty() {
            return Err(anyhow!(
                "Translation API key is required for {} provider (set it in the config or {})",
                self.translation.provider.display_name(),
                self.translation.provider.api_key_env_var().unwrap_or("the environment")
            ));
        }

        Ok(())
    }

    /// Validate everything except provider credentials
    pub fn validate_settings(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.source_language)
            .context("Invalid source language")?;
        crate::language_utils::validate_language_code(&self.target_language)
            .context("Invalid target language")?;

        PlannerConfig::try_from(&self.batching)?;
        if self.batching.concurrent_batches == 0 {
            return Err(anyhow!("concurrent_batches must be at least 1"));
        }

        DetectorConfig::try_from(&self.phase_detection)?;
        Ok(())
    }

    /// Load the configuration file, writing a default one first if it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let file = File::open(path).with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let reader = BufReader::new(file);
            return serde_json::from_reader(reader)
                .with_context(|| format!("Failed to parse config file: {}", path.display()));
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
        FileManager::write_to_file(path, &config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;
        Ok(config)
    }

    /// Orchestrator options from the batching section
    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            concurrent_batches: self.batching.concurrent_batches,
            strict_coverage: self.batching.strict_coverage,
            reject_foreign_indices: self.batching.reject_foreign_indices,
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            batching: BatchingConfig::default(),
            phase_detection: PhaseDetectionConfig::default(),
            drive: DriveConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TryFrom<&BatchingConfig> for PlannerConfig {
    type Error = anyhow::Error;

    fn try_from(batching: &BatchingConfig) -> Result<Self> {
        PlannerConfig::new(batching.batch_size, batching.overlap)
    }
}

impl TryFrom<&PhaseDetectionConfig> for DetectorConfig {
    type Error = anyhow::Error;

    fn try_from(phase: &PhaseDetectionConfig) -> Result<Self> {
        if phase.window_size == 0 {
            return Err(anyhow!("Phase detection window_size must be at least 1"));
        }
        let numbers = [
            ("threshold", phase.threshold),
            ("density_threshold", phase.density_threshold),
            ("post_context_weight", phase.post_context_weight),
            ("material_weight", phase.material_weight),
            ("pre_only_weight", phase.pre_only_weight),
        ];
        if let Some((name, _)) = numbers.iter().find(|(_, value)| !value.is_finite()) {
            return Err(anyhow!("Phase detection {} must be a finite number", name));
        }

        let weights = phase.weights();
        let mut signals = SignalTable::builtin(&weights);
        for extra in &phase.extra_signals {
            let weight = extra.weight.unwrap_or_else(|| weights.for_category(extra.category));
            if !weight.is_finite() {
                return Err(anyhow!("Weight of extra signal '{}' must be a finite number", extra.pattern));
            }
            let mut row = SignalPattern::new(&extra.pattern, extra.category, weight)
                .with_context(|| format!("Invalid extra signal pattern: {}", extra.pattern))?;
            if let Some(counts_for_density) = extra.counts_for_density {
                row = row.with_density(counts_for_density);
            }
            signals.push(row);
        }

        Ok(DetectorConfig {
            window_size: phase.window_size,
            threshold: phase.threshold,
            density_threshold: phase.density_threshold,
            signals,
        })
    }
}

impl TranslationConfig {
    /// Get the active provider configuration from the available_providers array
    pub fn get_active_provider_config(&self) -> Option<&ProviderConfig> {
        let provider_str = self.provider.to_lowercase_string();
        self.available_providers.iter().find(|p| p.provider_type == provider_str)
    }

    /// Mutable access to the active provider's entry, created with defaults if missing
    pub fn active_provider_config_mut(&mut self) -> &mut ProviderConfig {
        let provider_str = self.provider.to_lowercase_string();
        let position = match self.available_providers.iter().position(|p| p.provider_type == provider_str) {
            Some(position) => position,
            None => {
                self.available_providers.push(ProviderConfig::new(self.provider.clone()));
                self.available_providers.len() - 1
            }
        };
        &mut self.available_providers[position]
    }

    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        match self.get_active_provider_config() {
            Some(config) if !config.model.is_empty() => config.model.clone(),
            _ => default_model(&self.provider),
        }
    }

    /// Get the API key for the active provider, falling back to its environment variable
    pub fn get_api_key(&self) -> String {
        if let Some(config) = self.get_active_provider_config() {
            if !config.api_key.is_empty() {
                return config.api_key.clone();
            }
        }

        self.provider
            .api_key_env_var()
            .and_then(|name| std::env::var(name).ok())
            .map(|key| key.trim().to_string())
            .unwrap_or_default()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        match self.get_active_provider_config() {
            Some(config) if !config.endpoint.is_empty() => config.endpoint.clone(),
            _ => default_endpoint(&self.provider),
        }
    }

    /// Get the request timeout for the active provider
    pub fn get_timeout_secs(&self) -> u64 {
        match self.get_active_provider_config() {
            Some(config) if config.timeout_secs > 0 => config.timeout_secs,
            _ => default_timeout_secs(),
        }
    }

    /// Get the rate limit for the active provider
    pub fn get_rate_limit(&self) -> Option<u32> {
        match self.get_active_provider_config() {
            Some(config) => config.rate_limit,
            None => default_rate_limit(&self.provider),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            available_providers: vec![
                ProviderConfig::new(TranslationProvider::Anthropic),
                ProviderConfig::new(TranslationProvider::OpenAI),
                ProviderConfig::new(TranslationProvider::Ollama),
                ProviderConfig::new(TranslationProvider::LMStudio),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
