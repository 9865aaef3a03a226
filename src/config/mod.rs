//! Configuration module for the phonemizer
//!
//! Configuration comes from several sources. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading (`PHONEMIZER_*`)
//!
//! # Example
//! ```rust,no_run
//! use waav_phonemizer::config::PhonemizerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = PhonemizerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config = PhonemizerConfig::from_file(&PathBuf::from("phonemizer.yaml"))?;
//! println!("cache bound: {} entries", config.cache_max_entries);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod env;
mod yaml;

pub use yaml::{
    CacheYaml, DetectionYaml, LtsYaml, OutputYaml, ResilienceYaml, YamlConfig,
};

use crate::core::{PhonemeFormat, PhonemeOptions};
use crate::errors::{PhonemizerError, PhonemizerResult};
use crate::resilience::CircuitBreakerConfig;

/// Default number of consecutive failures before a circuit opens
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
/// Default time an open circuit waits before probing
pub const DEFAULT_RESET_TIMEOUT_MS: u64 = 30_000;
/// Default result cache entry bound
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 1000;
/// Default result cache memory bound (10 MiB)
pub const DEFAULT_CACHE_MAX_BYTES: usize = 10 * 1024 * 1024;
/// Default LTS word memo capacity
pub const DEFAULT_LTS_MEMO_CAPACITY: usize = 5000;

/// Phonemizer configuration
///
/// Holds every tunable the engine recognizes. Construct with [`Default`],
/// [`PhonemizerConfig::from_env`] or [`PhonemizerConfig::from_file`].
#[derive(Debug, Clone, PartialEq)]
pub struct PhonemizerConfig {
    /// Override location for dictionaries and rule data
    pub data_path: Option<PathBuf>,
    /// Emit per-phoneme stress values
    pub include_stress: bool,
    /// Emit per-phoneme duration estimates
    pub include_durations: bool,
    /// Emit word boundary indices
    pub include_word_boundaries: bool,
    /// Consecutive failures before a backend circuit opens
    pub failure_threshold: u32,
    /// Time an open circuit waits before allowing a probe
    pub reset_timeout_ms: u64,
    /// Trial calls admitted while half-open
    pub half_open_max_calls: u32,
    /// Result cache entry bound
    pub cache_max_entries: usize,
    /// Result cache memory bound in bytes
    pub cache_max_bytes: usize,
    /// Instances per pool for backends that are not thread-safe
    pub pool_size: usize,
    /// LTS word memo capacity
    pub lts_memo_capacity: usize,
    /// Detector confidence below which a result is flagged low-confidence
    pub detection_threshold: f32,
    /// Language used when detection finds nothing usable
    pub default_language: String,
    /// Speech rate divisor for duration estimates (1.0 = normal)
    pub speech_rate: f32,
    /// Extra fallback chains, keyed by requested language
    pub fallback_chains: HashMap<String, Vec<String>>,
}

impl Default for PhonemizerConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            include_stress: false,
            include_durations: false,
            include_word_boundaries: true,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout_ms: DEFAULT_RESET_TIMEOUT_MS,
            half_open_max_calls: 1,
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cache_max_bytes: DEFAULT_CACHE_MAX_BYTES,
            pool_size: 2,
            lts_memo_capacity: DEFAULT_LTS_MEMO_CAPACITY,
            detection_threshold: 0.5,
            default_language: "en-US".to_string(),
            speech_rate: 1.0,
            fallback_chains: HashMap::new(),
        }
    }
}

impl PhonemizerConfig {
    /// Load configuration from `.env` and `PHONEMIZER_*` environment variables
    pub fn from_env() -> PhonemizerResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        env::apply_env(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, layered over environment values
    pub fn from_file(path: &Path) -> PhonemizerResult<Self> {
        dotenvy::dotenv().ok();

        let yaml = YamlConfig::from_file(path)?;
        let mut config = Self::default();
        env::apply_env(&mut config)?;
        yaml.apply_to(&mut config);
        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded phonemizer configuration");
        Ok(config)
    }

    /// Reject values the engine cannot operate with
    pub fn validate(&self) -> PhonemizerResult<()> {
        if self.failure_threshold == 0 {
            return Err(PhonemizerError::Configuration(
                "failure_threshold must be at least 1".to_string(),
            ));
        }
        if self.half_open_max_calls == 0 {
            return Err(PhonemizerError::Configuration(
                "half_open_max_calls must be at least 1".to_string(),
            ));
        }
        if self.pool_size == 0 {
            return Err(PhonemizerError::Configuration(
                "pool_size must be at least 1".to_string(),
            ));
        }
        if !self.speech_rate.is_finite() || self.speech_rate <= 0.0 {
            return Err(PhonemizerError::Configuration(format!(
                "speech_rate must be positive, got {}",
                self.speech_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.detection_threshold) {
            return Err(PhonemizerError::Configuration(format!(
                "detection_threshold must be within [0, 1], got {}",
                self.detection_threshold
            )));
        }
        if self.default_language.trim().is_empty() {
            return Err(PhonemizerError::Configuration(
                "default_language must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Reset timeout as a [`Duration`]
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }

    /// Circuit breaker settings derived from this configuration
    pub fn circuit_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            reset_timeout: self.reset_timeout(),
            half_open_max_calls: self.half_open_max_calls,
        }
    }

    /// Default per-call options derived from this configuration
    pub fn phoneme_options(&self) -> PhonemeOptions {
        PhonemeOptions {
            include_stress: self.include_stress,
            include_tones: true,
            include_durations: self.include_durations,
            include_word_boundaries: self.include_word_boundaries,
            normalize_text: true,
            use_lts_fallback: true,
            speech_rate: self.speech_rate,
            format: PhonemeFormat::Native,
            ..Default::default()
        }
    }

    /// Resolve a file under the data path, if one is configured
    pub fn data_file(&self, name: &str) -> Option<PathBuf> {
        self.data_path.as_ref().map(|dir| dir.join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PhonemizerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.reset_timeout(), Duration::from_secs(30));
        assert_eq!(config.cache_max_entries, 1000);
        assert_eq!(config.cache_max_bytes, 10 * 1024 * 1024);
        assert!(config.include_word_boundaries);
        assert!(!config.include_stress);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let config = PhonemizerConfig {
            failure_threshold: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PhonemizerError::Configuration(_)));
    }

    #[test]
    fn test_validate_rejects_bad_speech_rate() {
        let config = PhonemizerConfig {
            speech_rate: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = PhonemizerConfig {
            speech_rate: f32::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let config = PhonemizerConfig {
            detection_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_circuit_config_mapping() {
        let config = PhonemizerConfig {
            failure_threshold: 3,
            reset_timeout_ms: 250,
            ..Default::default()
        };
        let circuit = config.circuit_config();
        assert_eq!(circuit.failure_threshold, 3);
        assert_eq!(circuit.reset_timeout, Duration::from_millis(250));
        assert_eq!(circuit.half_open_max_calls, 1);
    }

    #[test]
    fn test_phoneme_options_follow_config() {
        let config = PhonemizerConfig {
            include_stress: true,
            include_durations: true,
            speech_rate: 1.5,
            ..Default::default()
        };
        let options = config.phoneme_options();
        assert!(options.include_stress);
        assert!(options.include_durations);
        assert_eq!(options.speech_rate, 1.5);
    }

    #[test]
    fn test_data_file() {
        let config = PhonemizerConfig {
            data_path: Some(PathBuf::from("/opt/phonemizer")),
            ..Default::default()
        };
        assert_eq!(
            config.data_file("cmudict.txt"),
            Some(PathBuf::from("/opt/phonemizer/cmudict.txt"))
        );
        assert_eq!(PhonemizerConfig::default().data_file("x"), None);
    }
}
