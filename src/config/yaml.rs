use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::PhonemizerConfig;
use crate::errors::{PhonemizerError, PhonemizerResult};

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration. Values present in
/// the file override environment variables and defaults.
///
/// # Example YAML structure
/// ```yaml
/// data_path: "/opt/waav/phonemizer"
/// default_language: "en-US"
///
/// output:
///   include_stress: true
///   include_durations: false
///   include_word_boundaries: true
///   speech_rate: 1.0
///
/// resilience:
///   failure_threshold: 5
///   reset_timeout_ms: 30000
///   half_open_max_calls: 1
///   pool_size: 2
///
/// cache:
///   max_entries: 1000
///   max_bytes: 10485760
///
/// lts:
///   memo_capacity: 5000
///
/// detection:
///   threshold: 0.5
///
/// fallback_chains:
///   xx-XX: ["en-US"]
///   pt-BR: ["pt-PT", "es-ES", "en-US"]
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub data_path: Option<String>,
    pub default_language: Option<String>,
    pub output: Option<OutputYaml>,
    pub resilience: Option<ResilienceYaml>,
    pub cache: Option<CacheYaml>,
    pub lts: Option<LtsYaml>,
    pub detection: Option<DetectionYaml>,
    #[serde(default)]
    pub fallback_chains: HashMap<String, Vec<String>>,
}

/// Output annotation settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct OutputYaml {
    pub include_stress: Option<bool>,
    pub include_durations: Option<bool>,
    pub include_word_boundaries: Option<bool>,
    /// 1.0 = normal, 0.5 = slow, 2.0 = fast
    pub speech_rate: Option<f32>,
}

/// Circuit breaker and pool settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ResilienceYaml {
    pub failure_threshold: Option<u32>,
    pub reset_timeout_ms: Option<u64>,
    pub half_open_max_calls: Option<u32>,
    pub pool_size: Option<usize>,
}

/// Result cache settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CacheYaml {
    pub max_entries: Option<usize>,
    pub max_bytes: Option<usize>,
}

/// Letter-to-sound settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LtsYaml {
    pub memo_capacity: Option<usize>,
}

/// Language detection settings from YAML
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DetectionYaml {
    pub threshold: Option<f32>,
}

impl YamlConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> PhonemizerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PhonemizerError::Configuration(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            PhonemizerError::Configuration(format!("Failed to parse YAML config: {e}"))
        })
    }

    /// Overlay every value present in the file onto `config`
    pub fn apply_to(&self, config: &mut PhonemizerConfig) {
        if let Some(path) = &self.data_path {
            config.data_path = Some(PathBuf::from(path));
        }
        if let Some(language) = &self.default_language {
            config.default_language = language.clone();
        }
        if let Some(output) = &self.output {
            if let Some(v) = output.include_stress {
                config.include_stress = v;
            }
            if let Some(v) = output.include_durations {
                config.include_durations = v;
            }
            if let Some(v) = output.include_word_boundaries {
                config.include_word_boundaries = v;
            }
            if let Some(v) = output.speech_rate {
                config.speech_rate = v;
            }
        }
        if let Some(resilience) = &self.resilience {
            if let Some(v) = resilience.failure_threshold {
                config.failure_threshold = v;
            }
            if let Some(v) = resilience.reset_timeout_ms {
                config.reset_timeout_ms = v;
            }
            if let Some(v) = resilience.half_open_max_calls {
                config.half_open_max_calls = v;
            }
            if let Some(v) = resilience.pool_size {
                config.pool_size = v;
            }
        }
        if let Some(cache) = &self.cache {
            if let Some(v) = cache.max_entries {
                config.cache_max_entries = v;
            }
            if let Some(v) = cache.max_bytes {
                config.cache_max_bytes = v;
            }
        }
        if let Some(v) = self.lts.as_ref().and_then(|l| l.memo_capacity) {
            config.lts_memo_capacity = v;
        }
        if let Some(v) = self.detection.as_ref().and_then(|d| d.threshold) {
            config.detection_threshold = v;
        }
        for (language, chain) in &self.fallback_chains {
            config
                .fallback_chains
                .insert(language.clone(), chain.clone());
        }
    }
}
