//! Environment variable loading
//!
//! Every option maps to a `PHONEMIZER_*` variable. Unset variables leave the
//! current value untouched; malformed values are configuration errors.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use super::PhonemizerConfig;
use crate::errors::{PhonemizerError, PhonemizerResult};

/// Read and parse an optional environment variable
fn parse_env<T>(key: &str) -> PhonemizerResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| PhonemizerError::Configuration(format!("{key}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse booleans the way operators write them in `.env` files
fn parse_bool_env(key: &str) -> PhonemizerResult<Option<bool>> {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            other => Err(PhonemizerError::Configuration(format!(
                "{key}: expected a boolean, got '{other}'"
            ))),
        },
        Err(_) => Ok(None),
    }
}

/// Parse `PHONEMIZER_FALLBACK_CHAINS`: `pt-BR=pt-PT,es-ES;xx-XX=en-US`
pub(super) fn parse_fallback_chains(raw: &str) -> PhonemizerResult<HashMap<String, Vec<String>>> {
    let mut chains = HashMap::new();
    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (language, chain) = entry.split_once('=').ok_or_else(|| {
            PhonemizerError::Configuration(format!("fallback chain '{entry}' is missing '='"))
        })?;
        let chain: Vec<String> = chain
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
        chains.insert(language.trim().to_string(), chain);
    }
    Ok(chains)
}

/// Overlay environment variables onto `config`
pub(super) fn apply_env(config: &mut PhonemizerConfig) -> PhonemizerResult<()> {
    if let Some(path) = parse_env::<String>("PHONEMIZER_DATA_PATH")? {
        config.data_path = Some(PathBuf::from(path));
    }
    if let Some(v) = parse_bool_env("PHONEMIZER_INCLUDE_STRESS")? {
        config.include_stress = v;
    }
    if let Some(v) = parse_bool_env("PHONEMIZER_INCLUDE_DURATIONS")? {
        config.include_durations = v;
    }
    if let Some(v) = parse_bool_env("PHONEMIZER_INCLUDE_WORD_BOUNDARIES")? {
        config.include_word_boundaries = v;
    }
    if let Some(v) = parse_env("PHONEMIZER_FAILURE_THRESHOLD")? {
        config.failure_threshold = v;
    }
    if let Some(v) = parse_env("PHONEMIZER_RESET_TIMEOUT_MS")? {
        config.reset_timeout_ms = v;
    }
    if let Some(v) = parse_env("PHONEMIZER_HALF_OPEN_MAX_CALLS")? {
        config.half_open_max_calls = v;
    }
    if let Some(v) = parse_env("PHONEMIZER_CACHE_MAX_ENTRIES")? {
        config.cache_max_entries = v;
    }
    if let Some(v) = parse_env("PHONEMIZER_CACHE_MAX_BYTES")? {
        config.cache_max_bytes = v;
    }
    if let Some(v) = parse_env("PHONEMIZER_POOL_SIZE")? {
        config.pool_size = v;
    }
    if let Some(v) = parse_env("PHONEMIZER_LTS_MEMO_CAPACITY")? {
        config.lts_memo_capacity = v;
    }
    if let Some(v) = parse_env("PHONEMIZER_DETECTION_THRESHOLD")? {
        config.detection_threshold = v;
    }
    if let Some(v) = parse_env::<String>("PHONEMIZER_DEFAULT_LANGUAGE")? {
        config.default_language = v;
    }
    if let Some(v) = parse_env("PHONEMIZER_SPEECH_RATE")? {
        config.speech_rate = v;
    }
    if let Some(raw) = parse_env::<String>("PHONEMIZER_FALLBACK_CHAINS")? {
        config.fallback_chains.extend(parse_fallback_chains(&raw)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for (key, _) in std::env::vars() {
            if key.starts_with("PHONEMIZER_") {
                // SAFETY: tests touching the environment are serialized
                unsafe { std::env::remove_var(key) };
            }
        }
    }

    #[test]
    fn test_parse_fallback_chains() {
        let chains = parse_fallback_chains("pt-BR=pt-PT,es-ES; xx-XX = en-US ;").unwrap();
        assert_eq!(chains.len(), 2);
        assert_eq!(chains["pt-BR"], vec!["pt-PT", "es-ES"]);
        assert_eq!(chains["xx-XX"], vec!["en-US"]);
    }

    #[test]
    fn test_parse_fallback_chains_rejects_missing_separator() {
        assert!(parse_fallback_chains("pt-BR").is_err());
    }

    #[test]
    #[serial]
    fn test_apply_env_overrides() {
        clear_env();
        unsafe {
            std::env::set_var("PHONEMIZER_FAILURE_THRESHOLD", "7");
            std::env::set_var("PHONEMIZER_INCLUDE_STRESS", "yes");
            std::env::set_var("PHONEMIZER_DATA_PATH", "/data/phonemizer");
            std::env::set_var("PHONEMIZER_FALLBACK_CHAINS", "xx-XX=en-US");
        }

        let mut config = PhonemizerConfig::default();
        apply_env(&mut config).unwrap();
        clear_env();

        assert_eq!(config.failure_threshold, 7);
        assert!(config.include_stress);
        assert_eq!(config.data_path, Some(PathBuf::from("/data/phonemizer")));
        assert_eq!(config.fallback_chains["xx-XX"], vec!["en-US"]);
    }

    #[test]
    #[serial]
    fn test_apply_env_rejects_garbage() {
        clear_env();
        unsafe { std::env::set_var("PHONEMIZER_CACHE_MAX_ENTRIES", "lots") };

        let mut config = PhonemizerConfig::default();
        let result = apply_env(&mut config);
        clear_env();

        assert!(matches!(result, Err(PhonemizerError::Configuration(_))));
    }

    #[test]
    #[serial]
    fn test_apply_env_without_variables_keeps_defaults() {
        clear_env();
        let mut config = PhonemizerConfig::default();
        apply_env(&mut config).unwrap();
        assert_eq!(config, PhonemizerConfig::default());
    }
}
