//! WaaV Phonemizer
//!
//! Multilingual text-to-phoneme conversion for speech synthesis front ends.
//!
//! ```rust,no_run
//! use waav_phonemizer::{PhonemizationService, PhonemizerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let service = PhonemizationService::new(PhonemizerConfig::from_env()?).await?;
//! let result = service.phonemize("hello world", Some("en-US")).await;
//! println!("{}", result.to_phoneme_string());
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod cache;
pub mod config;
pub mod core;
pub mod detect;
pub mod dictionary;
pub mod errors;
pub mod lts;
pub mod resilience;
pub mod router;
pub mod service;
pub mod text;

// Re-export commonly used items for convenience
pub use cache::{CacheStats, ResultCache};
pub use config::PhonemizerConfig;
pub use core::*;
pub use detect::{Detection, LanguageDetector, Segment};
pub use dictionary::PronunciationDictionary;
pub use errors::{PhonemizerError, PhonemizerResult};
pub use lts::LetterToSoundEngine;
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState, ResilientBackend};
pub use router::{BackendRouter, LanguageCapabilities};
pub use service::{MetricsSnapshot, PhonemizationService};
