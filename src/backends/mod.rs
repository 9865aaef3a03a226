//! Language backends
//!
//! Built-in backends register a [`BackendConstructor`] with `inventory`
//! at link time; [`builtin_constructors`] walks them in name order so router
//! construction is deterministic.
//!
//! # Backends
//!
//! - `english`: CMU-style dictionary with letter-to-sound fallback
//! - `chinese`: pinyin lookup, tone sandhi, IPA mapping
//! - `korean`: Hangul decomposition with liaison and final neutralization
//! - `spanish`: rule-based G2P with dialect variants
//! - [`external::ExternalBackend`]: adapter for third-party phonemizers

pub mod chinese;
pub mod english;
pub mod external;
pub mod korean;
pub mod spanish;

use std::sync::Arc;

use crate::config::PhonemizerConfig;
use crate::core::PhonemizerBackend;
use crate::dictionary::PronunciationDictionary;
use crate::errors::PhonemizerResult;

pub use chinese::ChineseBackend;
pub use english::EnglishBackend;
pub use external::{ExternalBackend, ExternalPhonemizer, ExternalSymbol};
pub use korean::KoreanBackend;
pub use spanish::SpanishBackend;

/// Shared resources handed to backend factories
#[derive(Clone)]
pub struct BackendContext<'a> {
    pub config: &'a PhonemizerConfig,
    /// Dictionary shared with the service so reloads reach the backend
    pub dictionary: Arc<PronunciationDictionary>,
}

/// Factory function pointer for a built-in backend
pub type BackendFactory = fn(&BackendContext<'_>) -> PhonemizerResult<Box<dyn PhonemizerBackend>>;

/// Link-time registration record for a built-in backend
pub struct BackendConstructor {
    pub name: &'static str,
    pub create: BackendFactory,
}

impl BackendConstructor {
    pub const fn new(name: &'static str, create: BackendFactory) -> Self {
        Self { name, create }
    }
}

inventory::collect!(BackendConstructor);

/// All registered built-in backends, sorted by name
pub fn builtin_constructors() -> Vec<&'static BackendConstructor> {
    let mut constructors = Vec::new();
    for constructor in inventory::iter::<BackendConstructor> {
        constructors.push(constructor);
    }
    constructors.sort_by_key(|c| c.name);
    constructors
}

/// Find a built-in backend constructor by name
pub fn builtin_constructor(name: &str) -> Option<&'static BackendConstructor> {
    builtin_constructors()
        .into_iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
}

// ============================================================================
// Built-in Registrations
// ============================================================================

fn create_english(ctx: &BackendContext<'_>) -> PhonemizerResult<Box<dyn PhonemizerBackend>> {
    Ok(Box::new(EnglishBackend::new(
        ctx.dictionary.clone(),
        ctx.config.lts_memo_capacity,
    )))
}

fn create_chinese(_ctx: &BackendContext<'_>) -> PhonemizerResult<Box<dyn PhonemizerBackend>> {
    Ok(Box::new(ChineseBackend::new()))
}

fn create_korean(_ctx: &BackendContext<'_>) -> PhonemizerResult<Box<dyn PhonemizerBackend>> {
    Ok(Box::new(KoreanBackend::new()))
}

fn create_spanish(_ctx: &BackendContext<'_>) -> PhonemizerResult<Box<dyn PhonemizerBackend>> {
    Ok(Box::new(SpanishBackend::new()))
}

inventory::submit! {
    BackendConstructor::new("english", create_english)
}

inventory::submit! {
    BackendConstructor::new("chinese", create_chinese)
}

inventory::submit! {
    BackendConstructor::new("korean", create_korean)
}

inventory::submit! {
    BackendConstructor::new("spanish", create_spanish)
}
