pub mod backend;
pub mod language;
pub mod result;
pub mod timing;

pub use backend::{BackendCapabilities, PhonemeFormat, PhonemeOptions, PhonemizerBackend};
pub use language::{
    AUTO_LANGUAGE, LanguageInfo, MIXED_LANGUAGE, Script, canonicalize, language_info,
    primary_subtag, similarity,
};
pub use result::{FallbackInfo, FallbackReason, PhonemeResult, PhonemeResultBuilder};
