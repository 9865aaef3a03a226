//! Letter-to-sound conversion
//!
//! Context-sensitive rule traversal for words absent from the pronunciation
//! dictionary. Rule graphs live in a flat, bounds-checked arena
//! ([`LtsRuleSet`]); [`LetterToSoundEngine`] walks them one letter at a time
//! over a 4+4 character window and memoizes whole words.

pub mod engine;
pub mod english;
pub mod rules;

pub use engine::{DEFAULT_LETTER_PHONES, LetterToSoundEngine, LtsStats, MAX_TRAVERSAL_STEPS};
pub use english::english_rule_set;
pub use rules::{LtsContext, LtsRule, LtsRuleSet, RuleSetBuilder};
