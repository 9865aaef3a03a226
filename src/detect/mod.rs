//! Language identification and mixed-language segmentation
//!
//! # Architecture
//!
//! ```text
//!   text ──► script_of(c) per char ──► script counts ──┬─► non-Latin: script default
//!                                                      └─► Latin: n-gram profiles
//!
//!   segment_mixed: one pass, runs of the same script; Common chars
//!   (spaces, digits, punctuation) join the run they follow
//! ```
//!
//! Kanji inside text that also contains kana counts as Japanese rather than
//! Chinese.

mod ngram;
mod script;

use serde::{Deserialize, Serialize};

use crate::core::{Script, language_info};
pub use script::{is_significant, script_language, script_of};

/// Minimum share of letters a second script needs for text to count as mixed
pub const MIXED_SCRIPT_SHARE: f32 = 0.15;

/// Share assumed for Latin text no profile recognized
const UNRECOGNIZED_LATIN_SHARE: f32 = 0.5;

/// Result of [`LanguageDetector::detect`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub language: String,
    /// Normalized score in [0, 1]
    pub confidence: f32,
    /// `confidence` fell below the detector threshold
    pub low_confidence: bool,
    /// More than one script carries a significant share of the letters
    pub is_mixed: bool,
    pub script: Script,
}

/// A run of text in a single language
///
/// `start_index`/`end_index` are byte offsets into the original string with
/// `end_index` exclusive, so `&text[start_index..end_index] == segment.text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub language: String,
    pub text: String,
    pub start_index: usize,
    pub end_index: usize,
    pub script: Script,
}

/// Script and n-gram based language detector
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    threshold: f32,
    default_language: String,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl LanguageDetector {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
            default_language: "en-US".to_string(),
        }
    }

    /// Language reported when the text carries no signal at all
    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Detect the dominant language of `text`
    pub fn detect(&self, text: &str) -> Detection {
        let counts = script_counts(text);
        let total: usize = counts.iter().map(|(_, n)| n).sum();

        let Some(&(script, dominant)) = counts.iter().max_by_key(|(_, n)| *n) else {
            return Detection {
                language: self.default_language.clone(),
                confidence: 0.0,
                low_confidence: true,
                is_mixed: false,
                script: Script::Common,
            };
        };

        let dominant_share = dominant as f32 / total as f32;
        let significant = counts
            .iter()
            .filter(|(_, n)| *n as f32 / total as f32 >= MIXED_SCRIPT_SHARE)
            .count();

        let (language, language_share) = match script {
            Script::Latin => self.latin_language(text),
            other => (
                script_language(other)
                    .map(str::to_string)
                    .unwrap_or_else(|| self.default_language.clone()),
                1.0,
            ),
        };

        let confidence = (dominant_share * language_share).clamp(0.0, 1.0);
        let detection = Detection {
            language,
            confidence,
            low_confidence: confidence < self.threshold,
            is_mixed: significant > 1,
            script,
        };

        tracing::debug!(
            language = %detection.language,
            confidence = detection.confidence,
            is_mixed = detection.is_mixed,
            "Detected language"
        );
        detection
    }

    /// Split `text` into single-language segments
    ///
    /// Concatenating the segment texts in order reproduces `text` exactly.
    pub fn segment_mixed(&self, text: &str) -> Vec<Segment> {
        if text.is_empty() {
            return Vec::new();
        }
        let japanese = has_kana(text);

        // (script, start, end) byte ranges
        let mut runs: Vec<(Script, usize, usize)> = Vec::new();
        for (index, c) in text.char_indices() {
            let script = bucket(script_of(c), japanese);
            let end = index + c.len_utf8();

            if !is_significant(script) {
                if let Some(run) = runs.last_mut() {
                    run.2 = end;
                }
                continue;
            }
            match runs.last_mut() {
                Some(run) if run.0 == script => run.2 = end,
                Some(_) => runs.push((script, index, end)),
                // Leading Common characters belong to the first run
                None => runs.push((script, 0, end)),
            }
        }

        if runs.is_empty() {
            return vec![Segment {
                language: self.default_language.clone(),
                text: text.to_string(),
                start_index: 0,
                end_index: text.len(),
                script: Script::Common,
            }];
        }

        runs.into_iter()
            .map(|(script, start, end)| {
                let slice = &text[start..end];
                let language = match script {
                    Script::Latin => self.latin_language(slice).0,
                    other => script_language(other)
                        .map(str::to_string)
                        .unwrap_or_else(|| self.default_language.clone()),
                };
                Segment {
                    language,
                    text: slice.to_string(),
                    start_index: start,
                    end_index: end,
                    script,
                }
            })
            .collect()
    }

    /// Best Latin-script language and its share of the total score
    fn latin_language(&self, text: &str) -> (String, f32) {
        let scores = ngram::score_latin(text);
        let sum: f32 = scores.iter().map(|(_, s)| s).sum();
        let best = scores.iter().max_by(|a, b| a.1.total_cmp(&b.1));

        match best {
            Some(&(language, score)) if sum > 0.0 => (language.to_string(), score / sum),
            _ => {
                let default_is_latin = language_info(&self.default_language)
                    .is_some_and(|info| info.script == Script::Latin);
                let language = if default_is_latin {
                    self.default_language.clone()
                } else {
                    "en-US".to_string()
                };
                (language, UNRECOGNIZED_LATIN_SHARE)
            }
        }
    }
}

fn has_kana(text: &str) -> bool {
    text.chars().any(|c| script_of(c) == Script::Kana)
}

fn bucket(script: Script, japanese: bool) -> Script {
    if japanese && script == Script::Cjk {
        Script::Kana
    } else {
        script
    }
}

/// Letter counts per significant script, in first-seen order
fn script_counts(text: &str) -> Vec<(Script, usize)> {
    let japanese = has_kana(text);
    let mut counts: Vec<(Script, usize)> = Vec::new();
    for c in text.chars() {
        let script = bucket(script_of(c), japanese);
        if !is_significant(script) {
            continue;
        }
        match counts.iter_mut().find(|(s, _)| *s == script) {
            Some((_, n)) => *n += 1,
            None => counts.push((script, 1)),
        }
    }
    counts
}
