use parking_lot::Mutex;
use phf::phf_map;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::english::english_rule_set;
use super::rules::{BOUNDARY, CONTEXT_WIDTH, LtsContext, LtsRuleSet};
use crate::config::DEFAULT_LTS_MEMO_CAPACITY;
use crate::errors::{PhonemizerError, PhonemizerResult};

/// Traversal steps allowed per letter before giving up on the rule graph
pub const MAX_TRAVERSAL_STEPS: usize = 256;

/// Single-letter fallback used when the rule graph cannot answer
pub static DEFAULT_LETTER_PHONES: phf::Map<u8, &'static [&'static str]> = phf_map! {
    b'a' => &["ae1"],
    b'b' => &["b"],
    b'c' => &["k"],
    b'd' => &["d"],
    b'e' => &["eh1"],
    b'f' => &["f"],
    b'g' => &["g"],
    b'h' => &["hh"],
    b'i' => &["ih1"],
    b'j' => &["jh"],
    b'k' => &["k"],
    b'l' => &["l"],
    b'm' => &["m"],
    b'n' => &["n"],
    b'o' => &["aa1"],
    b'p' => &["p"],
    b'q' => &["k", "w"],
    b'r' => &["r"],
    b's' => &["s"],
    b't' => &["t"],
    b'u' => &["ah1"],
    b'v' => &["v"],
    b'w' => &["w"],
    b'x' => &["k", "s"],
    b'y' => &["y"],
    b'z' => &["z"],
};

/// Outcome of walking one letter's rule graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Traversal<'a> {
    Emit(&'a str),
    Silent,
}

/// Counters exposed for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LtsStats {
    pub memo_hits: u64,
    pub memo_misses: u64,
    /// Letters resolved through the default table instead of the graph
    pub default_fallbacks: u64,
}

/// Oldest-first bounded word memo
#[derive(Debug, Default)]
struct WordMemo {
    entries: HashMap<String, Arc<[String]>>,
    order: VecDeque<String>,
}

/// Rule-driven converter for words missing from the dictionary
///
/// Conversion is synchronous and bounded per letter. Converted words are
/// memoized; the memo evicts oldest entries first once over capacity.
#[derive(Debug)]
pub struct LetterToSoundEngine {
    rules: Arc<LtsRuleSet>,
    memo: Mutex<WordMemo>,
    capacity: usize,
    memo_hits: AtomicU64,
    memo_misses: AtomicU64,
    default_fallbacks: AtomicU64,
}

impl LetterToSoundEngine {
    pub fn new(rules: Arc<LtsRuleSet>) -> Self {
        Self::with_capacity(rules, DEFAULT_LTS_MEMO_CAPACITY)
    }

    pub fn with_capacity(rules: Arc<LtsRuleSet>, capacity: usize) -> Self {
        Self {
            rules,
            memo: Mutex::new(WordMemo::default()),
            capacity,
            memo_hits: AtomicU64::new(0),
            memo_misses: AtomicU64::new(0),
            default_fallbacks: AtomicU64::new(0),
        }
    }

    /// Engine over the built-in English rules
    pub fn english(capacity: usize) -> PhonemizerResult<Self> {
        Ok(Self::with_capacity(Arc::new(english_rule_set()?), capacity))
    }

    pub fn rules(&self) -> &Arc<LtsRuleSet> {
        &self.rules
    }

    /// Convert a word to phonemes
    ///
    /// Never fails: letters the graph cannot resolve use
    /// [`DEFAULT_LETTER_PHONES`]. Any word with at least one Latin letter
    /// produces a non-empty sequence.
    pub fn apply(&self, word: &str) -> Vec<String> {
        let key = word.trim().to_lowercase();
        if key.is_empty() {
            return Vec::new();
        }

        if let Some(hit) = self.memo.lock().entries.get(&key) {
            self.memo_hits.fetch_add(1, Ordering::Relaxed);
            return hit.to_vec();
        }
        self.memo_misses.fetch_add(1, Ordering::Relaxed);

        let phonemes = self.convert(&key);
        self.remember(key, &phonemes);
        phonemes
    }

    /// Convert without touching the memo
    pub fn convert(&self, word: &str) -> Vec<String> {
        let letters: Vec<u8> = word.chars().filter_map(fold_letter).collect();
        if letters.is_empty() {
            return Vec::new();
        }

        let mut padded = Vec::with_capacity(letters.len() + 2 * CONTEXT_WIDTH);
        padded.extend(std::iter::repeat_n(BOUNDARY, CONTEXT_WIDTH));
        padded.extend_from_slice(&letters);
        padded.extend(std::iter::repeat_n(BOUNDARY, CONTEXT_WIDTH));

        let mut phonemes = Vec::with_capacity(letters.len());
        for position in CONTEXT_WIDTH..CONTEXT_WIDTH + letters.len() {
            let context = LtsContext::new(&padded, position);
            match self.traverse(&context) {
                Ok(Traversal::Emit(phone)) => {
                    phonemes.extend(phone.split('-').map(String::from));
                }
                Ok(Traversal::Silent) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Letter-to-sound rules failed, using default letter");
                    self.push_default(context.current(), &mut phonemes);
                }
            }
        }

        if phonemes.is_empty() {
            // Every letter was silent in context; spell the word instead
            for &letter in &letters {
                self.push_default(letter, &mut phonemes);
            }
        }
        phonemes
    }

    fn push_default(&self, letter: u8, out: &mut Vec<String>) {
        self.default_fallbacks.fetch_add(1, Ordering::Relaxed);
        if let Some(phones) = DEFAULT_LETTER_PHONES.get(&letter) {
            out.extend(phones.iter().map(|p| p.to_string()));
        }
    }

    /// Walk the rule graph for the current letter
    fn traverse(&self, context: &LtsContext) -> PhonemizerResult<Traversal<'_>> {
        let letter = context.current();
        let mut index = self.rules.start_index(letter).ok_or_else(|| {
            PhonemizerError::InvalidRuleTable(format!("no rules for letter '{}'", letter as char))
        })?;

        for _ in 0..MAX_TRAVERSAL_STEPS {
            let rule = self.rules.rule(index).ok_or_else(|| {
                PhonemizerError::InvalidRuleTable(format!("jump to missing node {index}"))
            })?;
            if rule.is_terminal() {
                return Ok(match self.rules.phone(rule.test_value) {
                    Some(phone) => Traversal::Emit(phone),
                    None => Traversal::Silent,
                });
            }
            let value = context.feature(rule.feature_id).ok_or_else(|| {
                PhonemizerError::InvalidRuleTable(format!(
                    "node {index} tests unknown feature {}",
                    rule.feature_id
                ))
            })?;
            index = if value == rule.test_value {
                rule.next_if_true
            } else {
                rule.next_if_false
            };
        }

        Err(PhonemizerError::RuleTraversalExceeded {
            letter: letter as char,
            limit: MAX_TRAVERSAL_STEPS,
        })
    }

    fn remember(&self, key: String, phonemes: &[String]) {
        if self.capacity == 0 {
            return;
        }
        let mut memo = self.memo.lock();
        if memo.entries.contains_key(&key) {
            return;
        }
        memo.entries.insert(key.clone(), Arc::from(phonemes));
        memo.order.push_back(key);
        while memo.entries.len() > self.capacity {
            match memo.order.pop_front() {
                Some(oldest) => {
                    memo.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn memo_len(&self) -> usize {
        self.memo.lock().entries.len()
    }

    pub fn clear_memo(&self) {
        let mut memo = self.memo.lock();
        memo.entries.clear();
        memo.order.clear();
    }

    pub fn stats(&self) -> LtsStats {
        LtsStats {
            memo_hits: self.memo_hits.load(Ordering::Relaxed),
            memo_misses: self.memo_misses.load(Ordering::Relaxed),
            default_fallbacks: self.default_fallbacks.load(Ordering::Relaxed),
        }
    }

    pub fn memory_usage(&self) -> usize {
        let memo = self.memo.lock();
        let memo_bytes: usize = memo
            .entries
            .iter()
            .map(|(k, v)| 2 * k.len() + v.iter().map(|p| p.len() + 24).sum::<usize>() + 64)
            .sum();
        self.rules.memory_usage() + memo_bytes
    }
}

/// Lower-case ASCII letter for `c`, folding common Latin accents
fn fold_letter(c: char) -> Option<u8> {
    let c = c.to_lowercase().next().unwrap_or(c);
    let folded = match c {
        'a'..='z' => c,
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(folded as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lts::rules::{LtsRule, RuleSetBuilder};

    fn engine() -> LetterToSoundEngine {
        LetterToSoundEngine::english(100).unwrap()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_cat() {
        assert_eq!(engine().apply("cat"), strings(&["k", "ae1", "t"]));
    }

    #[test]
    fn test_unpronounceable_word_is_non_empty() {
        let phonemes = engine().apply("zxqvb");
        assert_eq!(phonemes, strings(&["z", "k", "s", "k", "w", "v", "b"]));
    }

    #[test]
    fn test_digraphs() {
        let engine = engine();
        assert_eq!(engine.apply("ship"), strings(&["sh", "ih1", "p"]));
        assert_eq!(engine.apply("chat"), strings(&["ch", "ae1", "t"]));
        assert_eq!(engine.apply("phone"), strings(&["f", "ow1", "n"]));
    }

    #[test]
    fn test_magic_e() {
        let engine = engine();
        assert_eq!(engine.apply("make"), strings(&["m", "ey1", "k"]));
        assert_eq!(engine.apply("bike"), strings(&["b", "ay1", "k"]));
    }

    #[test]
    fn test_soft_c_and_silent_k() {
        let engine = engine();
        assert_eq!(engine.apply("city")[0], "s");
        assert_eq!(engine.apply("knot"), strings(&["n", "aa1", "t"]));
    }

    #[test]
    fn test_case_and_accents_fold() {
        let engine = engine();
        assert_eq!(engine.apply("CAT"), engine.apply("cat"));
        assert_eq!(engine.apply("café"), engine.apply("cafe"));
    }

    #[test]
    fn test_non_letters_produce_nothing() {
        let engine = engine();
        assert!(engine.apply("").is_empty());
        assert!(engine.apply("123").is_empty());
        assert!(engine.apply("日本").is_empty());
    }

    #[test]
    fn test_every_single_letter_is_non_empty() {
        let engine = engine();
        for letter in 'a'..='z' {
            assert!(!engine.apply(&letter.to_string()).is_empty(), "{letter}");
        }
    }

    #[test]
    fn test_all_silent_word_is_spelled() {
        let mut builder = RuleSetBuilder::new();
        builder.rule(b'h', "", "", "");
        let engine = LetterToSoundEngine::new(Arc::new(builder.build().unwrap()));
        assert_eq!(engine.apply("hh"), strings(&["hh", "hh"]));
    }

    #[test]
    fn test_cyclic_table_hits_bound_and_falls_back() {
        // node 0 loops onto itself forever
        let rules = vec![LtsRule::test(0, b'q', 0, 0)];
        let letters = HashMap::from([(b'q', 0u32)]);
        let set = LtsRuleSet::new(rules, letters, vec![String::new()]).unwrap();
        let engine = LetterToSoundEngine::new(Arc::new(set));

        assert_eq!(engine.apply("q"), strings(&["k", "w"]));
        assert_eq!(engine.stats().default_fallbacks, 1);
    }

    #[test]
    fn test_missing_letter_falls_back() {
        let mut builder = RuleSetBuilder::new();
        builder.rule(b'a', "", "", "ae1");
        let engine = LetterToSoundEngine::new(Arc::new(builder.build().unwrap()));
        assert_eq!(engine.apply("at"), strings(&["ae1", "t"]));
    }

    #[test]
    fn test_memo_hits_and_fifo_eviction() {
        let engine = LetterToSoundEngine::english(2).unwrap();
        engine.apply("cat");
        engine.apply("cat");
        assert_eq!(engine.stats().memo_hits, 1);

        engine.apply("dog");
        engine.apply("fish");
        assert_eq!(engine.memo_len(), 2);

        // "cat" was oldest and is recomputed
        engine.apply("cat");
        assert_eq!(engine.stats().memo_misses, 4);
    }

    #[test]
    fn test_zero_capacity_disables_memo() {
        let engine = LetterToSoundEngine::english(0).unwrap();
        engine.apply("cat");
        assert_eq!(engine.memo_len(), 0);
    }

    #[test]
    fn test_clear_memo() {
        let engine = engine();
        engine.apply("cat");
        engine.clear_memo();
        assert_eq!(engine.memo_len(), 0);
        assert!(engine.memory_usage() > 0);
    }
}
