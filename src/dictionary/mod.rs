//! Pronunciation dictionary
//!
//! Word → phoneme-sequence tables, one per language key.
//!
//! # Architecture
//!
//! ```text
//!   ArcSwap<HashMap<language, Arc<WordTable>>>
//!                                  │
//!                 ┌────────────────┴────────────────┐
//!                 │ base: Arc<HashMap>  (from load) │
//!                 │ overrides: Arc<HashMap> (add)   │
//!                 └─────────────────────────────────┘
//! ```
//!
//! Lookups load the current snapshot without locking. `load` and `add_word`
//! serialize on a writer mutex, build a new snapshot and swap it in. A reload
//! replaces the language's whole table, overrides included; `add_word` copies
//! only the small override map.
//!
//! # File format
//!
//! UTF-8 text, one entry per line: `WORD  phoneme1 phoneme2 ...`. Lines
//! starting with `#` (or `;;;`, as in CMUdict) are comments. Alternate
//! pronunciations written as `WORD(2)` are skipped so the first one wins.

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::errors::{PhonemizerError, PhonemizerResult};

type Entries = HashMap<String, Arc<[String]>>;

#[derive(Debug, Default)]
struct WordTable {
    base: Arc<Entries>,
    overrides: Arc<Entries>,
}

impl WordTable {
    fn get(&self, word: &str) -> Option<&Arc<[String]>> {
        self.overrides.get(word).or_else(|| self.base.get(word))
    }

    fn len(&self) -> usize {
        self.base.len()
            + self
                .overrides
                .keys()
                .filter(|k| !self.base.contains_key(*k))
                .count()
    }
}

/// Case-insensitive pronunciation dictionary keyed by language
#[derive(Debug, Default)]
pub struct PronunciationDictionary {
    tables: ArcSwap<HashMap<String, Arc<WordTable>>>,
    write_lock: Mutex<()>,
}

/// Case-fold a word for lookup
fn fold(word: &str) -> String {
    word.trim().to_lowercase()
}

/// Parse dictionary text into entries, returning the number of lines skipped
fn parse_entries(contents: &str) -> (Entries, usize) {
    let mut entries = Entries::new();
    let mut skipped = 0;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(";;;") {
            continue;
        }

        let mut fields = line.split_whitespace();
        let Some(word) = fields.next() else {
            continue;
        };
        if word.ends_with(')') && word.contains('(') {
            // Alternate pronunciation
            continue;
        }
        let phonemes: Vec<String> = fields.map(|p| p.to_lowercase()).collect();
        if phonemes.is_empty() {
            skipped += 1;
            continue;
        }
        entries
            .entry(fold(word))
            .or_insert_with(|| Arc::from(phonemes));
    }

    (entries, skipped)
}

impl PronunciationDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a word; case-insensitive
    pub fn lookup(&self, word: &str, language: &str) -> Option<Vec<String>> {
        let tables = self.tables.load();
        tables
            .get(language)
            .and_then(|table| table.get(&fold(word)))
            .map(|phonemes| phonemes.to_vec())
    }

    pub fn contains(&self, word: &str, language: &str) -> bool {
        let tables = self.tables.load();
        tables
            .get(language)
            .is_some_and(|table| table.get(&fold(word)).is_some())
    }

    /// Load a dictionary file, replacing the language's table
    pub fn load(&self, path: &Path, language: &str) -> PhonemizerResult<usize> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PhonemizerError::Dictionary(format!("Failed to read {}: {e}", path.display()))
        })?;
        let count = self.load_from_str(&contents, language);

        tracing::info!(
            language = %language,
            path = %path.display(),
            entries = count,
            "Loaded pronunciation dictionary"
        );
        Ok(count)
    }

    /// Load dictionary text, replacing the language's table
    pub fn load_from_str(&self, contents: &str, language: &str) -> usize {
        let (entries, skipped) = parse_entries(contents);
        if skipped > 0 {
            tracing::debug!(language = %language, skipped, "Skipped malformed dictionary lines");
        }
        let count = entries.len();
        let table = Arc::new(WordTable {
            base: Arc::new(entries),
            overrides: Arc::default(),
        });

        let _guard = self.write_lock.lock();
        let mut next = HashMap::clone(&self.tables.load());
        next.insert(language.to_string(), table);
        self.tables.store(Arc::new(next));
        count
    }

    /// Add or replace a single pronunciation at runtime
    pub fn add_word(&self, word: &str, phonemes: Vec<String>, language: &str) {
        self.add_words(std::iter::once((word.to_string(), phonemes)), language);
    }

    /// Add or replace several pronunciations with one snapshot swap
    pub fn add_words<I>(&self, words: I, language: &str)
    where
        I: IntoIterator<Item = (String, Vec<String>)>,
    {
        let _guard = self.write_lock.lock();
        let current = self.tables.load();
        let existing = current.get(language).cloned().unwrap_or_default();

        let mut overrides = Entries::clone(&existing.overrides);
        for (word, phonemes) in words {
            if phonemes.is_empty() {
                continue;
            }
            overrides.insert(fold(&word), Arc::from(phonemes));
        }

        let table = Arc::new(WordTable {
            base: Arc::clone(&existing.base),
            overrides: Arc::new(overrides),
        });
        let mut next = HashMap::clone(&current);
        next.insert(language.to_string(), table);
        self.tables.store(Arc::new(next));
    }

    /// Drop a language's table
    pub fn clear(&self, language: &str) {
        let _guard = self.write_lock.lock();
        let mut next = HashMap::clone(&self.tables.load());
        if next.remove(language).is_some() {
            self.tables.store(Arc::new(next));
        }
    }

    /// Number of distinct words for a language
    pub fn word_count(&self, language: &str) -> usize {
        self.tables
            .load()
            .get(language)
            .map_or(0, |table| table.len())
    }

    /// Languages with a loaded table
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self.tables.load().keys().cloned().collect();
        languages.sort();
        languages
    }

    /// Approximate heap footprint in bytes
    pub fn memory_usage(&self) -> usize {
        fn entries_size(entries: &Entries) -> usize {
            entries
                .iter()
                .map(|(word, phonemes)| {
                    word.len()
                        + phonemes.iter().map(|p| p.len() + 24).sum::<usize>()
                        + 48
                })
                .sum()
        }
        self.tables
            .load()
            .values()
            .map(|table| entries_size(&table.base) + entries_size(&table.overrides))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
# sample dictionary
;;; cmudict style comment
HELLO  HH AH0 L OW1
cat k ae1 t
READ  R IY1 D
READ(2)  R EH1 D
broken
";

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let dict = PronunciationDictionary::new();
        dict.load_from_str(SAMPLE, "en");

        let expected = Some(strings(&["hh", "ah0", "l", "ow1"]));
        assert_eq!(dict.lookup("HELLO", "en"), expected);
        assert_eq!(dict.lookup("hello", "en"), expected);
        assert_eq!(dict.lookup("Hello", "en"), expected);
    }

    #[test]
    fn test_parse_skips_comments_alternates_and_malformed() {
        let dict = PronunciationDictionary::new();
        let count = dict.load_from_str(SAMPLE, "en");
        assert_eq!(count, 3);
        assert_eq!(dict.lookup("read", "en"), Some(strings(&["r", "iy1", "d"])));
        assert!(dict.lookup("broken", "en").is_none());
    }

    #[test]
    fn test_lookup_is_per_language() {
        let dict = PronunciationDictionary::new();
        dict.load_from_str("cat k ae1 t", "en");
        assert!(dict.lookup("cat", "es").is_none());
        assert!(dict.contains("cat", "en"));
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let dict = PronunciationDictionary::new();
        let count = dict.load(file.path(), "en").unwrap();
        assert_eq!(count, 3);
        assert_eq!(dict.word_count("en"), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let dict = PronunciationDictionary::new();
        let err = dict
            .load(Path::new("/nonexistent/cmudict.txt"), "en")
            .unwrap_err();
        assert!(matches!(err, PhonemizerError::Dictionary(_)));
    }

    #[test]
    fn test_reload_replaces_table() {
        let dict = PronunciationDictionary::new();
        dict.load_from_str("cat k ae1 t\ndog d ao1 g", "en");
        dict.add_word("waav", strings(&["w", "ey1", "v"]), "en");

        dict.load_from_str("cat k ae1 t", "en");
        assert_eq!(dict.word_count("en"), 1);
        assert!(dict.lookup("dog", "en").is_none());
        assert!(dict.lookup("waav", "en").is_none());
    }

    #[test]
    fn test_add_word_overrides_base() {
        let dict = PronunciationDictionary::new();
        dict.load_from_str("tomato t ah0 m ey1 t ow2", "en");
        dict.add_word("Tomato", strings(&["t", "ah0", "m", "aa1", "t", "ow2"]), "en");

        assert_eq!(
            dict.lookup("tomato", "en"),
            Some(strings(&["t", "ah0", "m", "aa1", "t", "ow2"]))
        );
        assert_eq!(dict.word_count("en"), 1);
    }

    #[test]
    fn test_add_word_to_unloaded_language() {
        let dict = PronunciationDictionary::new();
        dict.add_word("hola", strings(&["o", "l", "a"]), "es");
        assert_eq!(dict.lookup("HOLA", "es"), Some(strings(&["o", "l", "a"])));
        assert_eq!(dict.languages(), vec!["es".to_string()]);
    }

    #[test]
    fn test_clear_and_memory_usage() {
        let dict = PronunciationDictionary::new();
        dict.load_from_str(SAMPLE, "en");
        assert!(dict.memory_usage() > 0);
        dict.clear("en");
        assert_eq!(dict.word_count("en"), 0);
        assert_eq!(dict.memory_usage(), 0);
    }

    #[test]
    fn test_concurrent_reads_during_writes() {
        let dict = Arc::new(PronunciationDictionary::new());
        dict.load_from_str("cat k ae1 t", "en");

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let dict = Arc::clone(&dict);
                std::thread::spawn(move || {
                    for n in 0..200 {
                        if i == 0 {
                            dict.add_word(&format!("word{n}"), vec!["w".into()], "en");
                        } else {
                            assert!(dict.lookup("cat", "en").is_some());
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(dict.word_count("en"), 201);
    }
}
