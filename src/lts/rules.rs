//! LTS rule arena
//!
//! A rule set is a flat array of [`LtsRule`] nodes forming one binary decision
//! graph per letter. Non-terminal nodes test a single context slot against a
//! character and jump by index; terminal nodes emit an entry from the phone
//! table (or nothing, for epsilon).
//!
//! # Feature ids
//!
//! ```text
//!   window:   L4  L3  L2  L1  [cur]  R1  R2  R3  R4
//!   feature:   1   2   3   4    0     5   6   7   8
//! ```
//!
//! Feature `255` marks a terminal node; its `test_value` indexes the phone
//! table, with `0` reserved for epsilon.
//!
//! Rule graphs are authored as ordered patterns and compiled by
//! [`RuleSetBuilder`]. Every jump is validated when the arena is built.

use std::collections::HashMap;
use std::path::Path;

use crate::errors::{PhonemizerError, PhonemizerResult};

/// Feature id marking a terminal node
pub const FEATURE_TERMINAL: u8 = 255;
/// Terminal value for "emit nothing"
pub const EPSILON: u8 = 0;
/// Pad character on both sides of a word
pub const BOUNDARY: u8 = b'#';
/// Context characters on each side of the current letter
pub const CONTEXT_WIDTH: usize = 4;
/// Highest context feature id
pub const MAX_FEATURE: u8 = 8;

const VOWELS: &[u8] = b"aeiou";
const CONSONANTS: &[u8] = b"bcdfghjklmnpqrstvwxz";

/// One node of the rule graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LtsRule {
    pub feature_id: u8,
    pub test_value: u8,
    pub next_if_true: u32,
    pub next_if_false: u32,
}

impl LtsRule {
    pub const fn test(feature_id: u8, test_value: u8, next_if_true: u32, next_if_false: u32) -> Self {
        Self {
            feature_id,
            test_value,
            next_if_true,
            next_if_false,
        }
    }

    pub const fn terminal(phone: u8) -> Self {
        Self {
            feature_id: FEATURE_TERMINAL,
            test_value: phone,
            next_if_true: 0,
            next_if_false: 0,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.feature_id == FEATURE_TERMINAL
    }
}

/// Sliding window around the letter being converted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LtsContext {
    window: [u8; 2 * CONTEXT_WIDTH + 1],
}

impl LtsContext {
    /// Build the window for `padded[position]`
    ///
    /// `padded` must carry [`CONTEXT_WIDTH`] boundary characters on each side.
    pub fn new(padded: &[u8], position: usize) -> Self {
        let mut window = [BOUNDARY; 2 * CONTEXT_WIDTH + 1];
        for (slot, value) in window.iter_mut().enumerate() {
            let index = (position + slot).checked_sub(CONTEXT_WIDTH);
            if let Some(&c) = index.and_then(|i| padded.get(i)) {
                *value = c;
            }
        }
        Self { window }
    }

    pub fn current(&self) -> u8 {
        self.window[CONTEXT_WIDTH]
    }

    /// Character tested by `feature_id`, or `None` for a non-context feature
    #[inline]
    pub fn feature(&self, feature_id: u8) -> Option<u8> {
        match feature_id {
            0 => Some(self.window[CONTEXT_WIDTH]),
            1..=4 => Some(self.window[(feature_id - 1) as usize]),
            5..=8 => Some(self.window[feature_id as usize]),
            _ => None,
        }
    }
}

/// Compiled, validated rule arena
#[derive(Debug, Clone)]
pub struct LtsRuleSet {
    rules: Vec<LtsRule>,
    letter_index: HashMap<u8, u32>,
    phones: Vec<String>,
}

impl LtsRuleSet {
    /// Build an arena from raw parts, bounds-checking every node
    pub fn new(
        rules: Vec<LtsRule>,
        letter_index: HashMap<u8, u32>,
        phones: Vec<String>,
    ) -> PhonemizerResult<Self> {
        if phones.first().is_none_or(|p| !p.is_empty()) {
            return Err(PhonemizerError::InvalidRuleTable(
                "phone table must start with the epsilon entry".to_string(),
            ));
        }
        let len = rules.len() as u64;
        for (index, rule) in rules.iter().enumerate() {
            if rule.is_terminal() {
                if rule.test_value as usize >= phones.len() {
                    return Err(PhonemizerError::InvalidRuleTable(format!(
                        "node {index} emits unknown phone {}",
                        rule.test_value
                    )));
                }
                continue;
            }
            if rule.feature_id > MAX_FEATURE {
                return Err(PhonemizerError::InvalidRuleTable(format!(
                    "node {index} tests unknown feature {}",
                    rule.feature_id
                )));
            }
            if rule.next_if_true as u64 >= len || rule.next_if_false as u64 >= len {
                return Err(PhonemizerError::InvalidRuleTable(format!(
                    "node {index} jumps outside the arena ({} / {})",
                    rule.next_if_true, rule.next_if_false
                )));
            }
        }
        for (&letter, &start) in &letter_index {
            if start as u64 >= len {
                return Err(PhonemizerError::InvalidRuleTable(format!(
                    "letter '{}' starts outside the arena",
                    letter as char
                )));
            }
        }
        Ok(Self {
            rules,
            letter_index,
            phones,
        })
    }

    /// Compile a pattern file (`letter left right output` per line, `-` = empty, `;` comments)
    pub fn from_pattern_file(path: &Path) -> PhonemizerResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PhonemizerError::InvalidRuleTable(format!("Failed to read {}: {e}", path.display()))
        })?;
        let mut builder = RuleSetBuilder::new();
        for (number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [letter, left, right, output] = fields[..] else {
                return Err(PhonemizerError::InvalidRuleTable(format!(
                    "line {}: expected 4 fields, got {}",
                    number + 1,
                    fields.len()
                )));
            };
            let dash = |s: &'_ str| if s == "-" { String::new() } else { s.to_string() };
            let mut letters = letter.bytes();
            let (Some(letter), None) = (letters.next(), letters.next()) else {
                return Err(PhonemizerError::InvalidRuleTable(format!(
                    "line {}: '{letter}' is not a single letter",
                    number + 1
                )));
            };
            builder.rule(letter, &dash(left), &dash(right), &dash(output));
        }
        builder.build()
    }

    /// Start node for a (lower-case) letter
    #[inline]
    pub fn start_index(&self, letter: u8) -> Option<u32> {
        self.letter_index.get(&letter).copied()
    }

    #[inline]
    pub fn rule(&self, index: u32) -> Option<&LtsRule> {
        self.rules.get(index as usize)
    }

    /// Phone for a terminal value; `None` for epsilon or unknown
    #[inline]
    pub fn phone(&self, value: u8) -> Option<&str> {
        match value {
            EPSILON => None,
            v => self.phones.get(v as usize).map(String::as_str),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn letters(&self) -> usize {
        self.letter_index.len()
    }

    pub fn memory_usage(&self) -> usize {
        self.rules.len() * std::mem::size_of::<LtsRule>()
            + self.letter_index.len() * 16
            + self.phones.iter().map(|p| p.len() + 24).sum::<usize>()
    }
}

/// One authored pattern: `letter` in `left`/`right` context emits `output`
#[derive(Debug, Clone, PartialEq, Eq)]
struct PatternRule {
    left: String,
    right: String,
    output: String,
}

/// Compiles ordered context patterns into an [`LtsRuleSet`]
///
/// Context strings read outward from the letter: the last character of
/// `left` is L1, the first character of `right` is R1. Besides literal
/// letters they accept `#` (word boundary), `V` (vowel), `C` (consonant)
/// and `.` (anything). An empty `output` is epsilon; `-` joins a phone
/// sequence emitted by one terminal (`k-s`).
///
/// Patterns for a letter are tried in insertion order. A rule with empty
/// contexts acts as that letter's default.
#[derive(Debug, Default)]
pub struct RuleSetBuilder {
    letters: Vec<(u8, Vec<PatternRule>)>,
}

impl RuleSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(&mut self, letter: u8, left: &str, right: &str, output: &str) -> &mut Self {
        let letter = letter.to_ascii_lowercase();
        let pattern = PatternRule {
            left: left.to_string(),
            right: right.to_string(),
            output: output.to_string(),
        };
        match self.letters.iter_mut().find(|(l, _)| *l == letter) {
            Some((_, rules)) => rules.push(pattern),
            None => self.letters.push((letter, vec![pattern])),
        }
        self
    }

    pub fn build(&self) -> PhonemizerResult<LtsRuleSet> {
        let mut compiler = Compiler::default();
        let mut letter_index = HashMap::new();
        for (letter, rules) in &self.letters {
            let start = compiler.compile_letter(*letter, rules)?;
            letter_index.insert(*letter, start);
        }
        LtsRuleSet::new(compiler.rules, letter_index, compiler.phones)
    }
}

#[derive(Debug)]
struct Compiler {
    rules: Vec<LtsRule>,
    phones: Vec<String>,
    phone_ids: HashMap<String, u8>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            phones: vec![String::new()],
            phone_ids: HashMap::new(),
        }
    }
}

impl Compiler {
    fn push(&mut self, rule: LtsRule) -> PhonemizerResult<u32> {
        let index = u32::try_from(self.rules.len())
            .map_err(|_| PhonemizerError::InvalidRuleTable("arena too large".to_string()))?;
        self.rules.push(rule);
        Ok(index)
    }

    fn phone_id(&mut self, output: &str) -> PhonemizerResult<u8> {
        if output.is_empty() {
            return Ok(EPSILON);
        }
        if let Some(&id) = self.phone_ids.get(output) {
            return Ok(id);
        }
        let id = u8::try_from(self.phones.len())
            .ok()
            .filter(|&id| id != FEATURE_TERMINAL)
            .ok_or_else(|| PhonemizerError::InvalidRuleTable("too many phones".to_string()))?;
        self.phones.push(output.to_string());
        self.phone_ids.insert(output.to_string(), id);
        Ok(id)
    }

    /// Compile one letter's patterns back to front so every jump target exists
    fn compile_letter(&mut self, letter: u8, rules: &[PatternRule]) -> PhonemizerResult<u32> {
        // Without an unconditional rule the letter maps to epsilon
        let fallback = self.phone_id("")?;
        let mut on_fail = self.push(LtsRule::terminal(fallback))?;

        for rule in rules.iter().rev() {
            let phone = self.phone_id(&rule.output)?;
            let mut next = self.push(LtsRule::terminal(phone))?;
            let conditions = conditions(letter, rule)?;

            for (feature, values) in conditions.iter().rev() {
                let mut on_false = on_fail;
                for &value in values.iter().rev() {
                    on_false = self.push(LtsRule::test(*feature, value, next, on_false))?;
                }
                next = on_false;
            }
            on_fail = next;
        }
        Ok(on_fail)
    }
}

/// Translate a pattern into (feature, accepted values) conjunctions
fn conditions(letter: u8, rule: &PatternRule) -> PhonemizerResult<Vec<(u8, Vec<u8>)>> {
    if rule.left.len() > CONTEXT_WIDTH || rule.right.len() > CONTEXT_WIDTH {
        return Err(PhonemizerError::InvalidRuleTable(format!(
            "rule for '{}' has context wider than {CONTEXT_WIDTH}",
            letter as char
        )));
    }

    let mut out = Vec::new();
    let left = rule.left.as_bytes();
    for (i, &c) in left.iter().enumerate() {
        // L1 is the last character; L_k maps to feature 5 - k
        let distance = (left.len() - i) as u8;
        if let Some(values) = class_values(c) {
            out.push((5 - distance, values));
        }
    }
    for (i, &c) in rule.right.as_bytes().iter().enumerate() {
        if let Some(values) = class_values(c) {
            out.push((5 + i as u8, values));
        }
    }
    Ok(out)
}

fn class_values(c: u8) -> Option<Vec<u8>> {
    match c {
        b'.' => None,
        b'V' => Some(VOWELS.to_vec()),
        b'C' => Some(CONSONANTS.to_vec()),
        other => Some(vec![other.to_ascii_lowercase()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(word: &str) -> Vec<u8> {
        let mut out = vec![BOUNDARY; CONTEXT_WIDTH];
        out.extend(word.bytes());
        out.extend(std::iter::repeat_n(BOUNDARY, CONTEXT_WIDTH));
        out
    }

    #[test]
    fn test_context_feature_offsets() {
        let word = padded("abcdefghi");
        // current letter 'e'
        let ctx = LtsContext::new(&word, CONTEXT_WIDTH + 4);
        assert_eq!(ctx.feature(0), Some(b'e'));
        assert_eq!(ctx.feature(4), Some(b'd'));
        assert_eq!(ctx.feature(3), Some(b'c'));
        assert_eq!(ctx.feature(1), Some(b'a'));
        assert_eq!(ctx.feature(5), Some(b'f'));
        assert_eq!(ctx.feature(8), Some(b'i'));
        assert_eq!(ctx.feature(9), None);
    }

    #[test]
    fn test_context_pads_boundaries() {
        let word = padded("cat");
        let ctx = LtsContext::new(&word, CONTEXT_WIDTH);
        assert_eq!(ctx.current(), b'c');
        assert_eq!(ctx.feature(4), Some(BOUNDARY));
        assert_eq!(ctx.feature(1), Some(BOUNDARY));
        assert_eq!(ctx.feature(6), Some(b't'));
        assert_eq!(ctx.feature(7), Some(BOUNDARY));
    }

    #[test]
    fn test_new_rejects_out_of_range_jump() {
        let rules = vec![LtsRule::test(0, b'a', 5, 0)];
        let phones = vec![String::new()];
        let err = LtsRuleSet::new(rules, HashMap::new(), phones).unwrap_err();
        assert!(matches!(err, PhonemizerError::InvalidRuleTable(_)));
    }

    #[test]
    fn test_new_rejects_unknown_phone_and_feature() {
        let phones = vec![String::new()];
        let err = LtsRuleSet::new(vec![LtsRule::terminal(3)], HashMap::new(), phones.clone());
        assert!(err.is_err());

        let rules = vec![LtsRule::test(42, b'a', 0, 0)];
        assert!(LtsRuleSet::new(rules, HashMap::new(), phones).is_err());
    }

    #[test]
    fn test_new_requires_epsilon_entry() {
        let result = LtsRuleSet::new(vec![], HashMap::new(), vec!["k".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_compiles_priority_chain() {
        let mut builder = RuleSetBuilder::new();
        builder
            .rule(b'c', "", "h", "ch")
            .rule(b'c', "", "e", "s")
            .rule(b'c', "", "", "k");
        let set = builder.build().unwrap();
        assert_eq!(set.letters(), 1);
        assert!(set.start_index(b'c').is_some());
        assert!(set.start_index(b'z').is_none());

        // every jump stays in the arena
        for i in 0..set.len() as u32 {
            let rule = set.rule(i).unwrap();
            if !rule.is_terminal() {
                assert!(set.rule(rule.next_if_true).is_some());
                assert!(set.rule(rule.next_if_false).is_some());
            }
        }
    }

    #[test]
    fn test_builder_rejects_wide_context() {
        let mut builder = RuleSetBuilder::new();
        builder.rule(b'a', "abcde", "", "x");
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_phone_table_epsilon() {
        let mut builder = RuleSetBuilder::new();
        builder.rule(b'h', "c", "", "").rule(b'h', "", "", "hh");
        let set = builder.build().unwrap();
        assert_eq!(set.phone(EPSILON), None);
        assert_eq!(set.phone(1), Some("hh"));
    }

    #[test]
    fn test_from_pattern_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "; test rules").unwrap();
        writeln!(file, "c - h ch").unwrap();
        writeln!(file, "h c - -").unwrap();
        writeln!(file, "c - - k").unwrap();
        let set = LtsRuleSet::from_pattern_file(file.path()).unwrap();
        assert_eq!(set.letters(), 2);
    }

    #[test]
    fn test_from_pattern_file_rejects_bad_line() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "c h ch").unwrap();
        assert!(LtsRuleSet::from_pattern_file(file.path()).is_err());
    }
}
