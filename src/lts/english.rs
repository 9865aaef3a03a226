//! English letter-to-sound patterns
//!
//! Output symbols are lower-case ARPABET with stress digits, matching the
//! CMU-style dictionary the English backend loads. Digraphs are split across
//! their letters: the first letter emits the phone and the second emits
//! epsilon (`c`+`h` → `ch` + nothing).

use super::rules::{LtsRuleSet, RuleSetBuilder};
use crate::errors::PhonemizerResult;

/// `(letter, left context, right context, output)`, highest priority first
#[rustfmt::skip]
pub(crate) static ENGLISH_PATTERNS: &[(u8, &str, &str, &str)] = &[
    // a
    (b'a', "e", "", ""),
    (b'a', "o", "", ""),
    (b'a', "#", "#", "ah0"),
    (b'a', "", "r", "aa1"),
    (b'a', "", "i", "ey1"),
    (b'a', "", "y", "ey1"),
    (b'a', "", "u", "ao1"),
    (b'a', "", "w", "ao1"),
    (b'a', "", "Ce#", "ey1"),
    (b'a', "C", "#", "ah0"),
    (b'a', "", "", "ae1"),
    // b
    (b'b', "m", "#", ""),
    (b'b', "b", "", ""),
    (b'b', "", "", "b"),
    // c
    (b'c', "", "h", "ch"),
    (b'c', "", "k", ""),
    (b'c', "", "e", "s"),
    (b'c', "", "i", "s"),
    (b'c', "", "y", "s"),
    (b'c', "", "", "k"),
    // d
    (b'd', "d", "", ""),
    (b'd', "", "", "d"),
    // e
    (b'e', "e", "", ""),
    (b'e', "i", "#", ""),
    (b'e', "#C", "#", "iy1"),
    (b'e', "VC", "#", ""),
    (b'e', "", "e", "iy1"),
    (b'e', "", "a", "iy1"),
    (b'e', "", "y#", "iy1"),
    (b'e', "", "i", "ey1"),
    (b'e', "", "w", "uw1"),
    (b'e', "", "rC", "er1"),
    (b'e', "", "r#", "er0"),
    (b'e', "", "", "eh1"),
    // f
    (b'f', "f", "", ""),
    (b'f', "", "", "f"),
    // g
    (b'g', "#", "h", "g"),
    (b'g', "", "h", ""),
    (b'g', "n", "#", ""),
    (b'g', "g", "", ""),
    (b'g', "", "e", "jh"),
    (b'g', "", "i", "jh"),
    (b'g', "", "y", "jh"),
    (b'g', "", "", "g"),
    // h
    (b'h', "c", "", ""),
    (b'h', "s", "", ""),
    (b'h', "t", "", ""),
    (b'h', "p", "", ""),
    (b'h', "g", "", ""),
    (b'h', "w", "", ""),
    (b'h', "V", "#", ""),
    (b'h', "", "", "hh"),
    // i
    (b'i', "a", "", ""),
    (b'i', "e", "", ""),
    (b'i', "o", "", ""),
    (b'i', "t", "on", ""),
    (b'i', "", "gh", "ay1"),
    (b'i', "", "ng", "ih0"),
    (b'i', "", "Ce#", "ay1"),
    (b'i', "", "e#", "ay1"),
    (b'i', "", "", "ih1"),
    // j
    (b'j', "", "", "jh"),
    // k
    (b'k', "#", "n", ""),
    (b'k', "k", "", ""),
    (b'k', "", "", "k"),
    // l
    (b'l', "l", "", ""),
    (b'l', "", "", "l"),
    // m
    (b'm', "m", "", ""),
    (b'm', "", "", "m"),
    // n
    (b'n', "n", "", ""),
    (b'n', "", "g#", "ng"),
    (b'n', "", "k", "ng"),
    (b'n', "", "", "n"),
    // o
    (b'o', "o", "", ""),
    (b'o', "ti", "n", "ah0"),
    (b'o', "", "o", "uw1"),
    (b'o', "", "u", "aw1"),
    (b'o', "", "w", "ow1"),
    (b'o', "", "y", "oy1"),
    (b'o', "", "i", "oy1"),
    (b'o', "", "a", "ow1"),
    (b'o', "", "Ce#", "ow1"),
    (b'o', "", "#", "ow1"),
    (b'o', "", "", "aa1"),
    // p
    (b'p', "", "h", "f"),
    (b'p', "p", "", ""),
    (b'p', "", "", "p"),
    // q
    (b'q', "", "u", "k"),
    (b'q', "", "", "k-w"),
    // r
    (b'r', "r", "", ""),
    (b'r', "e", "C", ""),
    (b'r', "e", "#", ""),
    (b'r', "", "", "r"),
    // s
    (b's', "", "h", "sh"),
    (b's', "s", "", ""),
    (b's', "V", "V", "z"),
    (b's', "", "", "s"),
    // t
    (b't', "", "ion", "sh"),
    (b't', "e", "h", "dh"),
    (b't', "", "h", "th"),
    (b't', "t", "", ""),
    (b't', "", "", "t"),
    // u
    (b'u', "q", "", "w"),
    (b'u', "a", "", ""),
    (b'u', "o", "", ""),
    (b'u', "", "Ce#", "uw1"),
    (b'u', "", "", "ah1"),
    // v
    (b'v', "", "", "v"),
    // w
    (b'w', "a", "", ""),
    (b'w', "e", "", ""),
    (b'w', "o", "", ""),
    (b'w', "#", "r", ""),
    (b'w', "", "", "w"),
    // x
    (b'x', "#", "", "z"),
    (b'x', "", "", "k-s"),
    // y
    (b'y', "a", "", ""),
    (b'y', "o", "", ""),
    (b'y', "e", "#", ""),
    (b'y', "#", "V", "y"),
    (b'y', "#C", "#", "ay1"),
    (b'y', "C", "#", "iy0"),
    (b'y', "C", "C", "ih1"),
    (b'y', "", "", "y"),
    // z
    (b'z', "z", "", ""),
    (b'z', "", "", "z"),
];

/// Compile the built-in English rule set
pub fn english_rule_set() -> PhonemizerResult<LtsRuleSet> {
    let mut builder = RuleSetBuilder::new();
    for &(letter, left, right, output) in ENGLISH_PATTERNS {
        builder.rule(letter, left, right, output);
    }
    builder.build()
}
