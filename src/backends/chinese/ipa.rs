//! Pinyin → IPA
//!
//! A syllable splits into an initial and a final. `y`/`w` spellings and the
//! abbreviated finals (`iu`, `ui`, `un`) are expanded to their full forms
//! before the final table lookup.

use phf::phf_map;

static INITIALS: phf::Map<&'static str, &'static str> = phf_map! {
    "b" => "p", "p" => "pʰ", "m" => "m", "f" => "f",
    "d" => "t", "t" => "tʰ", "n" => "n", "l" => "l",
    "g" => "k", "k" => "kʰ", "h" => "x",
    "j" => "tɕ", "q" => "tɕʰ", "x" => "ɕ",
    "zh" => "ʈʂ", "ch" => "ʈʂʰ", "sh" => "ʂ", "r" => "ʐ",
    "z" => "ts", "c" => "tsʰ", "s" => "s",
};

static FINALS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "a" => &["a"], "o" => &["o"], "e" => &["ɤ"], "ai" => &["ai"], "ei" => &["ei"],
    "ao" => &["au"], "ou" => &["ou"], "an" => &["a", "n"], "en" => &["ə", "n"],
    "ang" => &["a", "ŋ"], "eng" => &["ə", "ŋ"], "ong" => &["ʊ", "ŋ"], "er" => &["ɚ"],
    "i" => &["i"], "ia" => &["j", "a"], "ie" => &["j", "e"], "iao" => &["j", "au"],
    "iou" => &["j", "ou"], "ian" => &["j", "ɛ", "n"], "in" => &["i", "n"],
    "iang" => &["j", "a", "ŋ"], "ing" => &["i", "ŋ"], "iong" => &["j", "ʊ", "ŋ"],
    "u" => &["u"], "ua" => &["w", "a"], "uo" => &["w", "o"], "uai" => &["w", "ai"],
    "uei" => &["w", "ei"], "uan" => &["w", "a", "n"], "uen" => &["w", "ə", "n"],
    "uang" => &["w", "a", "ŋ"], "ueng" => &["w", "ə", "ŋ"],
    "ü" => &["y"], "üe" => &["ɥ", "e"], "üan" => &["ɥ", "ɛ", "n"], "ün" => &["y", "n"],
};

/// IPA tone letters for tones 1-4; the neutral tone has none
pub fn tone_mark(tone: u8) -> Option<&'static str> {
    match tone {
        1 => Some("˥"),
        2 => Some("˧˥"),
        3 => Some("˨˩˦"),
        4 => Some("˥˩"),
        _ => None,
    }
}

/// Split a toneless syllable into initial and full final
fn split_syllable(syllable: &str) -> (&'static str, String) {
    let syllable = syllable.replace("u:", "ü").replace('v', "ü");

    for initial in ["zh", "ch", "sh"] {
        if let Some(rest) = syllable.strip_prefix(initial) {
            return (initial_key(initial), expand_final(initial, rest));
        }
    }

    let Some(first) = syllable.chars().next() else {
        return ("", String::new());
    };
    let (head, rest) = syllable.split_at(first.len_utf8());
    match first {
        'y' => ("", expand_y(rest)),
        'w' => ("", expand_w(rest)),
        _ if INITIALS.contains_key(head) => {
            let key = initial_key(head);
            (key, expand_final(key, rest))
        }
        _ => ("", syllable.clone()),
    }
}

/// Interned initial key (so the returned `&str` is `'static`)
fn initial_key(initial: &str) -> &'static str {
    INITIALS
        .get_entry(initial)
        .map(|(key, _)| *key)
        .unwrap_or("")
}

fn expand_y(rest: &str) -> String {
    match rest {
        "i" | "in" | "ing" => rest.to_string(),
        "u" => "ü".to_string(),
        "ue" => "üe".to_string(),
        "uan" => "üan".to_string(),
        "un" => "ün".to_string(),
        "ou" => "iou".to_string(),
        other => format!("i{other}"),
    }
}

fn expand_w(rest: &str) -> String {
    match rest {
        "u" => "u".to_string(),
        "ei" => "uei".to_string(),
        "en" => "uen".to_string(),
        other => format!("u{other}"),
    }
}

fn expand_final(initial: &str, rest: &str) -> String {
    let rest = if matches!(initial, "j" | "q" | "x") && rest.starts_with('u') {
        format!("ü{}", &rest[1..])
    } else {
        rest.to_string()
    };
    match rest.as_str() {
        "iu" => "iou".to_string(),
        "ui" => "uei".to_string(),
        "un" => "uen".to_string(),
        _ => rest,
    }
}

/// IPA segments for a toneless pinyin syllable
///
/// Returns `None` when the syllable is not valid pinyin.
pub fn syllable_to_ipa(syllable: &str) -> Option<Vec<String>> {
    let (initial, fin) = split_syllable(&syllable.to_lowercase());
    let mut out = Vec::with_capacity(4);
    if !initial.is_empty() {
        out.push(INITIALS.get(initial)?.to_string());
    }

    // Apical vowels after sibilants
    let segments: &[&str] = match (initial, fin.as_str()) {
        ("z" | "c" | "s", "i") => &["ɹ̩"],
        ("zh" | "ch" | "sh" | "r", "i") => &["ɻ̩"],
        (_, other) => FINALS.get(other)?,
    };
    out.extend(segments.iter().map(|s| s.to_string()));
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipa(syllable: &str) -> Vec<String> {
        syllable_to_ipa(syllable).unwrap()
    }

    #[test]
    fn test_initial_and_final() {
        assert_eq!(ipa("ni"), vec!["n", "i"]);
        assert_eq!(ipa("hao"), vec!["x", "au"]);
        assert_eq!(ipa("zhong"), vec!["ʈʂ", "ʊ", "ŋ"]);
        assert_eq!(ipa("qian"), vec!["tɕʰ", "j", "ɛ", "n"]);
    }

    #[test]
    fn test_y_and_w_spellings() {
        assert_eq!(ipa("yi"), vec!["i"]);
        assert_eq!(ipa("yao"), vec!["j", "au"]);
        assert_eq!(ipa("you"), vec!["j", "ou"]);
        assert_eq!(ipa("yu"), vec!["y"]);
        assert_eq!(ipa("wo"), vec!["w", "o"]);
        assert_eq!(ipa("wei"), vec!["w", "ei"]);
    }

    #[test]
    fn test_abbreviated_finals() {
        assert_eq!(ipa("liu"), vec!["l", "j", "ou"]);
        assert_eq!(ipa("dui"), vec!["t", "w", "ei"]);
        assert_eq!(ipa("lun"), vec!["l", "w", "ə", "n"]);
        assert_eq!(ipa("xue"), vec!["ɕ", "ɥ", "e"]);
        assert_eq!(ipa("lv"), vec!["l", "y"]);
    }

    #[test]
    fn test_apical_vowels() {
        assert_eq!(ipa("si"), vec!["s", "ɹ̩"]);
        assert_eq!(ipa("shi"), vec!["ʂ", "ɻ̩"]);
        assert_eq!(ipa("ri"), vec!["ʐ", "ɻ̩"]);
    }

    #[test]
    fn test_invalid_syllable() {
        assert!(syllable_to_ipa("xyz").is_none());
        assert!(syllable_to_ipa("").is_none());
    }

    #[test]
    fn test_tone_marks() {
        assert_eq!(tone_mark(1), Some("˥"));
        assert_eq!(tone_mark(3), Some("˨˩˦"));
        assert_eq!(tone_mark(5), None);
    }
}
