//! Latin-script language scoring
//!
//! Each profile holds frequent function words, characteristic trigrams and
//! letters that only occur in that language. A word hit weighs more than a
//! trigram hit; distinctive letters weigh the most.

use phf::phf_set;

pub(crate) struct LatinProfile {
    pub language: &'static str,
    pub words: &'static phf::Set<&'static str>,
    pub trigrams: &'static phf::Set<&'static str>,
    pub letters: &'static [char],
}

const WORD_WEIGHT: f32 = 3.0;
const TRIGRAM_WEIGHT: f32 = 1.0;
const LETTER_WEIGHT: f32 = 4.0;

static EN_WORDS: phf::Set<&'static str> = phf_set! {
    "the", "and", "is", "are", "was", "of", "to", "in", "it", "that", "you", "he", "she",
    "with", "for", "this", "have", "not", "be", "on", "at", "what", "hello", "how", "my",
    "i", "we", "they", "will", "would", "can", "from", "your", "there",
};
static EN_TRIGRAMS: phf::Set<&'static str> = phf_set! {
    "the", "ing", "and", "ion", "tio", "ent", "her", "tha", "hat", "his", "ere", "ter",
    "wor", "oul", "ght", "#th", "ng#", "ed#",
};

static ES_WORDS: phf::Set<&'static str> = phf_set! {
    "el", "la", "los", "las", "de", "que", "y", "en", "un", "una", "es", "por", "con",
    "para", "no", "se", "su", "al", "lo", "como", "pero", "muy", "hola", "gracias",
    "está", "esta", "yo", "tú", "usted", "del",
};
static ES_TRIGRAMS: phf::Set<&'static str> = phf_set! {
    "ció", "que", "ent", "nte", "aci", "ado", "los", "las", "del", "ien", "ero", "ara",
    "os#", "as#", "#es", "ión",
};

static PT_WORDS: phf::Set<&'static str> = phf_set! {
    "o", "os", "as", "de", "que", "e", "do", "da", "em", "um", "uma", "não", "para",
    "com", "por", "mais", "como", "mas", "ao", "obrigado", "obrigada", "você", "eu",
    "olá", "muito", "são", "está",
};
static PT_TRIGRAMS: phf::Set<&'static str> = phf_set! {
    "ção", "ões", "que", "ent", "ado", "nte", "ara", "com", "ão#", "em#", "nho", "lho",
    "#nã", "mos",
};

static FR_WORDS: phf::Set<&'static str> = phf_set! {
    "le", "la", "les", "de", "des", "et", "est", "un", "une", "du", "en", "que", "qui",
    "pas", "pour", "dans", "avec", "ce", "il", "elle", "je", "vous", "nous", "bonjour",
    "merci", "oui", "sur", "au", "aux",
};
static FR_TRIGRAMS: phf::Set<&'static str> = phf_set! {
    "ent", "les", "que", "ion", "eur", "our", "ous", "ait", "ais", "men", "eau", "oir",
    "es#", "#qu", "tio",
};

static DE_WORDS: phf::Set<&'static str> = phf_set! {
    "der", "die", "das", "und", "ist", "nicht", "ein", "eine", "ich", "sie", "es", "mit",
    "den", "dem", "zu", "von", "auf", "für", "auch", "wir", "hallo", "danke", "ja",
    "nein", "wie", "sind",
};
static DE_TRIGRAMS: phf::Set<&'static str> = phf_set! {
    "sch", "ein", "ich", "der", "die", "und", "cht", "ung", "gen", "den", "eit", "nde",
    "en#", "er#", "#ge",
};

pub(crate) static LATIN_PROFILES: &[LatinProfile] = &[
    LatinProfile {
        language: "en-US",
        words: &EN_WORDS,
        trigrams: &EN_TRIGRAMS,
        letters: &[],
    },
    LatinProfile {
        language: "es-ES",
        words: &ES_WORDS,
        trigrams: &ES_TRIGRAMS,
        letters: &['ñ', '¿', '¡'],
    },
    LatinProfile {
        language: "pt-BR",
        words: &PT_WORDS,
        trigrams: &PT_TRIGRAMS,
        letters: &['ã', 'õ'],
    },
    LatinProfile {
        language: "fr-FR",
        words: &FR_WORDS,
        trigrams: &FR_TRIGRAMS,
        letters: &['è', 'ê', 'ë', 'î', 'ï', 'û', 'ù', 'œ', 'æ'],
    },
    LatinProfile {
        language: "de-DE",
        words: &DE_WORDS,
        trigrams: &DE_TRIGRAMS,
        letters: &['ä', 'ö', 'ü', 'ß'],
    },
];

/// Score `text` against every Latin profile
///
/// Returns `(language, score)` in profile order; all scores are zero when
/// nothing matched.
pub(crate) fn score_latin(text: &str) -> Vec<(&'static str, f32)> {
    let lower = text.to_lowercase();
    let mut scores: Vec<(&'static str, f32)> =
        LATIN_PROFILES.iter().map(|p| (p.language, 0.0)).collect();

    for word in lower
        .split(|c: char| !c.is_alphabetic() && c != '¿' && c != '¡')
        .filter(|w| !w.is_empty())
    {
        let padded: Vec<char> = std::iter::once('#')
            .chain(word.chars())
            .chain(std::iter::once('#'))
            .collect();

        for (profile, (_, score)) in LATIN_PROFILES.iter().zip(scores.iter_mut()) {
            if profile.words.contains(word) {
                *score += WORD_WEIGHT;
            }
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                if profile.trigrams.contains(trigram.as_str()) {
                    *score += TRIGRAM_WEIGHT;
                }
            }
            let distinctive = word.chars().filter(|c| profile.letters.contains(c)).count();
            *score += distinctive as f32 * LETTER_WEIGHT;
        }
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn best(text: &str) -> &'static str {
        score_latin(text)
            .into_iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(lang, _)| lang)
            .unwrap()
    }

    #[test]
    fn test_scores_common_sentences() {
        assert_eq!(best("the cat is on the mat"), "en-US");
        assert_eq!(best("el niño está en la casa"), "es-ES");
        assert_eq!(best("não sei o que fazer"), "pt-BR");
        assert_eq!(best("je suis très content avec vous"), "fr-FR");
        assert_eq!(best("ich bin müde und die Straße ist lang"), "de-DE");
    }

    #[test]
    fn test_no_signal_scores_zero() {
        assert!(score_latin("zxqvb").iter().all(|(_, s)| *s == 0.0));
        assert!(score_latin("").iter().all(|(_, s)| *s == 0.0));
    }
}
