//! Character-level script classification

use crate::core::Script;

/// Script of a single character
pub fn script_of(c: char) -> Script {
    match c as u32 {
        _ if c.is_numeric() => Script::Common,
        0x41..=0x5A | 0x61..=0x7A => Script::Latin,
        0x00C0..=0x024F if c != '×' && c != '÷' => Script::Latin,
        0x1E00..=0x1EFF => Script::Latin,
        0xFF21..=0xFF3A | 0xFF41..=0xFF5A => Script::Latin,
        0x1100..=0x11FF | 0x3130..=0x318F | 0xA960..=0xA97F | 0xAC00..=0xD7AF => Script::Hangul,
        0x3040..=0x309F | 0x30A0..=0x30FF | 0x31F0..=0x31FF | 0xFF66..=0xFF9F => Script::Kana,
        0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x2A6DF => Script::Cjk,
        0x0400..=0x04FF => Script::Cyrillic,
        0x0600..=0x06FF => Script::Arabic,
        0x0900..=0x097F => Script::Devanagari,
        _ if c.is_whitespace() || c.is_ascii_digit() || c.is_ascii_punctuation() => {
            Script::Common
        }
        0x00A0..=0x00BF | 0x00D7 | 0x00F7 => Script::Common,
        0x2000..=0x206F | 0x3000..=0x303F | 0xFF00..=0xFF20 => Script::Common,
        0xFF3B..=0xFF40 | 0xFF5B..=0xFF65 => Script::Common,
        _ => Script::Unknown,
    }
}

/// Whether characters of `script` decide a segment's language
pub fn is_significant(script: Script) -> bool {
    !matches!(script, Script::Common | Script::Unknown)
}

/// Default language for text written in `script`
///
/// Latin text is resolved separately by n-gram scoring.
pub fn script_language(script: Script) -> Option<&'static str> {
    match script {
        Script::Cjk => Some("zh-CN"),
        Script::Hangul => Some("ko-KR"),
        Script::Kana => Some("ja-JP"),
        Script::Cyrillic => Some("ru-RU"),
        Script::Arabic => Some("ar-SA"),
        Script::Devanagari => Some("hi-IN"),
        Script::Latin | Script::Common | Script::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_of() {
        assert_eq!(script_of('a'), Script::Latin);
        assert_eq!(script_of('ñ'), Script::Latin);
        assert_eq!(script_of('中'), Script::Cjk);
        assert_eq!(script_of('한'), Script::Hangul);
        assert_eq!(script_of('ひ'), Script::Kana);
        assert_eq!(script_of('カ'), Script::Kana);
        assert_eq!(script_of('д'), Script::Cyrillic);
        assert_eq!(script_of(' '), Script::Common);
        assert_eq!(script_of('7'), Script::Common);
        assert_eq!(script_of('。'), Script::Common);
        assert_eq!(script_of('，'), Script::Common);
        assert_eq!(script_of('×'), Script::Common);
    }

    #[test]
    fn test_non_ascii_digits_are_common() {
        assert_eq!(script_of('٣'), Script::Common);
        assert_eq!(script_of('۵'), Script::Common);
        assert_eq!(script_of('३'), Script::Common);
        assert_eq!(script_of('ب'), Script::Arabic);
    }

    #[test]
    fn test_script_language() {
        assert_eq!(script_language(Script::Hangul), Some("ko-KR"));
        assert_eq!(script_language(Script::Latin), None);
        assert!(!is_significant(Script::Common));
    }
}
