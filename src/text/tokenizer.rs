//! Word and punctuation tokenization

use serde::{Deserialize, Serialize};

/// Punctuation that maps to a pause symbol in the phoneme stream
pub const PAUSE_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':'];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Token {
    Word(String),
    Punctuation(char),
}

impl Token {
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Token::Word(word) => Some(word),
            Token::Punctuation(_) => None,
        }
    }

    pub fn is_pause(&self) -> bool {
        matches!(self, Token::Punctuation(c) if PAUSE_PUNCTUATION.contains(c))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '\u{2019}'
}

/// Split text into words and punctuation marks
///
/// Words are runs of alphanumeric characters and apostrophes. Whitespace is
/// dropped; any other character becomes a [`Token::Punctuation`].
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in text.chars() {
        if is_word_char(c) {
            word.push(c);
            continue;
        }
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(&mut word)));
        }
        if !c.is_whitespace() {
            tokens.push(Token::Punctuation(c));
        }
    }
    if !word.is_empty() {
        tokens.push(Token::Word(word));
    }
    tokens
}
