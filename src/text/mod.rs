//! Text preparation shared by the language backends

pub mod normalizer;
pub mod numbers;
pub mod tokenizer;

pub use normalizer::TextNormalizer;
pub use tokenizer::{PAUSE_PUNCTUATION, Token, tokenize};
