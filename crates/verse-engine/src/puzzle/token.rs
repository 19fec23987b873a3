use serde::{Deserialize, Serialize};

use crate::api::error::EngineError;
use crate::api::game::Granularity;
use crate::core::rng::Rng;

/// Punctuation stripped from verse text unless a mode overrides it.
pub const DEFAULT_PUNCTUATION: &str = ".,;:!?\"'()[]{}";

/// Probability of closing a phrase once it holds at least two words.
const PHRASE_BREAK_CHANCE: f32 = 0.4;
const PHRASE_MIN_WORDS: usize = 2;
const PHRASE_MAX_WORDS: usize = 4;

/// Re-roll budget for scrambles that come out in canonical order.
const MAX_RESHUFFLES: usize = 8;

/// A word or phrase cut from verse text.
/// `index` is the canonical 0-based position and identifies the tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub index: usize,
    pub text: String,
}

impl Token {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Remove complete `<...>` tags left over from the scripture API.
/// A `<` with no closing `>` is kept as text.
pub fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                rest = &rest[open..];
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Strip markup and the given punctuation characters.
pub fn normalize(text: &str, punctuation: &str) -> String {
    strip_markup(text)
        .chars()
        .filter(|c| !punctuation.contains(*c))
        .collect()
}

/// Split normalized text into word tokens in canonical order.
pub fn tokenize(text: &str, punctuation: &str) -> Vec<Token> {
    normalize(text, punctuation)
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| Token::new(i, word))
        .collect()
}

/// Group word tokens into phrases of 2-4 words.
/// Break points are random; the concatenation of phrases always equals the words.
pub fn group_phrases(words: &[Token], rng: &mut Rng) -> Vec<Token> {
    let mut phrases = Vec::new();
    let mut current: Vec<&str> = Vec::with_capacity(PHRASE_MAX_WORDS);

    for (i, word) in words.iter().enumerate() {
        current.push(&word.text);
        let last = i + 1 == words.len();
        if current.len() >= PHRASE_MIN_WORDS
            && (current.len() >= PHRASE_MAX_WORDS || last || rng.chance(PHRASE_BREAK_CHANCE))
        {
            phrases.push(Token::new(phrases.len(), current.join(" ")));
            current.clear();
        }
    }
    if !current.is_empty() {
        phrases.push(Token::new(phrases.len(), current.join(" ")));
    }
    phrases
}

/// Cut verse text into tiles at the requested granularity.
///
/// Empty or punctuation-only text is a content error: there is no puzzle to build.
pub fn cut(
    text: &str,
    granularity: Granularity,
    punctuation: &str,
    rng: &mut Rng,
) -> Result<Vec<Token>, EngineError> {
    let words = tokenize(text, punctuation);
    if words.is_empty() {
        return Err(EngineError::content("verse text has no words"));
    }
    Ok(match granularity {
        Granularity::Words => words,
        Granularity::Phrases => group_phrases(&words, rng),
    })
}

/// Random permutation of the tokens.
/// When two or more tiles differ, the result never reads in canonical order.
pub fn scramble(tokens: &[Token], rng: &mut Rng) -> Vec<Token> {
    let mut canonical = tokens.to_vec();
    canonical.sort_by_key(|t| t.index);

    let mut out = canonical.clone();
    rng.shuffle(&mut out);
    let mut attempts = 0;
    while reads_same(&out, &canonical) && attempts < MAX_RESHUFFLES {
        rng.shuffle(&mut out);
        attempts += 1;
    }
    if reads_same(&out, &canonical) {
        out.rotate_left(1);
    }
    out
}

fn reads_same(a: &[Token], b: &[Token]) -> bool {
    a.iter().map(|t| &t.text).eq(b.iter().map(|t| &t.text))
}
