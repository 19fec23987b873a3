//! Answer checking. Two validators for two kinds of answer:
//! tile order is compared exactly, typed answers loosely.

use crate::puzzle::arrangement::join;
use crate::puzzle::token::Token;

/// Exact, case-sensitive comparison of the arranged sentence with the canonical one.
/// An arrangement that is still missing tiles never matches.
pub fn is_correct(arrangement: &[Token], tokens: &[Token]) -> bool {
    arrangement.len() == tokens.len() && join(arrangement) == join(tokens)
}

/// Free-text answer check: trimmed and case-insensitive. Blank guesses never match.
pub fn answers_match(guess: &str, expected: &str) -> bool {
    let guess = guess.trim();
    !guess.is_empty() && guess.to_lowercase() == expected.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::token::{tokenize, DEFAULT_PUNCTUATION};

    #[test]
    fn identity_is_correct() {
        let tokens = tokenize("In the beginning", DEFAULT_PUNCTUATION);
        assert!(is_correct(&tokens, &tokens));
    }

    #[test]
    fn order_matters() {
        let tokens = tokenize("In the beginning", DEFAULT_PUNCTUATION);
        let mut swapped = tokens.clone();
        swapped.swap(0, 2);
        assert!(!is_correct(&swapped, &tokens));
    }

    #[test]
    fn partial_arrangement_is_incorrect() {
        let tokens = tokenize("In the beginning", DEFAULT_PUNCTUATION);
        assert!(!is_correct(&tokens[..2], &tokens));
    }

    #[test]
    fn case_sensitive() {
        let tokens = tokenize("In the beginning", DEFAULT_PUNCTUATION);
        let lower = tokenize("in the beginning", DEFAULT_PUNCTUATION);
        assert!(!is_correct(&lower, &tokens));
    }

    #[test]
    fn duplicate_words_may_trade_places() {
        let tokens = tokenize("the word was the word", DEFAULT_PUNCTUATION);
        let arranged = vec![
            tokens[3].clone(),
            tokens[4].clone(),
            tokens[2].clone(),
            tokens[0].clone(),
            tokens[1].clone(),
        ];
        assert!(is_correct(&arranged, &tokens));
    }

    #[test]
    fn free_text_ignores_case_and_padding() {
        assert!(answers_match("  moses ", "Moses"));
        assert!(answers_match("MOSES", "Moses"));
        assert!(!answers_match("Mose", "Moses"));
        assert!(!answers_match("   ", ""));
    }
}
