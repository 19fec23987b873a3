use verse_engine::EngineError;

/// How far from the midpoint a clause break may pull the split.
const BREAK_WINDOW: usize = 2;
const CLAUSE_MARKS: &[char] = &[',', ';', ':'];

/// Cut a verse into an opening and an ending of roughly equal length.
///
/// The cut lands at the middle word unless a word ending a clause sits
/// within two words of it, in which case the cut follows that word.
pub fn split_verse(text: &str) -> Result<(String, String), EngineError> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < 2 {
        return Err(EngineError::content("verse is too short to split"));
    }
    let mid = words.len() / 2;
    let lo = mid.saturating_sub(BREAK_WINDOW).max(1);
    let hi = (mid + BREAK_WINDOW).min(words.len() - 1);
    let cut = (lo..=hi)
        .find(|&i| words[i - 1].contains(CLAUSE_MARKS))
        .unwrap_or(mid);
    Ok((words[..cut].join(" "), words[cut..].join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_clause_break() {
        let (first, second) = split_verse("The LORD is my shepherd; I shall not want.").unwrap();
        assert_eq!(first, "The LORD is my shepherd;");
        assert_eq!(second, "I shall not want.");
    }

    #[test]
    fn falls_back_to_midpoint() {
        let (first, second) = split_verse("For we walk by faith not by sight").unwrap();
        assert_eq!(first, "For we walk by");
        assert_eq!(second, "faith not by sight");
    }

    #[test]
    fn earliest_break_in_window_wins() {
        // mid = 5; window covers cuts 3..=7
        let (first, _) = split_verse("a b c, d e f; g h i j").unwrap();
        assert_eq!(first, "a b c,");
    }

    #[test]
    fn two_words_split_evenly() {
        assert_eq!(
            split_verse("Jesus wept.").unwrap(),
            ("Jesus".to_string(), "wept.".to_string())
        );
    }

    #[test]
    fn single_word_is_content_error() {
        assert!(split_verse("Amen").is_err());
        assert!(split_verse("   ").is_err());
    }

    #[test]
    fn halves_rejoin_to_the_verse() {
        let text = "Call unto me, and I will answer thee, and shew thee great and mighty things";
        let (first, second) = split_verse(text).unwrap();
        assert_eq!(format!("{} {}", first, second), text);
    }
}
