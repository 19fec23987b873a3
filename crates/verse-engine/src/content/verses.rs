use serde::{Deserialize, Serialize};

use crate::api::error::EngineError;
use crate::core::rng::Rng;

/// A verse with its reference, e.g. "John 11:35".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub reference: String,
    pub text: String,
}

impl Verse {
    pub fn new(reference: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            text: text.into(),
        }
    }
}

/// Database of verses for a game.
#[derive(Debug, Clone, Default)]
pub struct VerseDb {
    verses: Vec<Verse>,
}

impl VerseDb {
    /// Parse a JSON array of `{ "reference", "text" }` objects.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let verses: Vec<Verse> = serde_json::from_str(json)?;
        Ok(Self { verses })
    }

    pub fn from_verses(verses: Vec<Verse>) -> Self {
        Self { verses }
    }

    /// Pick a verse by index (wraps around).
    pub fn pick(&self, index: usize) -> Result<&Verse, EngineError> {
        if self.verses.is_empty() {
            return Err(EngineError::content("verse list is empty"));
        }
        Ok(&self.verses[index % self.verses.len()])
    }

    /// Random verse.
    pub fn random(&self, rng: &mut Rng) -> Result<&Verse, EngineError> {
        self.pick(rng.next_index(self.verses.len()))
    }

    /// Up to `count` distinct verses in random order, skipping references in `exclude`.
    ///
    /// Falls back to the full list when the exclusions would leave fewer than `count`.
    pub fn draw(&self, rng: &mut Rng, count: usize, exclude: &[String]) -> Result<Vec<Verse>, EngineError> {
        if self.verses.is_empty() {
            return Err(EngineError::content("verse list is empty"));
        }
        let mut candidates: Vec<&Verse> = self
            .verses
            .iter()
            .filter(|v| !exclude.contains(&v.reference))
            .collect();
        if candidates.len() < count {
            candidates = self.verses.iter().collect();
        }
        rng.shuffle(&mut candidates);
        Ok(candidates.into_iter().take(count).cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Verse> {
        self.verses.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON: &str = r#"[
        {"reference": "John 11:35", "text": "Jesus wept."},
        {"reference": "Genesis 1:1", "text": "In the beginning God created the heaven and the earth."},
        {"reference": "1 Thessalonians 5:16", "text": "Rejoice evermore."}
    ]"#;

    #[test]
    fn parse_verses() {
        let db = VerseDb::from_json(JSON).unwrap();
        assert_eq!(db.len(), 3);
        assert_eq!(db.pick(0).unwrap().reference, "John 11:35");
    }

    #[test]
    fn pick_wraps_around() {
        let db = VerseDb::from_json(JSON).unwrap();
        assert_eq!(db.pick(4).unwrap().reference, "Genesis 1:1");
    }

    #[test]
    fn empty_db_is_content_error() {
        let db = VerseDb::default();
        assert!(matches!(db.pick(0), Err(EngineError::ContentUnavailable { .. })));
        assert!(db.draw(&mut Rng::new(1), 2, &[]).is_err());
    }

    #[test]
    fn draw_skips_excluded_and_repeats_nothing() {
        let db = VerseDb::from_json(JSON).unwrap();
        let drawn = db.draw(&mut Rng::new(9), 2, &["John 11:35".to_string()]).unwrap();
        assert_eq!(drawn.len(), 2);
        assert!(drawn.iter().all(|v| v.reference != "John 11:35"));
        assert_ne!(drawn[0], drawn[1]);
    }

    #[test]
    fn draw_falls_back_when_everything_excluded() {
        let db = VerseDb::from_json(JSON).unwrap();
        let all: Vec<String> = db.iter().map(|v| v.reference.clone()).collect();
        let drawn = db.draw(&mut Rng::new(2), 3, &all).unwrap();
        assert_eq!(drawn.len(), 3);
    }
}
