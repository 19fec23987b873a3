use serde::{Deserialize, Serialize};
use verse_engine::{EngineError, Rng};

/// Embedded character list.
const CHARACTERS_JSON: &str = include_str!("../data/characters.json");

/// A Bible figure and one-word hints, most general first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub hints: Vec<String>,
}

/// Database of characters for the game.
#[derive(Debug, Clone, Default)]
pub struct CharacterDb {
    characters: Vec<Character>,
}

impl CharacterDb {
    /// Parse a JSON array of `{ "name", "hints" }` objects.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let characters: Vec<Character> = serde_json::from_str(json)?;
        Ok(Self { characters })
    }

    /// The embedded list. An unreadable list comes back empty and every pick
    /// fails with a content error.
    pub fn embedded() -> Self {
        Self::from_json(CHARACTERS_JSON).unwrap_or_else(|e| {
            log::error!("character list is unreadable: {}", e);
            Self::default()
        })
    }

    pub fn from_characters(characters: Vec<Character>) -> Self {
        Self { characters }
    }

    /// Random character whose name is not in `used`.
    ///
    /// When every character has been used the list starts over; the second
    /// value reports that so the caller can clear its record.
    pub fn pick(&self, rng: &mut Rng, used: &[String]) -> Result<(Character, bool), EngineError> {
        let playable: Vec<&Character> = self.characters.iter().filter(|c| !c.hints.is_empty()).collect();
        if playable.is_empty() {
            return Err(EngineError::content("no characters with hints"));
        }
        let fresh: Vec<&Character> = playable
            .iter()
            .copied()
            .filter(|c| !used.contains(&c.name))
            .collect();
        let (pool, exhausted) = if fresh.is_empty() {
            (playable, true)
        } else {
            (fresh, false)
        };
        let chosen = pool[rng.next_index(pool.len())].clone();
        Ok((chosen, exhausted))
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}
