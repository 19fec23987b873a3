use verse_engine::*;

/// Embedded verse list (KJV).
const VERSES_JSON: &str = include_str!("../data/verses.json");

/// Verse arrangement game. Verses are drawn at random without repeats
/// inside a round.
pub struct VersePuzzle {
    db: VerseDb,
    config: PuzzleConfig,
    /// References played in the current round.
    recent: Vec<String>,
}

impl VersePuzzle {
    /// Ten-verse round of word tiles.
    pub fn new() -> Self {
        Self::with_config(PuzzleConfig::word_tiles())
    }

    /// Single verse cut into phrase fragments.
    pub fn fragments() -> Self {
        Self::with_config(PuzzleConfig::fragment_tiles())
    }

    /// Phrase fragments with thousand-point scoring.
    pub fn classic() -> Self {
        Self::with_config(PuzzleConfig::classic())
    }

    pub fn with_config(config: PuzzleConfig) -> Self {
        let db = VerseDb::from_json(VERSES_JSON).unwrap_or_else(|e| {
            log::error!("verse list is unreadable: {}", e);
            VerseDb::default()
        });
        Self::with_verses(db, config)
    }

    pub fn with_verses(db: VerseDb, config: PuzzleConfig) -> Self {
        Self {
            db,
            config,
            recent: Vec::new(),
        }
    }
}

impl Default for VersePuzzle {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for VersePuzzle {
    fn config(&self) -> PuzzleConfig {
        self.config.clone()
    }

    fn kind(&self) -> GameKind {
        GameKind::VersePuzzle
    }

    fn next_verse(&mut self, rng: &mut Rng) -> Result<Verse, EngineError> {
        if self.recent.len() >= self.config.verses_per_round {
            self.recent.clear();
        }
        let verse = self
            .db
            .draw(rng, 1, &self.recent)?
            .pop()
            .ok_or_else(|| EngineError::content("no verse drawn"))?;
        self.recent.push(verse.reference.clone());
        Ok(verse)
    }

    fn resumed(&mut self, reference: &str) {
        if !self.recent.iter().any(|r| r == reference) {
            self.recent.push(reference.to_string());
        }
    }

    fn finished(&mut self, summary: &SessionSummary) {
        log::info!(
            "{}: {:?} for {} points",
            summary.reference,
            summary.outcome,
            summary.score
        );
    }
}
