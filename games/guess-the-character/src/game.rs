use serde::{Deserialize, Serialize};
use verse_engine::storage::store::{self, KeyValueStore};
use verse_engine::{
    AppState, Countdown, EngineError, GameEvent, GameKind, LevelReport, Phase, PlayerId, PlayerProgress, Rng,
    SessionId, SNAPSHOT_VERSION,
};

use crate::characters::CharacterDb;
use crate::levels::{level_spec, LevelSpec};
use crate::round::CharacterRound;

const KIND: GameKind = GameKind::GuessTheCharacter;

/// Stored form of an unfinished round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub version: u32,
    pub round: CharacterRound,
}

/// What the UI needs to draw the round. The name is only present once it is over.
#[derive(Debug, Serialize)]
pub struct CharacterView<'a> {
    pub session: SessionId,
    pub level: &'static LevelSpec,
    pub phase: Phase,
    pub revealed_hints: &'a [String],
    pub hints_used: u32,
    pub hints_left: u32,
    pub time_remaining: u32,
    pub wrong_guesses: u32,
    pub potential_score: u32,
    pub score: Option<u32>,
    pub answer: Option<&'a str>,
    pub total_score: u64,
}

/// Character guessing, one round per level.
/// A correct name moves the player up a level; anything else replays it.
pub struct CharacterGame<S: KeyValueStore> {
    db: CharacterDb,
    store: S,
    app: AppState,
    rng: Rng,
    countdown: Countdown,
    clock_for: Option<SessionId>,
    round: Option<CharacterRound>,
    next_id: u64,
    events: Vec<GameEvent>,
    now_ms: u64,
}

impl<S: KeyValueStore> CharacterGame<S> {
    pub fn new(db: CharacterDb, store: S) -> Self {
        Self {
            db,
            store,
            app: AppState::default(),
            rng: Rng::default(),
            countdown: Countdown::new(),
            clock_for: None,
            round: None,
            next_id: 1,
            events: Vec::new(),
            now_ms: 0,
        }
    }

    /// Load progress, then resume the stored round or start one at the player's level.
    pub fn init(&mut self, seed: u64, player: PlayerId) {
        self.rng = Rng::new(seed);
        self.app = AppState::load(&self.store, player);
        if !self.resume() {
            self.start_round();
        }
    }

    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    pub fn set_online(&mut self, online: bool) {
        self.app.set_online(online);
    }

    pub fn adopt_remote(&mut self, remote: Option<PlayerProgress>) {
        self.app.adopt_remote(KIND, remote);
        self.save_progress();
    }

    pub fn round(&self) -> Option<&CharacterRound> {
        self.round.as_ref()
    }

    pub fn progress(&self) -> &PlayerProgress {
        self.app.progress(KIND)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn tick(&mut self, dt: f32) {
        let seconds = self.countdown.accumulate(dt);
        let Some(id) = self.clock_for else {
            return;
        };
        for _ in 0..seconds {
            let Some(round) = self.round.as_mut() else {
                break;
            };
            if round.tick(id).is_some() {
                self.finish();
                return;
            }
        }
        if seconds > 0 {
            self.persist();
        }
    }

    pub fn reveal_hint(&mut self) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        match round.reveal_hint().map(|_| ()) {
            Ok(()) => {
                self.events.push(GameEvent::HintUsed {
                    hints_used: round.hints_used(),
                    hints_left: round.hints_left(),
                });
                self.persist();
            }
            Err(e) => self.reject(e),
        }
    }

    pub fn guess(&mut self, text: &str) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        match round.guess(text) {
            Ok(true) => self.finish(),
            Ok(false) => {
                self.events.push(GameEvent::Answered {
                    correct: false,
                    points: 0,
                    streak: 0,
                });
                self.persist();
            }
            Err(e) => self.reject(e),
        }
    }

    pub fn abandon(&mut self) {
        let Some(round) = self.round.as_mut() else {
            return;
        };
        match round.abandon() {
            Ok(()) => self.finish(),
            Err(e) => self.reject(e),
        }
    }

    /// Start the next round, abandoning the current one if it is still open.
    pub fn next(&mut self) {
        if self.round.as_ref().is_some_and(|r| !r.phase().is_terminal()) {
            self.abandon();
        }
        self.start_round();
    }

    pub fn view(&self) -> Option<CharacterView<'_>> {
        let round = self.round.as_ref()?;
        Some(CharacterView {
            session: round.id(),
            level: level_spec(round.level()),
            phase: round.phase(),
            revealed_hints: round.revealed_hints(),
            hints_used: round.hints_used(),
            hints_left: round.hints_left(),
            time_remaining: round.time_remaining(),
            wrong_guesses: round.wrong_guesses(),
            potential_score: round.potential_score(),
            score: round.score(),
            answer: round.answer(),
            total_score: self.progress().total_score,
        })
    }

    pub fn state_json(&self) -> String {
        to_json(&self.view())
    }

    pub fn take_events_json(&mut self) -> String {
        let events = self.take_events();
        to_json(&events)
    }

    pub fn progress_json(&self) -> String {
        to_json(self.progress())
    }

    fn resume(&mut self) -> bool {
        let snapshot = match store::load::<RoundSnapshot, S>(&self.store, KIND.snapshot_key()) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("could not read stored round: {}", e);
                return false;
            }
        };
        self.next_id = snapshot.round.id().0 + 1;
        if snapshot.version != SNAPSHOT_VERSION
            || snapshot.round.phase() != Phase::Active
            || !snapshot.round.is_consistent()
        {
            return false;
        }
        let round = snapshot.round;
        log::info!("resumed round {} at level {}", round.id(), round.level());
        self.events.push(GameEvent::SessionResumed {
            session: round.id(),
            reference: format!("Level {}", round.level()),
        });
        self.start_clock(round.id());
        self.round = Some(round);
        true
    }

    fn start_round(&mut self) {
        self.stop_clock();
        let used = self.progress().played.clone();
        let (character, exhausted) = match self.db.pick(&mut self.rng, &used) {
            Ok(pick) => pick,
            Err(e) => return self.content_error(e),
        };
        if exhausted {
            log::info!("every character used; starting the list over");
            self.app.progress_mut(KIND).clear_played();
        }

        let spec = level_spec(self.progress().level);
        let id = SessionId(self.next_id);
        self.next_id += 1;
        let mut round = match CharacterRound::new(id, character, spec) {
            Ok(round) => round,
            Err(e) => return self.content_error(e),
        };
        if let Err(e) = round.start() {
            return self.content_error(e);
        }
        log::info!("round {} started at level {}", id, spec.level);
        self.events.push(GameEvent::SessionStarted {
            session: id,
            reference: format!("Level {}", spec.level),
        });
        self.round = Some(round);
        self.start_clock(id);
        self.persist();
    }

    fn finish(&mut self) {
        self.stop_clock();
        self.persist();
        let Some(round) = self.round.as_ref() else {
            return;
        };
        let Some(summary) = round.summary() else {
            return;
        };
        let mut report = LevelReport::from(&summary);
        report.played = vec![round.character().name.clone()];

        if summary.outcome.is_success() {
            self.events.push(GameEvent::Answered {
                correct: true,
                points: summary.score,
                streak: self.progress().streak + 1,
            });
        }
        let earned = self.app.record(KIND, &report, self.now_ms);
        self.save_progress();
        self.events.push(GameEvent::Finished { summary });
        for achievement in earned {
            self.events.push(GameEvent::AchievementUnlocked { achievement });
        }
    }

    fn reject(&mut self, e: EngineError) {
        log::debug!("rejected: {}", e);
        self.events.push(GameEvent::ActionRejected {
            reason: e.to_string(),
        });
    }

    fn content_error(&mut self, e: EngineError) {
        log::error!("{}: {}", KIND.title(), e);
        self.round = None;
        self.events.push(GameEvent::ContentError {
            reason: e.to_string(),
        });
    }

    fn start_clock(&mut self, id: SessionId) {
        self.countdown.start();
        self.clock_for = Some(id);
    }

    fn stop_clock(&mut self) {
        self.countdown.stop();
        self.clock_for = None;
    }

    fn persist(&mut self) {
        let Some(round) = &self.round else {
            return;
        };
        let snapshot = RoundSnapshot {
            version: SNAPSHOT_VERSION,
            round: round.clone(),
        };
        if let Err(e) = store::save_idempotent(&mut self.store, KIND.snapshot_key(), &snapshot) {
            log::warn!("could not save round {}: {}", round.id(), e);
        }
    }

    fn save_progress(&mut self) {
        if let Err(e) = self.app.save(&mut self.store, KIND) {
            log::warn!("could not save progress: {}", e);
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::error!("failed to encode state: {}", e);
        "null".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use verse_engine::{Achievement, MemoryStore, Outcome};

    fn game_with(store: MemoryStore) -> CharacterGame<MemoryStore> {
        let mut game = CharacterGame::new(CharacterDb::embedded(), store);
        game.init(11, PlayerId::guest());
        game
    }

    fn answer(game: &CharacterGame<MemoryStore>) -> String {
        game.round().unwrap().character().name.clone()
    }

    #[test]
    fn first_round_is_level_one() {
        let mut game = game_with(MemoryStore::new());
        let round = game.round().unwrap();
        assert_eq!(round.level(), 1);
        assert_eq!(round.revealed_hints().len(), 1);
        assert_eq!(round.time_remaining(), 60);
        assert!(matches!(game.take_events()[0], GameEvent::SessionStarted { .. }));
    }

    #[test]
    fn correct_guess_levels_up() {
        let mut game = game_with(MemoryStore::new());
        game.set_now(77);
        let name = answer(&game);
        game.guess(&name.to_uppercase());

        assert_eq!(game.round().unwrap().score(), Some(100));
        assert_eq!(game.progress().level, 2);
        assert_eq!(game.progress().total_score, 100);
        assert_eq!(game.progress().played, vec![name]);
        let events = game.take_events();
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::AchievementUnlocked { achievement: Achievement::PerfectAnswer }
        )));

        game.next();
        assert_eq!(game.round().unwrap().level(), 2);
    }

    #[test]
    fn wrong_guess_reports_and_retries() {
        let mut game = game_with(MemoryStore::new());
        game.take_events();
        game.guess("Goliath");
        assert_eq!(
            game.take_events(),
            vec![GameEvent::Answered {
                correct: false,
                points: 0,
                streak: 0
            }]
        );
        assert!(game.round().unwrap().is_active());
    }

    #[test]
    fn timeout_replays_the_level() {
        let mut game = game_with(MemoryStore::new());
        game.tick(60.0);
        assert_eq!(game.round().unwrap().phase(), Phase::Done(Outcome::TimedOut));
        game.next();
        assert_eq!(game.round().unwrap().level(), 1);
        assert_eq!(game.progress().streak, 0);
    }

    #[test]
    fn characters_do_not_repeat_until_exhausted() {
        let mut game = game_with(MemoryStore::new());
        let mut seen = Vec::new();
        for _ in 0..10 {
            let name = answer(&game);
            assert!(!seen.contains(&name), "{} repeated", name);
            seen.push(name.clone());
            game.guess(&name);
            game.next();
        }
        // List started over
        assert!(game.progress().played.is_empty());
    }

    #[test]
    fn reload_resumes_round() {
        let mut first = game_with(MemoryStore::new());
        first.reveal_hint();
        first.tick(5.0);
        let before = first.round().unwrap().clone();

        let mut second = game_with(first.store().clone());
        assert_eq!(second.round(), Some(&before));
        assert!(matches!(second.take_events()[0], GameEvent::SessionResumed { .. }));
    }

    #[test]
    fn view_hides_the_name_until_done() {
        let mut game = game_with(MemoryStore::new());
        let json: serde_json::Value = serde_json::from_str(&game.state_json()).unwrap();
        assert!(json["answer"].is_null());
        assert_eq!(json["level"]["max_hints"], 3);
        game.abandon();
        let json: serde_json::Value = serde_json::from_str(&game.state_json()).unwrap();
        assert!(json["answer"].is_string());
    }

    #[test]
    fn empty_db_is_content_error() {
        let mut game = CharacterGame::new(CharacterDb::default(), MemoryStore::new());
        game.init(1, PlayerId::guest());
        assert!(game.round().is_none());
        assert!(matches!(game.take_events()[0], GameEvent::ContentError { .. }));
    }
}
