use serde::{Deserialize, Serialize};
use verse_engine::storage::store::{self, KeyValueStore};
use verse_engine::{
    AppState, Countdown, GameEvent, GameKind, LevelReport, Phase, PlayerId, PlayerProgress, Rng, SessionId, VerseDb,
    SNAPSHOT_VERSION,
};

use crate::board::{Card, MatchBoard, MatchError, MatchOption};

const KIND: GameKind = GameKind::MatchTheVerse;
const VERSES_JSON: &str = include_str!("../data/verses.json");

/// Verses on the board per round.
pub const VERSES_PER_ROUND: usize = 5;

/// The embedded verse list, or an empty one if it cannot be read.
pub fn embedded_verses() -> VerseDb {
    VerseDb::from_json(VERSES_JSON).unwrap_or_else(|e| {
        log::error!("verse list is unreadable: {}", e);
        VerseDb::default()
    })
}

/// Stored form of an unfinished board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub version: u32,
    pub board: MatchBoard,
}

#[derive(Debug, Serialize)]
pub struct MatchView<'a> {
    pub session: SessionId,
    pub phase: Phase,
    pub cards: &'a [Card],
    pub options: &'a [MatchOption],
    pub selected: Option<usize>,
    pub score: u32,
    pub streak: u32,
    pub matched: usize,
    pub accuracy_percent: u32,
    pub elapsed_secs: u32,
    pub total_score: u64,
}

/// Verse matching. Each round puts five unplayed verses on the board.
pub struct MatchGame<S: KeyValueStore> {
    db: VerseDb,
    store: S,
    app: AppState,
    rng: Rng,
    saver: Countdown,
    board: Option<MatchBoard>,
    next_id: u64,
    events: Vec<GameEvent>,
    now_ms: u64,
}

impl<S: KeyValueStore> MatchGame<S> {
    pub fn new(db: VerseDb, store: S) -> Self {
        Self {
            db,
            store,
            app: AppState::default(),
            rng: Rng::default(),
            saver: Countdown::new(),
            board: None,
            next_id: 1,
            events: Vec::new(),
            now_ms: 0,
        }
    }

    pub fn init(&mut self, seed: u64, player: PlayerId) {
        self.rng = Rng::new(seed);
        self.app = AppState::load(&self.store, player);
        if !self.resume() {
            self.start_board();
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

    pub fn board(&self) -> Option<&MatchBoard> {
        self.board.as_ref()
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

    /// Advance the board clock. The snapshot is refreshed once per whole second.
    pub fn tick(&mut self, dt: f32) {
        let Some(board) = self.board.as_mut() else {
            return;
        };
        board.advance(dt);
        if self.saver.accumulate(dt) > 0 {
            self.persist();
        }
    }

    pub fn reveal(&mut self, card: usize) {
        let Some(board) = self.board.as_mut() else {
            return;
        };
        match board.reveal(card) {
            Ok(()) => self.persist(),
            Err(e) => self.reject(e),
        }
    }

    pub fn choose(&mut self, option: usize) {
        let Some(board) = self.board.as_mut() else {
            return;
        };
        match board.choose(option) {
            Ok(choice) => {
                let done = board.phase().is_terminal();
                self.events.push(GameEvent::Answered {
                    correct: choice.correct,
                    points: choice.points,
                    streak: choice.streak,
                });
                if done {
                    self.finish();
                } else {
                    self.persist();
                }
            }
            Err(e) => self.reject(e),
        }
    }

    pub fn abandon(&mut self) {
        let Some(board) = self.board.as_mut() else {
            return;
        };
        match board.abandon() {
            Ok(()) => self.finish(),
            Err(e) => self.reject(e),
        }
    }

    /// Deal a new board, abandoning the current one if it is still open.
    pub fn next(&mut self) {
        if self.board.as_ref().is_some_and(|b| !b.phase().is_terminal()) {
            self.abandon();
        }
        self.start_board();
    }

    pub fn view(&self) -> Option<MatchView<'_>> {
        let board = self.board.as_ref()?;
        Some(MatchView {
            session: board.id(),
            phase: board.phase(),
            cards: board.cards(),
            options: board.options(),
            selected: board.selected(),
            score: board.score(),
            streak: board.streak(),
            matched: board.matched_count(),
            accuracy_percent: board.accuracy_percent(),
            elapsed_secs: board.elapsed_secs() as u32,
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
        let snapshot = match store::load::<BoardSnapshot, S>(&self.store, KIND.snapshot_key()) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("could not read stored board: {}", e);
                return false;
            }
        };
        self.next_id = snapshot.board.id().0 + 1;
        if snapshot.version != SNAPSHOT_VERSION
            || snapshot.board.phase() != Phase::Active
            || !snapshot.board.is_consistent()
        {
            return false;
        }
        let board = snapshot.board;
        log::info!("resumed board {} with {} matched", board.id(), board.matched_count());
        self.events.push(GameEvent::SessionResumed {
            session: board.id(),
            reference: board.references().join(", "),
        });
        self.saver.start();
        self.board = Some(board);
        true
    }

    fn start_board(&mut self) {
        self.saver.stop();
        let played = self.progress().played.clone();
        let verses = match self.db.draw(&mut self.rng, VERSES_PER_ROUND, &played) {
            Ok(verses) => verses,
            Err(e) => return self.content_error(e.into()),
        };
        if verses.iter().any(|v| played.contains(&v.reference)) {
            log::info!("every verse matched; starting the list over");
            self.app.progress_mut(KIND).clear_played();
        }

        let id = SessionId(self.next_id);
        self.next_id += 1;
        let streak = self.progress().streak;
        let board = match MatchBoard::new(id, &verses, streak, &mut self.rng) {
            Ok(board) => board,
            Err(e) => return self.content_error(e.into()),
        };
        log::info!("board {} dealt with {} verses", id, verses.len());
        self.events.push(GameEvent::SessionStarted {
            session: id,
            reference: board.references().join(", "),
        });
        self.board = Some(board);
        self.saver.start();
        self.persist();
    }

    fn finish(&mut self) {
        self.saver.stop();
        self.persist();
        let Some(board) = self.board.as_ref() else {
            return;
        };
        let Some(summary) = board.summary() else {
            return;
        };
        let mut report = LevelReport::from(&summary);
        report.played = board.references();
        report.elapsed_secs = board.elapsed_secs() as u32;
        if summary.outcome.is_success() {
            report.accuracy_percent = Some(board.accuracy_percent());
            report.answer_streak = Some(board.streak());
        }
        let earned = self.app.record(KIND, &report, self.now_ms);
        self.save_progress();
        self.events.push(GameEvent::Finished { summary });
        for achievement in earned {
            self.events.push(GameEvent::AchievementUnlocked { achievement });
        }
    }

    fn reject(&mut self, e: MatchError) {
        log::debug!("rejected: {}", e);
        self.events.push(GameEvent::ActionRejected {
            reason: e.to_string(),
        });
    }

    fn content_error(&mut self, e: MatchError) {
        log::error!("{}: {}", KIND.title(), e);
        self.board = None;
        self.events.push(GameEvent::ContentError {
            reason: e.to_string(),
        });
    }

    fn persist(&mut self) {
        let Some(board) = &self.board else {
            return;
        };
        let snapshot = BoardSnapshot {
            version: SNAPSHOT_VERSION,
            board: board.clone(),
        };
        if let Err(e) = store::save_idempotent(&mut self.store, KIND.snapshot_key(), &snapshot) {
            log::warn!("could not save board {}: {}", board.id(), e);
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
