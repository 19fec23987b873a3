use serde::Serialize;
use verse_engine::core::rng::DEFAULT_SEED;
use verse_engine::session::snapshot;
use verse_engine::{
    AppState, Countdown, EngineError, Game, GameEvent, InputQueue, KeyValueStore, LevelReport,
    Phase, PlayerAction, PlayerId, PlayerProgress, PuzzleConfig, PuzzleSession, RoundResults, Rng,
    SessionId, Token,
};

/// What the UI needs to draw the current puzzle.
#[derive(Debug, Serialize)]
pub struct SessionView<'a> {
    pub session: SessionId,
    pub reference: &'a str,
    pub phase: Phase,
    pub pool: &'a [Token],
    pub placed: &'a [Token],
    pub hints_used: u32,
    pub hints_left: u32,
    pub time_remaining: u32,
    pub time_budget: u32,
    pub score: Option<u32>,
    pub round_score: u32,
    pub round_played: usize,
    pub verses_per_round: usize,
}

/// Generic runner that wires a game to sessions, the countdown and storage.
///
/// Each concrete game creates a `thread_local!` GameRunner and exports free
/// functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export
/// generic structs directly.
pub struct GameRunner<G: Game, S: KeyValueStore> {
    game: G,
    store: S,
    config: PuzzleConfig,
    app: AppState,
    rng: Rng,
    input: InputQueue,
    countdown: Countdown,
    /// Session the running countdown belongs to.
    clock_for: Option<SessionId>,
    session: Option<PuzzleSession>,
    next_id: u64,
    round: RoundResults,
    events: Vec<GameEvent>,
    now_ms: u64,
    initialized: bool,
}

impl<G: Game, S: KeyValueStore> GameRunner<G, S> {
    pub fn new(game: G, store: S) -> Self {
        let config = game.config();
        Self {
            rng: Rng::new(config.seed.unwrap_or(DEFAULT_SEED)),
            game,
            store,
            config,
            app: AppState::default(),
            input: InputQueue::new(),
            countdown: Countdown::new(),
            clock_for: None,
            session: None,
            next_id: 1,
            round: RoundResults::new(),
            events: Vec::new(),
            now_ms: 0,
            initialized: false,
        }
    }

    /// Load progress, then resume the stored session or start a fresh one.
    /// `seed` is used unless the game config pins its own.
    pub fn init(&mut self, seed: u64, player: PlayerId) {
        self.config = self.game.config();
        if let Err(e) = self.config.validate() {
            log::error!("{}: {}", self.game.kind().title(), e);
            self.events.push(GameEvent::ContentError {
                reason: e.to_string(),
            });
            return;
        }
        self.rng = Rng::new(self.config.seed.unwrap_or(seed));
        self.app = AppState::load(&self.store, player);
        self.initialized = true;
        if !self.resume() {
            self.start_session();
        }
    }

    /// Host wall-clock time, stamped onto progress records.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    pub fn set_online(&mut self, online: bool) {
        self.app.set_online(online);
    }

    /// Merge a progress record fetched from the remote store and save the result.
    pub fn adopt_remote(&mut self, remote: Option<PlayerProgress>) {
        let kind = self.game.kind();
        self.app.adopt_remote(kind, remote);
        if let Err(e) = self.app.save(&mut self.store, kind) {
            log::warn!("could not save progress: {}", e);
        }
    }

    pub fn push_input(&mut self, action: PlayerAction) {
        self.input.push(action);
    }

    /// Run one frame: apply queued actions, then advance the countdown.
    pub fn tick(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }

        for action in self.input.drain() {
            self.apply(action);
        }

        let seconds = self.countdown.accumulate(dt);
        let Some(id) = self.clock_for else {
            return;
        };
        for _ in 0..seconds {
            let Some(session) = self.session.as_mut() else {
                break;
            };
            if session.tick(id).is_some() {
                self.finish();
                return;
            }
        }
        if seconds > 0 {
            self.persist();
        }
    }

    /// Move on to the next verse, abandoning the current one if it is unfinished.
    /// A full round starts over with fresh totals.
    pub fn next(&mut self) {
        if !self.initialized {
            return;
        }
        if self.session.as_ref().is_some_and(|s| !s.phase().is_terminal()) {
            self.apply(PlayerAction::Abandon);
        }
        if self.round.len() >= self.config.verses_per_round {
            self.round = RoundResults::new();
        }
        self.start_session();
    }

    pub fn session(&self) -> Option<&PuzzleSession> {
        self.session.as_ref()
    }

    pub fn round(&self) -> &RoundResults {
        &self.round
    }

    pub fn app(&self) -> &AppState {
        &self.app
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn view(&self) -> Option<SessionView<'_>> {
        let session = self.session.as_ref()?;
        Some(SessionView {
            session: session.id(),
            reference: session.reference(),
            phase: session.phase(),
            pool: session.arrangement().pool(),
            placed: session.arrangement().placed(),
            hints_used: session.hints_used(),
            hints_left: session.hints_left(),
            time_remaining: session.time_remaining(),
            time_budget: session.time_budget(),
            score: session.score(),
            round_score: self.round.total_score(),
            round_played: self.round.len(),
            verses_per_round: self.config.verses_per_round,
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
        to_json(self.app.progress(self.game.kind()))
    }

    pub fn round_json(&self) -> String {
        to_json(&self.round)
    }

    fn resume(&mut self) -> bool {
        let key = self.game.kind().snapshot_key();
        let Some(snap) = snapshot::read(&self.store, key) else {
            return false;
        };
        self.next_id = snap.session.0 + 1;
        if snap.phase.is_terminal() {
            return false;
        }
        match PuzzleSession::restore(snap, &self.config) {
            Ok(mut session) => {
                if session.phase() == Phase::Idle {
                    if let Err(e) = session.start() {
                        log::warn!("could not start resumed session: {}", e);
                        return false;
                    }
                }
                log::info!("resumed session {}: {}", session.id(), session.reference());
                self.game.resumed(session.reference());
                self.events.push(GameEvent::SessionResumed {
                    session: session.id(),
                    reference: session.reference().to_string(),
                });
                self.start_clock(session.id());
                self.session = Some(session);
                true
            }
            Err(e) => {
                log::warn!("discarding stored session: {}", e);
                false
            }
        }
    }

    fn start_session(&mut self) {
        self.stop_clock();
        self.input.clear();

        let verse = match self.game.next_verse(&mut self.rng) {
            Ok(verse) => verse,
            Err(e) => return self.content_error(e),
        };
        let id = SessionId(self.next_id);
        self.next_id += 1;

        let mut session = match PuzzleSession::new(id, &verse, &self.config, &mut self.rng) {
            Ok(session) => session,
            Err(e) => return self.content_error(e),
        };
        if let Err(e) = session.start() {
            return self.content_error(e);
        }
        self.events.push(GameEvent::SessionStarted {
            session: id,
            reference: verse.reference,
        });
        self.session = Some(session);
        self.start_clock(id);
        self.persist();
    }

    fn apply(&mut self, action: PlayerAction) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let result = match action {
            PlayerAction::Place { token, at } => session.place(token, at),
            PlayerAction::Remove { position } => session.remove(position),
            PlayerAction::Swap { a, b } => session.swap(a, b),
            PlayerAction::Move { from, to } => session.move_to(from, to),
            PlayerAction::Reset => session.reset(),
            PlayerAction::Hint => session.use_hint().map(|hints_left| {
                self.events.push(GameEvent::HintUsed {
                    hints_used: session.hints_used(),
                    hints_left,
                });
            }),
            PlayerAction::Submit => session.submit().map(|_| ()),
            PlayerAction::Abandon => session.abandon(),
        };
        let done = session.phase().is_terminal();

        match result {
            Ok(()) if done => self.finish(),
            Ok(()) => self.persist(),
            Err(e) => {
                log::debug!("rejected {:?}: {}", action, e);
                self.events.push(GameEvent::ActionRejected {
                    reason: e.to_string(),
                });
            }
        }
    }

    fn finish(&mut self) {
        self.stop_clock();
        self.input.clear();
        self.persist();

        let Some(summary) = self.session.as_ref().and_then(|s| s.summary()) else {
            return;
        };
        let kind = self.game.kind();
        self.round.push(summary.clone());
        self.game.finished(&summary);

        let earned = self.app.record(kind, &LevelReport::from(&summary), self.now_ms);
        if let Err(e) = self.app.save(&mut self.store, kind) {
            log::warn!("could not save progress: {}", e);
        }
        self.events.push(GameEvent::Finished { summary });
        for achievement in earned {
            self.events.push(GameEvent::AchievementUnlocked { achievement });
        }
    }

    fn content_error(&mut self, e: EngineError) {
        log::error!("{}: {}", self.game.kind().title(), e);
        self.session = None;
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
        let Some(session) = &self.session else {
            return;
        };
        let key = self.game.kind().snapshot_key();
        if let Err(e) = snapshot::write(&mut self.store, key, &session.snapshot()) {
            log::warn!("could not save session {}: {}", session.id(), e);
        }
    }
}

pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::error!("failed to encode state: {}", e);
        "null".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use verse_engine::{GameKind, MemoryStore, Outcome, SessionSummary, Verse, VerseDb};

    struct TestGame {
        db: VerseDb,
        finished: usize,
        resumed: Vec<String>,
    }

    impl TestGame {
        fn new(verses: &[(&str, &str)]) -> Self {
            Self {
                db: VerseDb::from_verses(verses.iter().map(|(r, t)| Verse::new(*r, *t)).collect()),
                finished: 0,
                resumed: Vec::new(),
            }
        }
    }

    impl Game for TestGame {
        fn config(&self) -> PuzzleConfig {
            PuzzleConfig {
                verses_per_round: 2,
                ..PuzzleConfig::default()
            }
        }

        fn kind(&self) -> GameKind {
            GameKind::VersePuzzle
        }

        fn next_verse(&mut self, rng: &mut Rng) -> Result<Verse, EngineError> {
            self.db.random(rng).cloned()
        }

        fn resumed(&mut self, reference: &str) {
            self.resumed.push(reference.to_string());
        }

        fn finished(&mut self, _summary: &SessionSummary) {
            self.finished += 1;
        }
    }

    fn runner() -> GameRunner<TestGame, MemoryStore> {
        runner_with(MemoryStore::new())
    }

    fn runner_with(store: MemoryStore) -> GameRunner<TestGame, MemoryStore> {
        let mut r = GameRunner::new(TestGame::new(&[("John 11:35", "Jesus wept.")]), store);
        r.init(3, PlayerId::guest());
        r
    }

    fn solve(r: &mut GameRunner<TestGame, MemoryStore>) {
        let n = r.session().unwrap().tokens().len();
        for token in 0..n {
            r.push_input(PlayerAction::Place { token, at: None });
        }
        r.push_input(PlayerAction::Submit);
        r.tick(0.0);
    }

    #[test]
    fn init_starts_a_session() {
        let mut r = runner();
        let session = r.session().unwrap();
        assert_eq!(session.phase(), Phase::Active);
        assert_eq!(session.time_remaining(), 30);
        let events = r.take_events();
        assert!(matches!(events[0], GameEvent::SessionStarted { .. }));
    }

    #[test]
    fn solving_records_progress() {
        let mut r = runner();
        r.set_now(1234);
        r.take_events();
        solve(&mut r);

        let session = r.session().unwrap();
        assert_eq!(session.phase(), Phase::Done(Outcome::Correct));
        assert_eq!(session.score(), Some(100));
        assert_eq!(r.round().total_score(), 100);
        assert_eq!(r.game().finished, 1);

        let progress = r.app().progress(GameKind::VersePuzzle);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.last_played, Some(1234));

        let events = r.take_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::Finished { summary } if summary.score == 100)));
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::AchievementUnlocked { achievement: verse_engine::Achievement::PerfectAnswer }
        )));
    }

    #[test]
    fn countdown_times_out() {
        let mut r = runner();
        r.tick(29.5);
        assert_eq!(r.session().unwrap().time_remaining(), 1);
        r.tick(0.5);
        assert_eq!(r.session().unwrap().phase(), Phase::Done(Outcome::TimedOut));
        assert_eq!(r.app().progress(GameKind::VersePuzzle).streak, 0);
    }

    #[test]
    fn finished_session_stops_the_clock() {
        let mut r = runner();
        r.tick(0.9);
        solve(&mut r);
        r.tick(10.0);
        assert_eq!(r.session().unwrap().time_remaining(), 30);

        r.next();
        r.tick(0.2);
        let session = r.session().unwrap();
        assert_eq!(session.id(), SessionId(2));
        assert_eq!(session.time_remaining(), 30);
    }

    #[test]
    fn rejected_moves_surface_as_events() {
        let mut r = runner();
        r.take_events();
        r.push_input(PlayerAction::Remove { position: 4 });
        r.tick(0.0);
        let events = r.take_events();
        assert!(matches!(events.as_slice(), [GameEvent::ActionRejected { .. }]));
    }

    #[test]
    fn hint_emits_counts() {
        let mut r = runner();
        r.take_events();
        r.push_input(PlayerAction::Hint);
        r.tick(0.0);
        assert_eq!(
            r.take_events(),
            vec![GameEvent::HintUsed {
                hints_used: 1,
                hints_left: 4
            }]
        );
    }

    #[test]
    fn reload_resumes_the_same_session() {
        let mut first = runner();
        first.push_input(PlayerAction::Hint);
        first.tick(3.0);
        let before = first.session().unwrap().snapshot();

        let mut second = runner_with(first.store().clone());
        let resumed = second.session().unwrap().snapshot();
        assert_eq!(resumed, before);
        assert_eq!(resumed.time_remaining_secs, 27);
        assert!(matches!(second.take_events()[0], GameEvent::SessionResumed { .. }));
        assert_eq!(second.game().resumed, vec!["John 11:35".to_string()]);
    }

    #[test]
    fn finished_session_is_not_resumed() {
        let mut first = runner();
        solve(&mut first);
        let mut second = runner_with(first.store().clone());
        assert_eq!(second.session().unwrap().id(), SessionId(2));
        assert_eq!(second.session().unwrap().phase(), Phase::Active);
        assert!(matches!(second.take_events()[0], GameEvent::SessionStarted { .. }));
        assert!(second.game().resumed.is_empty());
        // Progress from the first run survives.
        assert_eq!(second.app().progress(GameKind::VersePuzzle).level, 2);
    }

    #[test]
    fn offline_store_keeps_playing() {
        let mut r = runner_with(MemoryStore::failing());
        solve(&mut r);
        assert_eq!(r.session().unwrap().score(), Some(100));
    }

    #[test]
    fn next_abandons_unfinished_and_rolls_rounds() {
        let mut r = runner();
        r.next();
        assert_eq!(r.round().len(), 1);
        assert_eq!(r.round().summaries[0].outcome, Outcome::Abandoned);
        solve(&mut r);
        assert_eq!(r.round().len(), 2);
        assert_eq!(r.round().total_score(), 100);
        r.next();
        assert!(r.round().is_empty());
        assert_eq!(r.session().unwrap().id(), SessionId(3));
    }

    #[test]
    fn empty_content_reports_error() {
        let mut r = GameRunner::new(TestGame::new(&[]), MemoryStore::new());
        r.init(1, PlayerId::guest());
        assert!(r.session().is_none());
        assert!(matches!(r.take_events()[0], GameEvent::ContentError { .. }));
        assert_eq!(r.state_json(), "null");
    }

    #[test]
    fn state_json_lists_tiles() {
        let r = runner();
        let json: serde_json::Value = serde_json::from_str(&r.state_json()).unwrap();
        assert_eq!(json["pool"].as_array().unwrap().len(), 2);
        assert_eq!(json["phase"]["phase"], "active");
        assert_eq!(json["time_remaining"], 30);
    }
}
