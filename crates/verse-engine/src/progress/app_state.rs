use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::types::GameKind;
use crate::progress::player::{reconcile, Achievement, LevelReport, PlayerProgress};
use crate::storage::store::{load_or_default, save_idempotent, KeyValueStore, StoreError};

/// Identity the progress records are keyed by. Signed-out players are `guest`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn guest() -> Self {
        PlayerId("guest".into())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::guest()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Application state handed to every game: who is playing, whether the
/// remote store is reachable, and progress for each mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    player: PlayerId,
    online: bool,
    progress: [PlayerProgress; 3],
}

impl AppState {
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            ..Self::default()
        }
    }

    /// Read every mode's record for `player`; anything unreadable starts fresh.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, player: PlayerId) -> Self {
        let mut state = Self::new(player);
        for kind in GameKind::ALL {
            state.progress[kind as usize] = load_or_default(store, &state.key(kind));
        }
        state
    }

    /// Storage key for one mode's record.
    pub fn key(&self, kind: GameKind) -> String {
        format!("gameProgress/{}/{}", self.player, kind.slug())
    }

    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn set_online(&mut self, online: bool) {
        self.online = online;
    }

    pub fn progress(&self, kind: GameKind) -> &PlayerProgress {
        &self.progress[kind as usize]
    }

    pub fn progress_mut(&mut self, kind: GameKind) -> &mut PlayerProgress {
        &mut self.progress[kind as usize]
    }

    pub fn record(&mut self, kind: GameKind, report: &LevelReport, now_ms: u64) -> Vec<Achievement> {
        let earned = self.progress_mut(kind).record(report, now_ms);
        for a in &earned {
            log::info!("{} unlocked {} in {}", self.player, a.title(), kind.title());
        }
        earned
    }

    /// Merge a record fetched from the remote store.
    pub fn adopt_remote(&mut self, kind: GameKind, remote: Option<PlayerProgress>) {
        let local = std::mem::take(self.progress_mut(kind));
        self.progress[kind as usize] = reconcile(local, remote, self.online);
    }

    pub fn reset(&mut self, kind: GameKind) {
        *self.progress_mut(kind) = PlayerProgress::default();
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S, kind: GameKind) -> Result<bool, StoreError> {
        save_idempotent(store, &self.key(kind), self.progress(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::Outcome;
    use crate::storage::store::MemoryStore;

    fn win() -> LevelReport {
        LevelReport {
            outcome: Outcome::Correct,
            score: 70,
            hints_used: 2,
            elapsed_secs: 100,
            accuracy_percent: None,
            played: Vec::new(),
            answer_streak: None,
        }
    }

    #[test]
    fn keys_are_per_player_and_mode() {
        let state = AppState::new(PlayerId("ana".into()));
        assert_eq!(state.key(GameKind::MatchTheVerse), "gameProgress/ana/match-the-verse");
        assert_eq!(AppState::default().key(GameKind::VersePuzzle), "gameProgress/guest/verse-puzzle");
    }

    #[test]
    fn saved_progress_loads_back() {
        let mut store = MemoryStore::new();
        let mut state = AppState::new(PlayerId("ana".into()));
        state.record(GameKind::GuessTheCharacter, &win(), 5);
        state.save(&mut store, GameKind::GuessTheCharacter).unwrap();

        let loaded = AppState::load(&store, PlayerId("ana".into()));
        assert_eq!(loaded.progress(GameKind::GuessTheCharacter).total_score, 70);
        assert_eq!(loaded.progress(GameKind::VersePuzzle), &PlayerProgress::default());
    }

    #[test]
    fn unavailable_store_loads_defaults() {
        let state = AppState::load(&MemoryStore::failing(), PlayerId::guest());
        assert_eq!(state, AppState::default());
    }

    #[test]
    fn remote_overrides_only_when_online() {
        let remote = PlayerProgress { level: 7, ..PlayerProgress::default() };
        let mut state = AppState::default();
        state.record(GameKind::VersePuzzle, &win(), 0);

        state.adopt_remote(GameKind::VersePuzzle, Some(remote.clone()));
        assert_eq!(state.progress(GameKind::VersePuzzle).level, 2);

        state.set_online(true);
        state.adopt_remote(GameKind::VersePuzzle, Some(remote));
        assert_eq!(state.progress(GameKind::VersePuzzle).level, 7);
    }

    #[test]
    fn reset_only_touches_one_mode() {
        let mut state = AppState::default();
        state.record(GameKind::VersePuzzle, &win(), 0);
        state.record(GameKind::MatchTheVerse, &win(), 0);
        state.reset(GameKind::VersePuzzle);
        assert_eq!(state.progress(GameKind::VersePuzzle).level, 1);
        assert_eq!(state.progress(GameKind::MatchTheVerse).level, 2);
    }
}
