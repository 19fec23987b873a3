use serde::{Deserialize, Serialize};

use crate::api::types::{Phase, SessionId};
use crate::core::rng::Rng;
use crate::puzzle::token::Token;
use crate::storage::store::{self, KeyValueStore, StoreError};

/// Bumped whenever the snapshot layout changes. Older snapshots are dropped.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to rebuild a session after a reload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub session: SessionId,
    pub reference: String,
    pub source_text: String,
    pub tokens: Vec<Token>,
    pub pool: Vec<Token>,
    pub placed: Vec<Token>,
    pub hints_used: u32,
    pub hint_budget: u32,
    pub time_budget_secs: u32,
    pub time_remaining_secs: u32,
    pub phase: Phase,
    pub score: Option<u32>,
    pub rng: Rng,
}

impl SessionSnapshot {
    pub fn is_current(&self) -> bool {
        self.version == SNAPSHOT_VERSION
    }
}

/// Read the snapshot stored under `key`.
///
/// Missing, unreadable and out-of-date snapshots all come back as `None`;
/// the caller starts a fresh session.
pub fn read<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Option<SessionSnapshot> {
    match store::load::<SessionSnapshot, S>(store, key) {
        Ok(Some(snapshot)) if snapshot.is_current() => Some(snapshot),
        Ok(Some(snapshot)) => {
            log::info!(
                "discarding snapshot {} with version {} (expected {})",
                key,
                snapshot.version,
                SNAPSHOT_VERSION
            );
            None
        }
        Ok(None) => None,
        Err(e) => {
            log::warn!("could not read snapshot {}: {}", key, e);
            None
        }
    }
}

/// Mirror the snapshot into the store.
pub fn write<S: KeyValueStore + ?Sized>(
    store: &mut S,
    key: &str,
    snapshot: &SessionSnapshot,
) -> Result<bool, StoreError> {
    store::save_idempotent(store, key, snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::MemoryStore;

    fn snapshot(version: u32) -> SessionSnapshot {
        let tokens = vec![Token::new(0, "Jesus"), Token::new(1, "wept")];
        SessionSnapshot {
            version,
            session: SessionId(3),
            reference: "John 11:35".into(),
            source_text: "Jesus wept.".into(),
            pool: vec![tokens[1].clone()],
            placed: vec![tokens[0].clone()],
            tokens,
            hints_used: 0,
            hint_budget: 5,
            time_budget_secs: 30,
            time_remaining_secs: 21,
            phase: Phase::Active,
            score: None,
            rng: Rng::new(5),
        }
    }

    #[test]
    fn reads_back_what_was_written() {
        let mut store = MemoryStore::new();
        write(&mut store, "k", &snapshot(SNAPSHOT_VERSION)).unwrap();
        assert_eq!(read(&store, "k"), Some(snapshot(SNAPSHOT_VERSION)));
    }

    #[test]
    fn stale_version_is_absent() {
        let mut store = MemoryStore::new();
        write(&mut store, "k", &snapshot(SNAPSHOT_VERSION + 1)).unwrap();
        assert_eq!(read(&store, "k"), None);
    }

    #[test]
    fn garbage_is_absent() {
        let mut store = MemoryStore::new();
        store.set("k", "{not json").unwrap();
        assert_eq!(read(&store, "k"), None);
    }
}
