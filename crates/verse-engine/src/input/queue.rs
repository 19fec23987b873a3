/// Player moves the UI layer can send.
/// Positions refer to slots in the arrangement; `token` is a canonical tile index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    /// Move a tile from the pool into the arrangement (appended when `at` is `None`).
    Place { token: usize, at: Option<usize> },
    /// Send the tile in `position` back to the pool.
    Remove { position: usize },
    Swap { a: usize, b: usize },
    Move { from: usize, to: usize },
    Hint,
    Submit,
    /// Return every tile to the pool.
    Reset,
    Abandon,
}

/// A queue of player actions.
/// JS writes actions into the queue; Rust drains and applies them each frame.
pub struct InputQueue {
    actions: Vec<PlayerAction>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            actions: Vec::with_capacity(16),
        }
    }

    /// Push a new action (called from JS via wasm-bindgen).
    pub fn push(&mut self, action: PlayerAction) {
        self.actions.push(action);
    }

    /// Drain all pending actions in arrival order.
    pub fn drain(&mut self) -> Vec<PlayerAction> {
        std::mem::take(&mut self.actions)
    }

    /// Drop pending actions, e.g. when a session ends mid-frame.
    pub fn clear(&mut self) {
        self.actions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
