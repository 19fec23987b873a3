use serde::{Deserialize, Serialize};

use crate::api::error::EngineError;
use crate::core::rng::Rng;
use crate::puzzle::token::{scramble, Token};

/// The player's working state: tiles still in the pool and tiles placed so far.
///
/// Every operation either succeeds completely or leaves both sequences
/// untouched, so `pool ∪ placed` always equals the canonical token multiset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrangement {
    pool: Vec<Token>,
    placed: Vec<Token>,
}

impl Arrangement {
    /// Start with every tile in the pool, in the given (already scrambled) order.
    pub fn new(scrambled: Vec<Token>) -> Self {
        Self {
            pool: scrambled,
            placed: Vec::new(),
        }
    }

    /// Rebuild from persisted parts. The caller checks conservation.
    pub fn from_parts(pool: Vec<Token>, placed: Vec<Token>) -> Self {
        Self { pool, placed }
    }

    pub fn pool(&self) -> &[Token] {
        &self.pool
    }

    pub fn placed(&self) -> &[Token] {
        &self.placed
    }

    pub fn len(&self) -> usize {
        self.pool.len() + self.placed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All tiles placed.
    pub fn is_complete(&self) -> bool {
        self.pool.is_empty()
    }

    /// Move the tile with canonical `index` from the pool into the arrangement,
    /// appended or inserted at `at`.
    pub fn place(&mut self, index: usize, at: Option<usize>) -> Result<(), EngineError> {
        let from = self
            .pool
            .iter()
            .position(|t| t.index == index)
            .ok_or(EngineError::InvalidToken { index })?;
        let at = at.unwrap_or(self.placed.len());
        if at > self.placed.len() {
            return Err(EngineError::IndexOutOfRange {
                position: at,
                len: self.placed.len(),
            });
        }
        let token = self.pool.remove(from);
        self.placed.insert(at, token);
        Ok(())
    }

    /// Send the tile at `position` back to the end of the pool.
    pub fn remove(&mut self, position: usize) -> Result<&Token, EngineError> {
        self.check(position)?;
        let token = self.placed.remove(position);
        self.pool.push(token);
        Ok(&self.pool[self.pool.len() - 1])
    }

    /// Exchange two placed tiles. Same position is a no-op.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), EngineError> {
        self.check(a)?;
        self.check(b)?;
        if a != b {
            self.placed.swap(a, b);
        }
        Ok(())
    }

    /// Drag a placed tile from one slot to another, shifting the tiles in between.
    pub fn move_to(&mut self, from: usize, to: usize) -> Result<(), EngineError> {
        self.check(from)?;
        self.check(to)?;
        if from != to {
            let token = self.placed.remove(from);
            self.placed.insert(to, token);
        }
        Ok(())
    }

    /// Place the next tile of the canonical sequence at the end of the arrangement.
    ///
    /// The target is `canonical[placed.len()]`; any pool tile with the same text
    /// satisfies it, so repeated words never block a hint.
    pub fn place_next(&mut self, canonical: &[Token]) -> Result<&Token, EngineError> {
        let next = canonical
            .get(self.placed.len())
            .ok_or(EngineError::HintUnavailable)?;
        let from = self
            .pool
            .iter()
            .position(|t| t.text == next.text)
            .ok_or(EngineError::HintUnavailable)?;
        let token = self.pool.remove(from);
        self.placed.push(token);
        Ok(&self.placed[self.placed.len() - 1])
    }

    /// Return every tile to the pool in a fresh random order.
    pub fn reset(&mut self, rng: &mut Rng) {
        let mut all = std::mem::take(&mut self.pool);
        all.append(&mut self.placed);
        self.pool = scramble(&all, rng);
    }

    /// Placed tiles joined with single spaces.
    pub fn sentence(&self) -> String {
        join(&self.placed)
    }

    fn check(&self, position: usize) -> Result<(), EngineError> {
        if position < self.placed.len() {
            Ok(())
        } else {
            Err(EngineError::IndexOutOfRange {
                position,
                len: self.placed.len(),
            })
        }
    }
}

/// Join token texts with single spaces.
pub fn join(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, t) in tokens.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&t.text);
    }
    out
}

/// True when both sequences hold the same tiles by canonical index.
pub fn same_tiles(a: &[Token], b: &[Token]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut left: Vec<_> = a.iter().map(|t| (t.index, t.text.as_str())).collect();
    let mut right: Vec<_> = b.iter().map(|t| (t.index, t.text.as_str())).collect();
    left.sort_unstable();
    right.sort_unstable();
    left == right
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::puzzle::token::{tokenize, DEFAULT_PUNCTUATION};
    use crate::core::rng::Rng;
    use proptest::prelude::*;

    fn canonical() -> Vec<Token> {
        tokenize("In the beginning", DEFAULT_PUNCTUATION)
    }

    fn conserved(arr: &Arrangement, tokens: &[Token]) -> bool {
        let mut all = arr.pool().to_vec();
        all.extend_from_slice(arr.placed());
        same_tiles(&all, tokens)
    }

    #[test]
    fn place_appends_and_inserts() {
        let mut arr = Arrangement::new(canonical());
        arr.place(2, None).unwrap();
        arr.place(0, Some(0)).unwrap();
        arr.place(1, Some(1)).unwrap();
        assert_eq!(arr.sentence(), "In the beginning");
        assert!(arr.is_complete());
    }

    #[test]
    fn double_place_is_rejected() {
        let mut arr = Arrangement::new(canonical());
        arr.place(1, None).unwrap();
        let before = arr.clone();
        assert_eq!(arr.place(1, None), Err(EngineError::InvalidToken { index: 1 }));
        assert_eq!(arr, before);
    }

    #[test]
    fn insert_past_end_is_rejected() {
        let mut arr = Arrangement::new(canonical());
        let before = arr.clone();
        assert_eq!(
            arr.place(0, Some(1)),
            Err(EngineError::IndexOutOfRange { position: 1, len: 0 })
        );
        assert_eq!(arr, before);
    }

    #[test]
    fn remove_returns_tile_to_pool_end() {
        let mut arr = Arrangement::new(canonical());
        arr.place(0, None).unwrap();
        arr.place(1, None).unwrap();
        let removed = arr.remove(0).unwrap().clone();
        assert_eq!(removed.text, "In");
        assert_eq!(arr.pool().last(), Some(&removed));
        assert_eq!(arr.sentence(), "the");
        assert!(matches!(arr.remove(5), Err(EngineError::IndexOutOfRange { .. })));
    }

    #[test]
    fn swap_same_position_is_noop() {
        let mut arr = Arrangement::new(canonical());
        arr.place(0, None).unwrap();
        arr.place(1, None).unwrap();
        arr.swap(1, 1).unwrap();
        assert_eq!(arr.sentence(), "In the");
        arr.swap(0, 1).unwrap();
        assert_eq!(arr.sentence(), "the In");
        assert!(matches!(arr.swap(0, 2), Err(EngineError::IndexOutOfRange { .. })));
    }

    #[test]
    fn move_shifts_tiles_between() {
        let mut arr = Arrangement::new(canonical());
        for i in 0..3 {
            arr.place(i, None).unwrap();
        }
        arr.move_to(0, 2).unwrap();
        assert_eq!(arr.sentence(), "the beginning In");
    }

    #[test]
    fn place_next_follows_canonical_order() {
        let tokens = canonical();
        let mut arr = Arrangement::new(vec![tokens[2].clone(), tokens[1].clone(), tokens[0].clone()]);
        assert_eq!(arr.place_next(&tokens).unwrap().text, "In");
        assert_eq!(arr.place_next(&tokens).unwrap().text, "the");
        assert_eq!(arr.place_next(&tokens).unwrap().text, "beginning");
        assert_eq!(arr.place_next(&tokens), Err(EngineError::HintUnavailable));
    }

    #[test]
    fn place_next_accepts_duplicate_word() {
        let tokens = tokenize("the the end", DEFAULT_PUNCTUATION);
        // Pool holds the second "the" first
        let mut arr = Arrangement::new(vec![tokens[1].clone(), tokens[2].clone(), tokens[0].clone()]);
        assert_eq!(arr.place_next(&tokens).unwrap().index, 1);
        assert_eq!(arr.place_next(&tokens).unwrap().index, 0);
    }

    #[test]
    fn reset_returns_everything_to_pool() {
        let tokens = canonical();
        let mut arr = Arrangement::new(tokens.clone());
        arr.place(0, None).unwrap();
        arr.place(2, None).unwrap();
        arr.reset(&mut Rng::new(4));
        assert!(arr.placed().is_empty());
        assert_eq!(arr.pool().len(), 3);
        assert!(conserved(&arr, &tokens));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Place(usize, Option<usize>),
        Remove(usize),
        Swap(usize, usize),
        Move(usize, usize),
        Hint,
        Reset(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..10, proptest::option::of(0usize..10)).prop_map(|(i, at)| Op::Place(i, at)),
            (0usize..10).prop_map(Op::Remove),
            (0usize..10, 0usize..10).prop_map(|(a, b)| Op::Swap(a, b)),
            (0usize..10, 0usize..10).prop_map(|(a, b)| Op::Move(a, b)),
            Just(Op::Hint),
            any::<u64>().prop_map(Op::Reset),
        ]
    }

    proptest! {
        #[test]
        fn tiles_are_conserved(ops in proptest::collection::vec(op(), 0..60)) {
            let tokens = tokenize("and the word was with God and the word was God", DEFAULT_PUNCTUATION);
            let mut arr = Arrangement::new(scramble(&tokens, &mut Rng::new(1)));
            for op in ops {
                let _ = match op {
                    Op::Place(i, at) => arr.place(i, at),
                    Op::Remove(p) => arr.remove(p).map(|_| ()),
                    Op::Swap(a, b) => arr.swap(a, b),
                    Op::Move(a, b) => arr.move_to(a, b),
                    Op::Hint => arr.place_next(&tokens).map(|_| ()),
                    Op::Reset(seed) => {
                        arr.reset(&mut Rng::new(seed));
                        Ok(())
                    }
                };
                prop_assert!(conserved(&arr, &tokens));
                prop_assert_eq!(arr.len(), tokens.len());
            }
        }
    }
}
