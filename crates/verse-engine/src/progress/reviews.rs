use serde::{Deserialize, Serialize};

use crate::api::types::GameKind;
use crate::storage::store::{load_or_default, save_idempotent, KeyValueStore, StoreError};

/// Storage key for the review feed.
pub const REVIEWS_KEY: &str = "reviews";

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("rating {0} is outside 1-5")]
    RatingOutOfRange(u8),
    #[error("a review needs a name")]
    MissingName,
    #[error("a review needs a comment")]
    MissingComment,
    #[error("review {0} does not exist")]
    UnknownReview(u64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One entry in the community feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    pub user_name: String,
    /// `None` for feedback about the app as a whole.
    pub game: Option<GameKind>,
    pub rating: u8,
    pub comment: String,
    pub created_at_ms: u64,
    pub likes: u32,
}

/// What a player submits. Id, timestamp and likes are filled in by the book.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewReview {
    pub user_name: String,
    pub game: Option<GameKind>,
    pub rating: u8,
    pub comment: String,
}

/// The review feed, kept in insertion order and stored as one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewBook {
    reviews: Vec<Review>,
}

impl ReviewBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the feed; a missing or unreadable record gives an empty one.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        load_or_default(store, REVIEWS_KEY)
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<bool, StoreError> {
        save_idempotent(store, REVIEWS_KEY, self)
    }

    /// Validate and append a review. Name and comment are trimmed.
    pub fn add(&mut self, review: NewReview, now_ms: u64) -> Result<&Review, ReviewError> {
        if !(MIN_RATING..=MAX_RATING).contains(&review.rating) {
            return Err(ReviewError::RatingOutOfRange(review.rating));
        }
        let user_name = review.user_name.trim();
        if user_name.is_empty() {
            return Err(ReviewError::MissingName);
        }
        let comment = review.comment.trim();
        if comment.is_empty() {
            return Err(ReviewError::MissingComment);
        }
        let id = self.reviews.iter().map(|r| r.id).max().map_or(1, |id| id + 1);
        self.reviews.push(Review {
            id,
            user_name: user_name.to_string(),
            game: review.game,
            rating: review.rating,
            comment: comment.to_string(),
            created_at_ms: now_ms,
            likes: 0,
        });
        log::info!("review {} added by {}", id, user_name);
        Ok(&self.reviews[self.reviews.len() - 1])
    }

    /// Add one like. Returns the new count.
    pub fn like(&mut self, id: u64) -> Result<u32, ReviewError> {
        let review = self
            .reviews
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ReviewError::UnknownReview(id))?;
        review.likes = review.likes.saturating_add(1);
        Ok(review.likes)
    }

    pub fn get(&self, id: u64) -> Option<&Review> {
        self.reviews.iter().find(|r| r.id == id)
    }

    /// Most recent first, as the feed shows them.
    pub fn newest_first(&self) -> Vec<&Review> {
        let mut out: Vec<&Review> = self.reviews.iter().collect();
        out.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms).then(b.id.cmp(&a.id)));
        out
    }

    pub fn by_game(&self, game: Option<GameKind>) -> Vec<&Review> {
        self.reviews.iter().filter(|r| r.game == game).collect()
    }

    pub fn by_user(&self, user_name: &str) -> Vec<&Review> {
        self.reviews.iter().filter(|r| r.user_name == user_name).collect()
    }

    /// Mean rating in tenths of a star, e.g. 45 for 4.5. `None` when unrated.
    pub fn average_rating_tenths(&self, game: Option<GameKind>) -> Option<u32> {
        let ratings: Vec<u32> = self.by_game(game).iter().map(|r| u32::from(r.rating)).collect();
        if ratings.is_empty() {
            return None;
        }
        let count = ratings.len() as u32;
        let sum: u32 = ratings.iter().sum();
        Some((sum * 20 + count) / (count * 2))
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}
