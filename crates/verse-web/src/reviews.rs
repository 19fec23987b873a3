use serde::Serialize;
use verse_engine::{GameKind, KeyValueStore, NewReview, Review, ReviewBook};
use wasm_bindgen::prelude::*;

use crate::runner::to_json;
use crate::storage::LocalStorage;

/// Answer to a feed request, serialized for the UI.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReviewReply {
    Added { review: Review },
    Liked { id: u64, likes: u32 },
    Rejected { reason: String },
}

/// `""` is feedback about the whole app; anything else must be a game slug.
fn parse_game(game: &str) -> Result<Option<GameKind>, String> {
    if game.is_empty() {
        return Ok(None);
    }
    GameKind::from_slug(game)
        .map(Some)
        .ok_or_else(|| format!("unknown game {:?}", game))
}

fn rejected(reason: impl ToString) -> ReviewReply {
    ReviewReply::Rejected {
        reason: reason.to_string(),
    }
}

fn store_book<S: KeyValueStore>(book: &ReviewBook, store: &mut S) {
    if let Err(e) = book.save(store) {
        log::warn!("could not save reviews: {}", e);
    }
}

pub fn submit<S: KeyValueStore>(
    store: &mut S,
    user_name: &str,
    game: &str,
    rating: u8,
    comment: &str,
    now_ms: u64,
) -> ReviewReply {
    let game = match parse_game(game) {
        Ok(game) => game,
        Err(reason) => return rejected(reason),
    };
    let mut book = ReviewBook::load(store);
    let review = NewReview {
        user_name: user_name.to_string(),
        game,
        rating,
        comment: comment.to_string(),
    };
    let added = match book.add(review, now_ms) {
        Ok(review) => review.clone(),
        Err(e) => return rejected(e),
    };
    store_book(&book, store);
    ReviewReply::Added { review: added }
}

pub fn like<S: KeyValueStore>(store: &mut S, id: u64) -> ReviewReply {
    let mut book = ReviewBook::load(store);
    match book.like(id) {
        Ok(likes) => {
            store_book(&book, store);
            ReviewReply::Liked { id, likes }
        }
        Err(e) => rejected(e),
    }
}

/// Reviews for one game (or the app, for `""`) newest first; `"*"` lists everything.
pub fn feed<S: KeyValueStore>(store: &S, game: &str) -> Vec<Review> {
    let book = ReviewBook::load(store);
    let filter = if game == "*" {
        None
    } else {
        match parse_game(game) {
            Ok(game) => Some(game),
            Err(reason) => {
                log::warn!("{}", reason);
                return Vec::new();
            }
        }
    };
    book.newest_first()
        .into_iter()
        .filter(|r| filter.map_or(true, |g| r.game == g))
        .cloned()
        .collect()
}

// ---- Exports ----

#[wasm_bindgen]
pub fn review_submit(user_name: &str, game: &str, rating: u8, comment: &str) -> String {
    let now = js_sys::Date::now() as u64;
    to_json(&submit(&mut LocalStorage::open(), user_name, game, rating, comment, now))
}

#[wasm_bindgen]
pub fn review_like(id: u32) -> String {
    to_json(&like(&mut LocalStorage::open(), u64::from(id)))
}

#[wasm_bindgen]
pub fn get_reviews_json(game: &str) -> String {
    to_json(&feed(&LocalStorage::open(), game))
}
