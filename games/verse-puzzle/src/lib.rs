use wasm_bindgen::prelude::*;

mod game;
pub use game::VersePuzzle;

verse_web::export_game!(VersePuzzle, "verse-puzzle");
