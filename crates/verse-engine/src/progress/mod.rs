pub mod app_state;
pub mod player;
pub mod reviews;
