pub mod arrangement;
pub mod scoring;
pub mod token;
pub mod validate;
