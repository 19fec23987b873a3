pub mod puzzle;
pub mod results;
pub mod snapshot;
