pub mod cache;
pub mod matching;
pub mod search;
