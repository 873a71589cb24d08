pub mod search_strategy;

pub use search_strategy::SearchStrategy;
