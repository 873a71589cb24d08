pub mod search_service;

pub use search_service::{SearchResponse, SearchService};
