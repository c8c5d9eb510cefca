//! Web search and page fetching for query-driven ingestion

pub mod fetch;
pub mod search;

pub use fetch::WebFetcher;
pub use search::WebSearcher;
