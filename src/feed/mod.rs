//! Retrieval and parsing of the vacancy feed.
//!
//! The feed is a single XML document listing every open vacancy. [`fetch_vacancies`]
//! downloads it and hands the body to [`parse_feed_bytes`].

mod fetcher;
mod xml_parser;

// Re-export public API
pub use fetcher::{fetch_feed, fetch_vacancies};
pub use xml_parser::parse_feed_bytes;
