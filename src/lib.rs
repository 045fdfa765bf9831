pub mod adapters;
pub mod config;
pub mod constants;
pub mod dates;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod observability;
pub mod pipeline;
pub mod registry;
pub mod storage;
pub mod types;
