//! Incremental collection of deployment, pull-request, and issue data.
//!
//! The collector discovers eligible services from the catalog, fetches raw
//! events from GitHub since each service's watermark, folds them into
//! per-day aggregates, and upserts the rows into the store. It runs one
//! cycle immediately on startup and then on a fixed interval, processing
//! services strictly sequentially to respect external rate limits.

mod catalog;
mod collector;
mod config;
mod error;
mod github;
mod reduce;

pub use catalog::{Catalog, HttpCatalog};
pub use collector::Collector;
pub use config::CollectorConfig;
pub use error::{CollectorError, FetchError};
pub use github::{GitHubClient, GitHubConfig, SourceHost};
pub use reduce::reduce_day;
