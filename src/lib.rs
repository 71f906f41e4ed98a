//! # rustieee
//!
//! IEEE Xplore search acquisition and set algebra over saved results.
//!
//! ## Modules
//!
//! - [`scrape`] - Paginated scraping of the search UI through a headless browser
//! - [`chromium`] - Chromium-backed browser session
//! - [`api`] - IEEE Xplore Metadata API client
//! - [`record`] - Publication record and result envelope
//! - [`equivalence`] - Same-publication test used for deduplication
//! - [`logic`] - MERGE / AND / OR / NOT over record lists
//! - [`query`] - Data-field qualifiers and year ranges
//! - [`export`] - JSON and spreadsheet output
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustieee::{query::{add_data_field, DataField}, scrape};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let query = add_data_field("optics AND nano", Some(DataField::Metadata));
//!     let results = scrape::scrape(&query, &Default::default()).await?;
//!     println!("Found {} results", results.total_records);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod chromium;
pub mod equivalence;
pub mod error;
pub mod export;
pub mod logic;
pub mod query;
pub mod record;
pub mod scrape;

pub use equivalence::equivalent;
pub use error::{IeeeError, Result};
pub use record::{Record, ResultEnvelope};
