//! # paperharvest
//!
//! Keyword-driven literature harvester
//!
//! ## Modules
//!
//! - [`dblp`] - DBLP publication search
//! - [`semanticscholar`] - Semantic Scholar abstract lookup
//! - [`dedup`] - Order-preserving merge by DOI / title
//! - [`store`] - CSV persistence
//! - [`sheets`] - Optional Google Sheets mirror
//! - [`pipeline`] - Harvest orchestration
//! - [`config`] - Run configuration
//! - [`http`] - Shared HTTP client setup
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use paperharvest::{config::HarvestConfig, dblp::DblpClient, pipeline::Harvester,
//!     semanticscholar::SemanticScholarClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = HarvestConfig::default();
//!     let dblp = DblpClient::new(&config.endpoints.dblp)?;
//!     let s2 = SemanticScholarClient::new(&config.endpoints.semantic_scholar, None)?;
//!     let summary = Harvester::new(&config, &dblp, &s2).run().await?;
//!     println!("Collected {} papers", summary.total);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dblp;
pub mod dedup;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod record;
pub mod semanticscholar;
pub mod sheets;
pub mod store;

pub use error::{HarvestError, Result};
pub use record::PaperRecord;
