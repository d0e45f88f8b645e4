//! # bib-enrich
//!
//! Fills in missing BibTeX metadata by querying arXiv, DBLP and CrossRef,
//! available as a library, a CLI, and a Model Context Protocol (MCP) server.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Record, Candidate, Provider)
//! - [`bibtex`]: Reading and writing `.bib` text
//! - [`sources`]: Provider clients behind the [`MetadataSource`] trait
//! - [`reconcile`]: Candidate gathering, selection and merging
//! - [`mcp`]: MCP protocol implementation and server
//! - [`utils`]: HTTP client
//! - [`config`]: Configuration management
//!
//! ## Example
//!
//! ```no_run
//! use bib_enrich::config::Config;
//! use bib_enrich::reconcile::Reconciler;
//!
//! # async fn run() -> Result<(), bib_enrich::reconcile::EnrichError> {
//! let reconciler = Reconciler::from_config(&Config::default());
//! let summary = reconciler.enrich_collection("refs.bib").await?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```

pub mod bibtex;
pub mod config;
pub mod mcp;
pub mod models;
pub mod reconcile;
pub mod sources;
pub mod utils;

// Re-export commonly used types
pub use models::{Candidate, Provider, Record};
pub use reconcile::{EnrichError, Reconciler};
pub use sources::{MetadataSource, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
