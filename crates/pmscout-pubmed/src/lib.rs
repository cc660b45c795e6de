//! pmscout PubMed - find papers with pharmaceutical or biotech authors
//!
//! Searches PubMed through the NCBI E-utilities, fetches article XML in
//! batches, and keeps the authors whose affiliations are not academic.
//!
//! # Features
//!
//! - Streaming XML parsing with quick-xml
//! - Parallel batch fetching with rayon, output in search order
//! - Pluggable affiliation classifier ([`AffiliationClassifier`])
//! - CSV file or JSON-lines console output
//!
//! # Example
//!
//! ```ignore
//! use pmscout_core::ProgressContext;
//! use pmscout_pubmed::{Config, HeuristicClassifier, harvest, write_csv};
//!
//! let classifier = HeuristicClassifier::builtin()?;
//! let result = harvest("cancer immunotherapy", &Config::default(), &classifier, &ProgressContext::hidden())?;
//! write_csv(&result.records, "papers.csv".as_ref())?;
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod parser;
pub mod runner;
pub mod search;

// Re-exports
pub use classify::{AffiliationClassifier, AffiliationKind, HeuristicClassifier};
pub use config::{Config, DEFAULT_BASE_URL};
pub use error::HarvestError;
pub use extract::{ExtractedRecord, extract};
pub use fetch::{fetch_batch, fetch_detail};
pub use output::{CSV_HEADER, LIST_SEPARATOR, print_records, write_csv};
pub use parser::parse_pubmed_xml;
pub use runner::{Harvest, RecordFailure, harvest};
pub use search::{SearchOutcome, search};
