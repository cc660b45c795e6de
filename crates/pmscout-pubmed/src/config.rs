//! Harvester configuration

use std::time::Duration;

use pmscout_core::RetryPolicy;

/// Public NCBI E-utilities base
pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Runtime configuration for a harvest
#[derive(Debug, Clone)]
pub struct Config {
    /// E-utilities base URL; `esearch.fcgi` / `efetch.fcgi` are appended
    pub base_url: String,
    /// Maximum identifiers requested from search (`retmax`)
    pub max_results: usize,
    /// Identifiers per efetch request
    pub batch_size: usize,
    /// Parallel fetch workers
    pub workers: usize,
    /// Per-request timeout
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_results: 100,
            batch_size: 20,
            workers: 2,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn search_endpoint(&self) -> String {
        format!("{}/esearch.fcgi", self.base_url.trim_end_matches('/'))
    }

    pub fn fetch_endpoint(&self) -> String {
        format!("{}/efetch.fcgi", self.base_url.trim_end_matches('/'))
    }
}
