//! ESearch: query → ordered PMIDs

use pmscout_core::{get_text, retry_with_backoff};
use serde::Deserialize;

use crate::config::Config;
use crate::error::HarvestError;

/// Identifiers returned by one search, in server order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Total matches reported upstream (may exceed `ids.len()`)
    pub total_count: usize,
    pub ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    esearchresult: Option<SearchResult>,
    /// Top-level error, e.g. for an unknown database
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    count: Option<String>,
    #[serde(default)]
    idlist: Vec<String>,
    #[serde(rename = "ERROR")]
    error: Option<String>,
}

/// Search PubMed for `query`, returning at most `config.max_results` identifiers.
pub fn search(query: &str, config: &Config) -> Result<SearchOutcome, HarvestError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(HarvestError::Search("query is empty".to_string()));
    }

    let url = config.search_endpoint();
    let retmax = config.max_results.to_string();
    let params = [
        ("db", "pubmed"),
        ("term", query),
        ("retmode", "json"),
        ("retmax", retmax.as_str()),
    ];

    log::debug!("esearch term={query:?} retmax={retmax}");
    let body = retry_with_backoff("esearch", &config.retry, || {
        get_text(&url, &params, config.timeout)
    })
    .map_err(|e| HarvestError::Search(e.to_string()))?;

    parse_search_response(&body)
}

/// Parse an esearch JSON body.
fn parse_search_response(body: &str) -> Result<SearchOutcome, HarvestError> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| HarvestError::Search(format!("malformed response: {e}")))?;

    if let Some(error) = response.error {
        return Err(HarvestError::Search(format!("rejected upstream: {error}")));
    }
    let result = response
        .esearchresult
        .ok_or_else(|| HarvestError::Search("response has no esearchresult".to_string()))?;
    if let Some(error) = result.error {
        return Err(HarvestError::Search(format!("rejected upstream: {error}")));
    }

    let ids: Vec<String> = result
        .idlist
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    let total_count = result
        .count
        .and_then(|c| c.parse().ok())
        .unwrap_or(ids.len());

    Ok(SearchOutcome { total_count, ids })
}
