//! EFetch: identifiers → parsed articles
//!
//! Identifiers are requested in batches. When a batch request fails or its
//! document cannot be parsed, each identifier is retried on its own so one
//! bad record only costs itself.

use pmscout_core::{HttpError, get_text, retry_with_backoff};
use rustc_hash::FxHashMap;

use crate::config::Config;
use crate::error::HarvestError;
use crate::parser::{PubmedArticle, parse_pubmed_xml};

/// Result for one identifier
pub type FetchResult = Result<PubmedArticle, HarvestError>;

fn fetch_document(ids: &[&str], config: &Config) -> Result<String, HttpError> {
    let url = config.fetch_endpoint();
    let joined = ids.join(",");
    let params = [("db", "pubmed"), ("id", joined.as_str()), ("retmode", "xml")];

    log::debug!("efetch {} id(s): {joined}", ids.len());
    retry_with_backoff("efetch", &config.retry, || {
        get_text(&url, &params, config.timeout)
    })
}

/// Fetch and parse the detail document for a single identifier.
pub fn fetch_detail(id: &str, config: &Config) -> FetchResult {
    let body = fetch_document(&[id], config).map_err(|source| HarvestError::Fetch {
        id: id.to_string(),
        source,
    })?;

    let articles = parse_pubmed_xml(&body).map_err(|e| HarvestError::Parse {
        id: id.to_string(),
        message: format!("{e:#}"),
    })?;

    articles
        .into_iter()
        .find(|a| a.pmid == id)
        .ok_or_else(|| HarvestError::Parse {
            id: id.to_string(),
            message: "record not found in response".to_string(),
        })
}

/// Fetch a batch of identifiers, returning one result per identifier in
/// input order.
pub fn fetch_batch(ids: &[String], config: &Config) -> Vec<(String, FetchResult)> {
    if ids.len() <= 1 {
        return ids
            .iter()
            .map(|id| (id.clone(), fetch_detail(id, config)))
            .collect();
    }

    let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let articles = match fetch_document(&refs, config) {
        Ok(body) => match parse_pubmed_xml(&body) {
            Ok(articles) => articles,
            Err(e) => {
                log::warn!(
                    "batch of {} unparseable ({e:#}), fetching individually",
                    ids.len()
                );
                return fetch_each(ids, config);
            }
        },
        Err(e) => {
            log::warn!("batch of {} failed ({e}), fetching individually", ids.len());
            return fetch_each(ids, config);
        }
    };

    let mut by_pmid: FxHashMap<String, PubmedArticle> = articles
        .into_iter()
        .map(|a| (a.pmid.clone(), a))
        .collect();

    ids.iter()
        .map(|id| {
            let result = match by_pmid.remove(id) {
                Some(article) => Ok(article),
                None => {
                    log::debug!("{id} missing from batch response, fetching individually");
                    fetch_detail(id, config)
                }
            };
            (id.clone(), result)
        })
        .collect()
}

fn fetch_each(ids: &[String], config: &Config) -> Vec<(String, FetchResult)> {
    ids.iter()
        .map(|id| (id.clone(), fetch_detail(id, config)))
        .collect()
}
