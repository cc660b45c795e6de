//! Error taxonomy for a harvest run
//!
//! `Search` and `Output` end the run. `Fetch` and `Parse` belong to a single
//! identifier; the runner logs them and carries on with the next record.

use std::path::PathBuf;

use pmscout_core::HttpError;

#[derive(Debug)]
pub enum HarvestError {
    /// Search request failed, was rejected upstream, or returned an unusable body
    Search(String),
    /// Detail request for one identifier failed
    Fetch { id: String, source: HttpError },
    /// Detail document for one identifier could not be parsed
    Parse { id: String, message: String },
    /// Output destination could not be written
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for HarvestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Search(message) => write!(f, "search failed: {message}"),
            Self::Fetch { id, source } => write!(f, "fetch failed for {id}: {source}"),
            Self::Parse { id, message } => write!(f, "parse failed for {id}: {message}"),
            Self::Output { path, source } => {
                write!(f, "cannot write {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for HarvestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Fetch { source, .. } => Some(source),
            Self::Output { source, .. } => Some(source),
            Self::Search(_) | Self::Parse { .. } => None,
        }
    }
}
