//! Harvest runner: search, fetch in parallel batches, extract

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use pmscout_core::{ProgressContext, fmt_num, is_shutdown_requested};
use rayon::prelude::*;

use crate::classify::AffiliationClassifier;
use crate::config::Config;
use crate::error::HarvestError;
use crate::extract::{ExtractedRecord, extract};
use crate::fetch::fetch_batch;
use crate::search::search;

/// An identifier that was skipped, with the reason
#[derive(Debug)]
pub struct RecordFailure {
    pub id: String,
    pub error: HarvestError,
}

/// Outcome of one harvest
#[derive(Debug)]
pub struct Harvest {
    pub query: String,
    /// Matches reported by search (may exceed `ids.len()`)
    pub total_count: usize,
    /// Identifiers in search order
    pub ids: Vec<String>,
    /// Extracted records, in search order
    pub records: Vec<ExtractedRecord>,
    pub failures: Vec<RecordFailure>,
    /// Stopped early by a shutdown request
    pub interrupted: bool,
    pub elapsed: Duration,
}

enum Slot {
    Done(ExtractedRecord),
    Failed(RecordFailure),
}

/// Run a full harvest for `query`.
///
/// Only a search failure aborts the run. Per-record fetch and parse
/// failures are logged, collected in [`Harvest::failures`] and skipped.
pub fn harvest(
    query: &str,
    config: &Config,
    classifier: &dyn AffiliationClassifier,
    progress: &ProgressContext,
) -> Result<Harvest, HarvestError> {
    let start = Instant::now();

    let spinner = progress.stage_line("search");
    spinner.set_message(query.to_string());
    let outcome = search(query, config);
    spinner.finish_and_clear();
    let outcome = outcome?;

    log::info!(
        "{} matches for {query:?}, fetching {}",
        fmt_num(outcome.total_count),
        fmt_num(outcome.ids.len())
    );

    let batch_size = config.batch_size.max(1);
    let batches: Vec<&[String]> = outcome.ids.chunks(batch_size).collect();
    let pb = progress.record_bar("fetch", outcome.ids.len() as u64);
    let failed = AtomicUsize::new(0);

    let process = || -> Vec<Option<Vec<Slot>>> {
        batches
            .par_iter()
            .map(|batch| {
                if is_shutdown_requested() {
                    return None;
                }
                let slots: Vec<Slot> = fetch_batch(batch, config)
                    .into_iter()
                    .map(|(id, result)| match result {
                        Ok(article) => Slot::Done(extract(&article, classifier)),
                        Err(error) => {
                            log::warn!("skipping {id}: {error}");
                            Slot::Failed(RecordFailure { id, error })
                        }
                    })
                    .collect();
                let batch_failures = slots
                    .iter()
                    .filter(|s| matches!(s, Slot::Failed(_)))
                    .count();
                if batch_failures > 0 {
                    let total = failed.fetch_add(batch_failures, Ordering::Relaxed) + batch_failures;
                    pb.set_message(format!("{total} failed"));
                }
                pb.inc(batch.len() as u64);
                Some(slots)
            })
            .collect()
    };

    let per_batch = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.max(1))
        .build()
    {
        Ok(pool) => pool.install(process),
        Err(e) => {
            log::warn!("cannot build worker pool ({e}), using the global pool");
            process()
        }
    };
    pb.finish_and_clear();

    let mut records = Vec::with_capacity(outcome.ids.len());
    let mut failures = Vec::new();
    let mut interrupted = false;
    for batch in per_batch {
        let Some(slots) = batch else {
            interrupted = true;
            continue;
        };
        for slot in slots {
            match slot {
                Slot::Done(record) => records.push(record),
                Slot::Failed(failure) => failures.push(failure),
            }
        }
    }
    if interrupted {
        log::warn!(
            "interrupted: {} of {} identifiers processed",
            fmt_num(records.len() + failures.len()),
            fmt_num(outcome.ids.len())
        );
    }

    Ok(Harvest {
        query: query.to_string(),
        total_count: outcome.total_count,
        ids: outcome.ids,
        records,
        failures,
        interrupted,
        elapsed: start.elapsed(),
    })
}
