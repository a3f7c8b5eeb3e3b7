//! Parallel chunk dispatch
//!
//! Runs the chunk fetcher over every planned chunk with at most
//! `worker_count` chunks in flight. Each chunk's outcome is recorded; after
//! the first failure no new chunks are started, chunks already running are
//! allowed to finish, and the dispatch fails naming every failed chunk.

use crate::chunk::{ChunkFetcher, FetchOutcome};
use crate::error::{ExtractError, ExtractResult};
use crate::source::SourceConnector;
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::ProgressBar;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Final state of one chunk in a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkStatus {
    Written { rows: u64 },
    Skipped,
    Failed(String),
    /// Not started because another chunk had already failed
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub chunk_index: u64,
    pub status: ChunkStatus,
}

/// Outcomes of every dispatched chunk, ordered by chunk index
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub outcomes: Vec<ChunkOutcome>,
}

impl DispatchReport {
    pub fn written(&self) -> usize {
        self.count(|s| matches!(s, ChunkStatus::Written { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ChunkStatus::Skipped))
    }

    pub fn abandoned(&self) -> usize {
        self.count(|s| matches!(s, ChunkStatus::Abandoned))
    }

    pub fn failed_chunks(&self) -> Vec<u64> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ChunkStatus::Failed(_)))
            .map(|o| o.chunk_index)
            .collect()
    }

    /// Rows fetched in this run (skipped chunks are not counted)
    pub fn rows_written(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                ChunkStatus::Written { rows } => rows,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, predicate: impl Fn(&ChunkStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }

    /// Turn a report containing failures into a dispatch error
    pub fn into_result(self) -> ExtractResult<Self> {
        let failed = self.failed_chunks();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(ExtractError::Dispatch {
                failed,
                abandoned: self.abandoned(),
            })
        }
    }
}

/// Fetch every chunk in `chunk_indices` with bounded parallelism, failing
/// with the indices of any chunks that did not complete
pub async fn dispatch_chunks<C>(
    fetcher: Arc<ChunkFetcher<C>>,
    chunk_indices: impl IntoIterator<Item = u64>,
    worker_count: usize,
    progress: &ProgressBar,
) -> ExtractResult<DispatchReport>
where
    C: SourceConnector + ?Sized + 'static,
{
    collect_chunk_outcomes(fetcher, chunk_indices, worker_count, progress)
        .await?
        .into_result()
}

/// Run every chunk and report each one's outcome, failed chunks included
pub async fn collect_chunk_outcomes<C>(
    fetcher: Arc<ChunkFetcher<C>>,
    chunk_indices: impl IntoIterator<Item = u64>,
    worker_count: usize,
    progress: &ProgressBar,
) -> ExtractResult<DispatchReport>
where
    C: SourceConnector + ?Sized + 'static,
{
    if worker_count == 0 {
        return Err(ExtractError::configuration("worker_count must be greater than 0"));
    }

    let semaphore = Arc::new(Semaphore::new(worker_count));
    let halted = Arc::new(AtomicBool::new(false));
    let mut futures = FuturesUnordered::new();

    for chunk_index in chunk_indices {
        let semaphore = semaphore.clone();
        let halted = halted.clone();
        let fetcher = fetcher.clone();
        let progress = progress.clone();

        let handle = tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return ChunkStatus::Abandoned,
            };
            if halted.load(Ordering::SeqCst) {
                return ChunkStatus::Abandoned;
            }

            let status = match fetcher.fetch(chunk_index).await {
                Ok(FetchOutcome::Written { rows }) => ChunkStatus::Written { rows },
                Ok(FetchOutcome::Skipped) => ChunkStatus::Skipped,
                Err(e) => {
                    halted.store(true, Ordering::SeqCst);
                    error!("Chunk {} failed: {}", chunk_index, e);
                    ChunkStatus::Failed(e.to_string())
                }
            };
            progress.inc(1);
            status
        });

        futures.push(async move { (chunk_index, handle.await) });
    }

    let mut outcomes = Vec::new();
    while let Some((chunk_index, joined)) = futures.next().await {
        let status = match joined {
            Ok(status) => status,
            Err(e) => {
                halted.store(true, Ordering::SeqCst);
                error!("Chunk {} task panicked: {}", chunk_index, e);
                ChunkStatus::Failed(format!("task panicked: {}", e))
            }
        };
        outcomes.push(ChunkOutcome {
            chunk_index,
            status,
        });
    }
    outcomes.sort_by_key(|o| o.chunk_index);

    let report = DispatchReport { outcomes };
    if report.failed_chunks().is_empty() {
        progress.finish_with_message(format!(
            "Completed: {} written, {} skipped",
            report.written(),
            report.skipped()
        ));
        info!(
            "Dispatch completed: {} chunks written ({} rows), {} skipped",
            report.written(),
            report.rows_written(),
            report.skipped()
        );
    } else {
        progress.abandon_with_message("Failed - stopping extraction");
        warn!(
            "Dispatch failed: chunks {:?} failed, {} not started, {} written",
            report.failed_chunks(),
            report.abandoned(),
            report.written()
        );
    }

    Ok(report)
}
