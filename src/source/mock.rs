//! In-memory junction source for testing

use super::{JunctionSource, SourceConnector};
use crate::error::{ExtractError, ExtractResult};
use crate::vertex::JunctionRow;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// A recorded interaction with the mock source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    Connect,
    Count,
    FetchPage { offset: u64, limit: u64 },
}

#[derive(Default)]
struct MockState {
    rows: Vec<JunctionRow>,
    calls: Vec<SourceCall>,
    refuse_connections: bool,
    failing_offsets: HashSet<u64>,
    fetch_delay: Option<Duration>,
    fetches_in_flight: usize,
    peak_fetches_in_flight: usize,
}

/// Connector over a fixed in-memory junction table. Rows are served in the
/// order given, which stands in for `ORDER BY junction_id`.
#[derive(Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Create a mock serving the given rows
    pub fn new(rows: Vec<JunctionRow>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                rows,
                ..Default::default()
            })),
        }
    }

    /// Create a mock serving `count` generated junctions
    pub fn with_generated_rows(count: u64) -> Self {
        Self::new(generated_rows(count))
    }

    /// Replace the table contents
    pub async fn set_rows(&self, rows: Vec<JunctionRow>) {
        self.state.lock().await.rows = rows;
    }

    /// Make every `connect` call fail
    pub async fn refuse_connections(&self) {
        self.state.lock().await.refuse_connections = true;
    }

    /// Make page fetches starting at `offset` fail
    pub async fn fail_at_offset(&self, offset: u64) {
        self.state.lock().await.failing_offsets.insert(offset);
    }

    /// Hold every successful page fetch open for `delay`
    pub async fn set_fetch_delay(&self, delay: Duration) {
        self.state.lock().await.fetch_delay = Some(delay);
    }

    /// Highest number of page fetches that were running at once
    pub async fn peak_concurrent_fetches(&self) -> usize {
        self.state.lock().await.peak_fetches_in_flight
    }

    /// All calls made so far
    pub async fn calls(&self) -> Vec<SourceCall> {
        self.state.lock().await.calls.clone()
    }

    /// Number of queries (counts and page fetches) issued
    pub async fn query_count(&self) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| !matches!(call, SourceCall::Connect))
            .count()
    }
}

/// `count` junctions with ids from 1000 laid out along `y = 2x`
pub fn generated_rows(count: u64) -> Vec<JunctionRow> {
    (0..count)
        .map(|i| JunctionRow::new(format!("{}", 1000 + i), format!("POINT({} {})", i, i * 2)))
        .collect()
}

#[async_trait]
impl SourceConnector for MockConnector {
    async fn connect(&self) -> ExtractResult<Box<dyn JunctionSource>> {
        let mut state = self.state.lock().await;
        state.calls.push(SourceCall::Connect);
        if state.refuse_connections {
            return Err(ExtractError::connection("mock source refused connection"));
        }
        Ok(Box::new(MockSource {
            state: self.state.clone(),
        }))
    }
}

struct MockSource {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl JunctionSource for MockSource {
    async fn count_rows(&mut self) -> ExtractResult<u64> {
        let mut state = self.state.lock().await;
        state.calls.push(SourceCall::Count);
        Ok(state.rows.len() as u64)
    }

    async fn fetch_page(&mut self, offset: u64, limit: u64) -> ExtractResult<Vec<JunctionRow>> {
        let (fails, delay) = {
            let mut state = self.state.lock().await;
            state.calls.push(SourceCall::FetchPage { offset, limit });
            (state.failing_offsets.contains(&offset), state.fetch_delay)
        };
        if fails {
            // let other ready tasks run before the failure lands
            tokio::task::yield_now().await;
            return Err(ExtractError::query(format!("mock failure at offset {}", offset)));
        }

        {
            let mut state = self.state.lock().await;
            state.fetches_in_flight += 1;
            state.peak_fetches_in_flight = state.peak_fetches_in_flight.max(state.fetches_in_flight);
        }
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().await;
        state.fetches_in_flight -= 1;
        Ok(state
            .rows
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
