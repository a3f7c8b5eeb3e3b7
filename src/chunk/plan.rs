//! Chunk count planning

use crate::error::{ExtractError, ExtractResult};
use crate::source::SourceConnector;
use std::ops::Range;
use tracing::info;

/// How the junction table is split into fixed-size chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    pub total_rows: u64,
    pub page_size: u64,
}

impl ChunkPlan {
    pub fn new(total_rows: u64, page_size: u64) -> ExtractResult<Self> {
        if page_size == 0 {
            return Err(ExtractError::configuration("page_size must be greater than 0"));
        }
        Ok(Self {
            total_rows,
            page_size,
        })
    }

    /// `ceil(total_rows / page_size)`
    pub fn chunk_count(&self) -> u64 {
        self.total_rows.div_ceil(self.page_size)
    }

    pub fn indices(&self) -> Range<u64> {
        0..self.chunk_count()
    }

    /// First row of a chunk, which is also its first vertex id
    pub fn offset(&self, chunk_index: u64) -> u64 {
        chunk_index * self.page_size
    }

    /// Rows a chunk should return if the table has not changed since planning
    pub fn expected_rows(&self, chunk_index: u64) -> u64 {
        self.total_rows
            .saturating_sub(self.offset(chunk_index))
            .min(self.page_size)
    }

    pub fn contains(&self, chunk_index: u64) -> bool {
        chunk_index < self.chunk_count()
    }
}

/// Count the junction table and derive the chunk plan
pub async fn plan_chunks<C>(connector: &C, page_size: u64) -> ExtractResult<ChunkPlan>
where
    C: SourceConnector + ?Sized,
{
    let mut source = connector.connect().await?;
    let total_rows = source.count_rows().await?;
    info!("Found {} vertices", total_rows);

    let plan = ChunkPlan::new(total_rows, page_size)?;
    info!(
        "Submitting SQL queries across {} chunks of {} rows",
        plan.chunk_count(),
        page_size
    );
    Ok(plan)
}
