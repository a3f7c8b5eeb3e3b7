//! Chunk extraction: one paginated query, three files

use super::plan::ChunkPlan;
use super::writer::write_chunk_files;
use crate::error::{ExtractError, ExtractResult};
use crate::projection::ChunkPaths;
use crate::source::SourceConnector;
use crate::vertex::assign_vertex_ids;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What happened to a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Chunk was queried and its files written
    Written { rows: u64 },
    /// Output already existed; nothing was queried
    Skipped,
}

/// Extracts single chunks of the junction table into the vertices directory
pub struct ChunkFetcher<C: ?Sized> {
    connector: Arc<C>,
    vertices_dir: PathBuf,
    plan: ChunkPlan,
}

impl<C> ChunkFetcher<C>
where
    C: SourceConnector + ?Sized,
{
    pub fn new(connector: Arc<C>, vertices_dir: impl Into<PathBuf>, plan: ChunkPlan) -> Self {
        Self {
            connector,
            vertices_dir: vertices_dir.into(),
            plan,
        }
    }

    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    /// Fetch one chunk over a fresh connection and write its files.
    /// Returns `Skipped` without connecting when the chunk's output exists.
    pub async fn fetch(&self, chunk_index: u64) -> ExtractResult<FetchOutcome> {
        let paths = ChunkPaths::new(&self.vertices_dir, chunk_index);
        if paths.already_written() {
            info!("Chunk {} file already exists, skipping", chunk_index);
            return Ok(FetchOutcome::Skipped);
        }

        if !self.plan.contains(chunk_index) {
            return Err(ExtractError::configuration(format!(
                "chunk {} is outside the planned {} chunks",
                chunk_index,
                self.plan.chunk_count()
            )));
        }

        let offset = self.plan.offset(chunk_index);
        debug!(
            "Fetching chunk {} (offset {}, limit {})",
            chunk_index, offset, self.plan.page_size
        );

        let mut source = self.connector.connect().await?;
        let rows = source.fetch_page(offset, self.plan.page_size).await?;
        drop(source);

        let row_count = rows.len() as u64;
        let expected = self.plan.expected_rows(chunk_index);
        if row_count != expected {
            warn!(
                "Chunk {} returned {} rows, expected {}; the junction table changed since planning and vertex ids may overlap or leave gaps",
                chunk_index, row_count, expected
            );
        }

        let vertices = assign_vertex_ids(rows, offset)?;
        tokio::task::spawn_blocking(move || write_chunk_files(&paths, &vertices))
            .await
            .map_err(ExtractError::task)??;

        info!("Finished writing chunk {} to disk ({} rows)", chunk_index, row_count);
        Ok(FetchOutcome::Written { rows: row_count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::mock::generated_rows;
    use crate::source::{MockConnector, SourceCall};
    use crate::vertex::JunctionRow;
    use tempfile::TempDir;

    fn fetcher(connector: &MockConnector, dir: &TempDir, page_size: u64, total: u64) -> ChunkFetcher<MockConnector> {
        let plan = ChunkPlan::new(total, page_size).unwrap();
        ChunkFetcher::new(Arc::new(connector.clone()), dir.path(), plan)
    }

    fn vertex_ids(path: &std::path::Path) -> Vec<u64> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader
            .records()
            .map(|r| r.unwrap()[0].parse().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_vertex_ids_start_at_chunk_offset() {
        let dir = TempDir::new().unwrap();
        let connector = MockConnector::with_generated_rows(25);
        let fetcher = fetcher(&connector, &dir, 10, 25);

        let outcome = fetcher.fetch(2).await.unwrap();
        assert_eq!(outcome, FetchOutcome::Written { rows: 5 });

        let paths = ChunkPaths::new(dir.path(), 2);
        assert_eq!(vertex_ids(&paths.mapping), vec![20, 21, 22, 23, 24]);
        assert_eq!(vertex_ids(&paths.compass), vec![20, 21, 22, 23, 24]);
        assert!(paths.lookup.exists());
        assert!(connector
            .calls()
            .await
            .contains(&SourceCall::FetchPage { offset: 20, limit: 10 }));
    }

    #[tokio::test]
    async fn test_existing_output_skips_without_query() {
        let dir = TempDir::new().unwrap();
        let connector = MockConnector::with_generated_rows(25);
        let fetcher = fetcher(&connector, &dir, 10, 25);

        let paths = ChunkPaths::new(dir.path(), 1);
        std::fs::write(&paths.compass, "vertex_id,x,y\n999,1,1\n").unwrap();

        assert_eq!(fetcher.fetch(1).await.unwrap(), FetchOutcome::Skipped);
        assert!(connector.calls().await.is_empty());
        assert_eq!(
            std::fs::read_to_string(&paths.compass).unwrap(),
            "vertex_id,x,y\n999,1,1\n"
        );
        assert!(!paths.mapping.exists());
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let connector = MockConnector::with_generated_rows(8);
        let fetcher = fetcher(&connector, &dir, 4, 8);

        fetcher.fetch(0).await.unwrap();
        let queries = connector.query_count().await;
        let before = std::fs::read_to_string(ChunkPaths::new(dir.path(), 0).lookup).unwrap();

        assert_eq!(fetcher.fetch(0).await.unwrap(), FetchOutcome::Skipped);
        assert_eq!(connector.query_count().await, queries);
        let after = std::fs::read_to_string(ChunkPaths::new(dir.path(), 0).lookup).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_out_of_range_chunk_rejected() {
        let dir = TempDir::new().unwrap();
        let connector = MockConnector::with_generated_rows(8);
        let fetcher = fetcher(&connector, &dir, 4, 8);

        assert!(fetcher.fetch(2).await.is_err());
        assert!(connector.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_bad_geometry_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let connector = MockConnector::new(vec![
            JunctionRow::new("1", "POINT(0 0)"),
            JunctionRow::new("2", "not a geometry"),
        ]);
        let fetcher = fetcher(&connector, &dir, 10, 2);

        let err = fetcher.fetch(0).await.unwrap_err();
        assert!(matches!(err, ExtractError::Geometry { .. }));
        assert!(!ChunkPaths::new(dir.path(), 0).already_written());
    }

    #[tokio::test]
    async fn test_query_failure_propagates() {
        let dir = TempDir::new().unwrap();
        let connector = MockConnector::with_generated_rows(20);
        connector.fail_at_offset(10).await;
        let fetcher = fetcher(&connector, &dir, 10, 20);

        assert!(matches!(
            fetcher.fetch(1).await,
            Err(ExtractError::Query(_))
        ));
    }

    #[tokio::test]
    async fn test_shrunken_table_still_writes_rows() {
        let dir = TempDir::new().unwrap();
        let connector = MockConnector::with_generated_rows(20);
        let fetcher = fetcher(&connector, &dir, 10, 20);
        connector.set_rows(generated_rows(15)).await;

        assert_eq!(
            fetcher.fetch(1).await.unwrap(),
            FetchOutcome::Written { rows: 5 }
        );
    }
}
