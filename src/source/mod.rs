//! Junction source abstraction
//!
//! Extraction talks to the database through these traits so chunk fetching
//! and planning can be exercised without a live PostGIS server.

pub mod mock;
pub mod postgres;

pub use mock::{MockConnector, SourceCall};
pub use postgres::PostgresConnector;

use crate::error::ExtractResult;
use crate::vertex::JunctionRow;
use async_trait::async_trait;

/// An open connection to the junction table
#[async_trait]
pub trait JunctionSource: Send {
    /// Total number of junction rows
    async fn count_rows(&mut self) -> ExtractResult<u64>;

    /// Rows ordered by junction id, skipping `offset` and returning at most `limit`
    async fn fetch_page(&mut self, offset: u64, limit: u64) -> ExtractResult<Vec<JunctionRow>>;
}

/// Opens independent connections to the junction table
#[async_trait]
pub trait SourceConnector: Send + Sync {
    async fn connect(&self) -> ExtractResult<Box<dyn JunctionSource>>;
}
