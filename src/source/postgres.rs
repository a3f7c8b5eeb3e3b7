//! PostgreSQL junction source

use super::{JunctionSource, SourceConnector};
use crate::config::{Credentials, SourceConfig, JUNCTION_TABLE};
use crate::error::{ExtractError, ExtractResult};
use crate::vertex::JunctionRow;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection, Row};
use std::time::Duration;
use tracing::debug;

/// Connects to the source database with fixed credentials
pub struct PostgresConnector {
    options: PgConnectOptions,
}

impl PostgresConnector {
    pub fn new(source: &SourceConfig, credentials: &Credentials) -> Self {
        let options = PgConnectOptions::new()
            .host(&source.host)
            .port(source.port)
            .database(&source.database)
            .username(&credentials.username)
            .password(&credentials.password)
            .log_statements(log::LevelFilter::Debug)
            .log_slow_statements(log::LevelFilter::Warn, Duration::from_secs(60));
        Self { options }
    }
}

#[async_trait]
impl SourceConnector for PostgresConnector {
    async fn connect(&self) -> ExtractResult<Box<dyn JunctionSource>> {
        debug!(
            "Connecting to {}:{}/{}",
            self.options.get_host(),
            self.options.get_port(),
            self.options.get_database().unwrap_or_default()
        );
        let conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| ExtractError::connection(format!("Failed to connect to database: {}", e)))?;
        Ok(Box::new(PostgresSource { conn }))
    }
}

/// A single connection reading the junction table
pub struct PostgresSource {
    conn: PgConnection,
}

#[async_trait]
impl JunctionSource for PostgresSource {
    async fn count_rows(&mut self) -> ExtractResult<u64> {
        let query = format!("SELECT count(*) FROM {}", JUNCTION_TABLE);
        let count: i64 = sqlx::query_scalar(&query)
            .fetch_one(&mut self.conn)
            .await?;
        u64::try_from(count).map_err(|_| ExtractError::query(format!("negative row count {}", count)))
    }

    async fn fetch_page(&mut self, offset: u64, limit: u64) -> ExtractResult<Vec<JunctionRow>> {
        let query = format!(
            "SELECT feat_id::text AS junction_id, ST_AsText(geom) AS geom \
             FROM {} ORDER BY feat_id OFFSET $1 LIMIT $2",
            JUNCTION_TABLE
        );
        let offset = i64::try_from(offset)
            .map_err(|_| ExtractError::query(format!("offset {} out of range", offset)))?;
        let limit = i64::try_from(limit)
            .map_err(|_| ExtractError::query(format!("limit {} out of range", limit)))?;

        let rows = sqlx::query(&query)
            .bind(offset)
            .bind(limit)
            .fetch_all(&mut self.conn)
            .await?;

        rows.iter()
            .map(|row| -> ExtractResult<JunctionRow> {
                let junction_id: String = row.try_get("junction_id")?;
                let geom: Option<String> = row.try_get("geom")?;
                let geom = geom.ok_or_else(|| ExtractError::geometry(&junction_id, "geometry is NULL"))?;
                Ok(JunctionRow { junction_id, geom })
            })
            .collect()
    }
}
