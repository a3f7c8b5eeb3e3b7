//! Pipeline driver
//!
//! Stages run strictly in order and any error ends the run:
//!
//! 1. (extraction enabled) check credentials, plan chunks, dispatch chunks
//! 2. consolidate mapping chunks into `vertices-mapping.csv.gz`
//! 3. consolidate lookup chunks into `vertices-complete.csv.gz`
//! 4. consolidate compass chunks into `vertices-compass.csv.gz`

use crate::chunk::{plan_chunks, ChunkFetcher, ChunkPlan};
use crate::config::{Credentials, PipelineConfig, SourceConfig};
use crate::dispatch::{dispatch_chunks, DispatchReport};
use crate::error::{ExtractError, ExtractResult};
use crate::merge::{consolidate, ConsolidationSummary};
use crate::progress::create_progress_bar;
use crate::projection::ProjectionKind;
use crate::source::SourceConnector;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidateCredentials,
    PlanChunks,
    Dispatch,
    Consolidate(ProjectionKind),
    Complete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidateCredentials => write!(f, "validate credentials"),
            Self::PlanChunks => write!(f, "plan chunks"),
            Self::Dispatch => write!(f, "dispatch chunks"),
            Self::Consolidate(kind) => write!(f, "consolidate {}", kind),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// What a completed run did
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub plan: Option<ChunkPlan>,
    pub dispatch: Option<DispatchReport>,
    pub outputs: Vec<ConsolidationSummary>,
}

impl RunSummary {
    /// True when every output holds the same number of rows
    pub fn row_counts_agree(&self) -> bool {
        self.outputs.windows(2).all(|pair| pair[0].rows == pair[1].rows)
    }

    pub fn output(&self, kind: ProjectionKind) -> Option<&ConsolidationSummary> {
        self.outputs.iter().find(|o| o.kind == kind)
    }
}

type ConnectorFactory =
    Box<dyn Fn(&SourceConfig, &Credentials) -> Arc<dyn SourceConnector> + Send + Sync>;

/// Runs extraction and consolidation for one configuration
pub struct Pipeline {
    config: PipelineConfig,
    connector_factory: ConnectorFactory,
}

impl Pipeline {
    /// Create a pipeline that builds its source connector once credentials
    /// have been checked
    pub fn new<F>(config: PipelineConfig, connector_factory: F) -> Self
    where
        F: Fn(&SourceConfig, &Credentials) -> Arc<dyn SourceConnector> + Send + Sync + 'static,
    {
        Self {
            config,
            connector_factory: Box::new(connector_factory),
        }
    }

    /// Create a pipeline reading from an existing connector
    pub fn with_connector(config: PipelineConfig, connector: Arc<dyn SourceConnector>) -> Self {
        Self::new(config, move |_, _| connector.clone())
    }

    /// Create a pipeline reading from PostgreSQL
    pub fn postgres(config: PipelineConfig) -> Self {
        Self::new(config, |source, credentials| -> Arc<dyn SourceConnector> {
            Arc::new(crate::source::PostgresConnector::new(source, credentials))
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage
    pub async fn run(&self) -> ExtractResult<RunSummary> {
        self.config.validate()?;
        let mut summary = RunSummary::default();

        if self.config.extraction_enabled {
            let (plan, report) = self.extract().await?;
            summary.plan = Some(plan);
            summary.dispatch = Some(report);
        } else {
            debug!("Extraction disabled, consolidating existing chunk files");
        }

        std::fs::create_dir_all(&self.config.condensed_dir)?;
        for kind in ProjectionKind::ALL {
            enter(Stage::Consolidate(kind));
            summary.outputs.push(self.consolidate(kind).await?);
        }

        enter(Stage::Complete);
        if !summary.row_counts_agree() {
            warn!(
                "Output row counts differ: {}",
                summary
                    .outputs
                    .iter()
                    .map(|o| format!("{}={}", o.kind, o.rows))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        if let (Some(plan), Some(compass)) = (summary.plan, summary.output(ProjectionKind::Compass)) {
            if compass.rows as u64 != plan.total_rows {
                warn!(
                    "Consolidated {} vertices but the junction table had {} rows",
                    compass.rows, plan.total_rows
                );
            }
        }
        info!("Finished.");
        Ok(summary)
    }

    /// Plan and dispatch every chunk
    async fn extract(&self) -> ExtractResult<(ChunkPlan, DispatchReport)> {
        enter(Stage::ValidateCredentials);
        let credentials = self.config.require_credentials()?;
        let connector = (self.connector_factory)(&self.config.source, credentials);

        enter(Stage::PlanChunks);
        let plan = plan_chunks(connector.as_ref(), self.config.page_size).await?;

        enter(Stage::Dispatch);
        std::fs::create_dir_all(&self.config.vertices_dir)?;
        let fetcher = Arc::new(ChunkFetcher::new(
            connector,
            self.config.vertices_dir.clone(),
            plan,
        ));
        let progress = create_progress_bar(plan.chunk_count(), "chunks", self.config.show_progress);
        let report = dispatch_chunks(
            fetcher,
            plan.indices(),
            self.config.worker_count,
            &progress,
        )
        .await?;

        Ok((plan, report))
    }

    /// Consolidate one projection on the blocking pool
    async fn consolidate(&self, kind: ProjectionKind) -> ExtractResult<ConsolidationSummary> {
        let vertices_dir = self.config.vertices_dir.clone();
        let condensed_dir = self.config.condensed_dir.clone();
        let show_progress = self.config.show_progress;

        tokio::task::spawn_blocking(move || {
            consolidate(kind, &vertices_dir, &condensed_dir, show_progress)
        })
        .await
        .map_err(ExtractError::task)?
    }
}

fn enter(stage: Stage) {
    debug!("Entering stage: {}", stage);
}
