use clap::Parser;
use compass_vertexlist::{Pipeline, PipelineConfig, RunSummary};
use std::path::PathBuf;
use tracing::{debug, error, info, trace};
use tracing_subscriber::EnvFilter;

/// Extract TomTom junctions into chunk files and consolidate them into
/// compass vertex lists
#[derive(Parser, Debug)]
#[command(name = "compass-vertexlist")]
#[command(about = "Build compass vertex lists from the TomTom junction table", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Pull junctions from the database before consolidating
    /// (requires TROLLEY_USERNAME and TROLLEY_PASSWORD)
    #[arg(long)]
    extract: bool,

    /// Junction rows per chunk
    #[arg(long)]
    page_size: Option<u64>,

    /// Chunks extracted in parallel
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Directory for per-chunk CSV files
    #[arg(long)]
    vertices_dir: Option<PathBuf>,

    /// Directory for the consolidated outputs
    #[arg(long)]
    condensed_dir: Option<PathBuf>,

    /// Hide progress bars
    #[arg(long)]
    no_progress: bool,
}

impl Cli {
    /// Layer command-line flags over the file or default configuration
    fn into_config(self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        if self.extract {
            config.extraction_enabled = true;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(workers) = self.workers {
            config.worker_count = workers;
        }
        if let Some(dir) = self.vertices_dir {
            config.vertices_dir = dir;
        }
        if let Some(dir) = self.condensed_dir {
            config.condensed_dir = dir;
        }
        if self.no_progress {
            config.show_progress = false;
        }

        Ok(config.with_env_credentials())
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        2 => "trace",
        _ => "trace,sqlx=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 3)
        .with_line_number(cli.verbose >= 3)
        .with_writer(std::io::stderr)
        .init();

    debug!("compass-vertexlist started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    if let Err(e) = run(cli).await {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.into_config()?;
    debug!("Configuration: {:?}", config);

    let summary = Pipeline::postgres(config).run().await?;
    report(&summary);
    Ok(())
}

fn report(summary: &RunSummary) {
    if let Some(dispatch) = &summary.dispatch {
        info!(
            "Extraction: {} chunks written ({} rows), {} skipped",
            dispatch.written(),
            dispatch.rows_written(),
            dispatch.skipped()
        );
    }
    for output in &summary.outputs {
        info!(
            "{}: {} rows from {} files -> {}",
            output.kind,
            output.rows,
            output.files,
            output.output.display()
        );
    }
}
