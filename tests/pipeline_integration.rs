//! End-to-end runs against the in-memory junction source

mod common;

use common::read_gzip;
use compass_vertexlist::config::Credentials;
use compass_vertexlist::source::{MockConnector, SourceCall};
use compass_vertexlist::vertex::JunctionRow;
use compass_vertexlist::{ExtractError, Pipeline, PipelineConfig, ProjectionKind};
use std::sync::Arc;
use tempfile::TempDir;

fn extracting_config(root: &TempDir, page_size: u64, worker_count: usize) -> PipelineConfig {
    PipelineConfig {
        extraction_enabled: true,
        page_size,
        worker_count,
        vertices_dir: root.path().join("tomtom-vertices"),
        condensed_dir: root.path().join("tomtom-condensed"),
        show_progress: false,
        credentials: Some(Credentials::new("reader", "secret")),
        ..Default::default()
    }
}

fn data_lines(text: &str) -> Vec<&str> {
    text.lines().skip(1).collect()
}

#[tokio::test]
async fn test_outputs_agree_and_are_ordered() {
    let root = TempDir::new().unwrap();
    let connector = MockConnector::with_generated_rows(23);
    let pipeline = Pipeline::with_connector(extracting_config(&root, 5, 3), Arc::new(connector));

    let summary = pipeline.run().await.unwrap();

    assert_eq!(summary.plan.map(|p| p.chunk_count()), Some(5));
    assert!(summary.row_counts_agree());

    let condensed = root.path().join("tomtom-condensed");
    let compass = read_gzip(&condensed.join("vertices-compass.csv.gz")).unwrap();
    let mapping = read_gzip(&condensed.join("vertices-mapping.csv.gz")).unwrap();
    let lookup = read_gzip(&condensed.join("vertices-complete.csv.gz")).unwrap();

    assert!(compass.starts_with("vertex_id,x,y\n"));
    assert!(mapping.starts_with("vertex_id,junction_id\n"));
    assert!(lookup.starts_with("junction_id,geom,x,y,vertex_id\n"));

    let ids: Vec<u64> = data_lines(&compass)
        .iter()
        .map(|line| line.split(',').next().unwrap().parse().unwrap())
        .collect();
    assert_eq!(ids, (0..23).collect::<Vec<_>>());

    for (vertex_id, line) in data_lines(&mapping).iter().enumerate() {
        assert_eq!(*line, format!("{},{}", vertex_id, 1000 + vertex_id));
    }
    assert_eq!(data_lines(&lookup).len(), 23);
}

#[tokio::test]
async fn test_rerun_skips_written_chunks() {
    let root = TempDir::new().unwrap();
    let connector = MockConnector::with_generated_rows(12);
    let config = extracting_config(&root, 4, 2);

    Pipeline::with_connector(config.clone(), Arc::new(connector.clone()))
        .run()
        .await
        .unwrap();
    let first_run_queries = connector.query_count().await;

    let summary = Pipeline::with_connector(config, Arc::new(connector.clone()))
        .run()
        .await
        .unwrap();

    let dispatch = summary.dispatch.unwrap();
    assert_eq!(dispatch.written(), 0);
    assert_eq!(dispatch.skipped(), 3);
    // only the row count is queried again
    assert_eq!(connector.query_count().await, first_run_queries + 1);
    assert!(summary.outputs.iter().all(|o| o.rows == 12));
}

#[tokio::test]
async fn test_partial_rerun_fills_missing_chunk() {
    let root = TempDir::new().unwrap();
    let connector = MockConnector::with_generated_rows(9);
    let config = extracting_config(&root, 3, 1);

    Pipeline::with_connector(config.clone(), Arc::new(connector.clone()))
        .run()
        .await
        .unwrap();
    let vertices = root.path().join("tomtom-vertices");
    for kind in ProjectionKind::ALL {
        std::fs::remove_file(vertices.join(kind.chunk_file_name(1))).unwrap();
    }

    let summary = Pipeline::with_connector(config, Arc::new(connector.clone()))
        .run()
        .await
        .unwrap();

    let dispatch = summary.dispatch.unwrap();
    assert_eq!(dispatch.written(), 1);
    assert_eq!(dispatch.skipped(), 2);
    assert!(connector
        .calls()
        .await
        .contains(&SourceCall::FetchPage { offset: 3, limit: 3 }));
    assert!(summary.outputs.iter().all(|o| o.rows == 9));
}

#[tokio::test]
async fn test_failed_chunk_stops_before_consolidation() {
    let root = TempDir::new().unwrap();
    let connector = MockConnector::with_generated_rows(20);
    connector.fail_at_offset(10).await;

    let err = Pipeline::with_connector(extracting_config(&root, 5, 1), Arc::new(connector))
        .run()
        .await
        .unwrap_err();

    match err {
        ExtractError::Dispatch { failed, .. } => assert_eq!(failed, vec![2]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!root.path().join("tomtom-condensed").join("vertices-compass.csv.gz").exists());
}

#[tokio::test]
async fn test_empty_table_has_nothing_to_consolidate() {
    let root = TempDir::new().unwrap();
    let connector = MockConnector::new(Vec::new());

    let err = Pipeline::with_connector(extracting_config(&root, 5, 2), Arc::new(connector.clone()))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::NoChunkFiles { .. }));
    assert!(!connector
        .calls()
        .await
        .iter()
        .any(|call| matches!(call, SourceCall::FetchPage { .. })));
}

#[tokio::test]
async fn test_bad_geometry_fails_run() {
    let root = TempDir::new().unwrap();
    let connector = MockConnector::new(vec![
        JunctionRow::new("1", "POINT(1 1)"),
        JunctionRow::new("2", "LINESTRING(0 0, 1 1)"),
    ]);

    let err = Pipeline::with_connector(extracting_config(&root, 10, 1), Arc::new(connector))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractError::Dispatch { .. }));
    assert!(!root
        .path()
        .join("tomtom-vertices")
        .join(ProjectionKind::Compass.chunk_file_name(0))
        .exists());
}
