//! End-to-end pipeline test: CSV file -> transform -> batch -> dispatch
//!
//! Runs the full loader pipeline against a temp CSV file and a mock capture
//! API, verifying the request counts and the aggregate report.

use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use emissions_loader::batch::Batcher;
use emissions_loader::client::{CaptureClient, Submitter};
use emissions_loader::csv_handler::{CsvReader, EmissionRecord};
use emissions_loader::dispatcher::Dispatcher;
use emissions_loader::graph::{Node, Relationship};
use emissions_loader::transform::build_graph;

const HEADER: &str = "name,key,year,month,day,\
f_vol,f_vol_uom,f_mass,f_mass_uom,\
cv_vol,cv_vol_uom,cv_mass,cv_mass_uom,\
df_vol,df_vol_uom,df_mass,df_mass_uom,\
fg_vol,fg_vol_uom,fg_mass,fg_mass_uom";

/// Writes a CSV with one well and `days` daily Flaring measurements.
fn write_emissions_csv(path: &std::path::Path, days: usize) {
    let mut file = File::create(path).unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for day in 1..=days {
        writeln!(
            file,
            "Well A,W-001,2024,1,{},{}.5,m3,2.0,t,,,,,,,,,,,,",
            day, day
        )
        .unwrap();
    }
}

#[tokio::test]
async fn full_pipeline_posts_all_batches() {
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("emissions.csv");
    write_emissions_csv(&csv_path, 5);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/capture/v1/nodes"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/capture/v1/relationships"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let records: Vec<EmissionRecord> = CsvReader::new(&csv_path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 5);

    let payload = build_graph(&records, "emissions.csv", "2024-06-01T00:00:00Z");
    // 1 Well + 1 Emissions + 4 EmissionType + 5 measurements
    assert_eq!(payload.nodes.len(), 11);
    // 1 HAS_EMISSIONS + 4 HAS_TYPE + 1 HAS_DATA + 4 NEXT_DATE
    assert_eq!(payload.relationships.len(), 10);

    let batcher = Batcher::new(4).unwrap();
    let node_batches = batcher.split(payload.nodes);
    let rel_batches = batcher.split(payload.relationships);
    assert_eq!(node_batches.len(), 3); // 4 + 4 + 3
    assert_eq!(rel_batches.len(), 3); // 4 + 4 + 2

    let client = Arc::new(
        CaptureClient::new(&server.uri(), "test-token")
            .unwrap()
            .with_retry_policy(2, Duration::from_millis(1)),
    );
    let dispatcher = Dispatcher::new(2).unwrap();

    let node_report = dispatcher
        .run(
            Arc::clone(&client) as Arc<dyn Submitter<Node>>,
            node_batches,
            "nodes",
        )
        .await;
    assert!(node_report.is_success());
    assert_eq!(node_report.succeeded, 3);

    let rel_report = dispatcher
        .run(
            Arc::clone(&client) as Arc<dyn Submitter<Relationship>>,
            rel_batches,
            "relationships",
        )
        .await;
    assert!(rel_report.is_success());
    assert_eq!(rel_report.succeeded, 3);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 6);
}

#[tokio::test]
async fn pipeline_records_failed_batches_and_continues() {
    let dir = tempdir().unwrap();
    let csv_path = dir.path().join("emissions.csv");
    write_emissions_csv(&csv_path, 3);

    let server = MockServer::start().await;
    // Every node batch is rejected as malformed; no retries expected
    Mock::given(method("POST"))
        .and(path("/capture/v1/nodes"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad payload"))
        .mount(&server)
        .await;

    let records: Vec<EmissionRecord> = CsvReader::new(&csv_path)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let payload = build_graph(&records, "emissions.csv", "2024-06-01T00:00:00Z");

    let batcher = Batcher::new(100).unwrap();
    let node_batches = batcher.split(payload.nodes);
    assert_eq!(node_batches.len(), 1);

    let client = Arc::new(
        CaptureClient::new(&server.uri(), "test-token")
            .unwrap()
            .with_retry_policy(3, Duration::from_millis(1)),
    );
    let dispatcher = Dispatcher::new(2).unwrap();
    let report = dispatcher
        .run(
            Arc::clone(&client) as Arc<dyn Submitter<Node>>,
            node_batches,
            "nodes",
        )
        .await;

    assert!(!report.is_success());
    assert_eq!(report.failed, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].error.contains("bad payload"));
    assert!(report.fatal.is_none());

    // Permanent failure: exactly one request, no retries
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
}
