//! Integration tests for registry discovery
//!
//! These tests use wiremock to stand in for the registry search service and
//! drive the real HTTP client through whole regions.

use institution_finder::config::{
    Config, FinderConfig, HttpConfig, OutputConfig, DEFAULT_PROGRAM_FILTER,
};
use institution_finder::crawler::{DiscoveryOrchestrator, RegionEnd};
use institution_finder::output::{open_output, spawn_writer, ChannelSink, Institution, InstitutionSink};
use institution_finder::source::{spawn_discovery, InstitutionSource};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REGISTRY_PATH: &str = "/collegenavigator/";
const RESULTS_TABLE_ID: &str = "ctl00_cphCollegeNavBody_ucResultsMain_tblResults";
const PAGING_CONTROLS_ID: &str = "ctl00_cphCollegeNavBody_ucResultsMain_divPagingControls";

#[derive(Default)]
struct CollectingSink {
    records: Mutex<Vec<Institution>>,
}

impl CollectingSink {
    fn names(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|i| i.name.clone())
            .collect()
    }
}

impl InstitutionSink for CollectingSink {
    fn send(&self, institution: Institution) {
        self.records.lock().unwrap().push(institution);
    }
}

/// Creates a test configuration pointing at the mock registry
fn create_test_config(base_url: &str, regions: &[&str]) -> Config {
    Config {
        finder: FinderConfig {
            country: "usa".to_string(),
            registry_url: Some(format!("{}{}", base_url, REGISTRY_PATH)),
            program_filter: DEFAULT_PROGRAM_FILTER.to_string(),
            regions: regions.iter().map(|r| r.to_string()).collect(),
            data_dir: PathBuf::from("./data"),
            json_path: None,
        },
        http: HttpConfig {
            user_agent: "TestFinder/1.0".to_string(),
            connect_timeout_secs: 5,
            timeout_secs: 5,
            retry_backoff_ms: 0, // No waiting between attempts in tests
        },
        output: OutputConfig::default(),
    }
}

fn rows(prefix: &str, id_base: u32, count: u32) -> Vec<(String, String)> {
    (1..=count)
        .map(|n| (format!("{} College {}", prefix, n), (id_base + n).to_string()))
        .collect()
}

fn results_page(rows: &[(String, String)], paging_text: &str, next_link: bool) -> String {
    let body: String = rows
        .iter()
        .enumerate()
        .map(|(i, (name, id))| {
            let class = if i % 2 == 0 { "resultsW" } else { "resultsY" };
            format!(
                r#"<tr class="{}"><td><img alt="info"></td><td><a href="?s=XX&amp;id={}">{}</a></td><td>+</td></tr>"#,
                class, id, name
            )
        })
        .collect();
    let next = if next_link {
        r#"<a href="?pg=next">Next Page &raquo;</a> "#
    } else {
        ""
    };

    format!(
        r#"<html><body>
        <table id="{}"><tbody>{}</tbody></table>
        <div id="{}">{}{}</div>
        </body></html>"#,
        RESULTS_TABLE_ID, body, PAGING_CONTROLS_ID, next, paging_text
    )
}

fn empty_results_page() -> String {
    format!(
        r#"<html><body><table id="{}"></table><div id="{}"></div></body></html>"#,
        RESULTS_TABLE_ID, PAGING_CONTROLS_ID
    )
}

fn detail_page(name: &str) -> String {
    format!(
        r#"<html><body>
        <div><span class="headerlg">{}</span><br>100 Campus Drive, Springfield</div>
        <table><tr><td class="srb">Website:</td><td><a href="http://www.example.edu/">www.example.edu/</a></td></tr></table>
        </body></html>"#,
        name
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

async fn mount_results(server: &MockServer, region: &str, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path(REGISTRY_PATH))
        .and(query_param("s", region))
        .and(query_param("pg", page.to_string().as_str()))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn mount_details(server: &MockServer, rows: &[(String, String)]) {
    for (name, id) in rows {
        Mock::given(method("GET"))
            .and(path(REGISTRY_PATH))
            .and(query_param("id", id.as_str()))
            .respond_with(html(detail_page(name)))
            .mount(server)
            .await;
    }
}

/// Mounts a region of `pages` pages with `per_page` results each
///
/// Identifiers are `id_base + page * 100 + n`, so regions given distinct bases never share one.
async fn mount_region(server: &MockServer, region: &str, id_base: u32, pages: u32, per_page: u32) {
    for page in 1..=pages {
        let page_rows = rows(&format!("{} p{}", region, page), id_base + page * 100, per_page);
        let paging = format!("Showing Results | Page {} of {}", page, pages);
        mount_results(server, region, page, results_page(&page_rows, &paging, page < pages)).await;
        mount_details(server, &page_rows).await;
    }
}

async fn mount_failing_results(server: &MockServer, region: &str, page: u32, expected: u64) {
    Mock::given(method("GET"))
        .and(path(REGISTRY_PATH))
        .and(query_param("s", region))
        .and(query_param("pg", page.to_string().as_str()))
        .respond_with(ResponseTemplate::new(500))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_page_region() {
    let mock_server = MockServer::start().await;
    let alabama = rows("Alabama", 100_000, 9);
    mount_results(
        &mock_server,
        "AL",
        1,
        results_page(&alabama, "Showing All Results", false),
    )
    .await;
    mount_details(&mock_server, &alabama).await;

    let config = create_test_config(&mock_server.uri(), &["AL"]);
    let orchestrator = DiscoveryOrchestrator::from_config(&config).expect("Failed to build orchestrator");
    let sink = CollectingSink::default();

    let summary = orchestrator.run(&config.finder.regions, &sink).await;

    assert_eq!(summary.institutions, 9);
    let expected: Vec<String> = alabama.iter().map(|(name, _)| name.clone()).collect();
    assert_eq!(sink.names(), expected);

    let first = sink.records.lock().unwrap()[0].clone();
    assert_eq!(
        first,
        Institution::new(
            "Alabama College 1",
            "USA",
            "100 Campus Drive, Springfield",
            "https://www.example.edu/"
        )
    );
}

#[tokio::test]
async fn test_region_without_results() {
    let mock_server = MockServer::start().await;
    mount_results(&mock_server, "AS", 1, empty_results_page()).await;

    let config = create_test_config(&mock_server.uri(), &["AS"]);
    let orchestrator = DiscoveryOrchestrator::from_config(&config).expect("Failed to build orchestrator");
    let sink = CollectingSink::default();

    let summary = orchestrator.run(&config.finder.regions, &sink).await;

    assert_eq!(summary.institutions, 0);
    assert_eq!(summary.regions[0].end, RegionEnd::Completed);
    assert_eq!(summary.regions[0].pages_fetched, 1);
}

#[tokio::test]
async fn test_transient_failure_recovered_by_retry() {
    let mock_server = MockServer::start().await;

    // First request for page 1 fails, the retry succeeds
    Mock::given(method("GET"))
        .and(path(REGISTRY_PATH))
        .and(query_param("s", "AL"))
        .and(query_param("pg", "1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_region(&mock_server, "AL", 10_000, 1, 4).await;

    let config = create_test_config(&mock_server.uri(), &["AL"]);
    let orchestrator = DiscoveryOrchestrator::from_config(&config).expect("Failed to build orchestrator");
    let sink = CollectingSink::default();

    let summary = orchestrator.run(&config.finder.regions, &sink).await;

    assert_eq!(summary.institutions, 4);
}

#[tokio::test]
async fn test_failed_page_probes_next_page() {
    let mock_server = MockServer::start().await;
    mount_failing_results(&mock_server, "NY", 2, 2).await;
    mount_region(&mock_server, "NY", 20_000, 3, 5).await;

    let config = create_test_config(&mock_server.uri(), &["NY"]);
    let orchestrator = DiscoveryOrchestrator::from_config(&config).expect("Failed to build orchestrator");
    let sink = CollectingSink::default();

    let summary = orchestrator.run(&config.finder.regions, &sink).await;

    assert_eq!(summary.institutions, 10);
    let names = sink.names();
    assert!(names.contains(&"NY p1 College 1".to_string()));
    assert!(names.contains(&"NY p3 College 5".to_string()));
    assert!(!names.iter().any(|n| n.starts_with("NY p2")));
}

#[tokio::test]
async fn test_consecutive_failures_abort_region() {
    let mock_server = MockServer::start().await;
    mount_failing_results(&mock_server, "NY", 2, 2).await;
    mount_failing_results(&mock_server, "NY", 3, 2).await;
    mount_failing_results(&mock_server, "NY", 4, 0).await;
    mount_region(&mock_server, "NY", 20_000, 4, 3).await;
    mount_region(&mock_server, "CA", 30_000, 1, 2).await;

    let config = create_test_config(&mock_server.uri(), &["NY", "CA"]);
    let orchestrator = DiscoveryOrchestrator::from_config(&config).expect("Failed to build orchestrator");
    let sink = CollectingSink::default();

    let summary = orchestrator.run(&config.finder.regions, &sink).await;

    assert_eq!(summary.regions[0].emitted, 3);
    assert_eq!(summary.regions[0].end, RegionEnd::Aborted { page: 2 });
    assert_eq!(summary.regions[1].emitted, 2);
    assert_eq!(summary.aborted_regions(), vec!["NY"]);
}

#[tokio::test]
async fn test_detail_failure_skips_one_institution() {
    let mock_server = MockServer::start().await;
    let alabama = rows("Alabama", 100_000, 5);

    Mock::given(method("GET"))
        .and(path(REGISTRY_PATH))
        .and(query_param("id", alabama[2].1.as_str()))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_results(
        &mock_server,
        "AL",
        1,
        results_page(&alabama, "Showing All Results", false),
    )
    .await;
    mount_details(&mock_server, &alabama).await;

    let config = create_test_config(&mock_server.uri(), &["AL"]);
    let orchestrator = DiscoveryOrchestrator::from_config(&config).expect("Failed to build orchestrator");
    let sink = CollectingSink::default();

    let summary = orchestrator.run(&config.finder.regions, &sink).await;

    assert_eq!(summary.institutions, 4);
    assert_eq!(summary.skipped_institutions(), 1);
    assert!(!sink.names().contains(&alabama[2].0));
}

#[tokio::test]
async fn test_spawned_run_writes_json_lines() {
    let mock_server = MockServer::start().await;
    mount_region(&mock_server, "AL", 10_000, 2, 3).await;

    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let output_path = dir.path().join("institutions.jsonl");

    let config = create_test_config(&mock_server.uri(), &["AL"]);
    let source = InstitutionSource::from_config(&config).expect("Failed to select source");

    let output = open_output(Some(&output_path)).await.expect("Failed to open output");
    let (sink, receiver) = ChannelSink::channel();
    let writer = spawn_writer(receiver, output);

    let summary = spawn_discovery(Arc::new(source), Arc::new(sink))
        .await
        .expect("Discovery task panicked")
        .expect("Discovery failed");
    let written = writer.await.expect("Writer panicked");

    assert_eq!(summary.institutions, 6);
    assert_eq!(written, 6);

    let content = std::fs::read_to_string(&output_path).expect("Failed to read output");
    let records: Vec<Institution> = content
        .lines()
        .map(|line| serde_json::from_str(line).expect("Invalid JSON line"))
        .collect();
    assert_eq!(records.len(), 6);
    assert_eq!(records[0].name, "AL p1 College 1");
    assert_eq!(records[5].name, "AL p2 College 3");
}
