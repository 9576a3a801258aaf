//! Integration tests for the HTTP sweep
//!
//! These tests use wiremock to serve profile pages and run the full sweep
//! cycle end-to-end through the real HTTP fetcher and JSON checkpoint.

use mojo_sweep::config::{Config, CrawlerConfig, HttpConfig, OutputConfig};
use mojo_sweep::crawler::{run_sweep, FetchOutcome, HttpFetcher, PageFetcher, SweepStatus};
use mojo_sweep::output::{export_records, generate_markdown_summary, SweepSummary};
use mojo_sweep::storage::{CheckpointStore, JsonFileStore};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, headers, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn profile_page(name: &str, details: &str) -> String {
    format!(
        r#"<html><head><title>Profil</title></head><body>
        <div class="container"><div class="card p-2">
          <h2 class="pb-0">{}</h2>
          {}
        </div></div>
        </body></html>"#,
        name, details
    )
}

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, end_id: u64, temp_dir: &TempDir) -> Config {
    Config {
        crawler: CrawlerConfig {
            start_id: 1,
            end_id,
            max_concurrent: 4,
            batch_size: 3,
            save_every: 3,
        },
        http: HttpConfig {
            url_template: format!("{}/az/users/{{id}}", base_url),
            connect_timeout_secs: 1,
            timeout_secs: 1,
            ..HttpConfig::default()
        },
        output: OutputConfig {
            checkpoint_path: temp_dir
                .path()
                .join("checkpoint.json")
                .display()
                .to_string(),
            export_base: temp_dir.path().join("users").display().to_string(),
            summary_path: temp_dir.path().join("summary.md").display().to_string(),
            ..OutputConfig::default()
        },
    }
}

async fn mount_page(server: &MockServer, id: u64, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/az/users/{}", id)))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_sweep_against_mock_site() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        1,
        ResponseTemplate::new(200).set_body_string(profile_page(
            "Rəşad",
            "<p>(050) 555-12-34</p><p>Qeydiyyat tarixi: 12 mart 2021\n</p><p>Elan sayı: 4</p>",
        )),
    )
    .await;
    mount_page(
        &mock_server,
        2,
        ResponseTemplate::new(200).set_body_string(profile_page("Leyla", "<p>070 555 12 34</p>")),
    )
    .await;
    mount_page(&mock_server, 3, ResponseTemplate::new(500)).await;
    mount_page(
        &mock_server,
        4,
        ResponseTemplate::new(200).set_body_string(profile_page("Orxan", "<p>Elan sayı: 1</p>")),
    )
    .await;
    mount_page(
        &mock_server,
        5,
        ResponseTemplate::new(200)
            .set_body_string(profile_page("Slow", "<p>050 555 12 34</p>"))
            .set_delay(Duration::from_secs(3)),
    )
    .await;
    mount_page(
        &mock_server,
        6,
        ResponseTemplate::new(200).set_body_string(profile_page("Samir", "<p>040 555 12 34</p>")),
    )
    .await;

    // Everything else is an unknown profile
    Mock::given(method("GET"))
        .and(path_regex(r"^/az/users/\d+$"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 8, &temp_dir);
    let report = run_sweep(&config, false, CancellationToken::new())
        .await
        .expect("Sweep failed");

    assert_eq!(report.status, SweepStatus::Completed);

    let stats = &report.stats;
    assert_eq!(stats.total_processed, 8);
    // Records: 1, 2. Failed: 3 (500), 4 (no phone), 5 (timeout), 6 (bad prefix), 7, 8 (404)
    assert_eq!(stats.successful, 2);
    assert_eq!(stats.failed, 6);
    assert_eq!(stats.valid_records, 2);
    assert_eq!(stats.no_identifier, 1);
    assert_eq!(stats.invalid_identifier, 1);
    assert_eq!(stats.last_processed_id, Some(8));

    let mut records = report.records.clone();
    records.sort_by_key(|r| r.id);
    assert_eq!(records[0].id, 1);
    assert_eq!(records[0].phone, "505551234");
    assert_eq!(records[0].registration_date_raw.as_deref(), Some("12 mart 2021"));
    assert_eq!(records[0].listing_count, Some(4));
    assert_eq!(
        records[0].source_url,
        format!("{}/az/users/1", mock_server.uri())
    );
    assert_eq!(records[1].id, 2);
    assert_eq!(records[1].phone, "705551234");

    // The checkpoint on disk matches the report
    let checkpoint = JsonFileStore::new(&config.output.checkpoint_path)
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(&checkpoint.stats, stats);
    assert_eq!(checkpoint.records.len(), 2);
}

#[tokio::test]
async fn test_second_run_resumes_without_refetching() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    // IDs 1..=6 must each be requested exactly once across both runs
    Mock::given(method("GET"))
        .and(path_regex(r"^/az/users/[1-6]$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(profile_page("Aysel", "<p>055 555 12 34</p>")),
        )
        .expect(6)
        .mount(&mock_server)
        .await;

    let first = create_test_config(&mock_server.uri(), 3, &temp_dir);
    let report = run_sweep(&first, false, CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.stats.total_processed, 3);

    let second = create_test_config(&mock_server.uri(), 6, &temp_dir);
    let report = run_sweep(&second, false, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.resumed_from, 4);
    assert_eq!(report.stats.total_processed, 6);
    assert_eq!(report.records.len(), 6);
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/az/users/1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/az/users/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(profile_page("Nigar", "<p>051 555 12 34</p>")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&HttpConfig {
        url_template: format!("{}/az/users/{{id}}", mock_server.uri()),
        max_retries: 1,
        retry_delay_ms: 10,
        ..HttpConfig::default()
    })
    .unwrap();

    assert!(matches!(fetcher.fetch(1).await, FetchOutcome::Success(_)));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/az/users/9"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&HttpConfig {
        url_template: format!("{}/az/users/{{id}}", mock_server.uri()),
        max_retries: 3,
        retry_delay_ms: 10,
        ..HttpConfig::default()
    })
    .unwrap();

    assert_eq!(fetcher.fetch(9).await, FetchOutcome::HttpError(404));
}

#[tokio::test]
async fn test_browser_headers_are_sent() {
    let mock_server = MockServer::start().await;

    // wiremock splits header values on commas, so the language list is matched item by item
    Mock::given(method("GET"))
        .and(path("/az/users/1"))
        .and(headers("accept-language", vec!["az", "en;q=0.9"]))
        .and(header("user-agent", "mojo-sweep-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&HttpConfig {
        url_template: format!("{}/az/users/{{id}}", mock_server.uri()),
        user_agent: "mojo-sweep-test/1.0".to_string(),
        ..HttpConfig::default()
    })
    .unwrap();

    assert_eq!(fetcher.fetch(1).await, FetchOutcome::Success("ok".to_string()));
}

#[tokio::test]
async fn test_sweep_then_export() {
    let mock_server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path_regex(r"^/az/users/\d+$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(profile_page("Kamran", "<p>077 555 12 34</p>")),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 5, &temp_dir);
    let report = run_sweep(&config, false, CancellationToken::new())
        .await
        .unwrap();

    let written = export_records(&report.records, &config.output).unwrap();
    assert_eq!(written.len(), 2);

    let summary = SweepSummary::new(1, 5, &report.stats, &report.records)
        .with_status(report.status);
    let summary_path = temp_dir.path().join("summary.md");
    generate_markdown_summary(&summary, &summary_path).unwrap();

    let markdown = std::fs::read_to_string(&summary_path).unwrap();
    assert!(markdown.contains("- **Status**: completed"));
    assert!(markdown.contains("| 077 | 5 | 100.0% |"));

    let csv = std::fs::read_to_string(temp_dir.path().join("users.csv")).unwrap();
    assert_eq!(csv.lines().count(), 6);
}
