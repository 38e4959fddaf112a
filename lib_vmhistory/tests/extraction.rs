use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use lib_vmhistory::configs::config_vh::ExtractorConfig;
use lib_vmhistory::history::fetcher::{FetchOptions, VolunteerHistoryApi};
use lib_vmhistory::pipelines::extract::{extract_from, run_extraction};
use lib_vmhistory::retrieve::ky_http::{ApiClient, Credentials};
use lib_vmhistory::retrieve::retry::RetryPolicy;
use lib_vmhistory::tables::tabular::{load_table, TableFormat};
use lib_vmhistory::{DateWindow, VolunteerError};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/api/v3/volunteer-history";

fn window() -> DateWindow {
    DateWindow::for_report_month(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(), None).unwrap()
}

fn credentials() -> Credentials {
    Credentials {
        api_key: "key".into(),
        api_secret: "secret".into(),
        customer_code: "YMCA01".into(),
    }
}

fn api(server: &MockServer, timeout: Duration) -> VolunteerHistoryApi {
    let client = ApiClient::new(&format!("{}/api/v3", server.uri()), credentials(), timeout).unwrap();
    VolunteerHistoryApi::new(client, "volunteer-history")
}

fn fast_options() -> FetchOptions {
    FetchOptions {
        retry: RetryPolicy { backoff_unit: Duration::from_millis(10), ..RetryPolicy::default() },
        ..FetchOptions::default()
    }
}

fn page(ids: &[u32], extra: serde_json::Value) -> serde_json::Value {
    let items: Vec<_> = ids
        .iter()
        .map(|id| json!({"volunteerName": format!("v{id}"), "volunteerDate": "2025-08-04", "hours": 2}))
        .collect();
    let mut body = json!({ "items": items });
    if let (Some(obj), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        obj.extend(extra.clone());
    }
    body
}

fn files_in(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn pages_until_an_empty_page_and_writes_the_window_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .and(query_param("page", "1"))
        .and(query_param("pageSize", "1000"))
        .and(query_param("startDate", "2025-01-01"))
        .and(query_param("endDate", "2025-09-01"))
        .and(header("x-vm-customer-code", "YMCA01"))
        .and(header("authorization", "Basic a2V5OnNlY3JldA=="))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[1, 2], json!({"hasNextPage": true}))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[3], json!({"hasNextPage": true}))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[], json!({"hasNextPage": true}))))
        .mount(&server)
        .await;

    let out = tempdir().unwrap();
    let report = extract_from(api(&server, Duration::from_secs(5)), fast_options(), &window(), out.path())
        .await
        .unwrap();

    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert_eq!(report.records, 3);
    assert_eq!(report.pages, 3);
    assert_eq!(report.output.format, TableFormat::Xlsx);
    assert_eq!(
        report.output.path.file_name().unwrap().to_string_lossy(),
        "VolunteerHistory_2025-01_to_2025-08.xlsx"
    );

    let written = load_table(&report.output.path).unwrap();
    assert_eq!(written.len(), 3);
    assert_eq!(written.columns(), ["volunteerName", "volunteerDate", "hours"]);
}

#[tokio::test]
async fn next_page_token_is_sent_back_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[1], json!({"nextPage": "c3Vuc2V0"}))))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .and(query_param("page", "c3Vuc2V0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[2], json!({}))))
        .mount(&server)
        .await;

    let out = tempdir().unwrap();
    let report = extract_from(api(&server, Duration::from_secs(5)), fast_options(), &window(), out.path())
        .await
        .unwrap();

    assert_eq!(report.records, 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn two_timeouts_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page(&[9], json!({})))
                .set_delay(Duration::from_secs(2)),
        )
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[1, 2], json!({}))))
        .mount(&server)
        .await;

    let out = tempdir().unwrap();
    let report = extract_from(
        api(&server, Duration::from_millis(300)),
        fast_options(),
        &window(),
        out.path(),
    )
    .await
    .unwrap();

    assert_eq!(report.records, 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn exhausted_retries_write_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let out = tempdir().unwrap();
    let err = extract_from(api(&server, Duration::from_secs(5)), fast_options(), &window(), out.path())
        .await
        .unwrap_err();

    assert!(matches!(err, VolunteerError::Http { status: 503, .. }));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    assert!(files_in(out.path()).is_empty());
}

#[tokio::test]
async fn unauthorized_fails_after_one_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let out = tempdir().unwrap();
    let err = extract_from(api(&server, Duration::from_secs(5)), fast_options(), &window(), out.path())
        .await
        .unwrap_err();

    match err {
        VolunteerError::Http { status, body, .. } => {
            assert_eq!(status, 401);
            assert_eq!(body, "bad credentials");
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_body_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&server)
        .await;

    let out = tempdir().unwrap();
    let report = extract_from(api(&server, Duration::from_secs(5)), fast_options(), &window(), out.path())
        .await
        .unwrap();
    assert_eq!(report.records, 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn page_cap_stops_runaway_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[1], json!({"hasNextPage": true}))))
        .mount(&server)
        .await;

    let out = tempdir().unwrap();
    let options = FetchOptions { max_pages: Some(4), ..fast_options() };
    let err = extract_from(api(&server, Duration::from_secs(5)), options, &window(), out.path())
        .await
        .unwrap_err();

    assert!(matches!(err, VolunteerError::TooManyPages(4)));
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
    assert!(files_in(out.path()).is_empty());
}

#[tokio::test]
async fn empty_first_page_is_an_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let out = tempdir().unwrap();
    let err = extract_from(api(&server, Duration::from_secs(5)), fast_options(), &window(), out.path())
        .await
        .unwrap_err();

    assert!(matches!(err, VolunteerError::EmptyResult));
    assert!(files_in(out.path()).is_empty());
}

#[tokio::test]
async fn run_extraction_uses_resolved_configuration() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/history"))
        .and(header("x-vm-customer-code", "YMCA01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [{"id": 1}, {"id": 2}]})))
        .mount(&server)
        .await;

    let config = ExtractorConfig {
        base_url: Some(format!("{}/api/v3", server.uri())),
        api_key: Some("key".into()),
        api_secret: Some("secret".into()),
        customer_code: Some("YMCA01".into()),
        endpoint_path: Some("history".into()),
        ..Default::default()
    }
    .resolve()
    .unwrap();

    let out = tempdir().unwrap();
    let report = run_extraction(&config, &window(), out.path()).await.unwrap();
    assert_eq!(report.records, 2);
    assert_eq!(report.pages, 1);
}

#[test]
fn placeholder_configuration_is_rejected() {
    let err = ExtractorConfig::default().resolve().unwrap_err();
    assert!(matches!(err, VolunteerError::Config(_)));
}
