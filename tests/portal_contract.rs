//! Portal Contract Tests
//!
//! A mock portal stands in for the university timetable site. These tests pin
//! down what goes over the wire:
//! - session cookies and the CSRF token are replayed on every call
//! - fallback endpoints are tried in order, first non-empty answer wins
//! - a missing year is rejected before any request is made
//! - timetable failures degrade to a source tag instead of an error

use serde_json::{Value, json};
use std::sync::Arc;
use timetable_sync::adapters::portal::{OptionsResolver, PortalClient, TimetableFetcher};
use timetable_sync::domain::{ClassType, Cohort, Day, DomainError, ScheduleSource};
use timetable_sync::ports::{OptionsPort, TimetablePort};
use timetable_sync::shared::config::PortalConfig;
use wiremock::matchers::{any, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION_PAGE: &str = r#"<!DOCTYPE html><html><head>
<meta name="csrf-token" content="tok123">
</head><body><form><input type="hidden" name="_token" value="ignored"></form></body></html>"#;

const COOKIE: &str = "XSRF-TOKEN=xsrf1; laravel_session=sess1";

fn client_for(base_url: &str) -> Arc<PortalClient> {
    let mut config = PortalConfig::new(base_url);
    config.timeout_secs = 5;
    Arc::new(PortalClient::new(config).unwrap())
}

fn record(year: &str, batch: &str) -> Value {
    json!({
        "id": 7,
        "degree": "BTECH-CSE",
        "year": year,
        "batch": batch,
        "semester": "III",
        "school_dept": "SCS",
        "session": "2026-27",
        "group_name": null,
        "sub_batch": null,
        "status": "active"
    })
}

fn cohort() -> Cohort {
    Cohort {
        degree: "BTECH-CSE".into(),
        year: "Second".into(),
        batch: "CSE-A".into(),
    }
}

async fn mount_session(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/batchReport"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "XSRF-TOKEN=xsrf1; expires=Fri, 01 Jan 2027 00:00:00 GMT; path=/")
                .append_header("set-cookie", "laravel_session=sess1; path=/; httponly")
                .set_body_string(SESSION_PAGE),
        )
        .mount(server)
        .await;
}

// ────────────────────────────────────────────────────────────────────────────
// Years
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_years_get_replays_session_and_ranks_labels() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    Mock::given(method("GET"))
        .and(path("/get-yearbpublic"))
        .and(query_param("degree", "BTECH-CSE"))
        .and(header("cookie", COOKIE))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "yearList": [
                record("Third", "CSE-A"),
                record("First", "CSE-A"),
                record("First", "CSE-B"),
                record("Second", "CSE-A")
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = OptionsResolver::new(client_for(&server.uri()));
    let years = resolver.get_years("BTECH-CSE").await.unwrap();
    assert_eq!(years, vec!["First", "Second", "Third"]);
}

#[tokio::test]
async fn test_years_fall_back_to_post_with_csrf() {
    let server = MockServer::start().await;
    mount_session(&server).await;

    // Authenticated GET answers, but with nothing usable.
    Mock::given(method("GET"))
        .and(path("/get-yearbpublic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "no data"})))
        .expect(1)
        .mount(&server)
        .await;
    // First POST fallback is broken.
    Mock::given(method("POST"))
        .and(path("/getYearByDegreePublic"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/get-yearbpublic"))
        .and(body_string_contains("_token=tok123"))
        .and(body_string_contains("degree=BTECH-CSE"))
        .and(header("cookie", COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            [record("Fourth", "CSE-A"), record("Unknown", "CSE-A"), record("First", "CSE-A")]
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = OptionsResolver::new(client_for(&server.uri()));
    let years = resolver.get_years("BTECH-CSE").await.unwrap();
    assert_eq!(years, vec!["First", "Fourth", "Unknown"]);
}

#[tokio::test]
async fn test_years_all_empty_is_not_an_error() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(any())
        .and(path("/get-yearbpublic"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/getYearByDegreePublic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"yearList": []})))
        .mount(&server)
        .await;

    let resolver = OptionsResolver::new(client_for(&server.uri()));
    assert!(resolver.get_years("BTECH-CSE").await.unwrap().is_empty());
}

// ────────────────────────────────────────────────────────────────────────────
// Batches
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batches_from_first_post_candidate() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/getBatchByYearPublic"))
        .and(body_string_contains("_token=tok123"))
        .and(body_string_contains("year=Second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["CSE-C", "CSE-A", "CSE-A"])))
        .expect(1)
        .mount(&server)
        .await;
    // Never reached.
    Mock::given(method("POST"))
        .and(path("/get-batchbpublic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["WRONG"])))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = OptionsResolver::new(client_for(&server.uri()));
    let batches = resolver.get_batches("BTECH-CSE", Some("Second")).await.unwrap();
    assert_eq!(batches, vec!["CSE-A", "CSE-C"]);
}

#[tokio::test]
async fn test_batches_fall_back_to_filtering_year_records() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/getBatchByYearPublic"))
        .respond_with(ResponseTemplate::new(419))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/get-batchbpublic"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"batchList": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/get-batchbpublic"))
        .and(query_param("year", "Second"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/get-yearbpublic"))
        .and(query_param("degree", "BTECH-CSE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            record("First", "CSE-Z"),
            record("Second", "CSE-B"),
            record("Second", "CSE-A"),
            record("Second", "CSE-B")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = OptionsResolver::new(client_for(&server.uri()));
    let batches = resolver.get_batches("BTECH-CSE", Some("Second")).await.unwrap();
    assert_eq!(batches, vec!["CSE-A", "CSE-B"]);
}

#[tokio::test]
async fn test_missing_year_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resolver = OptionsResolver::new(client_for(&server.uri()));
    let err = resolver.get_batches("BTECH-CSE", None).await.unwrap_err();
    assert!(matches!(err, DomainError::MissingParameter("year")));
    let err = resolver.get_batches("BTECH-CSE", Some("")).await.unwrap_err();
    assert!(matches!(err, DomainError::MissingParameter("year")));
    server.verify().await;
}

#[tokio::test]
async fn test_unreachable_portal_is_an_error_for_options() {
    let resolver = OptionsResolver::new(client_for("http://127.0.0.1:1"));
    let err = resolver.get_years("BTECH-CSE").await.unwrap_err();
    assert!(matches!(err, DomainError::Unreachable(_)));
}

// ────────────────────────────────────────────────────────────────────────────
// Timetable
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_timetable_live() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/searchBatchReport2Public"))
        .and(body_string_contains("_token=tok123"))
        .and(body_string_contains("batch=CSE-A"))
        .and(header("cookie", COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "degree": "BTECH-CSE",
            "year": "Second",
            "data": {
                "Tuesday": {
                    "11:40-12:30": [{"subject": "Operating Systems", "facultyName": "Dr. Rao", "room_name": "A-101", "ltp": "3-0-0"}],
                    "09:00-10:40": [{"subject": "Networks", "facultyName": "Dr. Sen", "room_name": "Lab-2", "ltp": "0-0-2"}]
                },
                "Sunday": {"09:00-09:50": [{"subject": "Ghost"}]}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = TimetableFetcher::new(client_for(&server.uri()));
    let fetch = fetcher.fetch_timetable(&cohort()).await;
    assert_eq!(fetch.source, ScheduleSource::Live);
    assert_eq!(fetch.degree.as_deref(), Some("BTECH-CSE"));
    assert_eq!(fetch.year.as_deref(), Some("Second"));
    assert_eq!(fetch.classes.class_count(), 2);

    let tuesday = fetch.classes.day(Day::Tuesday);
    assert_eq!(tuesday[0].subject, "Networks");
    assert_eq!(tuesday[0].kind, ClassType::Lab);
    assert_eq!(tuesday[1].subject, "Operating Systems");
    assert_eq!(tuesday[1].kind, ClassType::Lecture);
}

#[tokio::test]
async fn test_fetch_without_token_proceeds_best_effort() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/batchReport"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>no token</body></html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/searchBatchReport2Public"))
        .and(body_string_contains("_token=&"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = TimetableFetcher::new(client_for(&server.uri()));
    let fetch = fetcher.fetch_timetable(&cohort()).await;
    assert_eq!(fetch.source, ScheduleSource::Live);
    assert!(fetch.classes.is_empty());
}

#[tokio::test]
async fn test_fetch_empty_data_array_is_a_live_empty_week() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/searchBatchReport2Public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = TimetableFetcher::new(client_for(&server.uri()));
    let fetch = fetcher.fetch_timetable(&cohort()).await;
    assert_eq!(fetch.source, ScheduleSource::Live);
    assert!(fetch.classes.is_empty());
}

#[tokio::test]
async fn test_fetch_failures_are_tagged() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    Mock::given(method("POST"))
        .and(path("/searchBatchReport2Public"))
        .and(body_string_contains("batch=CSE-A"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/searchBatchReport2Public"))
        .and(body_string_contains("batch=CSE-B"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Server Error</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/searchBatchReport2Public"))
        .and(body_string_contains("batch=CSE-C"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "No record"})))
        .mount(&server)
        .await;

    let fetcher = TimetableFetcher::new(client_for(&server.uri()));
    let mut cohort = cohort();

    let fetch = fetcher.fetch_timetable(&cohort).await;
    assert_eq!(fetch.source, ScheduleSource::Unavailable);
    assert!(fetch.classes.is_empty());

    cohort.batch = "CSE-B".into();
    assert_eq!(fetcher.fetch_timetable(&cohort).await.source, ScheduleSource::Error);

    cohort.batch = "CSE-C".into();
    assert_eq!(
        fetcher.fetch_timetable(&cohort).await.source,
        ScheduleSource::Unavailable
    );

    let offline = TimetableFetcher::new(client_for("http://127.0.0.1:1"));
    let fetch = offline.fetch_timetable(&cohort).await;
    assert_eq!(fetch.source, ScheduleSource::Error);
    assert!(fetch.classes.is_empty());
}
