//! Router tests for the survey, operation and aggregation endpoints.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{SURVEY_HEADERS, Sheet, approx, reference_survey, reference_workbook, write_workbook};
use ridership_yield::metrics::VatRate;
use ridership_yield::server::{AppState, build_router};
use serde_json::Value;
use tempfile::tempdir;
use tower::util::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request built")
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("body read");
    serde_json::from_slice(&bytes).expect("JSON body")
}

#[tokio::test]
async fn health_reports_service() {
    let app = build_router(AppState::new("unused.xlsx".into(), VatRate::default()));

    let response = app.oneshot(get("/health")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "ridership-yield");
}

#[tokio::test]
async fn dynamic_aggregation_returns_joined_buckets() {
    let dir = tempdir().expect("temporary directory");
    let app = build_router(AppState::new(
        reference_workbook(dir.path()),
        VatRate::default(),
    ));

    let response = app
        .oneshot(get("/api/dynamic-aggregation"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let buckets = body.as_array().expect("array body");
    assert_eq!(buckets.len(), 3);

    let line_22 = &buckets[1];
    assert_eq!(line_22["bus_line"], 22);
    assert_eq!(line_22["time_slot"], "07:00-10:00");
    assert_eq!(line_22["age_group"], "19-60");
    assert_eq!(line_22["total_trips"], 3);
    assert!(approx(line_22["total_revenue"].as_f64().expect("number"), 5.0));
    assert!(approx(line_22["avg_yield_per_trip"].as_f64().expect("number"), 2.0));
    assert!(approx(line_22["avg_yield_per_km"].as_f64().expect("number"), 0.02));

    assert!(buckets[0]["avg_yield_per_km"].is_null());
    assert!(buckets[2]["avg_yield_per_vehicle"].is_null());
}

#[tokio::test]
async fn survey_and_operation_endpoints_pass_records_through() {
    let dir = tempdir().expect("temporary directory");
    let state = AppState::new(reference_workbook(dir.path()), VatRate::default());

    let response = build_router(state.clone())
        .oneshot(get("/api/survey"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let survey = extract_json(response.into_body()).await;
    let survey = survey.as_array().expect("array body");
    assert_eq!(survey.len(), 4);
    assert_eq!(survey[0]["bus_line"], 22);
    assert_eq!(survey[0]["trips"], 2);
    assert_eq!(survey[0]["timestamp"], "2024-03-01T07:15:00");

    let response = build_router(state)
        .oneshot(get("/api/operation"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let operations = extract_json(response.into_body()).await;
    let operations = operations.as_array().expect("array body");
    assert_eq!(operations.len(), 3);
    assert_eq!(operations[1]["bus_line"], 7);
    assert_eq!(operations[1]["vehicles"], 2);
}

#[tokio::test]
async fn missing_workbook_is_not_found() {
    let dir = tempdir().expect("temporary directory");
    let app = build_router(AppState::new(
        dir.path().join("absent.xlsx"),
        VatRate::default(),
    ));

    let response = app
        .oneshot(get("/api/dynamic-aggregation"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "missing_input");
}

#[tokio::test]
async fn malformed_survey_sheet_is_unprocessable() {
    let dir = tempdir().expect("temporary directory");
    let path = dir.path().join("short.xlsx");
    let mut rows = reference_survey();
    for row in &mut rows {
        row.truncate(10);
    }
    write_workbook(
        &path,
        vec![Sheet {
            name: "survey",
            headers: &SURVEY_HEADERS[..10],
            rows,
        }],
    );

    let app = build_router(AppState::new(path, VatRate::default()));
    let response = app.oneshot(get("/api/survey")).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], "schema_mismatch");
}
