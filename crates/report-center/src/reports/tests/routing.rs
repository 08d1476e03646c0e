use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::reports::router::{catalog_handler, report_router};

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn generate_route_streams_an_attachment_and_cleans_up() {
    let harness = harness(fixture_store());
    let router = report_router(harness.service.clone());

    let response = router
        .oneshot(json_post(
            "/api/v1/reports/generate",
            json!({
                "reportType": "activities",
                "format": "pdf",
                "year": 2025,
                "quarter": 2
            }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .expect("ascii header");
    assert!(disposition.starts_with("attachment; filename=\"activities_"));
    assert!(disposition.ends_with(".pdf\""));

    let body = read_body(response).await;
    assert!(body.starts_with(b"%PDF-"));
    assert_eq!(harness.uploaded_files(), 0);
}

#[tokio::test]
async fn annual_route_returns_a_word_document() {
    let harness = harness(fixture_store());
    let router = report_router(harness.service.clone());

    let response = router
        .oneshot(json_post(
            "/api/v1/reports/annual",
            json!({
                "reportType": "conventions",
                "format": "docx",
                "year": 2025
            }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    let body = read_body(response).await;
    assert!(body.starts_with(b"PK"));
    assert_eq!(harness.uploaded_files(), 0);
}

#[tokio::test]
async fn out_of_range_quarter_is_a_bad_request() {
    let harness = harness(fixture_store());
    let router = report_router(harness.service.clone());

    let response = router
        .oneshot(json_post(
            "/api/v1/reports/generate",
            json!({
                "reportType": "activities",
                "format": "pdf",
                "year": 2025,
                "quarter": 5
            }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], false);
    assert_eq!(payload["message"], "Paramètres de rapport invalides");
    assert!(payload["error"]
        .as_str()
        .expect("error text")
        .contains("quarter"));
    assert_eq!(harness.uploaded_files(), 0);
}

#[tokio::test]
async fn unknown_report_type_is_rejected_before_the_service() {
    let harness = harness(fixture_store());
    let router = report_router(harness.service.clone());

    let response = router
        .oneshot(json_post(
            "/api/v1/reports/generate",
            json!({
                "reportType": "budgets",
                "format": "pdf",
                "year": 2025
            }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], false);
}

#[tokio::test]
async fn store_outage_maps_to_internal_error() {
    let harness = harness(UnavailableStore);
    let router = report_router(harness.service.clone());

    let response = router
        .oneshot(get(
            "/api/v1/reports/statistics/quarterly?year=2025&quarter=1",
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], false);
    assert_eq!(
        payload["message"],
        "Impossible de récupérer les données du rapport"
    );
}

#[tokio::test]
async fn quarterly_statistics_route_wraps_data() {
    let harness = harness(fixture_store());
    let router = report_router(harness.service.clone());

    let response = router
        .oneshot(get(
            "/api/v1/reports/statistics/quarterly?year=2025&quarter=1&themeId=%20",
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["success"], true);
    assert_eq!(payload["data"]["activities"]["total"], 10);
    assert_eq!(payload["data"]["conventions"], 1);
    assert_eq!(payload["data"]["knowledgeTransfers"], 1);
    assert_eq!(payload["data"]["period"]["label"], "Q1 2025");
}

#[tokio::test]
async fn annual_statistics_route_reports_trend() {
    let harness = harness(fixture_store());
    let router = report_router(harness.service.clone());

    let response = router
        .oneshot(get("/api/v1/reports/statistics/annual?year=2025"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"]["totals"]["activities"]["total"], 27);
    assert_eq!(payload["data"]["trend"], "hausse");
    assert_eq!(payload["data"]["trendPercent"], "50.0");
    assert_eq!(payload["data"]["mostActiveQuarter"]["quarter"], 4);
}

#[tokio::test]
async fn compare_route_lists_metrics() {
    let harness = harness(fixture_store());
    let router = report_router(harness.service.clone());

    let response = router
        .oneshot(get(
            "/api/v1/reports/statistics/compare?year1=2025&quarter1=1&year2=2025&quarter2=2",
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let metrics = payload["data"]["metrics"]
        .as_array()
        .expect("metrics array");
    assert_eq!(metrics.len(), 8);
    let mobilized = metrics
        .iter()
        .find(|metric| metric["metric"] == "budget.totalMobilized")
        .expect("mobilized metric");
    assert_eq!(mobilized["variationPercent"], "N/A");
    assert_eq!(mobilized["variation"], 250.0);
}

#[tokio::test]
async fn quarters_route_rejects_non_numeric_year() {
    let harness = harness(fixture_store());
    let router = report_router(harness.service.clone());

    let response = router
        .oneshot(get("/api/v1/reports/quarters/abc"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let router = report_router(harness.service.clone());
    let response = router
        .oneshot(get("/api/v1/reports/quarters/2025"))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"].as_array().map(Vec::len), Some(4));
    assert_eq!(payload["data"][0]["longLabel"], "Premier trimestre 2025");
}

#[tokio::test]
async fn catalog_handler_describes_report_types() {
    let harness = harness(fixture_store());
    let response = catalog_handler::<crate::reports::InMemoryReportStore>(State(
        harness.service.clone(),
    ))
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let types = payload["data"]["reportTypes"]
        .as_array()
        .expect("report types");
    assert_eq!(types.len(), 3);
    assert_eq!(types[0]["reportType"], "activities");
    assert_eq!(payload["data"]["years"]["min"], 2000);
}

#[tokio::test]
async fn cleanup_route_reports_summary() {
    let harness = harness(fixture_store());
    let router = report_router(harness.service.clone());

    let response = router
        .oneshot(
            Request::post("/api/v1/reports/cleanup")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["data"]["removed"], 0);
}
