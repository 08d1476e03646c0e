use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::filters::{AnnualReportInput, GenerateReportInput, RecordScope};
use super::service::{ReportError, ReportService};
use super::store::ReportStore;
use super::uploads::TransientReport;

/// Router exposing report generation, statistics and maintenance endpoints.
pub fn report_router<S>(service: Arc<ReportService<S>>) -> Router
where
    S: ReportStore + 'static,
{
    Router::new()
        .route("/api/v1/reports/generate", post(generate_handler::<S>))
        .route("/api/v1/reports/annual", post(annual_handler::<S>))
        .route("/api/v1/reports/quarters/:year", get(quarters_handler::<S>))
        .route(
            "/api/v1/reports/statistics/quarterly",
            get(quarterly_statistics_handler::<S>),
        )
        .route(
            "/api/v1/reports/statistics/annual",
            get(annual_statistics_handler::<S>),
        )
        .route(
            "/api/v1/reports/statistics/compare",
            get(compare_handler::<S>),
        )
        .route("/api/v1/reports/catalog", get(catalog_handler::<S>))
        .route("/api/v1/reports/cleanup", post(cleanup_handler::<S>))
        .with_state(service)
}

// Scope fields are repeated instead of flattened: urlencoded values only parse into
// numbers and booleans outside of `#[serde(flatten)]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterlyStatisticsQuery {
    pub year: i32,
    pub quarter: u8,
    #[serde(default)]
    pub theme_id: Option<String>,
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub station_id: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualStatisticsQuery {
    pub year: i32,
    #[serde(default)]
    pub theme_id: Option<String>,
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub station_id: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareQuery {
    pub year1: i32,
    pub quarter1: u8,
    pub year2: i32,
    pub quarter2: u8,
    #[serde(default)]
    pub theme_id: Option<String>,
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub station_id: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

fn record_scope(
    theme_id: Option<String>,
    program_id: Option<String>,
    station_id: Option<String>,
    include_archived: bool,
) -> RecordScope {
    RecordScope {
        theme_id,
        program_id,
        station_id,
        include_archived,
    }
    .normalized()
}

fn success<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": data,
        })),
    )
        .into_response()
}

fn failure(status: StatusCode, message: &str, error: String) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "message": message,
            "error": error,
        })),
    )
        .into_response()
}

fn report_failure(operation: &'static str, err: ReportError) -> Response {
    error!(operation, error = %err, "report request failed");
    failure(err.status_code(), err.message(), err.to_string())
}

fn rejected(operation: &'static str, error: String) -> Response {
    error!(operation, error = %error, "report request rejected");
    failure(
        StatusCode::BAD_REQUEST,
        "Paramètres de rapport invalides",
        error,
    )
}

/// Streams the document to the client; the file is gone once this returns.
async fn attachment(operation: &'static str, report: TransientReport) -> Response {
    let content_type = report.content_type();
    let disposition = format!("attachment; filename=\"{}\"", report.file_name());
    match report.into_bytes().await {
        Ok(bytes) => {
            let mut response = (StatusCode::OK, bytes).into_response();
            let headers = response.headers_mut();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(header::CONTENT_DISPOSITION, value);
            }
            response
        }
        Err(err) => {
            error!(operation, error = %err, "generated report could not be read");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Erreur lors de l'envoi du rapport",
                err.to_string(),
            )
        }
    }
}

pub(crate) async fn generate_handler<S>(
    State(service): State<Arc<ReportService<S>>>,
    payload: Result<Json<GenerateReportInput>, JsonRejection>,
) -> Response
where
    S: ReportStore + 'static,
{
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected("generate_report", rejection.body_text()),
    };
    match service.generate_report(input).await {
        Ok(report) => attachment("generate_report", report).await,
        Err(err) => report_failure("generate_report", err),
    }
}

pub(crate) async fn annual_handler<S>(
    State(service): State<Arc<ReportService<S>>>,
    payload: Result<Json<AnnualReportInput>, JsonRejection>,
) -> Response
where
    S: ReportStore + 'static,
{
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejected("generate_annual_report", rejection.body_text()),
    };
    match service.generate_annual_report(input).await {
        Ok(report) => attachment("generate_annual_report", report).await,
        Err(err) => report_failure("generate_annual_report", err),
    }
}

pub(crate) async fn quarters_handler<S>(
    State(service): State<Arc<ReportService<S>>>,
    year: Result<Path<i32>, PathRejection>,
) -> Response
where
    S: ReportStore + 'static,
{
    let Path(year) = match year {
        Ok(year) => year,
        Err(rejection) => return rejected("available_quarters", rejection.body_text()),
    };
    match service.available_quarters(year, Local::now().date_naive()) {
        Ok(quarters) => success(quarters),
        Err(err) => report_failure("available_quarters", err),
    }
}

pub(crate) async fn quarterly_statistics_handler<S>(
    State(service): State<Arc<ReportService<S>>>,
    query: Result<Query<QuarterlyStatisticsQuery>, QueryRejection>,
) -> Response
where
    S: ReportStore + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return rejected("quarterly_statistics", rejection.body_text()),
    };
    let scope = record_scope(
        query.theme_id,
        query.program_id,
        query.station_id,
        query.include_archived,
    );
    let (year, quarter) = (query.year, query.quarter);
    match service.quarterly_statistics(year, quarter, &scope).await {
        Ok(statistics) => success(statistics),
        Err(err) => report_failure("quarterly_statistics", err),
    }
}

pub(crate) async fn annual_statistics_handler<S>(
    State(service): State<Arc<ReportService<S>>>,
    query: Result<Query<AnnualStatisticsQuery>, QueryRejection>,
) -> Response
where
    S: ReportStore + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return rejected("annual_statistics", rejection.body_text()),
    };
    let scope = record_scope(
        query.theme_id,
        query.program_id,
        query.station_id,
        query.include_archived,
    );
    let year = query.year;
    match service.annual_statistics(year, &scope).await {
        Ok(statistics) => success(statistics),
        Err(err) => report_failure("annual_statistics", err),
    }
}

pub(crate) async fn compare_handler<S>(
    State(service): State<Arc<ReportService<S>>>,
    query: Result<Query<CompareQuery>, QueryRejection>,
) -> Response
where
    S: ReportStore + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return rejected("compare_quarters", rejection.body_text()),
    };
    let first = (query.year1, query.quarter1);
    let second = (query.year2, query.quarter2);
    let scope = record_scope(
        query.theme_id,
        query.program_id,
        query.station_id,
        query.include_archived,
    );
    match service.compare_quarters(first, second, &scope).await {
        Ok(comparison) => success(comparison),
        Err(err) => report_failure("compare_quarters", err),
    }
}

pub(crate) async fn catalog_handler<S>(State(service): State<Arc<ReportService<S>>>) -> Response
where
    S: ReportStore + 'static,
{
    success(service.catalog())
}

pub(crate) async fn cleanup_handler<S>(State(service): State<Arc<ReportService<S>>>) -> Response
where
    S: ReportStore + 'static,
{
    match service.clean_old_reports().await {
        Ok(summary) => success(summary),
        Err(err) => report_failure("clean_old_reports", err),
    }
}
