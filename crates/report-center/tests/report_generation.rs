use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use report_center::reports::store::{load_dir, load_readers};
use report_center::reports::{
    AnnualReportInput, DocumentGenerator, GenerateReportInput, InMemoryReportStore, RecordScope,
    ReportDataImportError, ReportService, UploadsDir,
};
use serde_json::json;

fn sample_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/sample")
}

fn sample_service(uploads: &tempfile::TempDir) -> ReportService<InMemoryReportStore> {
    let store = load_dir(sample_dir()).expect("sample data loads");
    let generator = DocumentGenerator::new(
        UploadsDir::init(uploads.path()).expect("uploads directory"),
        "Institut de l'Environnement et de Recherches Agricoles",
        "XOF",
    );
    ReportService::new(Arc::new(store), generator)
}

fn generated_at() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 12, 15)
        .and_then(|date| date.and_hms_opt(16, 45, 0))
        .expect("valid timestamp")
}

fn filters(body: serde_json::Value) -> report_center::reports::ReportFilters {
    serde_json::from_value::<GenerateReportInput>(body)
        .expect("input deserializes")
        .validate()
        .expect("valid filters")
}

fn drawn_strings(bytes: &[u8]) -> Vec<String> {
    let document = lopdf::Document::load_mem(bytes).expect("pdf parses");
    let mut strings = Vec::new();
    for (_, page_id) in document.get_pages() {
        let data = document.get_page_content(page_id).expect("page content");
        let content = lopdf::content::Content::decode(&data).expect("content decodes");
        for operation in content.operations.into_iter().filter(|op| op.operator == "Tj") {
            if let Some(lopdf::Object::String(raw, _)) = operation.operands.first() {
                strings.push(raw.iter().map(|&byte| byte as char).collect());
            }
        }
    }
    strings
}

fn document_xml(bytes: Vec<u8>) -> String {
    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("docx is a zip archive");
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .expect("document part")
        .read_to_string(&mut xml)
        .expect("document readable");
    xml
}

#[test]
fn sample_exports_load_into_the_store() {
    let store = load_dir(sample_dir()).expect("sample data loads");
    assert_eq!(store.record_counts(), (8, 3, 3));
}

#[test]
fn missing_export_names_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_dir(dir.path()).expect_err("nothing to load");
    match err {
        ReportDataImportError::Io { path, .. } => {
            assert!(path.ends_with("activities.csv"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_status_is_rejected() {
    let activities = "id,title,responsibles,status,start_date\n\
A-1,Essai,K. Diallo,EN_PAUSE,2025-01-01\n";
    let conventions = "id,title,start_date,end_date\n";
    let transfers = "id,title,availability_date\n";

    let err = load_readers(
        activities.as_bytes(),
        conventions.as_bytes(),
        transfers.as_bytes(),
    )
    .expect_err("unknown status");
    assert!(matches!(err, ReportDataImportError::Csv(_)));
}

#[tokio::test]
async fn pdf_report_lists_the_quarter_activities() {
    let uploads = tempfile::tempdir().expect("tempdir");
    let service = sample_service(&uploads);

    let report = service
        .generate_report_at(
            &filters(json!({
                "reportType": "activities",
                "format": "pdf",
                "year": 2025,
                "quarter": 1,
                "includeCharts": true
            })),
            generated_at(),
        )
        .await
        .expect("report generated");

    let strings = drawn_strings(&report.into_bytes().await.expect("report readable"));
    assert!(strings.iter().any(|s| s == "Total activités: 4"));
    assert!(strings.iter().any(|s| s.starts_with("Sélection variétale")));
    assert!(!strings.iter().any(|s| s.starts_with("Essais d'irrigation")));
    assert_eq!(
        std::fs::read_dir(uploads.path()).expect("uploads readable").count(),
        0
    );
}

#[tokio::test]
async fn docx_report_has_one_row_per_convention() {
    let uploads = tempfile::tempdir().expect("tempdir");
    let service = sample_service(&uploads);

    let report = service
        .generate_report_at(
            &filters(json!({
                "reportType": "conventions",
                "format": "docx",
                "year": 2025,
                "quarter": 1
            })),
            generated_at(),
        )
        .await
        .expect("report generated");

    let xml = document_xml(report.into_bytes().await.expect("report readable"));
    assert_eq!(xml.matches("<w:tr>").count(), 3, "header plus two conventions");
    assert!(xml.contains("FAO, Banque mondiale"));
    assert!(xml.contains("w:orient=\"landscape\""));
}

#[tokio::test]
async fn scope_filters_and_archive_flag_narrow_the_selection() {
    let uploads = tempfile::tempdir().expect("tempdir");
    let service = sample_service(&uploads);

    let report = service
        .generate_report_at(
            &filters(json!({
                "reportType": "activities",
                "format": "pdf",
                "year": 2025,
                "quarter": 4,
                "themeId": "TH-CER"
            })),
            generated_at(),
        )
        .await
        .expect("report generated");
    let strings = drawn_strings(&report.into_bytes().await.expect("report readable"));
    assert!(strings.iter().any(|s| s == "Total activités: 2"));

    let hidden = service
        .quarterly_statistics(2023, 1, &RecordScope::default())
        .await
        .expect("statistics computed");
    assert_eq!(hidden.activities.total, 0);

    let archived = service
        .quarterly_statistics(
            2023,
            1,
            &RecordScope {
                include_archived: true,
                ..RecordScope::default()
            },
        )
        .await
        .expect("statistics computed");
    assert_eq!(archived.activities.total, 1);
}

#[tokio::test]
async fn annual_report_can_be_kept_outside_the_uploads_directory() {
    let uploads = tempfile::tempdir().expect("tempdir");
    let archive = tempfile::tempdir().expect("tempdir");
    let service = sample_service(&uploads);

    let input: AnnualReportInput = serde_json::from_value(json!({
        "reportType": "activities",
        "format": "pdf",
        "year": 2025
    }))
    .expect("input deserializes");
    let report = service
        .generate_annual_report_at(&input.validate().expect("valid filters"), generated_at())
        .await
        .expect("annual report generated");

    let destination = archive.path().join(report.file_name());
    let kept = report.persist(&destination).expect("report persisted");
    assert!(kept.exists());
    assert_eq!(
        std::fs::read_dir(uploads.path()).expect("uploads readable").count(),
        0
    );

    let bytes = std::fs::read(&kept).expect("report readable");
    let strings = drawn_strings(&bytes);
    assert!(strings.iter().any(|s| s == "Synthèse annuelle"));
    assert!(strings.iter().any(|s| s == "Conclusion"));
}
