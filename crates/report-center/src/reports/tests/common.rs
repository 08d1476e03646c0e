use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use tempfile::TempDir;

use crate::reports::render::DocumentGenerator;
use crate::reports::service::ReportService;
use crate::reports::store::{
    InMemoryReportStore, RecordKeys, RecordQuery, ReportStore, StoreError, StoredActivity,
    StoredActivityStatus, StoredConvention, StoredKnowledgeTransfer,
};
use crate::reports::uploads::UploadsDir;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn moment(year: i32, month: u32, day: u32) -> NaiveDateTime {
    date(year, month, day)
        .and_hms_opt(9, 30, 0)
        .expect("valid time")
}

pub(super) fn activity(
    id: &str,
    status: StoredActivityStatus,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> StoredActivity {
    StoredActivity {
        id: id.to_string(),
        title: format!("Activité {id}"),
        responsibles: vec!["K. Diallo".to_string(), "S. Koné".to_string(), "A. Sow".to_string()],
        status,
        description: None,
        start_date: start,
        end_date: end,
        keys: RecordKeys::default(),
    }
}

pub(super) fn convention(
    id: &str,
    start: NaiveDate,
    end: NaiveDate,
    global_amount: f64,
    mobilized_amount: f64,
) -> StoredConvention {
    StoredConvention {
        id: id.to_string(),
        title: format!("Convention {id}"),
        start_date: start,
        end_date: end,
        global_amount,
        mobilized_amount,
        funders: vec!["FAO".to_string(), "BAD".to_string()],
        keys: RecordKeys::default(),
    }
}

pub(super) fn knowledge_transfer(id: &str, available: NaiveDate) -> StoredKnowledgeTransfer {
    StoredKnowledgeTransfer {
        id: id.to_string(),
        title: format!("Transfert {id}"),
        availability_date: available,
        description: "Variété de niébé tolérante à la sécheresse".to_string(),
        potential_impact: "Rendement accru en zone sahélienne".to_string(),
        audiences: vec!["Producteurs".to_string(), "Coopératives".to_string()],
        keys: RecordKeys::default(),
    }
}

fn batch(
    prefix: &str,
    count: usize,
    status: StoredActivityStatus,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<StoredActivity> {
    (0..count)
        .map(|index| activity(&format!("{prefix}-{index:02}"), status, start, Some(end)))
        .collect()
}

/// 2025 data set:
/// - Q1: 6 new + 4 in progress activities, convention C1 (nothing mobilized), transfer K1
/// - Q2: 1 new, 1 reconducted, 1 closed activity, convention C2 (250 mobilized)
/// - Q3: 3 abandoned activities, transfer K2
/// - Q4: 10 new + 5 reconducted activities
pub(super) fn fixture_store() -> InMemoryReportStore {
    let mut activities = Vec::new();
    activities.extend(batch("q1n", 6, StoredActivityStatus::New, date(2025, 1, 10), date(2025, 3, 20)));
    activities.extend(batch("q1r", 4, StoredActivityStatus::InProgress, date(2025, 1, 10), date(2025, 3, 20)));
    activities.extend(batch("q2n", 1, StoredActivityStatus::New, date(2025, 4, 5), date(2025, 6, 10)));
    activities.extend(batch("q2r", 1, StoredActivityStatus::Reconducted, date(2025, 4, 5), date(2025, 6, 10)));
    activities.extend(batch("q2c", 1, StoredActivityStatus::Closed, date(2025, 4, 5), date(2025, 6, 10)));
    activities.extend(batch("q3a", 3, StoredActivityStatus::Abandoned, date(2025, 7, 2), date(2025, 9, 15)));
    activities.extend(batch("q4n", 10, StoredActivityStatus::New, date(2025, 10, 1), date(2025, 12, 1)));
    activities.extend(batch("q4r", 5, StoredActivityStatus::Reconducted, date(2025, 10, 1), date(2025, 12, 1)));

    InMemoryReportStore::new(
        activities,
        vec![
            convention("C1", date(2025, 1, 15), date(2025, 3, 31), 1_000.0, 0.0),
            convention("C2", date(2025, 4, 1), date(2025, 6, 30), 1_500.0, 250.0),
        ],
        vec![
            knowledge_transfer("K1", date(2025, 2, 10)),
            knowledge_transfer("K2", date(2025, 8, 1)),
        ],
    )
}

/// Store whose backend is down.
pub(super) struct UnavailableStore;

#[async_trait]
impl ReportStore for UnavailableStore {
    async fn activities(&self, _query: &RecordQuery) -> Result<Vec<StoredActivity>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn conventions(
        &self,
        _query: &RecordQuery,
    ) -> Result<Vec<StoredConvention>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn knowledge_transfers(
        &self,
        _query: &RecordQuery,
    ) -> Result<Vec<StoredKnowledgeTransfer>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Service plus the temporary uploads directory it writes into.
pub(super) struct Harness<S> {
    pub(super) service: Arc<ReportService<S>>,
    pub(super) uploads: TempDir,
}

impl<S> Harness<S> {
    pub(super) fn uploaded_files(&self) -> usize {
        std::fs::read_dir(self.uploads.path())
            .expect("uploads readable")
            .count()
    }
}

pub(super) fn harness<S>(store: S) -> Harness<S>
where
    S: ReportStore + 'static,
{
    let uploads = tempfile::tempdir().expect("tempdir");
    let generator = DocumentGenerator::new(
        UploadsDir::init(uploads.path()).expect("uploads init"),
        "Centre de Recherche Agricole",
        "XOF",
    );
    Harness {
        service: Arc::new(ReportService::new(Arc::new(store), generator)),
        uploads,
    }
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = read_body(response).await;
    serde_json::from_slice(&body).expect("json body")
}

/// Every string drawn with `Tj`, page after page, decoded from WinAnsi.
pub(super) fn pdf_strings(bytes: &[u8]) -> Vec<String> {
    let document = lopdf::Document::load_mem(bytes).expect("pdf parses");
    let mut strings = Vec::new();
    for (_, page_id) in document.get_pages() {
        let data = document.get_page_content(page_id).expect("page content");
        let content = lopdf::content::Content::decode(&data).expect("content decodes");
        for operation in content.operations {
            if operation.operator != "Tj" {
                continue;
            }
            if let Some(lopdf::Object::String(raw, _)) = operation.operands.first() {
                strings.push(
                    raw.iter()
                        .map(|&byte| match byte {
                            0x80 => '€',
                            0x95 => '•',
                            other => other as char,
                        })
                        .collect(),
                );
            }
        }
    }
    strings
}
