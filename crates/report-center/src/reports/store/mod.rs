//! Read-side contract over the record store, plus the implementations shipped with the
//! service: an in-memory store and a CSV loader that hydrates it.

mod import;
mod memory;

pub use import::{load_dir, load_readers, ReportDataImportError};
pub use memory::InMemoryReportStore;

use super::domain::ActivityStatus;
use super::filters::RecordScope;
use super::period::ReportPeriod;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Window plus scope handed to every store query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub period: ReportPeriod,
    pub scope: RecordScope,
}

impl RecordQuery {
    pub fn new(period: ReportPeriod, scope: RecordScope) -> Self {
        Self { period, scope }
    }
}

/// Storage abstraction so aggregation can be exercised without a database.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn activities(&self, query: &RecordQuery) -> Result<Vec<StoredActivity>, StoreError>;
    async fn conventions(&self, query: &RecordQuery)
        -> Result<Vec<StoredConvention>, StoreError>;
    async fn knowledge_transfers(
        &self,
        query: &RecordQuery,
    ) -> Result<Vec<StoredKnowledgeTransfer>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("report store unavailable: {0}")]
    Unavailable(String),
    #[error("report store returned malformed data: {0}")]
    Malformed(String),
}

/// Lifecycle codes as persisted by the activity registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoredActivityStatus {
    #[serde(rename = "NOUVELLE")]
    New,
    #[serde(rename = "RECONDUITE")]
    Reconducted,
    #[serde(rename = "EN_COURS")]
    InProgress,
    #[serde(rename = "CLOTUREE")]
    Closed,
    #[serde(rename = "ABANDONNEE")]
    Abandoned,
}

impl StoredActivityStatus {
    /// Ongoing work counts as reconducted; abandoned work counts as closed.
    pub const fn report_status(self) -> ActivityStatus {
        match self {
            Self::New => ActivityStatus::New,
            Self::Reconducted | Self::InProgress => ActivityStatus::Reconducted,
            Self::Closed | Self::Abandoned => ActivityStatus::Closed,
        }
    }
}

/// Scope keys shared by every stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordKeys {
    pub theme_id: Option<String>,
    pub program_id: Option<String>,
    pub station_id: Option<String>,
    pub archived: bool,
}

impl RecordKeys {
    pub fn matches(&self, scope: &RecordScope) -> bool {
        if self.archived && !scope.include_archived {
            return false;
        }

        key_matches(&scope.theme_id, &self.theme_id)
            && key_matches(&scope.program_id, &self.program_id)
            && key_matches(&scope.station_id, &self.station_id)
    }
}

fn key_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted {
        Some(wanted) => actual.as_deref() == Some(wanted.as_str()),
        None => true,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredActivity {
    pub id: String,
    pub title: String,
    pub responsibles: Vec<String>,
    pub status: StoredActivityStatus,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub keys: RecordKeys,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredConvention {
    pub id: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub global_amount: f64,
    pub mobilized_amount: f64,
    pub funders: Vec<String>,
    pub keys: RecordKeys,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredKnowledgeTransfer {
    pub id: String,
    pub title: String,
    pub availability_date: NaiveDate,
    pub description: String,
    pub potential_impact: String,
    pub audiences: Vec<String>,
    pub keys: RecordKeys,
}
