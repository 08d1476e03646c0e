use super::{
    RecordQuery, ReportStore, StoreError, StoredActivity, StoredConvention,
    StoredKnowledgeTransfer,
};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;

/// Immutable snapshot of every record, filtered per query.
#[derive(Debug, Default, Clone)]
pub struct InMemoryReportStore {
    activities: Arc<Vec<StoredActivity>>,
    conventions: Arc<Vec<StoredConvention>>,
    knowledge_transfers: Arc<Vec<StoredKnowledgeTransfer>>,
}

impl InMemoryReportStore {
    pub fn new(
        activities: Vec<StoredActivity>,
        conventions: Vec<StoredConvention>,
        knowledge_transfers: Vec<StoredKnowledgeTransfer>,
    ) -> Self {
        Self {
            activities: Arc::new(activities),
            conventions: Arc::new(conventions),
            knowledge_transfers: Arc::new(knowledge_transfers),
        }
    }

    pub fn record_counts(&self) -> (usize, usize, usize) {
        (
            self.activities.len(),
            self.conventions.len(),
            self.knowledge_transfers.len(),
        )
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn activities(&self, query: &RecordQuery) -> Result<Vec<StoredActivity>, StoreError> {
        let mut rows: Vec<StoredActivity> = self
            .activities
            .iter()
            .filter(|activity| activity.keys.matches(&query.scope))
            .filter(|activity| {
                query.period.overlaps(
                    day_start(activity.start_date),
                    activity.end_date.map(day_end),
                )
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| (a.start_date, &a.title).cmp(&(b.start_date, &b.title)));
        Ok(rows)
    }

    async fn conventions(
        &self,
        query: &RecordQuery,
    ) -> Result<Vec<StoredConvention>, StoreError> {
        let mut rows: Vec<StoredConvention> = self
            .conventions
            .iter()
            .filter(|convention| convention.keys.matches(&query.scope))
            .filter(|convention| {
                query.period.overlaps(
                    day_start(convention.start_date),
                    Some(day_end(convention.end_date)),
                )
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| (a.start_date, &a.title).cmp(&(b.start_date, &b.title)));
        Ok(rows)
    }

    async fn knowledge_transfers(
        &self,
        query: &RecordQuery,
    ) -> Result<Vec<StoredKnowledgeTransfer>, StoreError> {
        let mut rows: Vec<StoredKnowledgeTransfer> = self
            .knowledge_transfers
            .iter()
            .filter(|transfer| transfer.keys.matches(&query.scope))
            .filter(|transfer| {
                query.period.overlaps(
                    day_start(transfer.availability_date),
                    Some(day_end(transfer.availability_date)),
                )
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (a.availability_date, &a.title).cmp(&(b.availability_date, &b.title))
        });
        Ok(rows)
    }
}

fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn day_end(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59).unwrap_or_else(|| day_start(date))
}
