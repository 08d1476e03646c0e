use super::domain::{ActivityReport, ConventionReport, KnowledgeTransferReport};
use super::filters::{RecordScope, ReportFilters};
use super::period::{quarter_period, report_period, Quarter, ReportPeriod};
use super::statistics::QuarterlyStatistics;
use super::store::{
    RecordQuery, ReportStore, StoreError, StoredActivity, StoredConvention,
    StoredKnowledgeTransfer,
};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

/// Pulls records for a window out of the store and shapes them into report rows.
pub struct DataAggregator<S> {
    store: Arc<S>,
}

impl<S> Clone for DataAggregator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> DataAggregator<S>
where
    S: ReportStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Rows for the window `filters` resolve to; `today` picks the default quarter.
    pub async fn activities_data(
        &self,
        filters: &ReportFilters,
        today: NaiveDate,
    ) -> Result<Vec<ActivityReport>, StoreError> {
        let period = report_period(filters, today);
        self.activities_in(&period, &filters.scope).await
    }

    pub async fn conventions_data(
        &self,
        filters: &ReportFilters,
        today: NaiveDate,
    ) -> Result<Vec<ConventionReport>, StoreError> {
        let period = report_period(filters, today);
        self.conventions_in(&period, &filters.scope).await
    }

    pub async fn knowledge_transfers_data(
        &self,
        filters: &ReportFilters,
        today: NaiveDate,
    ) -> Result<Vec<KnowledgeTransferReport>, StoreError> {
        let period = report_period(filters, today);
        self.knowledge_transfers_in(&period, &filters.scope).await
    }

    pub async fn activities_in(
        &self,
        period: &ReportPeriod,
        scope: &RecordScope,
    ) -> Result<Vec<ActivityReport>, StoreError> {
        let query = RecordQuery::new(period.clone(), scope.clone());
        let rows = self.store.activities(&query).await?;
        debug!(period = %period.label, rows = rows.len(), "activities fetched");
        let stamp = PeriodStamp::of(period);
        Ok(rows
            .into_iter()
            .map(|row| activity_report(row, stamp))
            .collect())
    }

    pub async fn conventions_in(
        &self,
        period: &ReportPeriod,
        scope: &RecordScope,
    ) -> Result<Vec<ConventionReport>, StoreError> {
        let query = RecordQuery::new(period.clone(), scope.clone());
        let rows = self.store.conventions(&query).await?;
        debug!(period = %period.label, rows = rows.len(), "conventions fetched");
        let stamp = PeriodStamp::of(period);
        Ok(rows
            .into_iter()
            .map(|row| convention_report(row, stamp))
            .collect())
    }

    pub async fn knowledge_transfers_in(
        &self,
        period: &ReportPeriod,
        scope: &RecordScope,
    ) -> Result<Vec<KnowledgeTransferReport>, StoreError> {
        let query = RecordQuery::new(period.clone(), scope.clone());
        let rows = self.store.knowledge_transfers(&query).await?;
        debug!(period = %period.label, rows = rows.len(), "knowledge transfers fetched");
        let stamp = PeriodStamp::of(period);
        Ok(rows
            .into_iter()
            .map(|row| knowledge_transfer_report(row, stamp))
            .collect())
    }

    /// Counts and funding for one quarter window. Queries run one after another.
    pub async fn quarterly_statistics(
        &self,
        year: i32,
        quarter: Quarter,
        scope: &RecordScope,
    ) -> Result<QuarterlyStatistics, StoreError> {
        let quarter_period = quarter_period(year, quarter);
        let window = ReportPeriod::from(&quarter_period);

        let activities = self.activities_in(&window, scope).await?;
        let conventions = self.conventions_in(&window, scope).await?;
        let transfers = self.knowledge_transfers_in(&window, scope).await?;

        Ok(QuarterlyStatistics::from_reports(
            quarter_period,
            &activities,
            &conventions,
            transfers.len(),
        ))
    }
}

/// Quarter and year copied onto rows when the window is a quarter.
#[derive(Debug, Clone, Copy)]
struct PeriodStamp {
    quarter: Option<u8>,
    year: Option<i32>,
}

impl PeriodStamp {
    fn of(period: &ReportPeriod) -> Self {
        match &period.quarter {
            Some(quarter) => Self {
                quarter: Some(quarter.quarter.number()),
                year: Some(quarter.year),
            },
            None => Self {
                quarter: None,
                year: None,
            },
        }
    }
}

fn activity_report(row: StoredActivity, stamp: PeriodStamp) -> ActivityReport {
    ActivityReport {
        title: row.title,
        responsibles: row.responsibles,
        status: row.status.report_status(),
        description: row.description,
        start_date: Some(row.start_date),
        end_date: row.end_date,
        quarter: stamp.quarter,
        year: stamp.year,
    }
}

fn convention_report(row: StoredConvention, stamp: PeriodStamp) -> ConventionReport {
    ConventionReport {
        title: row.title,
        start_date: row.start_date,
        end_date: row.end_date,
        global_amount: row.global_amount,
        mobilized_amount: row.mobilized_amount,
        funders: row.funders,
        quarter: stamp.quarter,
        year: stamp.year,
    }
}

fn knowledge_transfer_report(
    row: StoredKnowledgeTransfer,
    stamp: PeriodStamp,
) -> KnowledgeTransferReport {
    KnowledgeTransferReport {
        title: row.title,
        availability_date: row.availability_date,
        description: row.description,
        potential_impact: row.potential_impact,
        audiences: row.audiences,
        quarter: stamp.quarter,
        year: stamp.year,
    }
}
