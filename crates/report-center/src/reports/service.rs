use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::aggregator::DataAggregator;
use super::catalog::{catalog, ReportCatalog};
use super::domain::{ReportRecords, ReportType};
use super::filters::{
    validate_quarter, validate_year, AnnualReportFilters, AnnualReportInput, GenerateReportInput,
    RecordScope, ReportFilters, ValidationError,
};
use super::period::{
    current_quarter_at, report_period, year_period, year_quarters, Quarter, ReportPeriod,
};
use super::render::{DocumentGenerator, PeriodOptions, QuarterSection, RenderError};
use super::statistics::{self, AnnualStatistics, QuarterComparison, QuarterlyStatistics};
use super::store::{ReportStore, StoreError};
use super::uploads::{CleanupSummary, TransientReport, DEFAULT_RETENTION};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to sweep the uploads directory: {0}")]
    Cleanup(#[source] io::Error),
}

impl ReportError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::Render(_) | Self::Cleanup(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short French summary shown to API clients next to the technical error.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Paramètres de rapport invalides",
            Self::Store(_) => "Impossible de récupérer les données du rapport",
            Self::Render(_) => "Erreur lors de la génération du rapport",
            Self::Cleanup(_) => "Erreur lors du nettoyage des anciens rapports",
        }
    }
}

/// A quarter of the requested year as offered to report pickers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableQuarter {
    pub quarter: Quarter,
    pub year: i32,
    pub label: String,
    pub long_label: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub is_current: bool,
    /// The quarter has started, so it can hold data.
    pub is_available: bool,
}

/// Entry point for every report operation. Built once at startup and shared.
pub struct ReportService<S> {
    aggregator: DataAggregator<S>,
    generator: DocumentGenerator,
    retention: Duration,
}

impl<S> ReportService<S>
where
    S: ReportStore + 'static,
{
    pub fn new(store: Arc<S>, generator: DocumentGenerator) -> Self {
        Self {
            aggregator: DataAggregator::new(store),
            generator,
            retention: DEFAULT_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn generator(&self) -> &DocumentGenerator {
        &self.generator
    }

    pub async fn generate_report(
        &self,
        input: GenerateReportInput,
    ) -> Result<TransientReport, ReportError> {
        let filters = input.validate()?;
        self.generate_report_at(&filters, Local::now().naive_local())
            .await
    }

    /// Renders one period. `now` resolves the default quarter and stamps the document.
    pub async fn generate_report_at(
        &self,
        filters: &ReportFilters,
        now: NaiveDateTime,
    ) -> Result<TransientReport, ReportError> {
        let today = now.date();
        let period = report_period(filters, today);
        let records = self.report_records(filters, today).await?;
        info!(
            report_type = filters.report_type.slug(),
            format = filters.format.extension(),
            period = %period.label,
            rows = records.len(),
            "generating report"
        );

        let options = PeriodOptions {
            include_statistics: filters.include_statistics,
            include_charts: filters.include_charts,
        };
        Ok(self
            .generator
            .render_period(&records, &period, filters.format, options, now)?)
    }

    pub async fn generate_annual_report(
        &self,
        input: AnnualReportInput,
    ) -> Result<TransientReport, ReportError> {
        let filters = input.validate()?;
        self.generate_annual_report_at(&filters, Local::now().naive_local())
            .await
    }

    pub async fn generate_annual_report_at(
        &self,
        filters: &AnnualReportFilters,
        now: NaiveDateTime,
    ) -> Result<TransientReport, ReportError> {
        let statistics = self.annual_statistics(filters.year, &filters.scope).await?;

        let mut sections = Vec::with_capacity(4);
        for quarter in year_quarters(filters.year) {
            let window = ReportPeriod::from(&quarter);
            let records = self
                .records_in(filters.report_type, &window, &filters.scope)
                .await?;
            sections.push(QuarterSection {
                period: quarter,
                records,
            });
        }
        info!(
            report_type = filters.report_type.slug(),
            format = filters.format.extension(),
            year = filters.year,
            sections = sections.iter().filter(|section| !section.records.is_empty()).count(),
            "generating annual report"
        );

        Ok(self.generator.render_annual(
            filters.report_type,
            &statistics,
            &sections,
            filters.format,
            now,
        )?)
    }

    pub fn available_quarters(
        &self,
        year: i32,
        today: NaiveDate,
    ) -> Result<Vec<AvailableQuarter>, ReportError> {
        validate_year(year)?;
        let current = current_quarter_at(today);
        Ok(year_quarters(year)
            .into_iter()
            .map(|quarter| AvailableQuarter {
                is_current: quarter == current,
                is_available: quarter.start_date.date() <= today,
                long_label: quarter.long_label(),
                quarter: quarter.quarter,
                year: quarter.year,
                label: quarter.label,
                start_date: quarter.start_date,
                end_date: quarter.end_date,
            })
            .collect())
    }

    pub async fn quarterly_statistics(
        &self,
        year: i32,
        quarter: u8,
        scope: &RecordScope,
    ) -> Result<QuarterlyStatistics, ReportError> {
        validate_year(year)?;
        let quarter = validate_quarter(quarter)?;
        Ok(self
            .aggregator
            .quarterly_statistics(year, quarter, scope)
            .await?)
    }

    /// Four quarters one after another, then the whole-year conventions and transfers
    /// queries side by side.
    pub async fn annual_statistics(
        &self,
        year: i32,
        scope: &RecordScope,
    ) -> Result<AnnualStatistics, ReportError> {
        validate_year(year)?;

        let mut quarters = Vec::with_capacity(4);
        for quarter in Quarter::all() {
            quarters.push(
                self.aggregator
                    .quarterly_statistics(year, quarter, scope)
                    .await?,
            );
        }

        let whole_year = year_period(year);
        let (conventions, knowledge_transfers) = tokio::try_join!(
            self.aggregator.conventions_in(&whole_year, scope),
            self.aggregator.knowledge_transfers_in(&whole_year, scope)
        )?;
        debug!(
            year,
            conventions = conventions.len(),
            knowledge_transfers = knowledge_transfers.len(),
            "whole-year totals fetched"
        );

        Ok(AnnualStatistics::assemble(
            year,
            quarters,
            &conventions,
            knowledge_transfers.len(),
        ))
    }

    pub async fn compare_quarters(
        &self,
        first: (i32, u8),
        second: (i32, u8),
        scope: &RecordScope,
    ) -> Result<QuarterComparison, ReportError> {
        let first = self.quarterly_statistics(first.0, first.1, scope).await?;
        let second = self.quarterly_statistics(second.0, second.1, scope).await?;
        Ok(statistics::compare_quarters(&first, &second))
    }

    pub fn catalog(&self) -> ReportCatalog {
        catalog()
    }

    /// Directory scans run on the blocking pool.
    pub async fn clean_old_reports(&self) -> Result<CleanupSummary, ReportError> {
        let uploads = self.generator.uploads().clone();
        let retention = self.retention;
        let summary = tokio::task::spawn_blocking(move || uploads.sweep(retention))
            .await
            .map_err(|err| ReportError::Cleanup(io::Error::new(io::ErrorKind::Other, err)))?
            .map_err(ReportError::Cleanup)?;
        info!(
            removed = summary.removed,
            retained = summary.retained,
            failed = summary.failed,
            "uploads directory swept"
        );
        Ok(summary)
    }

    async fn report_records(
        &self,
        filters: &ReportFilters,
        today: NaiveDate,
    ) -> Result<ReportRecords, StoreError> {
        let aggregator = &self.aggregator;
        Ok(match filters.report_type {
            ReportType::Activities => {
                ReportRecords::Activities(aggregator.activities_data(filters, today).await?)
            }
            ReportType::Conventions => {
                ReportRecords::Conventions(aggregator.conventions_data(filters, today).await?)
            }
            ReportType::KnowledgeTransfers => ReportRecords::KnowledgeTransfers(
                aggregator.knowledge_transfers_data(filters, today).await?,
            ),
        })
    }

    /// Annual sections query each quarter window directly.
    async fn records_in(
        &self,
        report_type: ReportType,
        period: &ReportPeriod,
        scope: &RecordScope,
    ) -> Result<ReportRecords, StoreError> {
        Ok(match report_type {
            ReportType::Activities => {
                ReportRecords::Activities(self.aggregator.activities_in(period, scope).await?)
            }
            ReportType::Conventions => {
                ReportRecords::Conventions(self.aggregator.conventions_in(period, scope).await?)
            }
            ReportType::KnowledgeTransfers => ReportRecords::KnowledgeTransfers(
                self.aggregator
                    .knowledge_transfers_in(period, scope)
                    .await?,
            ),
        })
    }
}
