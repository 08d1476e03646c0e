//! Periodic reporting over research activities, funding conventions and knowledge
//! transfers: period resolution, aggregation, statistics, PDF/DOCX rendering and the
//! HTTP surface that exposes them.

pub mod aggregator;
pub mod catalog;
pub mod domain;
pub mod filters;
pub mod format;
pub mod period;
pub mod render;
pub mod router;
pub mod service;
pub mod statistics;
pub mod store;
pub mod uploads;

#[cfg(test)]
mod tests;

pub use aggregator::DataAggregator;
pub use catalog::{catalog, ReportCatalog};
pub use domain::{
    ActivityReport, ActivityStatus, ConventionReport, KnowledgeTransferReport, ReportFormat,
    ReportRecords, ReportType,
};
pub use filters::{
    AnnualReportFilters, AnnualReportInput, DateRange, GenerateReportInput, RecordScope,
    ReportFilters, ValidationError,
};
pub use period::{Quarter, QuarterPeriod, ReportPeriod};
pub use render::{DocumentGenerator, PeriodOptions, QuarterSection, RenderError};
pub use router::report_router;
pub use service::{AvailableQuarter, ReportError, ReportService};
pub use statistics::{AnnualStatistics, QuarterComparison, QuarterlyStatistics, TrendDirection};
pub use store::{InMemoryReportStore, RecordQuery, ReportDataImportError, ReportStore, StoreError};
pub use uploads::{CleanupSummary, TransientReport, UploadsDir};
