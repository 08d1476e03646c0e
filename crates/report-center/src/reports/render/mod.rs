//! Turns report rows into PDF or DOCX files inside the uploads directory.
//!
//! Layouts are built once per request as a list of [`layout::Block`]s and handed to the
//! backend matching the requested format.

mod annual;
mod docx;
mod layout;
mod pdf;
mod tables;

pub use annual::QuarterSection;
pub use tables::PeriodOptions;

use super::domain::{ReportFormat, ReportRecords, ReportType};
use super::period::ReportPeriod;
use super::statistics::AnnualStatistics;
use super::uploads::{TransientReport, UploadsDir};
use chrono::NaiveDateTime;
use layout::DocumentLayout;
use std::io::{self, BufWriter, Write};
use tables::RenderContext;
use thiserror::Error;
use tracing::info;

/// Column headers of the record table, left to right.
pub(crate) fn column_headers(report_type: ReportType) -> Vec<&'static str> {
    tables::columns_for(report_type)
        .iter()
        .map(|column| column.header)
        .collect()
}

pub(crate) fn is_landscape(report_type: ReportType) -> bool {
    tables::orientation_for(report_type) == layout::Orientation::Landscape
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write report file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to build pdf document: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("failed to package docx document: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Renders documents for one organisation into one uploads directory.
#[derive(Debug, Clone)]
pub struct DocumentGenerator {
    uploads: UploadsDir,
    organization: String,
    currency: String,
}

impl DocumentGenerator {
    pub fn new(
        uploads: UploadsDir,
        organization: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            uploads,
            organization: organization.into(),
            currency: currency.into(),
        }
    }

    pub fn uploads(&self) -> &UploadsDir {
        &self.uploads
    }

    pub fn render_period(
        &self,
        records: &ReportRecords,
        period: &ReportPeriod,
        format: ReportFormat,
        options: PeriodOptions,
        generated_at: NaiveDateTime,
    ) -> Result<TransientReport, RenderError> {
        let context = self.context(generated_at);
        let layout = tables::period_layout(records, &period.label, options, &context);
        self.write(&layout, records.report_type().slug(), &period.label, format)
    }

    pub fn render_annual(
        &self,
        report_type: ReportType,
        statistics: &AnnualStatistics,
        sections: &[QuarterSection],
        format: ReportFormat,
        generated_at: NaiveDateTime,
    ) -> Result<TransientReport, RenderError> {
        let context = self.context(generated_at);
        let layout = annual::annual_layout(report_type, statistics, sections, &context);
        let kind = format!("{}_annuel", report_type.slug());
        self.write(&layout, &kind, &statistics.year.to_string(), format)
    }

    fn context(&self, generated_at: NaiveDateTime) -> RenderContext {
        RenderContext {
            organization: self.organization.clone(),
            currency: self.currency.clone(),
            generated_at,
        }
    }

    /// Renders into a staging file and renames it into place, so a failure never leaves
    /// a partial document behind.
    fn write(
        &self,
        layout: &DocumentLayout,
        kind: &str,
        label: &str,
        format: ReportFormat,
    ) -> Result<TransientReport, RenderError> {
        let destination = self.uploads.allocate(kind, label, format);
        let mut staging = tempfile::Builder::new()
            .prefix(".rendering-")
            .tempfile_in(self.uploads.path())?;

        match format {
            ReportFormat::Pdf => {
                let mut writer = BufWriter::new(staging.as_file_mut());
                pdf::write_pdf(layout, &mut writer)?;
                writer.flush()?;
            }
            ReportFormat::Docx => {
                docx::write_docx(layout, staging.as_file_mut())?;
            }
        }

        staging
            .persist(&destination)
            .map_err(|err| RenderError::Io(err.error))?;
        info!(
            path = %destination.display(),
            format = format.extension(),
            blocks = layout.blocks.len(),
            "report rendered"
        );
        Ok(TransientReport::new(destination, format))
    }
}
