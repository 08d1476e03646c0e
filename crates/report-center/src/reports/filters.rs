use super::domain::{ReportFormat, ReportType};
use super::period::Quarter;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

pub const MIN_YEAR: i32 = 2000;
pub const MAX_YEAR: i32 = 2100;

/// Raw request body for single-period report generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportInput {
    pub report_type: ReportType,
    pub format: ReportFormat,
    pub year: i32,
    #[serde(default)]
    pub quarter: Option<u8>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub theme_id: Option<String>,
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub station_id: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
    #[serde(default)]
    pub include_charts: bool,
    #[serde(default = "default_true")]
    pub include_statistics: bool,
}

/// Raw request body for the annual composite report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualReportInput {
    pub report_type: ReportType,
    pub format: ReportFormat,
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

fn default_true() -> bool {
    true
}

/// Inclusive explicit window; both ends are always present together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Optional foreign-key filters and archive inclusion applied to every store query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordScope {
    #[serde(default)]
    pub theme_id: Option<String>,
    #[serde(default)]
    pub program_id: Option<String>,
    #[serde(default)]
    pub station_id: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
}

/// Validated filters. Construct through [`GenerateReportInput::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFilters {
    pub report_type: ReportType,
    pub format: ReportFormat,
    pub year: i32,
    pub quarter: Option<Quarter>,
    pub range: Option<DateRange>,
    pub scope: RecordScope,
    pub include_charts: bool,
    pub include_statistics: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnualReportFilters {
    pub report_type: ReportType,
    pub format: ReportFormat,
    pub year: i32,
    pub scope: RecordScope,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("year must be between 2000 and 2100, got {0}")]
    YearOutOfRange(i32),
    #[error("quarter must be between 1 and 4, got {0}")]
    QuarterOutOfRange(u8),
    #[error("startDate and endDate must be provided together")]
    IncompleteDateRange,
    #[error("startDate must not be after endDate")]
    InvertedDateRange,
}

impl GenerateReportInput {
    pub fn validate(self) -> Result<ReportFilters, ValidationError> {
        validate_year(self.year)?;
        let quarter = self.quarter.map(validate_quarter).transpose()?;

        let range = match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start > end => {
                return Err(ValidationError::InvertedDateRange)
            }
            (Some(start), Some(end)) => Some(DateRange {
                start: start.naive_utc(),
                end: end.naive_utc(),
            }),
            (None, None) => None,
            _ => return Err(ValidationError::IncompleteDateRange),
        };

        Ok(ReportFilters {
            report_type: self.report_type,
            format: self.format,
            year: self.year,
            quarter,
            range,
            scope: RecordScope {
                theme_id: normalize_id(self.theme_id),
                program_id: normalize_id(self.program_id),
                station_id: normalize_id(self.station_id),
                include_archived: self.include_archived,
            },
            include_charts: self.include_charts,
            include_statistics: self.include_statistics,
        })
    }
}

impl AnnualReportInput {
    pub fn validate(self) -> Result<AnnualReportFilters, ValidationError> {
        validate_year(self.year)?;
        Ok(AnnualReportFilters {
            report_type: self.report_type,
            format: self.format,
            year: self.year,
            scope: RecordScope {
                theme_id: normalize_id(self.theme_id),
                program_id: normalize_id(self.program_id),
                station_id: normalize_id(self.station_id),
                include_archived: self.include_archived,
            },
        })
    }
}

impl RecordScope {
    /// Blank identifiers behave as "no filter".
    pub fn normalized(self) -> Self {
        Self {
            theme_id: normalize_id(self.theme_id),
            program_id: normalize_id(self.program_id),
            station_id: normalize_id(self.station_id),
            include_archived: self.include_archived,
        }
    }
}

pub fn validate_year(year: i32) -> Result<i32, ValidationError> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(year)
    } else {
        Err(ValidationError::YearOutOfRange(year))
    }
}

pub fn validate_quarter(quarter: u8) -> Result<Quarter, ValidationError> {
    Quarter::try_from(quarter).map_err(|_| ValidationError::QuarterOutOfRange(quarter))
}

fn normalize_id(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
