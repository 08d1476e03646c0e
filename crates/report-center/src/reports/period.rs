//! Calendar arithmetic for reporting windows.
//!
//! Quarters are fixed three-month blocks (Q1 = January–March … Q4 = October–December).
//! A window runs from the first day at midnight to the last day at 23:59:59, so two
//! consecutive quarters of the same year never share an instant.

use super::filters::ReportFilters;
use super::format::format_date;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("quarter must be between 1 and 4, got {0}")]
pub struct InvalidQuarter(pub u8);

impl Quarter {
    pub const fn all() -> [Self; 4] {
        [Self::Q1, Self::Q2, Self::Q3, Self::Q4]
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
        }
    }

    /// Month is 1-based, as returned by `chrono::Datelike::month`.
    pub const fn from_month(month: u32) -> Self {
        match month {
            1..=3 => Self::Q1,
            4..=6 => Self::Q2,
            7..=9 => Self::Q3,
            _ => Self::Q4,
        }
    }

    /// First and last month (1-based) plus the last day of the last month.
    const fn bounds(self) -> (u32, u32, u32) {
        match self {
            Self::Q1 => (1, 3, 31),
            Self::Q2 => (4, 6, 30),
            Self::Q3 => (7, 9, 30),
            Self::Q4 => (10, 12, 31),
        }
    }

    pub const fn ordinal_label(self) -> &'static str {
        match self {
            Self::Q1 => "Premier trimestre",
            Self::Q2 => "Deuxième trimestre",
            Self::Q3 => "Troisième trimestre",
            Self::Q4 => "Quatrième trimestre",
        }
    }

    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Q1 => "T1",
            Self::Q2 => "T2",
            Self::Q3 => "T3",
            Self::Q4 => "T4",
        }
    }
}

impl TryFrom<u8> for Quarter {
    type Error = InvalidQuarter;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Q1),
            2 => Ok(Self::Q2),
            3 => Ok(Self::Q3),
            4 => Ok(Self::Q4),
            other => Err(InvalidQuarter(other)),
        }
    }
}

impl From<Quarter> for u8 {
    fn from(value: Quarter) -> Self {
        value.number()
    }
}

/// A resolved quarter: its number, year, inclusive window and display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterPeriod {
    pub quarter: Quarter,
    pub year: i32,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    pub label: String,
}

impl QuarterPeriod {
    pub fn contains(&self, moment: NaiveDateTime) -> bool {
        self.start_date <= moment && moment <= self.end_date
    }

    /// e.g. `Premier trimestre 2025`.
    pub fn long_label(&self) -> String {
        format!("{} {}", self.quarter.ordinal_label(), self.year)
    }
}

/// Effective window of a report, whatever selected it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarter: Option<QuarterPeriod>,
}

impl ReportPeriod {
    pub fn contains(&self, moment: NaiveDateTime) -> bool {
        self.start <= moment && moment <= self.end
    }

    /// True when `[start, end]` shares at least one instant with the window.
    /// A missing end means the interval is still open.
    pub fn overlaps(&self, start: NaiveDateTime, end: Option<NaiveDateTime>) -> bool {
        start <= self.end && end.map_or(true, |end| end >= self.start)
    }
}

impl From<&QuarterPeriod> for ReportPeriod {
    fn from(period: &QuarterPeriod) -> Self {
        Self {
            start: period.start_date,
            end: period.end_date,
            label: period.long_label(),
            quarter: Some(period.clone()),
        }
    }
}

pub fn current_quarter() -> QuarterPeriod {
    current_quarter_at(Local::now().date_naive())
}

pub fn current_quarter_at(today: NaiveDate) -> QuarterPeriod {
    quarter_period(today.year(), Quarter::from_month(today.month()))
}

pub fn quarter_period(year: i32, quarter: Quarter) -> QuarterPeriod {
    let (first_month, last_month, last_day) = quarter.bounds();
    QuarterPeriod {
        quarter,
        year,
        start_date: start_of_day(calendar_day(year, first_month, 1)),
        end_date: end_of_day(calendar_day(year, last_month, last_day)),
        label: format!("Q{} {}", quarter.number(), year),
    }
}

pub fn year_quarters(year: i32) -> [QuarterPeriod; 4] {
    Quarter::all().map(|quarter| quarter_period(year, quarter))
}

pub fn previous_quarter(year: i32, quarter: Quarter) -> QuarterPeriod {
    match quarter {
        Quarter::Q1 => quarter_period(year - 1, Quarter::Q4),
        Quarter::Q2 => quarter_period(year, Quarter::Q1),
        Quarter::Q3 => quarter_period(year, Quarter::Q2),
        Quarter::Q4 => quarter_period(year, Quarter::Q3),
    }
}

pub fn next_quarter(year: i32, quarter: Quarter) -> QuarterPeriod {
    match quarter {
        Quarter::Q1 => quarter_period(year, Quarter::Q2),
        Quarter::Q2 => quarter_period(year, Quarter::Q3),
        Quarter::Q3 => quarter_period(year, Quarter::Q4),
        Quarter::Q4 => quarter_period(year + 1, Quarter::Q1),
    }
}

pub fn quarter_from_date(date: NaiveDate) -> QuarterPeriod {
    quarter_period(date.year(), Quarter::from_month(date.month()))
}

pub fn is_date_in_quarter(moment: NaiveDateTime, year: i32, quarter: Quarter) -> bool {
    quarter_period(year, quarter).contains(moment)
}

/// Whole calendar year, used by annual aggregation.
pub fn year_period(year: i32) -> ReportPeriod {
    ReportPeriod {
        start: start_of_day(calendar_day(year, 1, 1)),
        end: end_of_day(calendar_day(year, 12, 31)),
        label: format!("Année {year}"),
        quarter: None,
    }
}

/// An explicit range wins over quarter and year. Without one, the requested quarter
/// is used, falling back to the quarter `today` falls in, within the requested year.
pub fn report_period(filters: &ReportFilters, today: NaiveDate) -> ReportPeriod {
    if let Some(range) = filters.range {
        return ReportPeriod {
            start: range.start,
            end: range.end,
            label: format!(
                "Du {} au {}",
                format_date(range.start.date()),
                format_date(range.end.date())
            ),
            quarter: None,
        };
    }

    let quarter = filters
        .quarter
        .unwrap_or_else(|| Quarter::from_month(today.month()));
    ReportPeriod::from(&quarter_period(filters.year, quarter))
}

fn calendar_day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("quarter bounds are valid calendar days")
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| start_of_day(date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::domain::{ReportFormat, ReportType};
    use crate::reports::filters::{DateRange, RecordScope};
    use chrono::Duration;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn filters(year: i32, quarter: Option<Quarter>, range: Option<DateRange>) -> ReportFilters {
        ReportFilters {
            report_type: ReportType::Activities,
            format: ReportFormat::Pdf,
            year,
            quarter,
            range,
            scope: RecordScope::default(),
            include_charts: false,
            include_statistics: true,
        }
    }

    #[test]
    fn quarter_bounds_cover_whole_months() {
        for year in [2000, 2023, 2024, 2025, 2100] {
            for quarter in Quarter::all() {
                let period = quarter_period(year, quarter);
                assert_eq!(period.start_date.day(), 1);
                assert_eq!(period.start_date.time(), NaiveTime::MIN);
                assert_eq!(
                    period.end_date.time(),
                    NaiveTime::from_hms_opt(23, 59, 59).expect("valid time")
                );
                let following = period.end_date.date() + Duration::days(1);
                assert_eq!(following.day(), 1, "end is the last day of its month");
                assert_eq!(
                    Quarter::from_month(period.start_date.month()),
                    Quarter::from_month(period.end_date.month())
                );
            }
        }
    }

    #[test]
    fn consecutive_quarters_do_not_overlap() {
        let quarters = year_quarters(2025);
        for pair in quarters.windows(2) {
            assert!(pair[0].end_date < pair[1].start_date);
            assert_eq!(pair[1].start_date - pair[0].end_date, Duration::seconds(1));
        }
        assert_eq!(quarters[0].label, "Q1 2025");
        assert_eq!(quarters[3].label, "Q4 2025");
    }

    #[test]
    fn wraps_across_year_boundaries() {
        assert_eq!(
            previous_quarter(2025, Quarter::Q1),
            quarter_period(2024, Quarter::Q4)
        );
        assert_eq!(
            next_quarter(2025, Quarter::Q4),
            quarter_period(2026, Quarter::Q1)
        );
        assert_eq!(
            next_quarter(2025, Quarter::Q2),
            quarter_period(2025, Quarter::Q3)
        );
    }

    #[test]
    fn quarter_from_date_inverts_quarter_period() {
        let mut date = day(2024, 1, 1);
        while date.year() == 2024 {
            let period = quarter_from_date(date);
            let noon = date.and_hms_opt(12, 0, 0).expect("valid time");
            assert!(is_date_in_quarter(noon, period.year, period.quarter));
            assert!(is_date_in_quarter(
                end_of_day(date),
                period.year,
                period.quarter
            ));
            date += Duration::days(1);
        }
    }

    #[test]
    fn current_quarter_follows_month() {
        assert_eq!(current_quarter_at(day(2025, 3, 31)).quarter, Quarter::Q1);
        assert_eq!(current_quarter_at(day(2025, 4, 1)).quarter, Quarter::Q2);
        assert_eq!(current_quarter_at(day(2025, 12, 1)).quarter, Quarter::Q4);
    }

    #[test]
    fn explicit_range_wins_over_quarter() {
        let range = DateRange {
            start: day(2025, 1, 1).and_hms_opt(0, 0, 0).expect("valid"),
            end: day(2025, 1, 31).and_hms_opt(23, 59, 59).expect("valid"),
        };
        let period = report_period(&filters(2025, Some(Quarter::Q3), Some(range)), day(2025, 6, 1));
        assert_eq!(period.label, "Du 01/01/2025 au 31/01/2025");
        assert_eq!(period.start, range.start);
        assert!(period.quarter.is_none());
    }

    #[test]
    fn quarter_label_uses_ordinal_name() {
        let period = report_period(&filters(2025, Some(Quarter::Q1), None), day(2025, 8, 1));
        assert_eq!(period.label, "Premier trimestre 2025");

        let fallback = report_period(&filters(2024, None, None), day(2025, 8, 1));
        assert_eq!(fallback.label, "Troisième trimestre 2024");
    }

    #[test]
    fn overlap_treats_open_intervals_as_ongoing() {
        let window = ReportPeriod::from(&quarter_period(2025, Quarter::Q2));
        let before = day(2025, 1, 10).and_hms_opt(0, 0, 0).expect("valid");
        let after = day(2025, 7, 1).and_hms_opt(0, 0, 0).expect("valid");
        assert!(window.overlaps(before, None));
        assert!(!window.overlaps(after, None));
        assert!(!window.overlaps(before, Some(before)));
    }

    #[test]
    fn quarter_rejects_out_of_range_numbers() {
        assert_eq!(Quarter::try_from(0), Err(InvalidQuarter(0)));
        assert_eq!(Quarter::try_from(5), Err(InvalidQuarter(5)));
        let parsed: Quarter = serde_json::from_str("2").expect("quarter parses");
        assert_eq!(parsed, Quarter::Q2);
    }
}
