use super::domain::{ActivityReport, ActivityStatus, ConventionReport};
use super::period::{Quarter, QuarterPeriod};
use serde::Serialize;

pub const NOT_APPLICABLE: &str = "N/A";

/// Activity counts by status. `total` is always `new + reconducted`; closed work is
/// tracked on the side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActivityBreakdown {
    pub total: usize,
    pub new: usize,
    pub reconducted: usize,
    pub closed: usize,
}

impl ActivityBreakdown {
    pub fn from_counts(new: usize, reconducted: usize, closed: usize) -> Self {
        Self {
            total: new + reconducted,
            new,
            reconducted,
            closed,
        }
    }

    pub fn tally<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = ActivityStatus>,
    {
        let (mut new, mut reconducted, mut closed) = (0, 0, 0);
        for status in statuses {
            match status {
                ActivityStatus::New => new += 1,
                ActivityStatus::Reconducted => reconducted += 1,
                ActivityStatus::Closed => closed += 1,
            }
        }
        Self::from_counts(new, reconducted, closed)
    }

    pub fn of_reports(reports: &[ActivityReport]) -> Self {
        Self::tally(reports.iter().map(|report| report.status))
    }

    pub fn combine(self, other: Self) -> Self {
        Self::from_counts(
            self.new + other.new,
            self.reconducted + other.reconducted,
            self.closed + other.closed,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub total_global: f64,
    pub total_mobilized: f64,
}

impl BudgetSummary {
    pub fn of_conventions(conventions: &[ConventionReport]) -> Self {
        conventions
            .iter()
            .fold(Self::default(), |acc, convention| Self {
                total_global: acc.total_global + convention.global_amount,
                total_mobilized: acc.total_mobilized + convention.mobilized_amount,
            })
    }

    /// Share of the global envelope already mobilized, as a percentage.
    pub fn mobilization_rate(&self) -> Option<f64> {
        percent_of(self.total_mobilized, self.total_global)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterlyStatistics {
    pub period: QuarterPeriod,
    pub activities: ActivityBreakdown,
    pub conventions: usize,
    pub knowledge_transfers: usize,
    pub budget: BudgetSummary,
}

impl QuarterlyStatistics {
    pub fn from_reports(
        period: QuarterPeriod,
        activities: &[ActivityReport],
        conventions: &[ConventionReport],
        knowledge_transfers: usize,
    ) -> Self {
        Self {
            period,
            activities: ActivityBreakdown::of_reports(activities),
            conventions: conventions.len(),
            knowledge_transfers,
            budget: BudgetSummary::of_conventions(conventions),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualTotals {
    pub activities: ActivityBreakdown,
    pub conventions: usize,
    pub knowledge_transfers: usize,
    pub budget: BudgetSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Hausse,
    Baisse,
    Stable,
}

impl TrendDirection {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hausse => "hausse",
            Self::Baisse => "baisse",
            Self::Stable => "stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MostActiveQuarter {
    pub quarter: Quarter,
    pub label: String,
    pub activities: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualStatistics {
    pub year: i32,
    pub quarters: Vec<QuarterlyStatistics>,
    pub totals: AnnualTotals,
    pub trend: TrendDirection,
    pub trend_percent: String,
    pub most_active_quarter: Option<MostActiveQuarter>,
}

impl AnnualStatistics {
    /// Activities are summed quarter by quarter. Conventions, transfers and funding come
    /// from a single whole-year query so an agreement spanning several quarters is
    /// counted once.
    pub fn assemble(
        year: i32,
        quarters: Vec<QuarterlyStatistics>,
        year_conventions: &[ConventionReport],
        year_knowledge_transfers: usize,
    ) -> Self {
        let activities = quarters
            .iter()
            .fold(ActivityBreakdown::default(), |acc, quarter| {
                acc.combine(quarter.activities)
            });

        let first = quarters.first().map_or(0, |q| q.activities.total);
        let last = quarters.last().map_or(0, |q| q.activities.total);
        let (trend, trend_percent) = trend_between(first, last);

        let most_active_quarter = most_active(&quarters).map(|quarter| MostActiveQuarter {
            quarter: quarter.period.quarter,
            label: quarter.period.long_label(),
            activities: quarter.activities.total,
        });

        Self {
            year,
            totals: AnnualTotals {
                activities,
                conventions: year_conventions.len(),
                knowledge_transfers: year_knowledge_transfers,
                budget: BudgetSummary::of_conventions(year_conventions),
            },
            quarters,
            trend,
            trend_percent,
            most_active_quarter,
        }
    }

    pub fn max_quarter_activities(&self) -> usize {
        self.quarters
            .iter()
            .map(|quarter| quarter.activities.total)
            .max()
            .unwrap_or(0)
    }
}

/// Highest activity total; the earliest quarter wins ties.
pub fn most_active(quarters: &[QuarterlyStatistics]) -> Option<&QuarterlyStatistics> {
    quarters.iter().fold(None, |best, quarter| match best {
        Some(current) if current.activities.total >= quarter.activities.total => Some(current),
        _ => Some(quarter),
    })
}

/// Direction and magnitude of the change from `first` to `last`.
pub fn trend_between(first: usize, last: usize) -> (TrendDirection, String) {
    let direction = match last.cmp(&first) {
        std::cmp::Ordering::Greater => TrendDirection::Hausse,
        std::cmp::Ordering::Less => TrendDirection::Baisse,
        std::cmp::Ordering::Equal => TrendDirection::Stable,
    };
    let percent = percent_variation(first as f64, last as f64).map(f64::abs);
    (direction, format_percent(percent))
}

/// `(value - base) / base` as a percentage; `None` when the baseline is zero.
pub fn percent_variation(base: f64, value: f64) -> Option<f64> {
    if base == 0.0 || !base.is_finite() || !value.is_finite() {
        None
    } else {
        Some((value - base) / base * 100.0)
    }
}

pub fn percent_of(part: f64, whole: f64) -> Option<f64> {
    if whole == 0.0 || !whole.is_finite() {
        None
    } else {
        Some(part / whole * 100.0)
    }
}

/// One decimal, or `N/A`.
pub fn format_percent(percent: Option<f64>) -> String {
    match percent {
        Some(value) => format!("{value:.1}"),
        None => NOT_APPLICABLE.to_string(),
    }
}

/// Share of the widest bar, in `[0, 1]`. A zero maximum yields an empty bar.
pub fn bar_fraction(value: usize, max: usize) -> f32 {
    if max == 0 {
        0.0
    } else {
        (value as f32 / max as f32).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    pub metric: &'static str,
    pub label: &'static str,
    pub quarter1: f64,
    pub quarter2: f64,
    pub variation: f64,
    pub variation_percent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterComparison {
    pub quarter1: QuarterPeriod,
    pub quarter2: QuarterPeriod,
    pub metrics: Vec<MetricComparison>,
}

impl QuarterComparison {
    pub fn metric(&self, key: &str) -> Option<&MetricComparison> {
        self.metrics.iter().find(|metric| metric.metric == key)
    }
}

pub fn compare_quarters(
    first: &QuarterlyStatistics,
    second: &QuarterlyStatistics,
) -> QuarterComparison {
    let pairs: [(&'static str, &'static str, f64, f64); 8] = [
        (
            "activities.total",
            "Activités (total)",
            first.activities.total as f64,
            second.activities.total as f64,
        ),
        (
            "activities.new",
            "Nouvelles activités",
            first.activities.new as f64,
            second.activities.new as f64,
        ),
        (
            "activities.reconducted",
            "Activités reconduites",
            first.activities.reconducted as f64,
            second.activities.reconducted as f64,
        ),
        (
            "activities.closed",
            "Activités clôturées",
            first.activities.closed as f64,
            second.activities.closed as f64,
        ),
        (
            "conventions",
            "Conventions",
            first.conventions as f64,
            second.conventions as f64,
        ),
        (
            "knowledgeTransfers",
            "Transferts de connaissances",
            first.knowledge_transfers as f64,
            second.knowledge_transfers as f64,
        ),
        (
            "budget.totalGlobal",
            "Financement global",
            first.budget.total_global,
            second.budget.total_global,
        ),
        (
            "budget.totalMobilized",
            "Financement mobilisé",
            first.budget.total_mobilized,
            second.budget.total_mobilized,
        ),
    ];

    let metrics = pairs
        .into_iter()
        .map(|(metric, label, quarter1, quarter2)| MetricComparison {
            metric,
            label,
            quarter1,
            quarter2,
            variation: quarter2 - quarter1,
            variation_percent: format_percent(percent_variation(quarter1, quarter2)),
        })
        .collect();

    QuarterComparison {
        quarter1: first.period.clone(),
        quarter2: second.period.clone(),
        metrics,
    }
}
