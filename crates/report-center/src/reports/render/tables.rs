use super::layout::{Bar, Block, Cell, Column, DocumentLayout, Orientation, Table};
use crate::reports::domain::{
    ActivityReport, ActivityStatus, ConventionReport, KnowledgeTransferReport, ReportRecords,
    ReportType,
};
use crate::reports::format::{format_currency, format_date, format_date_time};
use crate::reports::statistics::{
    bar_fraction, format_percent, ActivityBreakdown, BudgetSummary,
};
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

/// How many responsible names an annual section keeps before collapsing to `+N`.
pub(crate) const ANNUAL_VISIBLE_NAMES: usize = 2;

const ACTIVITY_COLUMNS: [Column; 3] = [
    Column::new("Intitulé", 220.0),
    Column::new("Responsables", 180.0),
    Column::new("Statut", 115.0),
];

const CONVENTION_COLUMNS: [Column; 6] = [
    Column::new("Intitulé", 190.0),
    Column::new("Début", 75.0),
    Column::new("Fin", 75.0),
    Column::new("Financement global", 115.0),
    Column::new("Financement mobilisé", 115.0),
    Column::new("Bailleurs", 192.0),
];

const KNOWLEDGE_TRANSFER_COLUMNS: [Column; 5] = [
    Column::new("Intitulé", 170.0),
    Column::new("Disponibilité", 85.0),
    Column::new("Description", 185.0),
    Column::new("Impact potentiel", 160.0),
    Column::new("Public cible", 162.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NameStyle {
    Full,
    Truncated,
}

/// Presentation settings shared by every layout built for one request.
#[derive(Debug, Clone)]
pub(crate) struct RenderContext {
    pub(crate) organization: String,
    pub(crate) currency: String,
    pub(crate) generated_at: NaiveDateTime,
}

impl RenderContext {
    pub(crate) fn money(&self, amount: f64) -> String {
        format_currency(amount, Some(&self.currency))
    }

    pub(crate) fn generated_note(&self) -> Block {
        Block::Note(format!("Généré le {}", format_date_time(self.generated_at)))
    }
}

/// Optional blocks of a single-period report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodOptions {
    pub include_statistics: bool,
    pub include_charts: bool,
}

pub(crate) const fn orientation_for(report_type: ReportType) -> Orientation {
    match report_type {
        ReportType::Activities => Orientation::Portrait,
        ReportType::Conventions | ReportType::KnowledgeTransfers => Orientation::Landscape,
    }
}

pub(crate) fn columns_for(report_type: ReportType) -> &'static [Column] {
    match report_type {
        ReportType::Activities => &ACTIVITY_COLUMNS,
        ReportType::Conventions => &CONVENTION_COLUMNS,
        ReportType::KnowledgeTransfers => &KNOWLEDGE_TRANSFER_COLUMNS,
    }
}

pub(crate) fn records_table(
    records: &ReportRecords,
    context: &RenderContext,
    names: NameStyle,
) -> Table {
    match records {
        ReportRecords::Activities(rows) => Table {
            columns: columns_for(ReportType::Activities).to_vec(),
            rows: rows.iter().map(|row| activity_row(row, names)).collect(),
        },
        ReportRecords::Conventions(rows) => Table {
            columns: columns_for(ReportType::Conventions).to_vec(),
            rows: rows.iter().map(|row| convention_row(row, context)).collect(),
        },
        ReportRecords::KnowledgeTransfers(rows) => Table {
            columns: columns_for(ReportType::KnowledgeTransfers).to_vec(),
            rows: rows.iter().map(knowledge_transfer_row).collect(),
        },
    }
}

fn activity_row(row: &ActivityReport, names: NameStyle) -> Vec<Cell> {
    let responsibles = match names {
        NameStyle::Full => Cell::Lines(row.responsibles.clone()),
        NameStyle::Truncated => Cell::Text(truncate_names(&row.responsibles, ANNUAL_VISIBLE_NAMES)),
    };
    vec![
        Cell::from(row.title.as_str()),
        responsibles,
        Cell::from(row.status.label()),
    ]
}

fn convention_row(row: &ConventionReport, context: &RenderContext) -> Vec<Cell> {
    vec![
        Cell::from(row.title.as_str()),
        Cell::Text(format_date(row.start_date)),
        Cell::Text(format_date(row.end_date)),
        Cell::Text(context.money(row.global_amount)),
        Cell::Text(context.money(row.mobilized_amount)),
        Cell::Text(row.funders.join(", ")),
    ]
}

fn knowledge_transfer_row(row: &KnowledgeTransferReport) -> Vec<Cell> {
    vec![
        Cell::from(row.title.as_str()),
        Cell::Text(format_date(row.availability_date)),
        Cell::from(row.description.as_str()),
        Cell::from(row.potential_impact.as_str()),
        Cell::Lines(row.audiences.clone()),
    ]
}

/// `A, B +3` for five names when two are kept.
pub(crate) fn truncate_names(names: &[String], visible: usize) -> String {
    let shown = names
        .iter()
        .take(visible)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if names.len() > visible {
        format!("{shown} +{}", names.len() - visible)
    } else {
        shown
    }
}

/// Title, period, optional summary/chart, the table, totals and the generation stamp.
pub(crate) fn period_layout(
    records: &ReportRecords,
    period_label: &str,
    options: PeriodOptions,
    context: &RenderContext,
) -> DocumentLayout {
    let report_type = records.report_type();
    let mut layout = DocumentLayout::new(report_type.title(), orientation_for(report_type));

    layout
        .push(Block::Title(report_type.title().to_string()))
        .push(Block::Subtitle(context.organization.clone()))
        .push(Block::Paragraph(format!("Période : {period_label}")));

    if options.include_statistics {
        layout.push(Block::Facts(summary_facts(records, context)));
    }

    if options.include_charts {
        if let ReportRecords::Activities(rows) = records {
            layout.push(Block::BarChart(status_bars(&ActivityBreakdown::of_reports(rows))));
        }
    }

    layout.push(Block::Table(records_table(records, context, NameStyle::Full)));

    if records.is_empty() {
        layout.push(Block::Paragraph(
            "Aucun enregistrement pour cette période.".to_string(),
        ));
    }

    if let ReportRecords::Activities(rows) = records {
        layout.push(Block::Note(format!("Total activités: {}", rows.len())));
    }
    layout.push(context.generated_note());
    layout
}

fn summary_facts(records: &ReportRecords, context: &RenderContext) -> Vec<(String, String)> {
    match records {
        ReportRecords::Activities(rows) => {
            let breakdown = ActivityBreakdown::of_reports(rows);
            vec![
                ("Nouvelles".to_string(), breakdown.new.to_string()),
                ("Reconduites".to_string(), breakdown.reconducted.to_string()),
                ("Clôturées".to_string(), breakdown.closed.to_string()),
                (
                    "Total (nouvelles + reconduites)".to_string(),
                    breakdown.total.to_string(),
                ),
            ]
        }
        ReportRecords::Conventions(rows) => {
            let budget = BudgetSummary::of_conventions(rows);
            vec![
                ("Conventions".to_string(), rows.len().to_string()),
                (
                    "Financement global".to_string(),
                    context.money(budget.total_global),
                ),
                (
                    "Financement mobilisé".to_string(),
                    context.money(budget.total_mobilized),
                ),
                (
                    "Taux de mobilisation".to_string(),
                    percent_text(budget.mobilization_rate()),
                ),
            ]
        }
        ReportRecords::KnowledgeTransfers(rows) => {
            let audiences: BTreeSet<&str> = rows
                .iter()
                .flat_map(|row| row.audiences.iter().map(String::as_str))
                .collect();
            vec![
                (
                    "Transferts de connaissances".to_string(),
                    rows.len().to_string(),
                ),
                (
                    "Publics cibles distincts".to_string(),
                    audiences.len().to_string(),
                ),
            ]
        }
    }
}

/// `25.0 %`, or `N/A` without a baseline.
pub(crate) fn percent_text(percent: Option<f64>) -> String {
    match percent {
        Some(_) => format!("{} %", format_percent(percent)),
        None => format_percent(percent),
    }
}

fn status_bars(breakdown: &ActivityBreakdown) -> Vec<Bar> {
    let counts = [breakdown.new, breakdown.reconducted, breakdown.closed];
    let max = counts.iter().copied().max().unwrap_or(0);
    ActivityStatus::ordered()
        .into_iter()
        .zip(counts)
        .map(|(status, value)| Bar {
            label: status.label().to_string(),
            value,
            fraction: bar_fraction(value, max),
        })
        .collect()
}
