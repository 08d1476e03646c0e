use super::layout::{Bar, Block, Cell, Column, DocumentLayout, Table};
use super::tables::{orientation_for, percent_text, records_table, NameStyle, RenderContext};
use crate::reports::domain::{ReportRecords, ReportType};
use crate::reports::period::QuarterPeriod;
use crate::reports::statistics::{bar_fraction, AnnualStatistics, NOT_APPLICABLE};

const RECAP_COLUMNS: [Column; 6] = [
    Column::new("Trimestre", 115.0),
    Column::new("Activités", 80.0),
    Column::new("Nouvelles", 80.0),
    Column::new("Reconduites", 80.0),
    Column::new("Conventions", 80.0),
    Column::new("Transferts", 80.0),
];

/// Records of one quarter, in the order the sections are printed.
#[derive(Debug, Clone)]
pub struct QuarterSection {
    pub period: QuarterPeriod,
    pub records: ReportRecords,
}

pub(crate) fn annual_title(report_type: ReportType, year: i32) -> String {
    format!("Rapport annuel {year} - {}", report_type.label())
}

/// Cover, summary, one section per non-empty quarter, conclusion.
pub(crate) fn annual_layout(
    report_type: ReportType,
    statistics: &AnnualStatistics,
    sections: &[QuarterSection],
    context: &RenderContext,
) -> DocumentLayout {
    let title = annual_title(report_type, statistics.year);
    let mut layout = DocumentLayout::new(title.clone(), orientation_for(report_type));

    layout
        .push(Block::Title(title))
        .push(Block::Subtitle(format!("Année {}", statistics.year)))
        .push(Block::Paragraph(context.organization.clone()))
        .push(context.generated_note())
        .push(Block::PageBreak);

    summary(&mut layout, statistics, context);

    for section in sections.iter().filter(|section| !section.records.is_empty()) {
        layout
            .push(Block::PageBreak)
            .push(Block::Heading(section.period.long_label()))
            .push(Block::Table(records_table(
                &section.records,
                context,
                NameStyle::Truncated,
            )));
        if let ReportRecords::Activities(rows) = &section.records {
            layout.push(Block::Note(format!("Total activités: {}", rows.len())));
        }
    }

    conclusion(&mut layout, statistics, context);
    layout
}

fn summary(layout: &mut DocumentLayout, statistics: &AnnualStatistics, context: &RenderContext) {
    let totals = &statistics.totals;
    let rate = totals.budget.mobilization_rate();

    layout
        .push(Block::Heading("Synthèse annuelle".to_string()))
        .push(Block::Facts(vec![
            (
                "Activités (nouvelles + reconduites)".to_string(),
                totals.activities.total.to_string(),
            ),
            ("Nouvelles".to_string(), totals.activities.new.to_string()),
            (
                "Reconduites".to_string(),
                totals.activities.reconducted.to_string(),
            ),
            ("Clôturées".to_string(), totals.activities.closed.to_string()),
            ("Conventions".to_string(), totals.conventions.to_string()),
            (
                "Transferts de connaissances".to_string(),
                totals.knowledge_transfers.to_string(),
            ),
            (
                "Financement global".to_string(),
                context.money(totals.budget.total_global),
            ),
            (
                "Financement mobilisé".to_string(),
                context.money(totals.budget.total_mobilized),
            ),
            ("Taux de mobilisation".to_string(), percent_text(rate)),
        ]));

    let rows: Vec<Vec<Cell>> = statistics
        .quarters
        .iter()
        .map(|quarter| {
            vec![
                quarter.period.quarter.short_label().into(),
                quarter.activities.total.to_string().into(),
                quarter.activities.new.to_string().into(),
                quarter.activities.reconducted.to_string().into(),
                quarter.conventions.to_string().into(),
                quarter.knowledge_transfers.to_string().into(),
            ]
        })
        .collect();
    layout.push(Block::Table(Table {
        columns: RECAP_COLUMNS.to_vec(),
        rows,
    }));

    let max = statistics.max_quarter_activities();
    layout.push(Block::BarChart(
        statistics
            .quarters
            .iter()
            .map(|quarter| Bar {
                label: quarter.period.quarter.short_label().to_string(),
                value: quarter.activities.total,
                fraction: bar_fraction(quarter.activities.total, max),
            })
            .collect(),
    ));
}

fn conclusion(
    layout: &mut DocumentLayout,
    statistics: &AnnualStatistics,
    context: &RenderContext,
) {
    let totals = &statistics.totals;
    layout
        .push(Block::PageBreak)
        .push(Block::Heading("Conclusion".to_string()))
        .push(Block::Bullets(vec![
            format!(
                "{} activités menées ({} nouvelles, {} reconduites), {} clôturées",
                totals.activities.total,
                totals.activities.new,
                totals.activities.reconducted,
                totals.activities.closed
            ),
            format!("{} conventions actives", totals.conventions),
            format!(
                "{} transferts de connaissances disponibles",
                totals.knowledge_transfers
            ),
            format!(
                "{} mobilisés sur {}",
                context.money(totals.budget.total_mobilized),
                context.money(totals.budget.total_global)
            ),
        ]))
        .push(Block::Paragraph(trend_sentence(statistics)));

    if let Some(best) = &statistics.most_active_quarter {
        layout.push(Block::Paragraph(format!(
            "Trimestre le plus actif : {} ({} activités)",
            best.label, best.activities
        )));
    }
    layout.push(context.generated_note());
}

pub(crate) fn trend_sentence(statistics: &AnnualStatistics) -> String {
    let direction = statistics.trend.label();
    if statistics.trend_percent == NOT_APPLICABLE {
        format!("Tendance du premier au dernier trimestre : {direction} (variation N/A)")
    } else {
        format!(
            "Tendance du premier au dernier trimestre : {direction} de {} %",
            statistics.trend_percent
        )
    }
}
