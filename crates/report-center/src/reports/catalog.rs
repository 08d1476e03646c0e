use super::domain::{ReportFormat, ReportType};
use super::filters::{MAX_YEAR, MIN_YEAR};
use super::period::Quarter;
use super::render;
use serde::Serialize;

/// Static description of what can be generated, for clients building their forms.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportCatalog {
    pub report_types: Vec<ReportTypeInfo>,
    pub formats: Vec<FormatInfo>,
    pub quarters: Vec<QuarterInfo>,
    pub years: YearRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTypeInfo {
    pub report_type: ReportType,
    pub label: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub landscape: bool,
    pub columns: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatInfo {
    pub format: ReportFormat,
    pub extension: &'static str,
    pub content_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterInfo {
    pub quarter: Quarter,
    pub label: &'static str,
    pub short_label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min: i32,
    pub max: i32,
}

fn description(report_type: ReportType) -> &'static str {
    match report_type {
        ReportType::Activities => {
            "Activités de recherche de la période avec leurs responsables et leur statut"
        }
        ReportType::Conventions => {
            "Conventions actives sur la période, montants engagés et mobilisés, bailleurs"
        }
        ReportType::KnowledgeTransfers => {
            "Technologies et connaissances disponibles sur la période et leurs publics cibles"
        }
    }
}

pub fn catalog() -> ReportCatalog {
    ReportCatalog {
        report_types: ReportType::ordered()
            .into_iter()
            .map(|report_type| ReportTypeInfo {
                report_type,
                label: report_type.label(),
                title: report_type.title(),
                description: description(report_type),
                landscape: render::is_landscape(report_type),
                columns: render::column_headers(report_type),
            })
            .collect(),
        formats: [ReportFormat::Pdf, ReportFormat::Docx]
            .into_iter()
            .map(|format| FormatInfo {
                format,
                extension: format.extension(),
                content_type: format.content_type(),
            })
            .collect(),
        quarters: Quarter::all()
            .into_iter()
            .map(|quarter| QuarterInfo {
                quarter,
                label: quarter.ordinal_label(),
                short_label: quarter.short_label(),
            })
            .collect(),
        years: YearRange {
            min: MIN_YEAR,
            max: MAX_YEAR,
        },
    }
}
