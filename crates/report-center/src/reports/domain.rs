use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Families of records a report can be produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Activities,
    Conventions,
    KnowledgeTransfers,
}

impl ReportType {
    pub const fn ordered() -> [Self; 3] {
        [Self::Activities, Self::Conventions, Self::KnowledgeTransfers]
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Self::Activities => "activities",
            Self::Conventions => "conventions",
            Self::KnowledgeTransfers => "knowledge_transfers",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Activities => "Activités",
            Self::Conventions => "Conventions",
            Self::KnowledgeTransfers => "Transferts de connaissances",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Activities => "Rapport des activités",
            Self::Conventions => "Rapport des conventions",
            Self::KnowledgeTransfers => "Rapport des transferts de connaissances",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Pdf,
    Docx,
}

impl ReportFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// Closed vocabulary used by reports, whatever the store calls things.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityStatus {
    New,
    Reconducted,
    Closed,
}

impl ActivityStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::New, Self::Reconducted, Self::Closed]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "Nouvelle",
            Self::Reconducted => "Reconduite",
            Self::Closed => "Clôturée",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    pub title: String,
    pub responsibles: Vec<String>,
    pub status: ActivityStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarter: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConventionReport {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub global_amount: f64,
    pub mobilized_amount: f64,
    pub funders: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarter: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeTransferReport {
    pub title: String,
    pub availability_date: NaiveDate,
    pub description: String,
    pub potential_impact: String,
    pub audiences: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarter: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// Rows for one report type, as handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportRecords {
    Activities(Vec<ActivityReport>),
    Conventions(Vec<ConventionReport>),
    KnowledgeTransfers(Vec<KnowledgeTransferReport>),
}

impl ReportRecords {
    pub fn report_type(&self) -> ReportType {
        match self {
            Self::Activities(_) => ReportType::Activities,
            Self::Conventions(_) => ReportType::Conventions,
            Self::KnowledgeTransfers(_) => ReportType::KnowledgeTransfers,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Activities(rows) => rows.len(),
            Self::Conventions(rows) => rows.len(),
            Self::KnowledgeTransfers(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_type_uses_snake_case_on_the_wire() {
        let parsed: ReportType =
            serde_json::from_str("\"knowledge_transfers\"").expect("known report type");
        assert_eq!(parsed, ReportType::KnowledgeTransfers);
        assert!(serde_json::from_str::<ReportType>("\"seminars\"").is_err());
    }

    #[test]
    fn formats_expose_mime_types() {
        assert_eq!(ReportFormat::Pdf.content_type(), "application/pdf");
        assert!(ReportFormat::Docx
            .content_type()
            .ends_with("wordprocessingml.document"));
        assert_eq!(ReportFormat::Docx.extension(), "docx");
    }

    #[test]
    fn activity_status_serializes_to_closed_vocabulary() {
        let json = serde_json::to_string(&ActivityStatus::Reconducted).expect("serializes");
        assert_eq!(json, "\"Reconducted\"");
    }
}
