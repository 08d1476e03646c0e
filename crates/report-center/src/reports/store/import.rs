use super::{
    InMemoryReportStore, RecordKeys, StoredActivity, StoredActivityStatus, StoredConvention,
    StoredKnowledgeTransfer,
};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const ACTIVITIES_FILE: &str = "activities.csv";
pub const CONVENTIONS_FILE: &str = "conventions.csv";
pub const KNOWLEDGE_TRANSFERS_FILE: &str = "knowledge_transfers.csv";

#[derive(Debug)]
pub enum ReportDataImportError {
    Io { path: PathBuf, source: std::io::Error },
    Csv(csv::Error),
}

impl std::fmt::Display for ReportDataImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportDataImportError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ReportDataImportError::Csv(err) => write!(f, "invalid report CSV data: {}", err),
        }
    }
}

impl std::error::Error for ReportDataImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportDataImportError::Io { source, .. } => Some(source),
            ReportDataImportError::Csv(err) => Some(err),
        }
    }
}

impl From<csv::Error> for ReportDataImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Loads the three record exports from `dir` into an in-memory store.
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<InMemoryReportStore, ReportDataImportError> {
    let dir = dir.as_ref();
    let open = |name: &str| {
        let path = dir.join(name);
        File::open(&path).map_err(|source| ReportDataImportError::Io { path, source })
    };

    load_readers(
        open(ACTIVITIES_FILE)?,
        open(CONVENTIONS_FILE)?,
        open(KNOWLEDGE_TRANSFERS_FILE)?,
    )
}

pub fn load_readers<A: Read, C: Read, K: Read>(
    activities: A,
    conventions: C,
    knowledge_transfers: K,
) -> Result<InMemoryReportStore, ReportDataImportError> {
    let activities = read_rows::<ActivityRow, _>(activities)?
        .into_iter()
        .map(ActivityRow::into_record)
        .collect();
    let conventions = read_rows::<ConventionRow, _>(conventions)?
        .into_iter()
        .map(ConventionRow::into_record)
        .collect();
    let knowledge_transfers = read_rows::<KnowledgeTransferRow, _>(knowledge_transfers)?
        .into_iter()
        .map(KnowledgeTransferRow::into_record)
        .collect();

    Ok(InMemoryReportStore::new(
        activities,
        conventions,
        knowledge_transfers,
    ))
}

fn read_rows<T, R>(reader: R) -> Result<Vec<T>, csv::Error>
where
    T: for<'de> Deserialize<'de>,
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader.deserialize::<T>().collect()
}

#[derive(Debug, Deserialize)]
struct ActivityRow {
    id: String,
    title: String,
    #[serde(default, deserialize_with = "name_list")]
    responsibles: Vec<String>,
    status: StoredActivityStatus,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    description: Option<String>,
    #[serde(deserialize_with = "date")]
    start_date: NaiveDate,
    #[serde(default, deserialize_with = "optional_date")]
    end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    theme_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    program_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    station_id: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    archived: bool,
}

impl ActivityRow {
    fn into_record(self) -> StoredActivity {
        StoredActivity {
            id: self.id,
            title: self.title,
            responsibles: self.responsibles,
            status: self.status,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            keys: record_keys(self.theme_id, self.program_id, self.station_id, self.archived),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConventionRow {
    id: String,
    title: String,
    #[serde(deserialize_with = "date")]
    start_date: NaiveDate,
    #[serde(deserialize_with = "date")]
    end_date: NaiveDate,
    #[serde(default, deserialize_with = "amount")]
    global_amount: f64,
    #[serde(default, deserialize_with = "amount")]
    mobilized_amount: f64,
    #[serde(default, deserialize_with = "name_list")]
    funders: Vec<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    theme_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    program_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    station_id: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    archived: bool,
}

impl ConventionRow {
    fn into_record(self) -> StoredConvention {
        StoredConvention {
            id: self.id,
            title: self.title,
            start_date: self.start_date,
            end_date: self.end_date,
            global_amount: self.global_amount,
            mobilized_amount: self.mobilized_amount,
            funders: self.funders,
            keys: record_keys(self.theme_id, self.program_id, self.station_id, self.archived),
        }
    }
}

#[derive(Debug, Deserialize)]
struct KnowledgeTransferRow {
    id: String,
    title: String,
    #[serde(deserialize_with = "date")]
    availability_date: NaiveDate,
    #[serde(default)]
    description: String,
    #[serde(default)]
    potential_impact: String,
    #[serde(default, deserialize_with = "name_list")]
    audiences: Vec<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    theme_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    program_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    station_id: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    archived: bool,
}

impl KnowledgeTransferRow {
    fn into_record(self) -> StoredKnowledgeTransfer {
        StoredKnowledgeTransfer {
            id: self.id,
            title: self.title,
            availability_date: self.availability_date,
            description: self.description,
            potential_impact: self.potential_impact,
            audiences: self.audiences,
            keys: record_keys(self.theme_id, self.program_id, self.station_id, self.archived),
        }
    }
}

fn record_keys(
    theme_id: Option<String>,
    program_id: Option<String>,
    station_id: Option<String>,
    archived: bool,
) -> RecordKeys {
    RecordKeys {
        theme_id,
        program_id,
        station_id,
        archived,
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

/// `;`-separated names, blanks dropped.
fn name_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect())
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "no" | "non" => Ok(false),
        "true" | "1" | "yes" | "oui" => Ok(true),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean flag, got '{other}'"
        ))),
    }
}

fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

fn date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("failed to parse '{raw}' as a date")))
}

fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match empty_string_as_none(deserializer)? {
        Some(raw) => parse_date(&raw).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("failed to parse '{raw}' as a date"))
        }),
        None => Ok(None),
    }
}

/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps.
fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.naive_utc().date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ACTIVITIES: &str = "\
id,title,responsibles,status,description,start_date,end_date,theme_id,program_id,station_id,archived
a1,Suivi des parcelles,Diallo; Traoré ;,NOUVELLE,,2025-01-15,,th-1,,st-1,
a2,Essais variétaux,Koné,EN_COURS,Essais multi-sites,2024-03-01T08:00:00Z,2025-12-31,th-1,pr-2,,false
a3,Ancienne campagne,Sow,CLOTUREE,,2023-01-01,2023-06-30,,,,oui
";

    const CONVENTIONS: &str = "\
id,title,start_date,end_date,global_amount,mobilized_amount,funders,theme_id,program_id,station_id,archived
c1,Convention FAO,2025-01-01,2026-12-31,150000000,42000000,FAO;Union européenne,,,,
";

    const TRANSFERS: &str = "\
id,title,availability_date,description,potential_impact,audiences,theme_id,program_id,station_id,archived
k1,Fiche technique mil,2025-05-20,Itinéraire cultural,Hausse des rendements,Producteurs;Techniciens,,,,
";

    #[test]
    fn loads_all_three_exports() {
        let store = load_readers(
            Cursor::new(ACTIVITIES),
            Cursor::new(CONVENTIONS),
            Cursor::new(TRANSFERS),
        )
        .expect("csv loads");
        assert_eq!(store.record_counts(), (3, 1, 1));
    }

    #[test]
    fn parses_lists_dates_and_flags() {
        let rows = read_rows::<ActivityRow, _>(Cursor::new(ACTIVITIES)).expect("rows parse");
        let first = rows[0].theme_id.clone();
        let activities: Vec<StoredActivity> =
            rows.into_iter().map(ActivityRow::into_record).collect();

        assert_eq!(first.as_deref(), Some("th-1"));
        assert_eq!(activities[0].responsibles, vec!["Diallo", "Traoré"]);
        assert!(activities[0].end_date.is_none());
        assert_eq!(activities[1].status, StoredActivityStatus::InProgress);
        assert_eq!(
            activities[1].start_date,
            NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date")
        );
        assert!(activities[2].keys.archived);
    }

    #[test]
    fn rejects_unknown_status_codes() {
        let csv = "id,title,responsibles,status,description,start_date,end_date\n\
a1,Test,,PLANIFIEE,,2025-01-01,\n";
        let error = read_rows::<ActivityRow, _>(Cursor::new(csv)).expect_err("bad status");
        assert!(error.to_string().contains("PLANIFIEE"));
    }

    #[test]
    fn missing_directory_reports_path() {
        let error = load_dir("./does-not-exist").expect_err("expected io error");
        match error {
            ReportDataImportError::Io { path, .. } => {
                assert!(path.ends_with(ACTIVITIES_FILE));
            }
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
