use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use report_center::config::ReportsConfig;
use report_center::error::AppError;
use report_center::reports::store::load_dir;
use report_center::reports::{DocumentGenerator, InMemoryReportStore, ReportService, UploadsDir};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// CSV exports when a data directory is configured, an empty store otherwise.
pub(crate) fn open_store(data_dir: Option<&Path>) -> Result<InMemoryReportStore, AppError> {
    match data_dir {
        Some(dir) => {
            let store = load_dir(dir)?;
            let (activities, conventions, knowledge_transfers) = store.record_counts();
            info!(
                data_dir = %dir.display(),
                activities,
                conventions,
                knowledge_transfers,
                "report data loaded"
            );
            Ok(store)
        }
        None => {
            warn!("no report data directory configured; serving an empty store");
            Ok(InMemoryReportStore::default())
        }
    }
}

pub(crate) fn report_service(
    config: &ReportsConfig,
) -> Result<Arc<ReportService<InMemoryReportStore>>, AppError> {
    let store = open_store(config.data_dir.as_deref())?;
    let uploads = UploadsDir::init(&config.uploads_dir)?;
    let generator = DocumentGenerator::new(
        uploads,
        config.organization.clone(),
        config.currency.clone(),
    );
    Ok(Arc::new(
        ReportService::new(Arc::new(store), generator).with_retention(config.retention),
    ))
}

/// Sweeps the uploads directory at startup and then every `every`.
pub(crate) fn spawn_cleanup(
    service: Arc<ReportService<InMemoryReportStore>>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(err) = service.clean_old_reports().await {
                warn!(operation = "clean_old_reports", error = %err, "scheduled cleanup failed");
            }
        }
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub(crate) fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(23, 59, 59)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN))
        .and_utc()
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).map_err(io::Error::from)?;
    writeln!(out)?;
    Ok(())
}
