use crate::infra::{end_of_day, parse_date, print_json, report_service, start_of_day};
use crate::server;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use report_center::config::AppConfig;
use report_center::error::AppError;
use report_center::reports::{
    AnnualReportInput, GenerateReportInput, InMemoryReportStore, RecordScope, ReportFormat,
    ReportService, ReportType, TransientReport,
};
use report_center::telemetry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "report-center",
    about = "Quarterly and annual reports on research activities, conventions and knowledge transfers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Render a report document to disk
    Report {
        #[command(subcommand)]
        command: ReportCommand,
    },
    /// Print statistics as JSON
    Stats {
        #[command(subcommand)]
        command: StatsCommand,
    },
    /// List the quarters of a year and whether they can hold data yet
    Quarters(QuartersArgs),
    /// Delete generated reports older than the retention window
    Cleanup(DataArgs),
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// One quarter or an explicit date range
    Generate(GenerateArgs),
    /// Composite report for a whole year
    Annual(AnnualArgs),
}

#[derive(Subcommand, Debug)]
enum StatsCommand {
    Quarterly(QuarterlyArgs),
    Annual(AnnualStatsArgs),
    /// Metric-by-metric comparison of two quarters
    Compare(CompareArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct DataArgs {
    /// Directory holding activities.csv, conventions.csv and knowledge_transfers.csv
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) data: DataArgs,
}

#[derive(Args, Debug, Default)]
struct ScopeArgs {
    #[arg(long)]
    theme_id: Option<String>,
    #[arg(long)]
    program_id: Option<String>,
    #[arg(long)]
    station_id: Option<String>,
    /// Include archived records
    #[arg(long)]
    include_archived: bool,
}

impl ScopeArgs {
    fn scope(self) -> RecordScope {
        RecordScope {
            theme_id: self.theme_id,
            program_id: self.program_id,
            station_id: self.station_id,
            include_archived: self.include_archived,
        }
        .normalized()
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportTypeArg {
    Activities,
    Conventions,
    KnowledgeTransfers,
}

impl From<ReportTypeArg> for ReportType {
    fn from(value: ReportTypeArg) -> Self {
        match value {
            ReportTypeArg::Activities => ReportType::Activities,
            ReportTypeArg::Conventions => ReportType::Conventions,
            ReportTypeArg::KnowledgeTransfers => ReportType::KnowledgeTransfers,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    Docx,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Pdf => ReportFormat::Pdf,
            FormatArg::Docx => ReportFormat::Docx,
        }
    }
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[arg(long, value_enum)]
    report_type: ReportTypeArg,
    #[arg(long, value_enum, default_value = "pdf")]
    format: FormatArg,
    #[arg(long)]
    year: i32,
    /// Quarter 1-4; defaults to the current quarter number
    #[arg(long)]
    quarter: Option<u8>,
    /// First day of an explicit range (YYYY-MM-DD); overrides the quarter
    #[arg(long, value_parser = parse_date, requires = "end_date")]
    start_date: Option<NaiveDate>,
    /// Last day of an explicit range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date, requires = "start_date")]
    end_date: Option<NaiveDate>,
    /// Add a status chart to activity reports
    #[arg(long)]
    include_charts: bool,
    /// Leave out the summary figures
    #[arg(long)]
    no_statistics: bool,
    /// Directory the document is written to
    #[arg(long, default_value = ".")]
    output: PathBuf,
    #[command(flatten)]
    scope: ScopeArgs,
    #[command(flatten)]
    data: DataArgs,
}

#[derive(Args, Debug)]
struct AnnualArgs {
    #[arg(long, value_enum)]
    report_type: ReportTypeArg,
    #[arg(long, value_enum, default_value = "pdf")]
    format: FormatArg,
    #[arg(long)]
    year: i32,
    /// Directory the document is written to
    #[arg(long, default_value = ".")]
    output: PathBuf,
    #[command(flatten)]
    scope: ScopeArgs,
    #[command(flatten)]
    data: DataArgs,
}

#[derive(Args, Debug)]
struct QuarterlyArgs {
    #[arg(long)]
    year: i32,
    #[arg(long)]
    quarter: u8,
    #[command(flatten)]
    scope: ScopeArgs,
    #[command(flatten)]
    data: DataArgs,
}

#[derive(Args, Debug)]
struct AnnualStatsArgs {
    #[arg(long)]
    year: i32,
    #[command(flatten)]
    scope: ScopeArgs,
    #[command(flatten)]
    data: DataArgs,
}

#[derive(Args, Debug)]
struct CompareArgs {
    #[arg(long)]
    year1: i32,
    #[arg(long)]
    quarter1: u8,
    #[arg(long)]
    year2: i32,
    #[arg(long)]
    quarter2: u8,
    #[command(flatten)]
    scope: ScopeArgs,
    #[command(flatten)]
    data: DataArgs,
}

#[derive(Args, Debug)]
struct QuartersArgs {
    #[arg(long)]
    year: i32,
    /// Reference day for current/available flags (defaults to today)
    #[arg(long, value_parser = parse_date)]
    today: Option<NaiveDate>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report {
            command: ReportCommand::Generate(args),
        } => generate(args).await,
        Command::Report {
            command: ReportCommand::Annual(args),
        } => annual(args).await,
        Command::Stats { command } => stats(command).await,
        Command::Quarters(args) => {
            let service = offline_service(DataArgs::default())?;
            let today = args.today.unwrap_or_else(|| Local::now().date_naive());
            print_json(&service.available_quarters(args.year, today)?)
        }
        Command::Cleanup(args) => {
            let service = offline_service(args)?;
            print_json(&service.clean_old_reports().await?)
        }
    }
}

/// Same configuration as the server, without binding a socket.
fn offline_service(
    data: DataArgs,
) -> Result<Arc<ReportService<InMemoryReportStore>>, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(data_dir) = data.data_dir {
        config.reports.data_dir = Some(data_dir);
    }
    telemetry::init(&config.telemetry)?;
    report_service(&config.reports)
}

async fn generate(args: GenerateArgs) -> Result<(), AppError> {
    let service = offline_service(args.data)?;
    let scope = args.scope.scope();
    let input = GenerateReportInput {
        report_type: args.report_type.into(),
        format: args.format.into(),
        year: args.year,
        quarter: args.quarter,
        start_date: args.start_date.map(start_of_day),
        end_date: args.end_date.map(end_of_day),
        theme_id: scope.theme_id,
        program_id: scope.program_id,
        station_id: scope.station_id,
        include_archived: scope.include_archived,
        include_charts: args.include_charts,
        include_statistics: !args.no_statistics,
    };
    let report = service.generate_report(input).await?;
    keep(report, &args.output)
}

async fn annual(args: AnnualArgs) -> Result<(), AppError> {
    let service = offline_service(args.data)?;
    let scope = args.scope.scope();
    let input = AnnualReportInput {
        report_type: args.report_type.into(),
        format: args.format.into(),
        year: args.year,
        theme_id: scope.theme_id,
        program_id: scope.program_id,
        station_id: scope.station_id,
        include_archived: scope.include_archived,
    };
    let report = service.generate_annual_report(input).await?;
    keep(report, &args.output)
}

async fn stats(command: StatsCommand) -> Result<(), AppError> {
    match command {
        StatsCommand::Quarterly(args) => {
            let service = offline_service(args.data)?;
            let statistics = service
                .quarterly_statistics(args.year, args.quarter, &args.scope.scope())
                .await?;
            print_json(&statistics)
        }
        StatsCommand::Annual(args) => {
            let service = offline_service(args.data)?;
            let statistics = service
                .annual_statistics(args.year, &args.scope.scope())
                .await?;
            print_json(&statistics)
        }
        StatsCommand::Compare(args) => {
            let service = offline_service(args.data)?;
            let comparison = service
                .compare_quarters(
                    (args.year1, args.quarter1),
                    (args.year2, args.quarter2),
                    &args.scope.scope(),
                )
                .await?;
            print_json(&comparison)
        }
    }
}

fn keep(report: TransientReport, output: &Path) -> Result<(), AppError> {
    std::fs::create_dir_all(output)?;
    let destination = output.join(report.file_name());
    let kept = report.persist(&destination)?;
    println!("{}", kept.display());
    Ok(())
}
