//! `officedesk` command-line entry point.
//!
//! # Responsibility
//! - Feed REST-shaped JSON exports through the core classifier and print the
//!   bucketed view model the list pages render.
//! - Keep output deterministic (`--today`) for local checks and fixtures.
//!
//! ## Commands
//!
//! - `version`: print core linkage probe
//! - `kinds`: print the active rule table
//! - `summarize`: bucket one list page export
//! - `attendance`: summarize an attendance register export

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use log::info;
use officedesk_core::{
    adapt_punches, adapt_records, aggregate_with_clock, default_log_level, init_logging,
    load_rule_table, parse_entity_kind, select_page, summarize_attendance, tally_by_status,
    AggregateView, AttendanceSummary, Clock, FixedClock, RuleTable, StatusTally, SystemClock,
    TemporalEntity, ViewQuery,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "officedesk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deadline and expiry status for office list pages", long_about = None)]
struct Cli {
    /// Directory for rolling log files (logging stays off when omitted)
    #[arg(long, global = true, env = "OFFICEDESK_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true, env = "OFFICEDESK_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core version and linkage probe
    Version,

    /// Print the active rule table as JSON
    Kinds {
        /// Rule table JSON file (default: built-in thresholds)
        #[arg(long, env = "OFFICEDESK_RULES")]
        rules: Option<PathBuf>,
    },

    /// Bucket one list page export and print the view model
    Summarize {
        /// Entity kind: task|dsc_certificate|document|due_date
        #[arg(short, long)]
        kind: String,

        /// REST export (row array or `{ "data": [...] }`)
        #[arg(short, long)]
        input: PathBuf,

        /// Rule table JSON file (default: built-in thresholds)
        #[arg(long, env = "OFFICEDESK_RULES")]
        rules: Option<PathBuf>,

        /// Classify as of this date (YYYY-MM-DD) instead of the wall clock
        #[arg(long)]
        today: Option<String>,

        /// Only rows in this bucket (label such as EXPIRED, or key id)
        #[arg(long)]
        bucket: Option<String>,

        /// Only rows with this explicit status
        #[arg(long)]
        status: Option<String>,

        /// Only rows whose label or id contains this text
        #[arg(long)]
        search: Option<String>,

        /// Page size
        #[arg(long)]
        limit: Option<u32>,

        /// Rows to skip
        #[arg(long, default_value = "0")]
        offset: u32,
    },

    /// Summarize an attendance register export
    Attendance {
        /// Punch rows (`[{ "id", "day", "punch_in", "punch_out" }]` or `{ "data": [...] }`)
        #[arg(short, long)]
        input: PathBuf,

        /// Summarize as of this date (YYYY-MM-DD) instead of the wall clock
        #[arg(long)]
        today: Option<String>,
    },
}

#[derive(Serialize)]
struct SummaryOutput {
    view: AggregateView,
    status_tabs: Vec<StatusTally>,
    skipped_rows: usize,
    page: PageOutput,
}

#[derive(Serialize)]
struct PageOutput {
    total_matches: usize,
    applied_limit: u32,
    offset: u32,
    rows: Vec<RowOutput>,
}

#[derive(Serialize)]
struct RowOutput {
    id: String,
    label: String,
    status: Option<String>,
    bucket: String,
    days_remaining: Option<i64>,
}

#[derive(Serialize)]
struct AttendanceOutput {
    #[serde(flatten)]
    summary: AttendanceSummary,
    skipped_rows: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Some(log_dir) = cli.log_dir.as_deref() {
        start_logging(log_dir, cli.log_level.as_deref())?;
    }

    match cli.command {
        Commands::Version => {
            println!("officedesk_core ping={}", officedesk_core::ping());
            println!("officedesk_core version={}", officedesk_core::core_version());
        }
        Commands::Kinds { rules } => {
            let table = resolve_rule_table(rules.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&table.to_document())?);
        }
        Commands::Summarize {
            kind,
            input,
            rules,
            today,
            bucket,
            status,
            search,
            limit,
            offset,
        } => {
            let table = resolve_rule_table(rules.as_deref())?;
            let clock = resolve_clock(today.as_deref())?;
            let output = summarize(
                &table,
                &kind,
                &input,
                clock.as_ref(),
                SummaryFilters {
                    bucket,
                    status,
                    search,
                    limit,
                    offset,
                },
            )?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Attendance { input, today } => {
            let clock = resolve_clock(today.as_deref())?;
            let output = attendance(&input, clock.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

struct SummaryFilters {
    bucket: Option<String>,
    status: Option<String>,
    search: Option<String>,
    limit: Option<u32>,
    offset: u32,
}

fn summarize(
    table: &RuleTable,
    kind: &str,
    input: &Path,
    clock: &dyn Clock,
    filters: SummaryFilters,
) -> Result<SummaryOutput> {
    // Rule set and bucket filter are resolved before any row is read.
    let kind = parse_entity_kind(kind)?;
    let rule_set = table.get(kind)?;
    let bucket = match filters.bucket.as_deref() {
        Some(raw) => Some(
            rule_set
                .labels()
                .resolve(raw)
                .with_context(|| format!("unknown bucket `{raw}` for {kind}"))?,
        ),
        None => None,
    };

    let payload: serde_json::Value = serde_json::from_str(&read_input(input)?)
        .with_context(|| format!("invalid JSON in {}", input.display()))?;
    let outcome = adapt_records(kind, &payload)?;
    let aggregation = aggregate_with_clock(&outcome.records, rule_set, clock);

    let query = ViewQuery {
        bucket,
        status: filters.status,
        text: filters.search,
        limit: filters.limit,
        offset: filters.offset,
    };
    let page = select_page(&aggregation, &query);
    let rows = page
        .items
        .iter()
        .map(|row| RowOutput {
            id: row.entity.entity_id().to_string(),
            label: row.entity.display_label().to_string(),
            status: row.entity.explicit_status().map(str::to_string),
            bucket: rule_set.labels().label(row.bucket.key()).to_string(),
            days_remaining: row.bucket.days_remaining(),
        })
        .collect();

    info!(
        "event=summarize module=cli status=ok kind={} rows={} skipped={}",
        kind,
        aggregation.total(),
        outcome.skipped
    );

    Ok(SummaryOutput {
        view: aggregation.to_view(),
        status_tabs: tally_by_status(&outcome.records),
        skipped_rows: outcome.skipped,
        page: PageOutput {
            total_matches: page.total_matches,
            applied_limit: page.applied_limit,
            offset: page.offset,
            rows,
        },
    })
}

fn attendance(input: &Path, clock: &dyn Clock) -> Result<AttendanceOutput> {
    let payload: serde_json::Value = serde_json::from_str(&read_input(input)?)
        .with_context(|| format!("invalid JSON in {}", input.display()))?;
    let outcome = adapt_punches(&payload)?;
    let summary = summarize_attendance(&outcome.records, clock.now());

    info!(
        "event=attendance module=cli status=ok rows={} skipped={}",
        outcome.records.len(),
        outcome.skipped
    );

    Ok(AttendanceOutput {
        summary,
        skipped_rows: outcome.skipped,
    })
}

fn start_logging(log_dir: &Path, level: Option<&str>) -> Result<()> {
    let absolute = if log_dir.is_absolute() {
        log_dir.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to resolve current directory")?
            .join(log_dir)
    };
    let dir = absolute
        .to_str()
        .with_context(|| format!("log dir is not valid UTF-8: {}", absolute.display()))?;
    init_logging(level.unwrap_or(default_log_level()), dir)?;
    Ok(())
}

fn resolve_rule_table(path: Option<&Path>) -> Result<RuleTable> {
    match path {
        Some(path) => Ok(load_rule_table(path)?),
        None => Ok(RuleTable::standard()),
    }
}

fn resolve_clock(today: Option<&str>) -> Result<Box<dyn Clock>> {
    match today {
        Some(raw) => Ok(Box::new(FixedClock::new(parse_today(raw)?))),
        None => Ok(Box::new(SystemClock)),
    }
}

fn parse_today(raw: &str) -> Result<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("--today must be YYYY-MM-DD, got `{raw}`"))?;
    Ok(date.and_time(chrono::NaiveTime::MIN))
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{attendance, parse_today, start_logging, summarize, SummaryFilters};
    use chrono::NaiveDate;
    use officedesk_core::{default_log_level, logging_status, FixedClock, RuleTable};
    use std::io::Write;

    fn filters() -> SummaryFilters {
        SummaryFilters {
            bucket: None,
            status: None,
            search: None,
            limit: None,
            offset: 0,
        }
    }

    fn export(rows: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(rows.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_today_pins_midnight() {
        let parsed = parse_today(" 2025-06-01 ").unwrap();
        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2025, 6, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
        assert!(parse_today("01-06-2025").is_err());
    }

    #[test]
    fn summarize_buckets_dsc_export() {
        let file = export(
            r#"{ "data": [
                { "id": 1, "holder_name": "A", "status": "IN", "expiry_date": "2025-05-30" },
                { "id": 2, "holder_name": "B", "status": "OUT", "expiry_date": "2025-06-03" },
                { "id": 3, "holder_name": "C", "status": "IN", "valid_upto": "2025-06-20" },
                { "id": 4, "holder_name": "D", "status": "IN", "expiry_date": "2025-08-01" }
            ] }"#,
        );
        let clock = FixedClock::new(parse_today("2025-06-01").unwrap());

        let mut wanted = filters();
        wanted.bucket = Some("due_soon".to_string());
        let output = summarize(
            &RuleTable::standard(),
            "dsc_certificate",
            file.path(),
            &clock,
            wanted,
        )
        .unwrap();

        assert_eq!(output.view.counts["EXPIRED"], 1);
        assert_eq!(output.view.counts["DUE_SOON"], 2);
        assert_eq!(output.view.counts["ACTIVE"], 1);
        assert_eq!(output.page.total_matches, 2);
        assert_eq!(output.page.rows[0].id, "2");
        assert_eq!(output.page.rows[0].days_remaining, Some(2));
        assert_eq!(output.status_tabs[0].status, "in");
        assert_eq!(output.status_tabs[0].count, 3);
    }

    #[test]
    fn attendance_survives_a_malformed_row() {
        let file = export(
            r#"[
                { "id": "e1", "day": "2025-06-02", "punch_in": "2025-06-02T09:00:00", "punch_out": "2025-06-02T17:30:00" },
                { "id": "e2", "day": "2025-06-02", "punch_in": "2025-06-02T03:30:00Z" },
                { "id": "e3", "day": "2025-06-02", "punch_in": "late", "punch_out": "2025-06-02T18:00:00" },
                42
            ]"#,
        );
        let clock = FixedClock::new(parse_today("2025-06-03").unwrap());

        let output = attendance(file.path(), &clock).unwrap();
        assert_eq!(output.skipped_rows, 1);
        assert_eq!(output.summary.complete, 1);
        assert_eq!(output.summary.missing_punch_out, 1);
        assert_eq!(output.summary.inconsistent, 1);
        assert_eq!(output.summary.total_worked, "8h 30m");

        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["complete"], 1);
        assert_eq!(json["skipped_rows"], 1);
    }

    #[test]
    fn start_logging_uses_default_level_when_unset() {
        let dir = tempfile::tempdir().unwrap();
        start_logging(dir.path(), None).unwrap();

        let (level, log_dir) = logging_status().unwrap();
        assert_eq!(level, default_log_level());
        assert_eq!(log_dir, dir.path());
    }

    #[test]
    fn summarize_fails_before_reading_for_unconfigured_kind() {
        let table = RuleTable::from_json_str(
            r#"{ "rule_sets": [ { "kind": "task", "window": { "single": { "days": 7 } } } ] }"#,
        )
        .unwrap();
        let clock = FixedClock::new(parse_today("2025-06-01").unwrap());
        let missing = std::path::Path::new("/nonexistent/officedesk-export.json");

        let err = summarize(&table, "document", missing, &clock, filters())
            .err()
            .expect("unconfigured kind must fail");
        assert!(err.to_string().contains("no rule set configured"));

        let err = summarize(&table, "payroll", missing, &clock, filters())
            .err()
            .expect("unknown kind must fail");
        assert!(err.to_string().contains("unknown entity kind"));
    }
}
