//! Attendance punch-clock completeness.
//!
//! # Responsibility
//! - Classify one day's punch pair as complete, still open, missing its
//!   punch-out, absent or inconsistent.
//! - Summarize worked time across a register page.
//!
//! # Invariants
//! - A punch-out earlier than its punch-in is `Inconsistent`, never a
//!   negative duration.
//! - An unparsable punch is kept as `PunchTime::Invalid` and classified
//!   `Inconsistent`; deserializing a punch never fails.
//! - An open punch is only `MissingPunchOut` once its day has passed; the
//!   current day and later days report `Open`.

use crate::model::record::{parse_date_time_in, ReferenceDate};
use chrono::{Local, NaiveDate, NaiveDateTime};
use log::warn;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One punch timestamp with explicit absent/malformed states.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PunchTime {
    At(NaiveDateTime),
    #[default]
    Missing,
    /// Raw input that failed to parse.
    Invalid(String),
}

impl PunchTime {
    /// Parses optional raw input in local time. Blank input counts as missing.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Missing,
            Some(value) if value.trim().is_empty() => Self::Missing,
            Some(value) => match parse_date_time_in(value, &Local) {
                Some(at) => Self::At(at),
                None => Self::Invalid(value.to_string()),
            },
        }
    }

    pub fn as_date_time(&self) -> Option<NaiveDateTime> {
        match self {
            Self::At(at) => Some(*at),
            Self::Missing | Self::Invalid(_) => None,
        }
    }
}

impl From<NaiveDateTime> for PunchTime {
    fn from(value: NaiveDateTime) -> Self {
        Self::At(value)
    }
}

impl From<Option<NaiveDateTime>> for PunchTime {
    fn from(value: Option<NaiveDateTime>) -> Self {
        value.map_or(Self::Missing, Self::At)
    }
}

impl Serialize for PunchTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::At(at) => serializer.serialize_str(&at.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Self::Missing => serializer.serialize_none(),
            Self::Invalid(raw) => serializer.serialize_str(raw),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPunchTime {
    Text(String),
    Null(()),
    Other(IgnoredAny),
}

impl<'de> Deserialize<'de> for PunchTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawPunchTime::deserialize(deserializer)? {
            RawPunchTime::Text(value) => Self::parse(Some(value.as_str())),
            RawPunchTime::Null(()) => Self::Missing,
            RawPunchTime::Other(_) => Self::Invalid("<non-string value>".to_string()),
        })
    }
}

/// One employee-day from the attendance register.
///
/// `day` falls back to the punch-in date when it is missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub day: ReferenceDate,
    #[serde(default)]
    pub punch_in: PunchTime,
    #[serde(default)]
    pub punch_out: PunchTime,
}

impl PunchRecord {
    /// Register day, or the punch-in date when the day is unusable.
    pub fn effective_day(&self) -> Option<NaiveDate> {
        self.day
            .as_date()
            .or_else(|| self.punch_in.as_date_time().map(|at| at.date()))
    }
}

/// Completeness of one punch pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PunchState {
    Complete { worked_minutes: i64 },
    Open,
    MissingPunchOut,
    Absent,
    Inconsistent,
}

/// Classifies one punch pair against `now`.
pub fn classify_punch(record: &PunchRecord, now: NaiveDateTime) -> PunchState {
    match (&record.punch_in, &record.punch_out) {
        (PunchTime::Invalid(_), _) | (_, PunchTime::Invalid(_)) => PunchState::Inconsistent,
        (PunchTime::Missing, PunchTime::Missing) => PunchState::Absent,
        (PunchTime::Missing, PunchTime::At(_)) => PunchState::Inconsistent,
        (PunchTime::At(punch_in), PunchTime::At(punch_out)) if punch_out < punch_in => {
            PunchState::Inconsistent
        }
        (PunchTime::At(punch_in), PunchTime::At(punch_out)) => PunchState::Complete {
            worked_minutes: punch_out.signed_duration_since(*punch_in).num_minutes(),
        },
        (PunchTime::At(punch_in), PunchTime::Missing) => {
            let day = record.day.as_date().unwrap_or_else(|| punch_in.date());
            if day >= now.date() {
                PunchState::Open
            } else {
                PunchState::MissingPunchOut
            }
        }
    }
}

/// Formats minutes as `8h 05m`. Negative input renders as zero.
pub fn format_worked_duration(minutes: i64) -> String {
    let minutes = minutes.max(0);
    format!("{}h {:02}m", minutes / 60, minutes % 60)
}

/// Per-state counts for a register page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub complete: usize,
    pub open: usize,
    pub missing_punch_out: usize,
    pub absent: usize,
    pub inconsistent: usize,
    pub total_worked_minutes: i64,
    pub total_worked: String,
}

/// Summarizes a register page against `now`.
pub fn summarize_attendance(records: &[PunchRecord], now: NaiveDateTime) -> AttendanceSummary {
    let mut summary = AttendanceSummary::default();
    for record in records {
        match classify_punch(record, now) {
            PunchState::Complete { worked_minutes } => {
                summary.complete += 1;
                summary.total_worked_minutes += worked_minutes;
            }
            PunchState::Open => summary.open += 1,
            PunchState::MissingPunchOut => summary.missing_punch_out += 1,
            PunchState::Absent => summary.absent += 1,
            PunchState::Inconsistent => summary.inconsistent += 1,
        }
    }
    if summary.inconsistent > 0 {
        warn!(
            "event=summarize_attendance module=attendance status=degraded inconsistent={}",
            summary.inconsistent
        );
    }
    summary.total_worked = format_worked_duration(summary.total_worked_minutes);
    summary
}
