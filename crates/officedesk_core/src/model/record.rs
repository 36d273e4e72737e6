//! Temporal record model.
//!
//! # Responsibility
//! - Define the `TemporalEntity` seam the classifier reads through.
//! - Provide `TemporalRecord`, the canonical concrete record every list page
//!   projects onto.
//! - Parse reference dates once, at the boundary, into `ReferenceDate`.
//!
//! # Invariants
//! - A malformed date never becomes a sentinel date; it is kept as
//!   `ReferenceDate::Invalid` and classified like a missing date.
//! - Deserializing a reference date never fails.

use crate::model::kind::EntityKind;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Read-only view of a record subject to lifecycle classification.
pub trait TemporalEntity {
    /// Opaque unique identifier.
    fn entity_id(&self) -> &str;
    /// Human-set status such as `pending` or `completed`.
    fn explicit_status(&self) -> Option<&str>;
    /// Date the classification is computed against.
    fn reference_date(&self) -> &ReferenceDate;
    /// Free text used by view search; empty when the record has no title.
    fn display_label(&self) -> &str {
        ""
    }
}

/// Parsed reference date with explicit absent/malformed states.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReferenceDate {
    Date(NaiveDate),
    #[default]
    Missing,
    /// Raw input that failed to parse.
    Invalid(String),
}

impl ReferenceDate {
    /// Parses optional raw input. Blank input counts as missing.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Missing,
            Some(value) if value.trim().is_empty() => Self::Missing,
            Some(value) => match parse_reference_date(value) {
                Ok(date) => Self::Date(date),
                Err(err) => Self::Invalid(err.raw),
            },
        }
    }

    /// Returns the calendar date when one was parsed.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Missing | Self::Invalid(_) => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}

impl From<NaiveDate> for ReferenceDate {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Option<NaiveDate>> for ReferenceDate {
    fn from(value: Option<NaiveDate>) -> Self {
        value.map_or(Self::Missing, Self::Date)
    }
}

impl Serialize for ReferenceDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Date(date) => {
                serializer.serialize_str(&date.format(ISO_DATE_FORMAT).to_string())
            }
            Self::Missing => serializer.serialize_none(),
            Self::Invalid(raw) => serializer.serialize_str(raw),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawReferenceDate {
    Text(String),
    Null(()),
    Other(IgnoredAny),
}

impl<'de> Deserialize<'de> for ReferenceDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawReferenceDate::deserialize(deserializer)? {
            RawReferenceDate::Text(value) => Self::parse(Some(value.as_str())),
            RawReferenceDate::Null(()) => Self::Missing,
            RawReferenceDate::Other(_) => Self::Invalid("<non-string value>".to_string()),
        })
    }
}

/// Reference date input that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidReferenceDate {
    pub raw: String,
}

impl Display for InvalidReferenceDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid reference date: `{}`", self.raw)
    }
}

impl Error for InvalidReferenceDate {}

/// Strictly parses an ISO-8601 date or date-time into a local calendar date.
///
/// Accepts `YYYY-MM-DD`, naive date-times (`T` or space separated) and
/// RFC 3339 timestamps. Offset-bearing timestamps are converted to the local
/// time zone first, so both sides of `days_between` share one frame; naive
/// and date-only input is kept as written.
///
/// # Errors
/// - Returns `InvalidReferenceDate` for blank or unrecognized input.
pub fn parse_reference_date(raw: &str) -> Result<NaiveDate, InvalidReferenceDate> {
    parse_reference_date_in(raw, &Local)
}

/// Same as [`parse_reference_date`], converting offset timestamps into `tz`.
pub fn parse_reference_date_in<Tz: TimeZone>(
    raw: &str,
    tz: &Tz,
) -> Result<NaiveDate, InvalidReferenceDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT) {
        return Ok(date);
    }
    parse_date_time_in(trimmed, tz)
        .map(|value| value.date())
        .ok_or_else(|| InvalidReferenceDate {
            raw: raw.to_string(),
        })
}

/// Parses a naive or RFC 3339 date-time into wall-clock time of `tz`.
///
/// Naive input is taken as already being in `tz`. Returns `None` for blank
/// or unrecognized input.
pub fn parse_date_time_in<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(timestamp.with_timezone(tz).naive_local());
    }
    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

/// Normalizes a human-set status for comparisons.
///
/// Returns `None` for blank values.
pub fn normalize_status(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_ascii_lowercase())
}

/// Canonical record for task/DSC/document/due-date projections.
///
/// Kind-specific REST fields are mapped onto this one shape by the adapter,
/// so the classifier never branches on where a date came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalRecord {
    pub id: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub explicit_status: Option<String>,
    #[serde(default)]
    pub reference_date: ReferenceDate,
    /// Display-only date (issue date, creation date).
    #[serde(default)]
    pub secondary_date: Option<NaiveDate>,
}

impl TemporalRecord {
    /// Creates a record with no status, label or dates.
    pub fn new(id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            kind,
            label: String::new(),
            explicit_status: None,
            reference_date: ReferenceDate::Missing,
            secondary_date: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.explicit_status = Some(status.into());
        self
    }

    pub fn with_reference_date(mut self, reference_date: impl Into<ReferenceDate>) -> Self {
        self.reference_date = reference_date.into();
        self
    }

    pub fn with_secondary_date(mut self, secondary_date: NaiveDate) -> Self {
        self.secondary_date = Some(secondary_date);
        self
    }
}

impl TemporalEntity for TemporalRecord {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn explicit_status(&self) -> Option<&str> {
        self.explicit_status.as_deref()
    }

    fn reference_date(&self) -> &ReferenceDate {
        &self.reference_date
    }

    fn display_label(&self) -> &str {
        &self.label
    }
}
