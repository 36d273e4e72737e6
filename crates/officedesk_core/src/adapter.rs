//! REST row adapter.
//!
//! # Responsibility
//! - Map kind-specific REST rows (`due_date`, `expiry_date`, `valid_upto`,
//!   ...) onto `TemporalRecord`, and attendance register rows onto
//!   `PunchRecord`.
//! - Parse dates here so nothing downstream sees raw date strings.
//!
//! # Invariants
//! - Per-row anomalies never fail the batch: non-object rows are skipped and
//!   counted, missing ids are synthesized, malformed dates become
//!   `ReferenceDate::Invalid` or `PunchTime::Invalid`.
//! - Only a payload that is not a row list at all is an error.

use crate::attendance::{PunchRecord, PunchTime};
use crate::model::kind::EntityKind;
use crate::model::record::{ReferenceDate, TemporalRecord};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ID_FIELD: &str = "id";
const STATUS_FIELD: &str = "status";
const DATA_ENVELOPE_FIELD: &str = "data";
const PUNCH_DAY_FIELDS: &[&str] = &["day", "date"];
const PUNCH_IN_FIELD: &str = "punch_in";
const PUNCH_OUT_FIELD: &str = "punch_out";
const LABEL_FIELDS: &[&str] = &["title", "name", "holder_name", "client_name", "document_name"];

/// Field names read for one entity kind, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub reference_fields: &'static [&'static str],
    pub secondary_fields: &'static [&'static str],
}

/// REST field mapping for `kind`.
pub fn field_mapping(kind: EntityKind) -> FieldMapping {
    match kind {
        EntityKind::Task | EntityKind::DueDate => FieldMapping {
            reference_fields: &["due_date"],
            secondary_fields: &["created_at"],
        },
        EntityKind::DscCertificate | EntityKind::Document => FieldMapping {
            reference_fields: &["expiry_date", "valid_upto"],
            secondary_fields: &["issue_date"],
        },
    }
}

/// Adapted rows plus the number of rows that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptOutcome {
    pub records: Vec<TemporalRecord>,
    pub skipped: usize,
}

/// Adapts a REST payload (row array or `{ "data": [...] }`).
///
/// # Errors
/// - `UnexpectedShape` when the payload holds no row array.
pub fn adapt_records(kind: EntityKind, payload: &Value) -> Result<AdaptOutcome, AdapterError> {
    let rows = row_list(payload)?;
    let mapping = field_mapping(kind);
    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for (index, row) in rows.iter().enumerate() {
        match row {
            Value::Object(object) => records.push(adapt_row(kind, mapping, index, object)),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(
            "event=adapt_records module=adapter status=degraded kind={} skipped={}",
            kind, skipped
        );
    }
    debug!(
        "event=adapt_records module=adapter status=ok kind={} records={}",
        kind,
        records.len()
    );
    Ok(AdaptOutcome { records, skipped })
}

/// Attendance rows plus the number of rows that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunchOutcome {
    pub records: Vec<PunchRecord>,
    pub skipped: usize,
}

/// Adapts an attendance register payload (row array or `{ "data": [...] }`).
///
/// Reads `day` (or `date`), `punch_in` and `punch_out`. Malformed punches are
/// kept as `PunchTime::Invalid` so one bad row never fails the register.
///
/// # Errors
/// - `UnexpectedShape` when the payload holds no row array.
pub fn adapt_punches(payload: &Value) -> Result<PunchOutcome, AdapterError> {
    let rows = row_list(payload)?;
    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for (index, row) in rows.iter().enumerate() {
        match row {
            Value::Object(object) => records.push(PunchRecord {
                id: row_id(object, index),
                day: reference_date_from(object, PUNCH_DAY_FIELDS),
                punch_in: punch_time_from(object, PUNCH_IN_FIELD),
                punch_out: punch_time_from(object, PUNCH_OUT_FIELD),
            }),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(
            "event=adapt_punches module=adapter status=degraded skipped={}",
            skipped
        );
    }
    debug!(
        "event=adapt_punches module=adapter status=ok records={}",
        records.len()
    );
    Ok(PunchOutcome { records, skipped })
}

fn row_list(payload: &Value) -> Result<&Vec<Value>, AdapterError> {
    match payload {
        Value::Array(rows) => Ok(rows),
        Value::Object(object) => match object.get(DATA_ENVELOPE_FIELD) {
            Some(Value::Array(rows)) => Ok(rows),
            _ => Err(AdapterError::UnexpectedShape(shape_name(payload))),
        },
        other => Err(AdapterError::UnexpectedShape(shape_name(other))),
    }
}

fn row_id(object: &Map<String, Value>, index: usize) -> String {
    match object.get(ID_FIELD) {
        Some(Value::String(value)) if !value.trim().is_empty() => value.trim().to_string(),
        Some(Value::Number(value)) => value.to_string(),
        _ => format!("row-{index}"),
    }
}

fn punch_time_from(object: &Map<String, Value>, field: &str) -> PunchTime {
    match object.get(field) {
        None | Some(Value::Null) => PunchTime::Missing,
        Some(Value::String(value)) => PunchTime::parse(Some(value.as_str())),
        Some(other) => PunchTime::Invalid(other.to_string()),
    }
}

fn adapt_row(
    kind: EntityKind,
    mapping: FieldMapping,
    index: usize,
    object: &Map<String, Value>,
) -> TemporalRecord {
    let mut record = TemporalRecord::new(row_id(object, index), kind);
    record.label = first_text(object, LABEL_FIELDS).unwrap_or_default().to_string();
    record.explicit_status = first_text(object, &[STATUS_FIELD]).map(str::to_string);
    record.reference_date = reference_date_from(object, mapping.reference_fields);
    record.secondary_date = reference_date_from(object, mapping.secondary_fields).as_date();
    record
}

/// First non-blank string among `fields`.
fn first_text<'v>(object: &'v Map<String, Value>, fields: &[&str]) -> Option<&'v str> {
    fields.iter().find_map(|field| match object.get(*field) {
        Some(Value::String(value)) if !value.trim().is_empty() => Some(value.as_str()),
        _ => None,
    })
}

/// First present date field; a later field is only consulted when earlier
/// ones are absent, null or blank.
fn reference_date_from(object: &Map<String, Value>, fields: &[&str]) -> ReferenceDate {
    for field in fields {
        match object.get(*field) {
            None | Some(Value::Null) => continue,
            Some(Value::String(value)) => match ReferenceDate::parse(Some(value.as_str())) {
                ReferenceDate::Missing => continue,
                parsed => return parsed,
            },
            Some(other) => return ReferenceDate::Invalid(other.to_string()),
        }
    }
    ReferenceDate::Missing
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Payload-level adapter errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    UnexpectedShape(&'static str),
}

impl Display for AdapterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedShape(shape) => write!(
                f,
                "expected a row array or an object with a `data` array, got {shape}"
            ),
        }
    }
}

impl Error for AdapterError {}
