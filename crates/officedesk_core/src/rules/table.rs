//! Rule table: the registry of per-kind rule sets.
//!
//! # Responsibility
//! - Provide the standard thresholds used by the office list pages.
//! - Load operator overrides from a JSON rule-table document.
//!
//! # Invariants
//! - At most one rule set per `EntityKind`.
//! - Every registered rule set has passed `RuleSet::validate()`.
//! - Lookups of unconfigured kinds return `UnknownEntityKind`; callers do
//!   this once while wiring a page, not per entity.

use crate::model::kind::EntityKind;
use crate::rules::rule_set::{
    RuleSet, RuleSetConfig, RuleSetValidationError, WarningWindow,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Task deadline window in days.
pub const TASK_WINDOW_DAYS: u32 = 7;
/// Due-date (compliance calendar) window in days.
pub const DUE_DATE_WINDOW_DAYS: u32 = 7;
/// Critical ("red") band for certificates and documents.
pub const EXPIRY_CRITICAL_DAYS: u32 = 7;
/// Warning ("yellow") band for certificates and documents.
pub const EXPIRY_WARNING_DAYS: u32 = 30;

/// Rule table document shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleTableDocument {
    pub rule_sets: Vec<RuleSetConfig>,
}

/// Registry of rule sets keyed by entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleTable {
    rule_sets: BTreeMap<EntityKind, RuleSet>,
}

impl RuleTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard thresholds for all four list pages.
    pub fn standard() -> Self {
        let expiry = WarningWindow::Tiered {
            critical_days: EXPIRY_CRITICAL_DAYS,
            warning_days: EXPIRY_WARNING_DAYS,
        };
        let rule_sets = [
            RuleSet::new(
                EntityKind::Task,
                WarningWindow::Single {
                    days: TASK_WINDOW_DAYS,
                },
            )
            .with_terminal_statuses(["completed"]),
            RuleSet::new(
                EntityKind::DueDate,
                WarningWindow::Single {
                    days: DUE_DATE_WINDOW_DAYS,
                },
            )
            .with_terminal_statuses(["completed", "filed"]),
            RuleSet::new(EntityKind::DscCertificate, expiry),
            RuleSet::new(EntityKind::Document, expiry),
        ];

        Self {
            rule_sets: rule_sets
                .into_iter()
                .map(|rule_set| (rule_set.kind(), rule_set))
                .collect(),
        }
    }

    /// Registers one validated rule set.
    pub fn register(&mut self, rule_set: RuleSet) -> Result<(), RuleTableError> {
        let kind = rule_set.kind();
        rule_set
            .validate()
            .map_err(|source| RuleTableError::Invalid { kind, source })?;
        if self.rule_sets.contains_key(&kind) {
            return Err(RuleTableError::DuplicateKind(kind));
        }
        self.rule_sets.insert(kind, rule_set);
        Ok(())
    }

    /// Returns the rule set for `kind`.
    ///
    /// # Errors
    /// - `UnknownEntityKind` when no rule set is configured for `kind`.
    pub fn get(&self, kind: EntityKind) -> Result<&RuleSet, RuleTableError> {
        self.rule_sets
            .get(&kind)
            .ok_or(RuleTableError::UnknownEntityKind(kind))
    }

    /// Configured kinds in sorted order.
    pub fn kinds(&self) -> Vec<EntityKind> {
        self.rule_sets.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleSet> {
        self.rule_sets.values()
    }

    pub fn len(&self) -> usize {
        self.rule_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rule_sets.is_empty()
    }

    /// Builds a table from a rule-table document.
    pub fn from_document(document: RuleTableDocument) -> Result<Self, RuleTableError> {
        if document.rule_sets.is_empty() {
            return Err(RuleTableError::Empty);
        }
        let mut table = Self::new();
        for config in document.rule_sets {
            let kind = config.kind;
            let rule_set = RuleSet::from_config(config)
                .map_err(|source| RuleTableError::Invalid { kind, source })?;
            table.register(rule_set)?;
        }
        Ok(table)
    }

    /// Parses and validates a JSON rule-table document.
    pub fn from_json_str(raw: &str) -> Result<Self, RuleTableError> {
        let document: RuleTableDocument = serde_json::from_str(raw)?;
        Self::from_document(document)
    }

    /// Document form of this table.
    pub fn to_document(&self) -> RuleTableDocument {
        RuleTableDocument {
            rule_sets: self.iter().map(RuleSet::to_config).collect(),
        }
    }
}

/// Loads a rule table from a JSON file.
///
/// # Errors
/// - `Io` when the file cannot be read.
/// - `Parse` for malformed JSON or unknown kinds/fields.
/// - `Invalid`, `DuplicateKind` or `Empty` for rejected content.
pub fn load_rule_table(path: &Path) -> Result<RuleTable, RuleTableError> {
    let raw = std::fs::read_to_string(path).map_err(|source| RuleTableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = RuleTable::from_json_str(&raw)?;
    info!(
        "event=rule_table_load module=rules status=ok path={} kinds={}",
        path.display(),
        table.len()
    );
    Ok(table)
}

/// Rule table errors.
#[derive(Debug)]
pub enum RuleTableError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid {
        kind: EntityKind,
        source: RuleSetValidationError,
    },
    DuplicateKind(EntityKind),
    Empty,
    UnknownEntityKind(EntityKind),
}

impl Display for RuleTableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read rule table `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid rule table document: {err}"),
            Self::Invalid { kind, source } => write!(f, "invalid rule set for `{kind}`: {source}"),
            Self::DuplicateKind(kind) => write!(f, "rule set already registered for `{kind}`"),
            Self::Empty => write!(f, "rule table must declare at least one rule set"),
            Self::UnknownEntityKind(kind) => {
                write!(f, "no rule set configured for entity kind `{kind}`")
            }
        }
    }
}

impl Error for RuleTableError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid { source, .. } => Some(source),
            Self::DuplicateKind(_) | Self::Empty | Self::UnknownEntityKind(_) => None,
        }
    }
}

impl From<serde_json::Error> for RuleTableError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}
