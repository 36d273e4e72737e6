//! Per-kind classification rule set.
//!
//! # Invariants
//! - `terminal_statuses` are stored normalized (trimmed, lowercase).
//! - `days_remaining` is the signed calendar-day distance between
//!   `now.date()` and the reference date; time of day never matters.
//! - `days_remaining == 0` is due-soon, not overdue.

use crate::model::kind::EntityKind;
use crate::model::record::{normalize_status, ReferenceDate, TemporalEntity};
use crate::rules::bucket::{Bucket, BucketKey, BucketLabels, DueSoonTier};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Due-soon window ahead of the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningWindow {
    /// One band, e.g. tasks due within 7 days.
    Single { days: u32 },
    /// Nested bands, e.g. certificates: critical within 7, warning within 30.
    Tiered { critical_days: u32, warning_days: u32 },
}

impl WarningWindow {
    /// Outer edge of the window, inclusive.
    pub fn max_days(self) -> i64 {
        match self {
            Self::Single { days } => i64::from(days),
            Self::Tiered { warning_days, .. } => i64::from(warning_days),
        }
    }

    /// Band for a non-negative day distance, or `None` outside the window.
    pub fn tier_for(self, days_remaining: i64) -> Option<DueSoonTier> {
        if days_remaining < 0 || days_remaining > self.max_days() {
            return None;
        }
        match self {
            Self::Single { .. } => Some(DueSoonTier::Critical),
            Self::Tiered { critical_days, .. } if days_remaining <= i64::from(critical_days) => {
                Some(DueSoonTier::Critical)
            }
            Self::Tiered { .. } => Some(DueSoonTier::Warning),
        }
    }
}

/// Bucket for records without a usable reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDatePolicy {
    /// Own `NO_DATE` bucket.
    #[default]
    Separate,
    TreatAsActive,
    TreatAsExpired,
}

impl NoDatePolicy {
    fn bucket(self) -> Bucket {
        match self {
            Self::Separate => Bucket::NoDate,
            Self::TreatAsActive => Bucket::Upcoming,
            Self::TreatAsExpired => Bucket::Overdue,
        }
    }
}

/// Signed whole calendar days from `now`'s date to `reference`.
pub fn days_between(now: NaiveDateTime, reference: NaiveDate) -> i64 {
    reference.signed_duration_since(now.date()).num_days()
}

/// Thresholds, terminal statuses and labels for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    kind: EntityKind,
    terminal_statuses: BTreeSet<String>,
    window: WarningWindow,
    no_date_policy: NoDatePolicy,
    labels: BucketLabels,
}

impl RuleSet {
    /// Creates a rule set with no terminal statuses, the `Separate` no-date
    /// policy and the standard labels for `kind`.
    pub fn new(kind: EntityKind, window: WarningWindow) -> Self {
        Self {
            kind,
            terminal_statuses: BTreeSet::new(),
            window,
            no_date_policy: NoDatePolicy::default(),
            labels: standard_labels(kind),
        }
    }

    /// Replaces terminal statuses. Blank values are dropped.
    pub fn with_terminal_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.terminal_statuses = statuses
            .into_iter()
            .filter_map(|status| normalize_status(status.as_ref()))
            .collect();
        self
    }

    pub fn with_no_date_policy(mut self, policy: NoDatePolicy) -> Self {
        self.no_date_policy = policy;
        self
    }

    pub fn with_labels(mut self, labels: BucketLabels) -> Self {
        self.labels = labels;
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn window(&self) -> WarningWindow {
        self.window
    }

    pub fn no_date_policy(&self) -> NoDatePolicy {
        self.no_date_policy
    }

    pub fn labels(&self) -> &BucketLabels {
        &self.labels
    }

    /// Normalized terminal statuses in sorted order.
    pub fn terminal_statuses(&self) -> impl Iterator<Item = &str> {
        self.terminal_statuses.iter().map(String::as_str)
    }

    /// Returns whether `status` forces the `DONE` bucket.
    pub fn is_terminal(&self, status: &str) -> bool {
        normalize_status(status).is_some_and(|value| self.terminal_statuses.contains(&value))
    }

    /// Classifies one entity against `now`.
    pub fn classify<E: TemporalEntity + ?Sized>(&self, entity: &E, now: NaiveDateTime) -> Bucket {
        self.classify_parts(entity.explicit_status(), entity.reference_date(), now)
    }

    /// Classifies raw parts; `classify` delegates here.
    pub fn classify_parts(
        &self,
        explicit_status: Option<&str>,
        reference_date: &ReferenceDate,
        now: NaiveDateTime,
    ) -> Bucket {
        if explicit_status.is_some_and(|status| self.is_terminal(status)) {
            return Bucket::Done;
        }

        let Some(reference) = reference_date.as_date() else {
            return self.no_date_policy.bucket();
        };

        let days_remaining = days_between(now, reference);
        if days_remaining < 0 {
            return Bucket::Overdue;
        }
        match self.window.tier_for(days_remaining) {
            Some(tier) => Bucket::DueSoon {
                days_remaining,
                tier,
            },
            None => Bucket::Upcoming,
        }
    }

    /// Checks window shape and label uniqueness.
    pub fn validate(&self) -> Result<(), RuleSetValidationError> {
        if let WarningWindow::Tiered {
            critical_days,
            warning_days,
        } = self.window
        {
            if critical_days > warning_days {
                return Err(RuleSetValidationError::InvertedWindow {
                    critical_days,
                    warning_days,
                });
            }
        }

        let mut seen = BTreeSet::<String>::new();
        for key in BucketKey::ALL {
            let label = self.labels.label(key).trim();
            if label.is_empty() {
                return Err(RuleSetValidationError::BlankLabel(key));
            }
            if !seen.insert(label.to_ascii_lowercase()) {
                return Err(RuleSetValidationError::DuplicateLabel(label.to_string()));
            }
        }
        Ok(())
    }

    /// Builds and validates a rule set from its configuration form.
    ///
    /// # Errors
    /// - Blank or duplicate terminal statuses (after normalization).
    /// - Any `validate()` failure.
    pub fn from_config(config: RuleSetConfig) -> Result<Self, RuleSetValidationError> {
        let mut statuses = BTreeSet::<String>::new();
        for raw in &config.terminal_statuses {
            let normalized =
                normalize_status(raw).ok_or(RuleSetValidationError::EmptyTerminalStatus)?;
            if !statuses.insert(normalized.clone()) {
                return Err(RuleSetValidationError::DuplicateTerminalStatus(normalized));
            }
        }

        let labels = config
            .labels
            .unwrap_or_else(|| standard_labels(config.kind));
        let rule_set = Self {
            kind: config.kind,
            terminal_statuses: statuses,
            window: config.window,
            no_date_policy: config.no_date_policy,
            labels,
        };
        rule_set.validate()?;
        Ok(rule_set)
    }

    /// Configuration form of this rule set.
    pub fn to_config(&self) -> RuleSetConfig {
        RuleSetConfig {
            kind: self.kind,
            terminal_statuses: self.terminal_statuses.iter().cloned().collect(),
            window: self.window,
            no_date_policy: self.no_date_policy,
            labels: Some(self.labels.clone()),
        }
    }
}

/// Deadline labels for tasks/due dates, expiry labels for certificates/documents.
pub fn standard_labels(kind: EntityKind) -> BucketLabels {
    match kind {
        EntityKind::Task | EntityKind::DueDate => BucketLabels::deadline(),
        EntityKind::DscCertificate | EntityKind::Document => BucketLabels::expiry(),
    }
}

/// Serialized rule set as it appears in a rule-table document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSetConfig {
    pub kind: EntityKind,
    #[serde(default)]
    pub terminal_statuses: Vec<String>,
    pub window: WarningWindow,
    #[serde(default)]
    pub no_date_policy: NoDatePolicy,
    /// Falls back to the standard labels for `kind` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BucketLabels>,
}

/// Rule set validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSetValidationError {
    EmptyTerminalStatus,
    DuplicateTerminalStatus(String),
    InvertedWindow { critical_days: u32, warning_days: u32 },
    BlankLabel(BucketKey),
    DuplicateLabel(String),
}

impl Display for RuleSetValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTerminalStatus => write!(f, "terminal status must not be empty"),
            Self::DuplicateTerminalStatus(value) => {
                write!(f, "terminal status declared twice: {value}")
            }
            Self::InvertedWindow {
                critical_days,
                warning_days,
            } => write!(
                f,
                "critical band ({critical_days} days) must not exceed warning band ({warning_days} days)"
            ),
            Self::BlankLabel(key) => write!(f, "label for bucket `{}` must not be blank", key.as_str()),
            Self::DuplicateLabel(value) => write!(f, "bucket label used twice: {value}"),
        }
    }
}

impl Error for RuleSetValidationError {}
