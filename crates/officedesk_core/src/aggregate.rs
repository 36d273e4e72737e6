//! Bucket aggregation over fetched record collections.
//!
//! # Responsibility
//! - Run one rule set over a collection and produce per-bucket counts plus a
//!   stable partition of the input.
//! - Render the tab/badge view model consumed by list pages.
//! - Tally explicit statuses for custody and Kanban tabs.
//!
//! # Invariants
//! - Every entity lands in exactly one bucket; counts sum to input length.
//! - Relative input order is preserved inside each bucket.
//! - Aggregation reads `now` once and never fails; malformed dates are
//!   absorbed by the no-date policy and only reported through logs.

use crate::clock::Clock;
use crate::model::kind::EntityKind;
use crate::model::record::{normalize_status, TemporalEntity};
use crate::rules::bucket::{Bucket, BucketKey, BucketLabels, DueSoonTier};
use crate::rules::rule_set::RuleSet;
use chrono::NaiveDateTime;
use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;

/// Status tally key for records without an explicit status.
pub const UNSET_STATUS: &str = "unset";

/// One classified entity, in input position.
#[derive(Debug)]
pub struct ClassifiedRow<'a, E> {
    pub bucket: Bucket,
    pub entity: &'a E,
}

impl<E> Clone for ClassifiedRow<'_, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for ClassifiedRow<'_, E> {}

/// Result of classifying one collection against one instant.
#[derive(Debug)]
pub struct Aggregation<'a, E> {
    kind: EntityKind,
    as_of: NaiveDateTime,
    labels: BucketLabels,
    rows: Vec<ClassifiedRow<'a, E>>,
    counts: BTreeMap<BucketKey, usize>,
    buckets: BTreeMap<BucketKey, Vec<&'a E>>,
    tier_counts: BTreeMap<DueSoonTier, usize>,
    invalid_reference_dates: usize,
}

/// Classifies every entity and partitions the collection by bucket.
pub fn aggregate<'a, E: TemporalEntity>(
    entities: &'a [E],
    rule_set: &RuleSet,
    now: NaiveDateTime,
) -> Aggregation<'a, E> {
    let mut rows = Vec::with_capacity(entities.len());
    let mut counts = BTreeMap::<BucketKey, usize>::new();
    let mut buckets = BTreeMap::<BucketKey, Vec<&'a E>>::new();
    let mut tier_counts = BTreeMap::<DueSoonTier, usize>::new();
    let mut invalid_reference_dates = 0;

    for entity in entities {
        let bucket = rule_set.classify(entity, now);
        let key = bucket.key();
        *counts.entry(key).or_default() += 1;
        buckets.entry(key).or_default().push(entity);
        if let Bucket::DueSoon { tier, .. } = bucket {
            *tier_counts.entry(tier).or_default() += 1;
        }
        if key != BucketKey::Done && entity.reference_date().is_invalid() {
            invalid_reference_dates += 1;
        }
        rows.push(ClassifiedRow { bucket, entity });
    }

    if invalid_reference_dates > 0 {
        warn!(
            "event=reference_date_fallback module=aggregate status=degraded kind={} count={}",
            rule_set.kind(),
            invalid_reference_dates
        );
    }
    debug!(
        "event=aggregate module=aggregate status=ok kind={} total={} buckets={}",
        rule_set.kind(),
        rows.len(),
        counts.len()
    );

    Aggregation {
        kind: rule_set.kind(),
        as_of: now,
        labels: rule_set.labels().clone(),
        rows,
        counts,
        buckets,
        tier_counts,
        invalid_reference_dates,
    }
}

/// Same as [`aggregate`], reading `now` once from `clock`.
pub fn aggregate_with_clock<'a, E: TemporalEntity>(
    entities: &'a [E],
    rule_set: &RuleSet,
    clock: &dyn Clock,
) -> Aggregation<'a, E> {
    aggregate(entities, rule_set, clock.now())
}

impl<'a, E: TemporalEntity> Aggregation<'a, E> {
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Instant the aggregation was computed against.
    pub fn as_of(&self) -> NaiveDateTime {
        self.as_of
    }

    pub fn labels(&self) -> &BucketLabels {
        &self.labels
    }

    /// Number of classified entities.
    pub fn total(&self) -> usize {
        self.rows.len()
    }

    /// Count for one bucket; zero when the bucket is empty.
    pub fn count(&self, key: BucketKey) -> usize {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    /// Counts of non-empty buckets.
    pub fn counts(&self) -> &BTreeMap<BucketKey, usize> {
        &self.counts
    }

    /// Entities of one bucket in input order.
    pub fn bucket(&self, key: BucketKey) -> &[&'a E] {
        self.buckets.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-empty buckets in urgency order.
    pub fn buckets(&self) -> &BTreeMap<BucketKey, Vec<&'a E>> {
        &self.buckets
    }

    /// Due-soon entities inside one band.
    pub fn tier_count(&self, tier: DueSoonTier) -> usize {
        self.tier_counts.get(&tier).copied().unwrap_or(0)
    }

    /// All entities with their bucket, in input order.
    pub fn rows(&self) -> &[ClassifiedRow<'a, E>] {
        &self.rows
    }

    /// Entities whose malformed date fell back to the no-date policy.
    pub fn invalid_reference_dates(&self) -> usize {
        self.invalid_reference_dates
    }

    /// Label-keyed view model for tabs and per-tab tables.
    pub fn to_view(&self) -> AggregateView {
        let mut counts = BTreeMap::new();
        let mut buckets = BTreeMap::new();
        let mut tabs = Vec::with_capacity(self.counts.len());
        for key in BucketKey::ALL {
            let count = self.count(key);
            if count == 0 {
                continue;
            }
            let label = self.labels.label(key).to_string();
            tabs.push(TabBadge {
                key,
                label: label.clone(),
                count,
            });
            counts.insert(label.clone(), count);
            buckets.insert(
                label,
                self.bucket(key)
                    .iter()
                    .map(|entity| entity.entity_id().to_string())
                    .collect(),
            );
        }

        AggregateView {
            kind: self.kind,
            as_of: self.as_of,
            total: self.total(),
            counts,
            buckets,
            tabs,
            critical: self.tier_count(DueSoonTier::Critical),
            warning: self.tier_count(DueSoonTier::Warning),
            invalid_reference_dates: self.invalid_reference_dates,
        }
    }
}

/// Tab badge, e.g. `EXPIRED (1)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabBadge {
    pub key: BucketKey,
    pub label: String,
    pub count: usize,
}

/// Serializable output contract for the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateView {
    pub kind: EntityKind,
    pub as_of: NaiveDateTime,
    pub total: usize,
    /// Label → count, non-empty buckets only.
    pub counts: BTreeMap<String, usize>,
    /// Label → entity ids in input order.
    pub buckets: BTreeMap<String, Vec<String>>,
    /// Non-empty buckets in urgency order.
    pub tabs: Vec<TabBadge>,
    pub critical: usize,
    pub warning: usize,
    pub invalid_reference_dates: usize,
}

/// Count of one explicit status value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    pub status: String,
    pub count: usize,
}

/// Counts normalized explicit statuses in first-seen order.
///
/// Records without a status are tallied under [`UNSET_STATUS`].
pub fn tally_by_status<E: TemporalEntity>(entities: &[E]) -> Vec<StatusTally> {
    let mut tallies: Vec<StatusTally> = Vec::new();
    for entity in entities {
        let status = entity
            .explicit_status()
            .and_then(normalize_status)
            .unwrap_or_else(|| UNSET_STATUS.to_string());
        match tallies.iter_mut().find(|tally| tally.status == status) {
            Some(tally) => tally.count += 1,
            None => tallies.push(StatusTally { status, count: 1 }),
        }
    }
    tallies
}

#[cfg(test)]
mod tests {
    use super::{aggregate, aggregate_with_clock, tally_by_status, StatusTally};
    use crate::clock::SequenceClock;
    use crate::model::kind::EntityKind;
    use crate::model::record::{ReferenceDate, TemporalRecord};
    use crate::rules::bucket::{BucketKey, DueSoonTier};
    use crate::rules::table::RuleTable;
    use chrono::{NaiveDate, NaiveDateTime};

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .expect("valid test instant")
    }

    fn dsc(id: &str, expiry: &str) -> TemporalRecord {
        TemporalRecord::new(id, EntityKind::DscCertificate)
            .with_reference_date(ReferenceDate::parse(Some(expiry)))
    }

    #[test]
    fn counts_tiers_and_invalid_dates() {
        let table = RuleTable::standard();
        let rule_set = table.get(EntityKind::DscCertificate).expect("dsc rules");
        let records = vec![
            dsc("a", "2025-06-03"),
            dsc("b", "2025-06-20"),
            dsc("c", "garbage"),
            dsc("d", "2025-06-10"),
        ];

        let result = aggregate(&records, rule_set, midnight(2025, 6, 1));
        assert_eq!(result.total(), 4);
        assert_eq!(result.count(BucketKey::DueSoon), 3);
        assert_eq!(result.count(BucketKey::NoDate), 1);
        assert_eq!(result.count(BucketKey::Done), 0);
        assert_eq!(result.tier_count(DueSoonTier::Critical), 1);
        assert_eq!(result.tier_count(DueSoonTier::Warning), 2);
        assert_eq!(result.invalid_reference_dates(), 1);
        assert!(result.bucket(BucketKey::Overdue).is_empty());
    }

    #[test]
    fn view_lists_tabs_in_urgency_order() {
        let table = RuleTable::standard();
        let rule_set = table.get(EntityKind::DscCertificate).expect("dsc rules");
        let records = vec![
            dsc("active", "2025-09-01"),
            dsc("expired", "2025-05-01"),
            dsc("soon", "2025-06-02"),
        ];

        let view = aggregate(&records, rule_set, midnight(2025, 6, 1)).to_view();
        let labels: Vec<&str> = view.tabs.iter().map(|tab| tab.label.as_str()).collect();
        assert_eq!(labels, vec!["EXPIRED", "DUE_SOON", "ACTIVE"]);
        assert_eq!(view.buckets["EXPIRED"], vec!["expired".to_string()]);
        assert_eq!(view.critical, 1);

        let json = serde_json::to_value(&view).expect("serialize view");
        assert_eq!(json["kind"], "dsc_certificate");
        assert_eq!(json["as_of"], "2025-06-01T00:00:00");
        assert_eq!(json["counts"]["ACTIVE"], 1);
        assert_eq!(json["tabs"][0]["key"], "overdue");
    }

    #[test]
    fn clock_is_read_once_per_aggregation() {
        let table = RuleTable::standard();
        let rule_set = table.get(EntityKind::Task).expect("task rules");
        let records = vec![
            TemporalRecord::new("t1", EntityKind::Task)
                .with_reference_date(ReferenceDate::parse(Some("2025-06-05"))),
            TemporalRecord::new("t2", EntityKind::Task)
                .with_reference_date(ReferenceDate::parse(Some("2025-06-05"))),
        ];
        let clock = SequenceClock::new(vec![midnight(2025, 6, 1), midnight(2025, 7, 1)])
            .expect("non-empty script");

        let first = aggregate_with_clock(&records, rule_set, &clock);
        assert_eq!(first.count(BucketKey::DueSoon), 2);
        assert_eq!(first.as_of(), midnight(2025, 6, 1));

        let second = aggregate_with_clock(&records, rule_set, &clock);
        assert_eq!(second.count(BucketKey::Overdue), 2);
    }

    #[test]
    fn tally_keeps_first_seen_order_and_unset_bucket() {
        let records = vec![
            TemporalRecord::new("1", EntityKind::DscCertificate).with_status("IN"),
            TemporalRecord::new("2", EntityKind::DscCertificate).with_status("out"),
            TemporalRecord::new("3", EntityKind::DscCertificate).with_status(" in "),
            TemporalRecord::new("4", EntityKind::DscCertificate),
            TemporalRecord::new("5", EntityKind::DscCertificate).with_status(""),
        ];

        assert_eq!(
            tally_by_status(&records),
            vec![
                StatusTally {
                    status: "in".to_string(),
                    count: 2
                },
                StatusTally {
                    status: "out".to_string(),
                    count: 1
                },
                StatusTally {
                    status: "unset".to_string(),
                    count: 2
                },
            ]
        );
    }
}
