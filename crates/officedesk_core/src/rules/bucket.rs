//! Lifecycle buckets and their per-kind display labels.

use serde::{Deserialize, Serialize};

/// Urgency band inside the due-soon window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueSoonTier {
    /// Inside the nested critical band (or a single-threshold window).
    Critical,
    /// Inside the outer warning band of a two-tier window.
    Warning,
}

/// Classification result for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Done,
    Overdue,
    DueSoon {
        days_remaining: i64,
        tier: DueSoonTier,
    },
    Upcoming,
    NoDate,
}

impl Bucket {
    /// Partition key without the due-soon payload.
    pub fn key(self) -> BucketKey {
        match self {
            Self::Done => BucketKey::Done,
            Self::Overdue => BucketKey::Overdue,
            Self::DueSoon { .. } => BucketKey::DueSoon,
            Self::Upcoming => BucketKey::Upcoming,
            Self::NoDate => BucketKey::NoDate,
        }
    }

    /// Days until the reference date, when the bucket carries it.
    pub fn days_remaining(self) -> Option<i64> {
        match self {
            Self::DueSoon { days_remaining, .. } => Some(days_remaining),
            _ => None,
        }
    }
}

/// Counting/partition key. Declaration order is urgency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKey {
    Overdue,
    DueSoon,
    Upcoming,
    NoDate,
    Done,
}

impl BucketKey {
    pub const ALL: [BucketKey; 5] = [
        BucketKey::Overdue,
        BucketKey::DueSoon,
        BucketKey::Upcoming,
        BucketKey::NoDate,
        BucketKey::Done,
    ];

    /// Stable snake_case id, independent of per-kind labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::DueSoon => "due_soon",
            Self::Upcoming => "upcoming",
            Self::NoDate => "no_date",
            Self::Done => "done",
        }
    }
}

/// Per-kind names rendered on tabs and badges.
///
/// Tasks say `OVERDUE`/`UPCOMING`, certificates say `EXPIRED`/`ACTIVE`;
/// the buckets underneath are the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketLabels {
    pub overdue: String,
    pub due_soon: String,
    pub upcoming: String,
    pub no_date: String,
    pub done: String,
}

impl BucketLabels {
    /// Labels for deadline-driven records (tasks, due dates).
    pub fn deadline() -> Self {
        Self::from_strs("OVERDUE", "DUE_SOON", "UPCOMING", "NO_DATE", "DONE")
    }

    /// Labels for expiry-driven records (DSC certificates, documents).
    pub fn expiry() -> Self {
        Self::from_strs("EXPIRED", "DUE_SOON", "ACTIVE", "NO_DATE", "DONE")
    }

    fn from_strs(overdue: &str, due_soon: &str, upcoming: &str, no_date: &str, done: &str) -> Self {
        Self {
            overdue: overdue.to_string(),
            due_soon: due_soon.to_string(),
            upcoming: upcoming.to_string(),
            no_date: no_date.to_string(),
            done: done.to_string(),
        }
    }

    pub fn label(&self, key: BucketKey) -> &str {
        match key {
            BucketKey::Overdue => &self.overdue,
            BucketKey::DueSoon => &self.due_soon,
            BucketKey::Upcoming => &self.upcoming,
            BucketKey::NoDate => &self.no_date,
            BucketKey::Done => &self.done,
        }
    }

    /// Resolves a label or stable key id (case-insensitive) back to a key.
    pub fn resolve(&self, value: &str) -> Option<BucketKey> {
        let wanted = value.trim();
        if wanted.is_empty() {
            return None;
        }
        BucketKey::ALL.into_iter().find(|key| {
            self.label(*key).eq_ignore_ascii_case(wanted) || key.as_str().eq_ignore_ascii_case(wanted)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Bucket, BucketKey, BucketLabels, DueSoonTier};

    #[test]
    fn bucket_keys_order_by_urgency() {
        assert!(BucketKey::Overdue < BucketKey::DueSoon);
        assert!(BucketKey::DueSoon < BucketKey::Upcoming);
        let mut keys = vec![BucketKey::Done, BucketKey::Upcoming, BucketKey::Overdue];
        keys.sort();
        assert_eq!(
            keys,
            vec![BucketKey::Overdue, BucketKey::Upcoming, BucketKey::Done]
        );
    }

    #[test]
    fn due_soon_key_drops_payload() {
        let bucket = Bucket::DueSoon {
            days_remaining: 3,
            tier: DueSoonTier::Critical,
        };
        assert_eq!(bucket.key(), BucketKey::DueSoon);
        assert_eq!(bucket.days_remaining(), Some(3));
        assert_eq!(Bucket::Overdue.days_remaining(), None);
    }

    #[test]
    fn labels_resolve_by_label_or_key_id() {
        let labels = BucketLabels::expiry();
        assert_eq!(labels.label(BucketKey::Overdue), "EXPIRED");
        assert_eq!(labels.resolve("expired"), Some(BucketKey::Overdue));
        assert_eq!(labels.resolve("ACTIVE"), Some(BucketKey::Upcoming));
        assert_eq!(labels.resolve("due_soon"), Some(BucketKey::DueSoon));
        assert_eq!(labels.resolve("overdue"), Some(BucketKey::Overdue));
        assert_eq!(labels.resolve("archived"), None);
        assert_eq!(labels.resolve(""), None);
    }
}
