use chrono::{Duration, FixedOffset, NaiveDate, NaiveDateTime};
use officedesk_core::{
    parse_reference_date_in, Bucket, BucketKey, DueSoonTier, EntityKind, ReferenceDate, RuleTable,
    TemporalRecord,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn now_at(hour: u32) -> NaiveDateTime {
    date(2025, 6, 1).and_hms_opt(hour, 0, 0).unwrap()
}

fn task(id: &str, due: Option<NaiveDate>) -> TemporalRecord {
    TemporalRecord::new(id, EntityKind::Task).with_reference_date(due)
}

#[test]
fn task_single_window_scenario() {
    let table = RuleTable::standard();
    let rules = table.get(EntityKind::Task).unwrap();
    let now = now_at(10);

    assert_eq!(rules.classify(&task("a", Some(date(2025, 5, 31))), now), Bucket::Overdue);
    assert_eq!(
        rules.classify(&task("b", Some(date(2025, 6, 5))), now),
        Bucket::DueSoon {
            days_remaining: 4,
            tier: DueSoonTier::Critical
        }
    );
    assert_eq!(rules.classify(&task("c", Some(date(2025, 7, 1))), now), Bucket::Upcoming);
    assert_eq!(
        rules.classify(
            &task("d", Some(date(2020, 1, 1))).with_status("completed"),
            now
        ),
        Bucket::Done
    );
}

#[test]
fn terminal_status_overrides_any_reference_date() {
    let table = RuleTable::standard();
    let rules = table.get(EntityKind::Task).unwrap();
    let now = now_at(10);

    let references = [
        ReferenceDate::Date(date(1990, 1, 1)),
        ReferenceDate::Date(date(2025, 6, 1)),
        ReferenceDate::Date(date(2099, 12, 31)),
        ReferenceDate::Missing,
        ReferenceDate::Invalid("Invalid Date".to_string()),
    ];
    for reference in references {
        for status in ["completed", "Completed", " COMPLETED "] {
            let record = TemporalRecord::new("t", EntityKind::Task)
                .with_status(status)
                .with_reference_date(reference.clone());
            assert_eq!(rules.classify(&record, now), Bucket::Done, "{reference:?} {status}");
        }
    }

    let pending = task("p", Some(date(1990, 1, 1))).with_status("pending");
    assert_eq!(rules.classify(&pending, now), Bucket::Overdue);
}

#[test]
fn due_date_filed_status_is_terminal() {
    let table = RuleTable::standard();
    let rules = table.get(EntityKind::DueDate).unwrap();
    let record = TemporalRecord::new("gst-3b", EntityKind::DueDate)
        .with_status("filed")
        .with_reference_date(date(2025, 5, 20));
    assert_eq!(rules.classify(&record, now_at(9)), Bucket::Done);
}

#[test]
fn same_calendar_day_is_due_soon_not_overdue() {
    let table = RuleTable::standard();
    for kind in EntityKind::ALL {
        let rules = table.get(kind).unwrap();
        for hour in [0, 12, 23] {
            let record = TemporalRecord::new("x", kind).with_reference_date(date(2025, 6, 1));
            assert_eq!(
                rules.classify(&record, now_at(hour)),
                Bucket::DueSoon {
                    days_remaining: 0,
                    tier: DueSoonTier::Critical
                },
                "{kind} at {hour}h"
            );
        }
    }
}

#[test]
fn utc_encoded_local_midnight_is_due_today() {
    let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
    let due = parse_reference_date_in("2025-05-31T18:30:00Z", &ist).unwrap();
    let table = RuleTable::standard();
    let rules = table.get(EntityKind::Task).unwrap();

    assert_eq!(
        rules.classify(&task("ist", Some(due)), now_at(10)),
        Bucket::DueSoon {
            days_remaining: 0,
            tier: DueSoonTier::Critical
        }
    );
}

#[test]
fn moving_reference_date_earlier_never_reduces_urgency() {
    let table = RuleTable::standard();
    let now = now_at(15);
    for kind in EntityKind::ALL {
        let rules = table.get(kind).unwrap();
        let mut previous: Option<BucketKey> = None;
        // Walk from far future to far past one day at a time.
        for offset in (-60..=60).rev() {
            let reference = date(2025, 6, 1) + Duration::days(offset);
            let record = TemporalRecord::new("m", kind).with_reference_date(reference);
            let key = rules.classify(&record, now).key();
            if let Some(previous) = previous {
                assert!(key <= previous, "{kind}: {key:?} after {previous:?} at {offset}");
            }
            previous = Some(key);
        }
    }
}

#[test]
fn missing_reference_date_lands_in_no_date_bucket() {
    let table = RuleTable::standard();
    for kind in EntityKind::ALL {
        let rules = table.get(kind).unwrap();
        let missing = TemporalRecord::new("n", kind);
        let garbage = TemporalRecord::new("g", kind)
            .with_reference_date(ReferenceDate::parse(Some("32/13/2025")));
        assert_eq!(rules.classify(&missing, now_at(8)), Bucket::NoDate);
        assert_eq!(rules.classify(&garbage, now_at(8)), Bucket::NoDate);
    }
}

#[test]
fn dsc_two_tier_boundaries() {
    let table = RuleTable::standard();
    let rules = table.get(EntityKind::DscCertificate).unwrap();
    let now = now_at(18);
    let classify = |d: NaiveDate| {
        rules.classify(
            &TemporalRecord::new("dsc", EntityKind::DscCertificate).with_reference_date(d),
            now,
        )
    };

    assert_eq!(classify(date(2025, 5, 31)), Bucket::Overdue);
    assert_eq!(
        classify(date(2025, 6, 8)),
        Bucket::DueSoon {
            days_remaining: 7,
            tier: DueSoonTier::Critical
        }
    );
    assert_eq!(
        classify(date(2025, 6, 9)),
        Bucket::DueSoon {
            days_remaining: 8,
            tier: DueSoonTier::Warning
        }
    );
    assert_eq!(
        classify(date(2025, 7, 1)),
        Bucket::DueSoon {
            days_remaining: 30,
            tier: DueSoonTier::Warning
        }
    );
    assert_eq!(classify(date(2025, 7, 2)), Bucket::Upcoming);
}
