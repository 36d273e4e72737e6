//! Classification rule sets.
//!
//! # Responsibility
//! - Map `(explicit_status, reference_date, now)` to exactly one bucket.
//! - Hold per-kind thresholds (single or two-tier windows) as configuration
//!   rather than per-page branching.
//!
//! # Invariants
//! - Terminal statuses override any date math.
//! - Missing and malformed reference dates follow the configured no-date
//!   policy; classification never fails.
//! - Unknown kinds fail at rule-table lookup, never per entity.

pub mod bucket;
pub mod rule_set;
pub mod table;
