//! Filtered, paginated slices of an aggregation.
//!
//! # Responsibility
//! - Serve per-tab tables: filter classified rows by bucket, status and free
//!   text, then page through them.
//!
//! # Invariants
//! - Selection preserves input order.
//! - `applied_limit` is always within `1..=VIEW_LIMIT_MAX`.

use crate::aggregate::{Aggregation, ClassifiedRow};
use crate::model::record::{normalize_status, TemporalEntity};
use crate::rules::bucket::BucketKey;
use once_cell::sync::Lazy;
use regex::Regex;

/// Page size when the caller does not ask for one.
pub const VIEW_DEFAULT_LIMIT: u32 = 50;
/// Largest page size served.
pub const VIEW_LIMIT_MAX: u32 = 500;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Filter and paging options for one tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub bucket: Option<BucketKey>,
    pub status: Option<String>,
    pub text: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// One page of classified rows.
#[derive(Debug)]
pub struct ViewPage<'a, E> {
    pub items: Vec<ClassifiedRow<'a, E>>,
    /// Matches before paging.
    pub total_matches: usize,
    pub applied_limit: u32,
    pub offset: u32,
}

/// Clamps a requested page size.
pub fn normalize_view_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => VIEW_DEFAULT_LIMIT,
        Some(value) if value > VIEW_LIMIT_MAX => VIEW_LIMIT_MAX,
        Some(value) => value,
        None => VIEW_DEFAULT_LIMIT,
    }
}

/// Lowercases and collapses whitespace for search comparisons.
pub fn normalize_search_text(value: &str) -> String {
    WHITESPACE_RE
        .replace_all(value.trim(), " ")
        .to_lowercase()
}

/// Selects one page of rows matching `query`.
pub fn select_page<'a, E: TemporalEntity>(
    aggregation: &Aggregation<'a, E>,
    query: &ViewQuery,
) -> ViewPage<'a, E> {
    let applied_limit = normalize_view_limit(query.limit);
    let status = query.status.as_deref().and_then(normalize_status);
    let needle = query
        .text
        .as_deref()
        .map(normalize_search_text)
        .filter(|value| !value.is_empty());

    let matches: Vec<ClassifiedRow<'a, E>> = aggregation
        .rows()
        .iter()
        .filter(|row| query.bucket.map_or(true, |key| row.bucket.key() == key))
        .filter(|row| {
            status.as_deref().map_or(true, |wanted| {
                row.entity
                    .explicit_status()
                    .and_then(normalize_status)
                    .is_some_and(|value| value == wanted)
            })
        })
        .filter(|row| {
            needle
                .as_deref()
                .map_or(true, |wanted| row_matches_text(row.entity, wanted))
        })
        .copied()
        .collect();

    let total_matches = matches.len();
    let items = matches
        .into_iter()
        .skip(query.offset as usize)
        .take(applied_limit as usize)
        .collect();

    ViewPage {
        items,
        total_matches,
        applied_limit,
        offset: query.offset,
    }
}

fn row_matches_text<E: TemporalEntity>(entity: &E, needle: &str) -> bool {
    normalize_search_text(entity.display_label()).contains(needle)
        || entity.entity_id().to_lowercase().contains(needle)
}
