//! Clock source for time-dependent classification.
//!
//! # Responsibility
//! - Supply the single "now" value that bucket assignment is computed against.
//! - Keep wall-clock access behind one injectable seam so tests stay
//!   deterministic.
//!
//! # Invariants
//! - `now()` never fails; only `SequenceClock` advances internal state.
//! - Values are local wall-clock time; calendar-day math uses `now().date()`.

use chrono::{Local, NaiveDateTime};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of the current local date-time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall-clock source used outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock pinned to one injected instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    instant: NaiveDateTime,
}

impl FixedClock {
    pub fn new(instant: NaiveDateTime) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.instant
    }
}

/// Clock that replays injected instants in order.
///
/// After the last value is handed out it keeps returning that value, so a
/// poll loop under test never runs past the scripted timeline.
#[derive(Debug)]
pub struct SequenceClock {
    instants: Vec<NaiveDateTime>,
    cursor: AtomicUsize,
}

impl SequenceClock {
    /// Creates a replaying clock.
    ///
    /// # Errors
    /// - Returns `ClockError::EmptySequence` when `instants` is empty.
    pub fn new(instants: Vec<NaiveDateTime>) -> Result<Self, ClockError> {
        if instants.is_empty() {
            return Err(ClockError::EmptySequence);
        }
        Ok(Self {
            instants,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Number of scripted instants.
    pub fn len(&self) -> usize {
        self.instants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instants.is_empty()
    }
}

impl Clock for SequenceClock {
    fn now(&self) -> NaiveDateTime {
        let last = self.instants.len() - 1;
        // Cursor saturates at `last`; it never wraps back to the start.
        let previous = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |index| {
                Some(index.saturating_add(1).min(last))
            })
            .unwrap_or_else(|index| index);
        self.instants[previous.min(last)]
    }
}

/// Clock construction errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    EmptySequence,
}

impl Display for ClockError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySequence => write!(f, "sequence clock requires at least one instant"),
        }
    }
}

impl Error for ClockError {}
