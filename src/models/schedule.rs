//! Time slots and the two-slot span a match occupies.

use crate::models::error::ScheduleError;
use serde::{Deserialize, Serialize};

/// Number of time slots in a playing day (numbered from 1).
pub const SLOTS_PER_DAY: u8 = 3;

/// Consecutive slots a single match occupies.
pub const MATCH_LENGTH: u8 = 2;

/// The consecutive slots booked by one match, identified by its first slot.
///
/// Only starts whose whole span fits inside the day can be constructed, so with
/// three slots per day the valid starts are 1 (slots 1-2) and 2 (slots 2-3).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct SlotSpan {
    start: u8,
}

impl SlotSpan {
    /// Span starting at `start`, or `InvalidSlot` if it would run past the last slot.
    pub fn starting_at(start: i64) -> Result<Self, ScheduleError> {
        let last_start = i64::from(SLOTS_PER_DAY - MATCH_LENGTH + 1);
        if !(1..=last_start).contains(&start) {
            return Err(ScheduleError::InvalidSlot(start));
        }
        Ok(Self { start: start as u8 })
    }

    /// First slot of the span (the stored `time_slot`).
    pub fn start(&self) -> u8 {
        self.start
    }

    /// Last slot of the span.
    pub fn end(&self) -> u8 {
        self.start + MATCH_LENGTH - 1
    }

    pub fn slots(&self) -> impl Iterator<Item = u8> {
        self.start..=self.end()
    }

    /// True if the two spans share at least one slot. Adjacent starts overlap.
    pub fn overlaps(&self, other: &SlotSpan) -> bool {
        self.start <= other.end() && other.start <= self.end()
    }
}

impl TryFrom<i64> for SlotSpan {
    type Error = ScheduleError;

    fn try_from(start: i64) -> Result<Self, Self::Error> {
        Self::starting_at(start)
    }
}

impl From<SlotSpan> for u8 {
    fn from(span: SlotSpan) -> u8 {
        span.start
    }
}

impl std::fmt::Display for SlotSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slots {}-{}", self.start, self.end())
    }
}
