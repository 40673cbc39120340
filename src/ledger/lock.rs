//! Round lock computation.
//!
//! The lock boundary is a pure function of the fixture schedule and the
//! round's lock offset: earliest kickoff minus the offset, with the
//! boundary itself inclusive. It is never stored, so it cannot drift
//! from the schedule — every query recomputes it.

use chrono::{DateTime, Utc};

use crate::types::{Fixture, Round};

/// The instant at which the round freezes, or `None` when the round has
/// no fixtures yet. A fixtureless round has no kickoff to anchor to and
/// stays open indefinitely — deliberate, not an omission.
pub fn lock_instant(round: &Round, fixtures: &[Fixture]) -> Option<DateTime<Utc>> {
    fixtures
        .iter()
        .map(|f| f.kickoff)
        .min()
        .map(|earliest| earliest - round.lock_offset())
}

/// Whether the round is locked at `now`. Inclusive: at the lock instant
/// exactly, the round is already locked.
pub fn is_locked(round: &Round, fixtures: &[Fixture], now: DateTime<Utc>) -> bool {
    match lock_instant(round, fixtures) {
        Some(instant) => now >= instant,
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
