//! Fixture catalog.
//!
//! Supplies the matches of a round, ordered by kickoff, behind the
//! `FixtureCatalog` trait. The ledger core treats the catalog as
//! read-only; the administrator odds-edit path lives on the in-memory
//! implementation and freezes once the round locks.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::ledger::lock;
use crate::types::{Fixture, LedgerError, OddsTriple, Round};

/// Abstraction over wherever the fixture list comes from.
///
/// An empty list is a valid answer (no fixtures known yet) and is distinct
/// from an unknown round, which is `ConfigMissing`.
#[cfg_attr(test, mockall::automock)]
pub trait FixtureCatalog: Send + Sync {
    /// The round's fixtures, ordered by kickoff (earliest first).
    fn fixtures(&self, round_id: &str) -> Result<Vec<Fixture>, LedgerError>;
}

/// In-memory fixture catalog fed from configuration or an upstream feed.
pub struct InMemoryFixtureCatalog {
    rounds: Mutex<BTreeMap<String, Vec<Fixture>>>,
}

impl InMemoryFixtureCatalog {
    pub fn new() -> Self {
        Self {
            rounds: Mutex::new(BTreeMap::new()),
        }
    }

    /// Register a round, possibly with no fixtures yet.
    pub fn add_round(&self, round_id: &str) {
        self.rounds
            .lock()
            .unwrap()
            .entry(round_id.to_string())
            .or_default();
    }

    /// Insert or replace a fixture (matched by id) in a round.
    ///
    /// Sub-1.0 odds are invalid input and collapse to the visible 1.0
    /// placeholder rather than entering the catalog.
    pub fn upsert_fixture(&self, round_id: &str, mut fixture: Fixture) {
        fixture.odds = sanitised(fixture.odds);
        let mut rounds = self.rounds.lock().unwrap();
        let fixtures = rounds.entry(round_id.to_string()).or_default();
        match fixtures.iter_mut().find(|f| f.id == fixture.id) {
            Some(existing) => *existing = fixture,
            None => fixtures.push(fixture),
        }
    }

    /// Administrator odds edit. Allowed until the round locks; afterwards
    /// odds are frozen and the edit is rejected.
    pub fn set_odds(
        &self,
        round: &Round,
        fixture_id: &str,
        odds: OddsTriple,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut rounds = self.rounds.lock().unwrap();
        let fixtures = rounds
            .get_mut(&round.id)
            .ok_or_else(|| LedgerError::ConfigMissing(format!("unknown round {}", round.id)))?;

        if let Some(since) = lock::lock_instant(round, fixtures) {
            if now >= since {
                debug!(round = %round.id, fixture = fixture_id, "Odds edit refused: round locked");
                return Err(LedgerError::RoundLocked {
                    round: round.id.clone(),
                    since,
                });
            }
        }

        let fixture = fixtures
            .iter_mut()
            .find(|f| f.id == fixture_id)
            .ok_or_else(|| LedgerError::FixtureUnknown {
                round: round.id.clone(),
                fixture: fixture_id.to_string(),
            })?;

        fixture.odds = sanitised(odds);
        info!(
            round = %round.id,
            fixture = fixture_id,
            odds = %fixture.odds,
            "Odds updated"
        );
        Ok(())
    }
}

impl Default for InMemoryFixtureCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureCatalog for InMemoryFixtureCatalog {
    fn fixtures(&self, round_id: &str) -> Result<Vec<Fixture>, LedgerError> {
        let rounds = self.rounds.lock().unwrap();
        let mut fixtures = rounds
            .get(round_id)
            .cloned()
            .ok_or_else(|| LedgerError::ConfigMissing(format!("unknown round {round_id}")))?;
        fixtures.sort_by_key(|f| f.kickoff);
        Ok(fixtures)
    }
}

/// Collapse invalid (< 1.0) odds onto the unset placeholder.
fn sanitised(odds: OddsTriple) -> OddsTriple {
    let fix = |d| if d < OddsTriple::UNSET { OddsTriple::UNSET } else { d };
    OddsTriple::new(fix(odds.home), fix(odds.draw), fix(odds.away))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
