//! The betting ledger — the core rules engine.
//!
//! Owns the bet records and the recorded outcomes, enforces placement
//! and settlement rules against the injected round store, fixture
//! catalog, and clock, and answers the aggregation queries. Everything
//! here is synchronous and in-memory; persistence and presentation wrap
//! it from the outside.

pub mod lock;
pub mod placement;
pub mod settlement;
pub mod summary;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::clock::Clock;
use crate::fixtures::FixtureCatalog;
use crate::rounds::RoundStore;
use crate::storage::LedgerSnapshot;
use crate::types::{Bet, Fixture, LedgerError, Pick, Round};

/// Whether a positive stake may ride on a placeholder (1.0) odd.
///
/// The source systems disagreed on this; the policy is explicit here
/// rather than guessed. `RejectUnset` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OddsPolicy {
    /// Positive stakes on an unset odd fail with `OddsUnset`.
    #[default]
    RejectUnset,
    /// Placeholder odds are accepted as-is (settles at 1.0).
    AllowUnset,
}

/// Composite bet key: (round, user, fixture).
pub(crate) type BetKey = (String, String, String);

/// The mutable book: every placed bet plus the outcomes recorded so far.
/// Lives behind one `RwLock`; writers hold it across their whole
/// read-check-write sequence, which is the critical section the cap
/// invariant needs.
#[derive(Debug, Default)]
pub(crate) struct LedgerBook {
    pub bets: BTreeMap<BetKey, Bet>,
    /// (round, fixture) → final outcome. Once present, final.
    pub outcomes: BTreeMap<(String, String), Pick>,
}

/// The betting ledger engine.
pub struct BettingLedger {
    rounds: Arc<dyn RoundStore>,
    catalog: Arc<dyn FixtureCatalog>,
    clock: Arc<dyn Clock>,
    odds_policy: OddsPolicy,
    book: RwLock<LedgerBook>,
}

impl BettingLedger {
    pub fn new(
        rounds: Arc<dyn RoundStore>,
        catalog: Arc<dyn FixtureCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rounds,
            catalog,
            clock,
            odds_policy: OddsPolicy::default(),
            book: RwLock::new(LedgerBook::default()),
        }
    }

    pub fn with_odds_policy(mut self, policy: OddsPolicy) -> Self {
        self.odds_policy = policy;
        self
    }

    pub fn odds_policy(&self) -> OddsPolicy {
        self.odds_policy
    }

    /// Resolve the round and its kickoff-ordered fixtures in one go.
    pub(crate) fn round_context(
        &self,
        round_id: &str,
    ) -> Result<(Round, Vec<Fixture>), LedgerError> {
        let round = self.rounds.round(round_id)?;
        let fixtures = self.catalog.fixtures(round_id)?;
        Ok((round, fixtures))
    }

    /// The instant the round freezes, or `None` for a fixtureless round.
    pub fn lock_instant(&self, round_id: &str) -> Result<Option<DateTime<Utc>>, LedgerError> {
        let (round, fixtures) = self.round_context(round_id)?;
        Ok(lock::lock_instant(&round, &fixtures))
    }

    /// Whether the round is locked right now. Recomputed on every call —
    /// lock state is never cached.
    pub fn is_locked(&self, round_id: &str) -> Result<bool, LedgerError> {
        let (round, fixtures) = self.round_context(round_id)?;
        Ok(lock::is_locked(&round, &fixtures, self.clock.now()))
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// All configured round identifiers, for display surfaces.
    pub fn round_ids(&self) -> Vec<String> {
        self.rounds.round_ids()
    }

    /// A point-in-time copy of the book for persistence.
    pub fn export_snapshot(&self) -> LedgerSnapshot {
        let book = self.book.read().unwrap();
        LedgerSnapshot::from_book(&book.bets, &book.outcomes)
    }

    /// Replace the book with a previously saved snapshot.
    pub fn restore(&self, snapshot: LedgerSnapshot) {
        let mut book = self.book.write().unwrap();
        *book = snapshot.into_book();
    }

    pub(crate) fn read_book(&self) -> std::sync::RwLockReadGuard<'_, LedgerBook> {
        // Lock poisoning only happens if a writer panicked mid-mutation;
        // there is no sensible recovery, so propagate the panic.
        self.book.read().unwrap()
    }

    pub(crate) fn write_book(&self) -> std::sync::RwLockWriteGuard<'_, LedgerBook> {
        self.book.write().unwrap()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
