//! Round configuration resolver.
//!
//! Exposes per-round parameters (bookmaker, stake step, stake cap, lock
//! offset) behind the `RoundStore` trait. An unknown round or an absent
//! game-affecting parameter is `ConfigMissing` — callers must never fall
//! back to defaults that move a threshold.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::types::{LedgerError, Round};

/// Abstraction over wherever round parameters live.
#[cfg_attr(test, mockall::automock)]
pub trait RoundStore: Send + Sync {
    /// Resolve a round by identifier.
    fn round(&self, round_id: &str) -> Result<Round, LedgerError>;

    /// All known round identifiers, for display surfaces.
    fn round_ids(&self) -> Vec<String>;
}

/// In-memory round store, seeded from configuration at startup.
///
/// Rounds are immutable once published; `publish` replaces a previous
/// round wholesale rather than editing it.
pub struct StaticRoundStore {
    rounds: Mutex<BTreeMap<String, Round>>,
}

impl StaticRoundStore {
    pub fn new(rounds: Vec<Round>) -> Result<Self, LedgerError> {
        let store = Self {
            rounds: Mutex::new(BTreeMap::new()),
        };
        for round in rounds {
            store.publish(round)?;
        }
        Ok(store)
    }

    pub fn empty() -> Self {
        Self {
            rounds: Mutex::new(BTreeMap::new()),
        }
    }

    /// Publish a round, superseding any previous round with the same id.
    pub fn publish(&self, round: Round) -> Result<(), LedgerError> {
        if round.stake_step <= 0 {
            return Err(LedgerError::ConfigMissing(format!(
                "round {} has no positive stake_step",
                round.id
            )));
        }
        if round.stake_cap <= 0 {
            return Err(LedgerError::ConfigMissing(format!(
                "round {} has no positive stake_cap",
                round.id
            )));
        }
        if round.lock_offset_mins < 0 {
            return Err(LedgerError::ConfigMissing(format!(
                "round {} has a negative lock offset",
                round.id
            )));
        }
        self.rounds.lock().unwrap().insert(round.id.clone(), round);
        Ok(())
    }
}

/// Convenience constructor used by `main` and tests.
pub fn shared_round_store(rounds: Vec<Round>) -> Result<Arc<StaticRoundStore>, LedgerError> {
    Ok(Arc::new(StaticRoundStore::new(rounds)?))
}

impl RoundStore for StaticRoundStore {
    fn round(&self, round_id: &str) -> Result<Round, LedgerError> {
        self.rounds
            .lock()
            .unwrap()
            .get(round_id)
            .cloned()
            .ok_or_else(|| LedgerError::ConfigMissing(format!("unknown round {round_id}")))
    }

    fn round_ids(&self) -> Vec<String> {
        self.rounds.lock().unwrap().keys().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
