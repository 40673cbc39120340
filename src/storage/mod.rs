//! Persistence layer.
//!
//! Saves and loads the ledger book to/from a JSON snapshot file.
//! SQLite could replace this later for per-bet history queries, but a
//! JSON snapshot covers the restart-survival requirement.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::ledger::{BetKey, LedgerBook};
use crate::types::{Bet, Pick};

/// Default snapshot file path.
const DEFAULT_SNAPSHOT_FILE: &str = "gameweek_ledger.json";

/// A recorded fixture outcome, flattened for serialisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedOutcome {
    pub round_id: String,
    pub fixture_id: String,
    pub outcome: Pick,
}

/// A point-in-time copy of the book, in a stable file layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub bets: Vec<Bet>,
    pub outcomes: Vec<RecordedOutcome>,
}

impl LedgerSnapshot {
    pub(crate) fn from_book(
        bets: &BTreeMap<BetKey, Bet>,
        outcomes: &BTreeMap<(String, String), Pick>,
    ) -> Self {
        Self {
            bets: bets.values().cloned().collect(),
            outcomes: outcomes
                .iter()
                .map(|((round_id, fixture_id), outcome)| RecordedOutcome {
                    round_id: round_id.clone(),
                    fixture_id: fixture_id.clone(),
                    outcome: *outcome,
                })
                .collect(),
        }
    }

    pub(crate) fn into_book(self) -> LedgerBook {
        let mut book = LedgerBook::default();
        for bet in self.bets {
            book.bets.insert(
                (bet.round_id.clone(), bet.user.clone(), bet.fixture_id.clone()),
                bet,
            );
        }
        for rec in self.outcomes {
            book.outcomes
                .insert((rec.round_id, rec.fixture_id), rec.outcome);
        }
        book
    }
}

/// Save a ledger snapshot to a JSON file.
pub fn save_snapshot(snapshot: &LedgerSnapshot, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    let json = serde_json::to_string_pretty(snapshot)
        .context("Failed to serialise ledger snapshot")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write snapshot to {path}"))?;

    debug!(path, bets = snapshot.bets.len(), "Snapshot saved");
    Ok(())
}

/// Load a ledger snapshot from a JSON file.
/// Returns None if the file doesn't exist (fresh start).
pub fn load_snapshot(path: Option<&str>) -> Result<Option<LedgerSnapshot>> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved snapshot found, starting fresh");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read snapshot from {path}"))?;

    let snapshot: LedgerSnapshot = serde_json::from_str(&json)
        .context(format!("Failed to parse snapshot from {path}"))?;

    info!(
        path,
        bets = snapshot.bets.len(),
        outcomes = snapshot.outcomes.len(),
        "Ledger snapshot loaded from disk"
    );

    Ok(Some(snapshot))
}

/// Delete the snapshot file (for testing or reset).
pub fn delete_snapshot(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete snapshot file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
