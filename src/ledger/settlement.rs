//! Fixture settlement.
//!
//! Recording a fixture's outcome settles every open bet on it in one
//! atomic step. Settlement is terminal and idempotent: re-submitting the
//! same outcome is a no-op, a different outcome is a conflict, and a
//! settled bet never changes again.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{info, warn};

use crate::ledger::BettingLedger;
use crate::types::{Bet, BetStatus, LedgerError, Pick, Settlement};

impl BettingLedger {
    /// Record `outcome` for a fixture and settle its bets.
    ///
    /// Returns the fixture's bets after settlement (for every caller the
    /// same outcome yields the same records — the repeat call does not
    /// re-settle). Locked or not, settlement is always allowed; results
    /// arrive after kickoff by definition.
    pub fn settle(
        &self,
        round_id: &str,
        fixture_id: &str,
        outcome: Pick,
    ) -> Result<Vec<Bet>, LedgerError> {
        let (round, fixtures) = self.round_context(round_id)?;
        if !fixtures.iter().any(|f| f.id == fixture_id) {
            return Err(LedgerError::FixtureUnknown {
                round: round.id,
                fixture: fixture_id.to_string(),
            });
        }

        let mut book = self.write_book();

        let outcome_key = (round_id.to_string(), fixture_id.to_string());
        match book.outcomes.get(&outcome_key) {
            Some(recorded) if *recorded == outcome => {
                // Duplicate feed delivery; already settled with this outcome.
                info!(
                    round = round_id,
                    fixture = fixture_id,
                    outcome = %outcome,
                    "Settlement repeated, no-op"
                );
                return Ok(bets_for_fixture(&book.bets, round_id, fixture_id));
            }
            Some(recorded) => {
                warn!(
                    round = round_id,
                    fixture = fixture_id,
                    recorded = %recorded,
                    attempted = %outcome,
                    "Settlement conflict"
                );
                return Err(LedgerError::SettlementConflict {
                    fixture: fixture_id.to_string(),
                    recorded: *recorded,
                    attempted: outcome,
                });
            }
            None => {}
        }

        book.outcomes.insert(outcome_key, outcome);

        let mut settled = 0usize;
        for bet in book.bets.values_mut() {
            if bet.round_id != round_id || bet.fixture_id != fixture_id || !bet.is_open() {
                continue;
            }
            let matched = bet.pick == outcome;
            let payout = if matched {
                payout_for(bet.stake, bet.odds_at_placement)
            } else {
                0
            };
            bet.settlement = Some(Settlement {
                matched,
                payout,
                net: payout - bet.stake,
            });
            bet.status = BetStatus::Settled;
            settled += 1;
        }

        info!(
            round = round_id,
            fixture = fixture_id,
            outcome = %outcome,
            bets = settled,
            "Fixture settled"
        );

        Ok(bets_for_fixture(&book.bets, round_id, fixture_id))
    }
}

/// Winning payout: stake × odds, rounded half-away-from-zero to whole
/// currency units.
fn payout_for(stake: i64, odds: Decimal) -> i64 {
    (Decimal::from(stake) * odds)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(i64::MAX)
}

fn bets_for_fixture(
    bets: &std::collections::BTreeMap<super::BetKey, Bet>,
    round_id: &str,
    fixture_id: &str,
) -> Vec<Bet> {
    bets.values()
        .filter(|b| b.round_id == round_id && b.fixture_id == fixture_id)
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
