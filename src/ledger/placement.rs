//! Bet placement and modification.
//!
//! Single submissions are the one-line case of the batch path: every
//! slip is validated against the round's rules and the combined stake
//! total before anything is written, so a batch either applies in full
//! or not at all.

use tracing::{debug, info};

use crate::ledger::{lock, BettingLedger, OddsPolicy};
use crate::types::{Bet, BetSlip, BetStatus, Fixture, LedgerError, Round};

impl BettingLedger {
    /// Place or replace a single bet.
    ///
    /// Keyed by (round, user, fixture): a re-submission for the same
    /// fixture replaces the prior bet, it never adds a second record.
    pub fn place_bet(
        &self,
        round_id: &str,
        user: &str,
        slip: BetSlip,
    ) -> Result<Bet, LedgerError> {
        let mut placed = self.place_bets(round_id, user, vec![slip])?;
        // One slip in, one bet out.
        Ok(placed.remove(0))
    }

    /// Place or replace a batch of bets (a round-sheet), atomically.
    ///
    /// The cap check runs against the combined new total; if any slip
    /// fails any rule the whole batch is rejected with nothing written.
    /// A batch naming the same fixture twice keeps the last slip.
    pub fn place_bets(
        &self,
        round_id: &str,
        user: &str,
        slips: Vec<BetSlip>,
    ) -> Result<Vec<Bet>, LedgerError> {
        let (round, fixtures) = self.round_context(round_id)?;

        if user == round.bookmaker {
            debug!(round = round_id, user, "Rejected: bookmaker cannot bet");
            return Err(LedgerError::BookmakerCannotBet {
                round: round_id.to_string(),
                user: user.to_string(),
            });
        }

        // Re-check the lock at call time; never trust a UI-cached value.
        let now = self.now();
        if let Some(since) = lock::lock_instant(&round, &fixtures) {
            if now >= since {
                debug!(round = round_id, user, %since, "Rejected: round locked");
                return Err(LedgerError::RoundLocked {
                    round: round_id.to_string(),
                    since,
                });
            }
        }

        // Last slip wins when a fixture appears twice in one sheet.
        let mut deduped: Vec<BetSlip> = Vec::with_capacity(slips.len());
        for slip in slips {
            deduped.retain(|s| s.fixture_id != slip.fixture_id);
            deduped.push(slip);
        }

        let mut validated: Vec<(BetSlip, &Fixture)> = Vec::with_capacity(deduped.len());
        for slip in deduped {
            let fixture = validate_slip(&round, &fixtures, &slip, self.odds_policy())?;
            validated.push((slip, fixture));
        }

        let mut book = self.write_book();

        // A recorded outcome makes the fixture's bets final.
        for (slip, _) in &validated {
            if let Some(recorded) = book
                .outcomes
                .get(&(round_id.to_string(), slip.fixture_id.clone()))
            {
                return Err(LedgerError::SettlementConflict {
                    fixture: slip.fixture_id.clone(),
                    recorded: *recorded,
                    attempted: slip.pick,
                });
            }
        }

        // Cap check with replacement semantics: sum the user's other OPEN
        // stakes, excluding every fixture this batch replaces, then add
        // the batch itself. Lowering a stake can therefore never trip the
        // cap.
        let untouched: i64 = book
            .bets
            .values()
            .filter(|b| {
                b.round_id == round_id
                    && b.user == user
                    && b.is_open()
                    && !validated.iter().any(|(s, _)| s.fixture_id == b.fixture_id)
            })
            .map(|b| b.stake)
            .sum();
        let batch_total: i64 = validated.iter().map(|(s, _)| s.stake).sum();
        let attempted = untouched + batch_total;
        if attempted > round.stake_cap {
            debug!(
                round = round_id,
                user,
                attempted,
                cap = round.stake_cap,
                "Rejected: stake cap exceeded"
            );
            return Err(LedgerError::StakeCapExceeded {
                round: round_id.to_string(),
                user: user.to_string(),
                attempted,
                cap: round.stake_cap,
            });
        }

        // Everything passed — apply the whole sheet.
        let mut placed = Vec::with_capacity(validated.len());
        for (slip, fixture) in validated {
            let bet = Bet {
                round_id: round_id.to_string(),
                user: user.to_string(),
                fixture_id: slip.fixture_id.clone(),
                pick: slip.pick,
                stake: slip.stake,
                odds_at_placement: fixture.odds.price_for(slip.pick),
                placed_at: now,
                status: BetStatus::Open,
                settlement: None,
            };
            info!(
                round = round_id,
                user,
                fixture = %slip.fixture_id,
                pick = %slip.pick,
                stake = slip.stake,
                odds = %bet.odds_at_placement,
                "Bet placed"
            );
            book.bets.insert(
                (round_id.to_string(), user.to_string(), slip.fixture_id),
                bet.clone(),
            );
            placed.push(bet);
        }

        Ok(placed)
    }
}

/// Per-slip validation: stake step, fixture membership, odds policy.
fn validate_slip<'a>(
    round: &Round,
    fixtures: &'a [Fixture],
    slip: &BetSlip,
    policy: OddsPolicy,
) -> Result<&'a Fixture, LedgerError> {
    if !round.is_stake_valid(slip.stake) {
        return Err(LedgerError::InvalidStake {
            stake: slip.stake,
            step: round.stake_step,
        });
    }

    let fixture = fixtures
        .iter()
        .find(|f| f.id == slip.fixture_id)
        .ok_or_else(|| LedgerError::FixtureUnknown {
            round: round.id.clone(),
            fixture: slip.fixture_id.clone(),
        })?;

    // Zero-stake submissions (clearing a position) are exempt from the
    // odds policy — there is nothing riding on the placeholder.
    if policy == OddsPolicy::RejectUnset
        && slip.stake > 0
        && fixture.odds.is_unset_for(slip.pick)
    {
        return Err(LedgerError::OddsUnset {
            fixture: slip.fixture_id.clone(),
            stake: slip.stake,
        });
    }

    Ok(fixture)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
