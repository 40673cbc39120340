//! Aggregation queries over the book.
//!
//! Read-only views: per-user open exposure and the round scoreboard.
//! Both read a consistent snapshot under the book's read lock.

use std::collections::BTreeMap;

use crate::ledger::BettingLedger;
use crate::types::{Bet, UserRoundTotals};

impl BettingLedger {
    /// The user's total OPEN stake in a round. Settled bets no longer
    /// count against the cap; a user with no bets is simply 0.
    pub fn total_open_stake(&self, round_id: &str, user: &str) -> i64 {
        let book = self.read_book();
        book.bets
            .values()
            .filter(|b| b.round_id == round_id && b.user == user && b.is_open())
            .map(|b| b.stake)
            .sum()
    }

    /// The round scoreboard: one row per user who has placed at least
    /// one bet, in stable user order.
    pub fn round_summary(&self, round_id: &str) -> Vec<UserRoundTotals> {
        let book = self.read_book();
        let mut per_user: BTreeMap<&str, UserRoundTotals> = BTreeMap::new();

        for bet in book.bets.values().filter(|b| b.round_id == round_id) {
            let row = per_user
                .entry(bet.user.as_str())
                .or_insert_with(|| UserRoundTotals {
                    user: bet.user.clone(),
                    total_stake: 0,
                    total_payout: 0,
                    net: 0,
                    open_bets: 0,
                    settled_bets: 0,
                });
            row.total_stake += bet.stake;
            match &bet.settlement {
                Some(s) => {
                    row.total_payout += s.payout;
                    row.net += s.net;
                    row.settled_bets += 1;
                }
                None => row.open_bets += 1,
            }
        }

        per_user.into_values().collect()
    }

    /// Every bet a user holds in a round, in fixture order.
    pub fn user_bets(&self, round_id: &str, user: &str) -> Vec<Bet> {
        let book = self.read_book();
        book.bets
            .values()
            .filter(|b| b.round_id == round_id && b.user == user)
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
