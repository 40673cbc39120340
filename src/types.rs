//! Shared types for the GAMEWEEK betting ledger.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that the stores, ledger,
//! storage, and dashboard modules can depend on them without
//! circular references.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Pick
// ---------------------------------------------------------------------------

/// A match-outcome pick: home win, draw, or away win.
///
/// The same enum doubles as the final outcome supplied at settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pick {
    Home,
    Draw,
    Away,
}

impl Pick {
    /// All picks (useful for iteration).
    pub const ALL: &'static [Pick] = &[Pick::Home, Pick::Draw, Pick::Away];
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pick::Home => write!(f, "HOME"),
            Pick::Draw => write!(f, "DRAW"),
            Pick::Away => write!(f, "AWAY"),
        }
    }
}

/// Parse the raw pick encodings seen at the ingestion boundary.
///
/// Upstream forms encode picks inconsistently ("H", "Home", "Home Win",
/// "1"/"X"/"2"); everything is normalised here so the core only ever
/// sees the three-valued enum.
impl std::str::FromStr for Pick {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "h" | "home" | "home win" | "1" => Ok(Pick::Home),
            "d" | "x" | "draw" => Ok(Pick::Draw),
            "a" | "away" | "away win" | "2" => Ok(Pick::Away),
            _ => Err(anyhow::anyhow!("Unknown pick: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Odds
// ---------------------------------------------------------------------------

/// Decimal odds for the three outcomes of a fixture.
///
/// A value of exactly 1.0 is the "unset" placeholder an administrator has
/// not filled in yet — visible to callers, never meant for settlement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OddsTriple {
    pub home: Decimal,
    pub draw: Decimal,
    pub away: Decimal,
}

impl OddsTriple {
    /// The placeholder value for an odd nobody has set.
    pub const UNSET: Decimal = Decimal::ONE;

    pub fn new(home: Decimal, draw: Decimal, away: Decimal) -> Self {
        Self { home, draw, away }
    }

    /// A triple with all three odds at the unset placeholder.
    pub fn unset() -> Self {
        Self::new(Self::UNSET, Self::UNSET, Self::UNSET)
    }

    /// The odd paying out for the given pick.
    pub fn price_for(&self, pick: Pick) -> Decimal {
        match pick {
            Pick::Home => self.home,
            Pick::Draw => self.draw,
            Pick::Away => self.away,
        }
    }

    /// Whether the odd for this pick is still the placeholder.
    pub fn is_unset_for(&self, pick: Pick) -> bool {
        self.price_for(pick) == Self::UNSET
    }

    /// Whether any of the three odds is still the placeholder.
    pub fn any_unset(&self) -> bool {
        Pick::ALL.iter().any(|p| self.is_unset_for(*p))
    }

    /// Whether every odd is a legal decimal odd (>= 1.0).
    pub fn is_valid(&self) -> bool {
        Pick::ALL.iter().all(|p| self.price_for(*p) >= Decimal::ONE)
    }
}

impl fmt::Display for OddsTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.home, self.draw, self.away)
    }
}

// ---------------------------------------------------------------------------
// Round & fixture
// ---------------------------------------------------------------------------

/// Per-round ("gameweek") parameters. Immutable once published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    /// Round identifier, e.g. "GW7".
    pub id: String,
    /// The designated bookmaker for this round — excluded from betting.
    pub bookmaker: String,
    /// Minimum stake increment in whole currency units.
    pub stake_step: i64,
    /// Maximum total open stake per user in this round.
    pub stake_cap: i64,
    /// Minutes before the earliest kickoff at which the round freezes.
    pub lock_offset_mins: i64,
}

impl Round {
    /// The lock offset as a chrono duration.
    pub fn lock_offset(&self) -> Duration {
        Duration::minutes(self.lock_offset_mins)
    }

    /// Whether a stake is a non-negative multiple of this round's step.
    pub fn is_stake_valid(&self, stake: i64) -> bool {
        self.stake_step > 0 && stake >= 0 && stake % self.stake_step == 0
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (bookmaker: {}, step: {}, cap: {}, lock: T-{}m)",
            self.id, self.bookmaker, self.stake_step, self.stake_cap, self.lock_offset_mins,
        )
    }
}

/// A single match inside a round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    /// Match identifier, unique within the round.
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    /// Absolute kickoff instant (UTC-normalised).
    pub kickoff: DateTime<Utc>,
    /// Latest administrator-edited odds; may carry the unset placeholder.
    pub odds: OddsTriple,
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} v {} @ {} ({})",
            self.id,
            self.home_team,
            self.away_team,
            self.kickoff.format("%Y-%m-%d %H:%M"),
            self.odds,
        )
    }
}

// ---------------------------------------------------------------------------
// Bets
// ---------------------------------------------------------------------------

/// Bet lifecycle: OPEN until the fixture's outcome is recorded, then SETTLED.
/// SETTLED is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetStatus {
    Open,
    Settled,
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetStatus::Open => write!(f, "OPEN"),
            BetStatus::Settled => write!(f, "SETTLED"),
        }
    }
}

/// Result of settling a bet, computed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Whether the pick matched the recorded outcome.
    pub matched: bool,
    /// Payout in whole currency units (0 for an unmatched pick).
    pub payout: i64,
    /// `payout - stake`.
    pub net: i64,
}

/// One line of a submission: a pick and a stake on a single fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetSlip {
    pub fixture_id: String,
    pub pick: Pick,
    pub stake: i64,
}

/// A placed bet, uniquely keyed by (round, user, fixture).
///
/// `odds_at_placement` is copied from the fixture at the moment of
/// placement or last modification — later admin odds edits never
/// retroactively change a placed bet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub round_id: String,
    pub user: String,
    pub fixture_id: String,
    pub pick: Pick,
    /// Stake in whole currency units; a non-negative multiple of the
    /// round's stake step.
    pub stake: i64,
    pub odds_at_placement: Decimal,
    pub placed_at: DateTime<Utc>,
    pub status: BetStatus,
    /// Present once status is SETTLED, immutable thereafter.
    pub settlement: Option<Settlement>,
}

impl Bet {
    pub fn is_open(&self) -> bool {
        self.status == BetStatus::Open
    }
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} on {}: {} {} @ {} ({})",
            self.round_id,
            self.user,
            self.fixture_id,
            self.pick,
            self.stake,
            self.odds_at_placement,
            self.status,
        )?;
        if let Some(s) = &self.settlement {
            let sign = if s.net >= 0 { "+" } else { "" };
            write!(f, " → payout {} ({sign}{})", s.payout, s.net)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Per-user totals for a round, derived fresh on every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoundTotals {
    pub user: String,
    pub total_stake: i64,
    pub total_payout: i64,
    pub net: i64,
    pub open_bets: usize,
    pub settled_bets: usize,
}

impl fmt::Display for UserRoundTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.net >= 0 { "+" } else { "" };
        write!(
            f,
            "{}: staked {} paid {} ({sign}{}) [{} open / {} settled]",
            self.user, self.total_stake, self.total_payout, self.net, self.open_bets, self.settled_bets,
        )
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Domain errors for the betting ledger.
///
/// Taxonomy per the error-handling design: `ConfigMissing` is a
/// configuration error and is never silently defaulted; `InvalidStake`
/// and `FixtureUnknown` are validation errors the caller can correct;
/// `BookmakerCannotBet`, `RoundLocked`, `StakeCapExceeded` and
/// `OddsUnset` are expected policy rejections; `SettlementConflict`
/// indicates operator misuse and is worth logging.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("Round configuration missing: {0}")]
    ConfigMissing(String),

    #[error("Bookmaker {user} cannot bet in round {round}")]
    BookmakerCannotBet { round: String, user: String },

    #[error("Round {round} has been locked since {since}")]
    RoundLocked {
        round: String,
        since: DateTime<Utc>,
    },

    #[error("Invalid stake {stake}: must be a non-negative multiple of {step}")]
    InvalidStake { stake: i64, step: i64 },

    #[error("Fixture {fixture} does not belong to round {round}")]
    FixtureUnknown { round: String, fixture: String },

    #[error("Stake cap exceeded in round {round} for {user}: {attempted} > {cap}")]
    StakeCapExceeded {
        round: String,
        user: String,
        attempted: i64,
        cap: i64,
    },

    #[error("Odds for fixture {fixture} are still unset; refusing stake {stake}")]
    OddsUnset { fixture: String, stake: i64 },

    #[error("Fixture {fixture} already settled as {recorded}; refusing {attempted}")]
    SettlementConflict {
        fixture: String,
        recorded: Pick,
        attempted: Pick,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
