//! Dashboard API route handlers.
//!
//! All endpoints are read-only views over the ledger and return JSON.
//! State is shared via `Arc<DashboardState>`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::ledger::BettingLedger;
use crate::types::{Bet, LedgerError, UserRoundTotals};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub ledger: Arc<BettingLedger>,
}

impl DashboardState {
    pub fn new(ledger: Arc<BettingLedger>) -> Self {
        Self { ledger }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RoundOverview {
    pub id: String,
    pub bookmaker: String,
    pub stake_step: i64,
    pub stake_cap: i64,
    pub fixtures: usize,
    pub locked: bool,
    pub lock_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundStatusResponse {
    pub round_id: String,
    pub locked: bool,
    pub lock_at: Option<String>,
    pub fixtures: usize,
    pub users: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixtureView {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub kickoff: String,
    pub odds_home: String,
    pub odds_draw: String,
    pub odds_away: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRoundResponse {
    pub user: String,
    pub round_id: String,
    pub total_open_stake: i64,
    pub bets: Vec<Bet>,
}

/// Unknown rounds map to 404; anything else is a 500.
fn error_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::ConfigMissing(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/rounds
pub async fn get_rounds(State(state): State<AppState>) -> Json<Vec<RoundOverview>> {
    let overviews = state
        .ledger
        .round_ids()
        .into_iter()
        .filter_map(|id| round_overview(&state.ledger, &id).ok())
        .collect();
    Json(overviews)
}

fn round_overview(ledger: &BettingLedger, round_id: &str) -> Result<RoundOverview, LedgerError> {
    let (round, fixtures) = ledger.round_context(round_id)?;
    let lock_at = ledger.lock_instant(round_id)?;
    Ok(RoundOverview {
        id: round.id,
        bookmaker: round.bookmaker,
        stake_step: round.stake_step,
        stake_cap: round.stake_cap,
        fixtures: fixtures.len(),
        locked: ledger.is_locked(round_id)?,
        lock_at: lock_at.map(|t| t.to_rfc3339()),
    })
}

/// GET /api/rounds/:id/status
pub async fn get_round_status(
    State(state): State<AppState>,
    Path(round_id): Path<String>,
) -> Result<Json<RoundStatusResponse>, StatusCode> {
    let ledger = &state.ledger;
    let (_, fixtures) = ledger.round_context(&round_id).map_err(|e| error_status(&e))?;
    let lock_at = ledger.lock_instant(&round_id).map_err(|e| error_status(&e))?;
    let locked = ledger.is_locked(&round_id).map_err(|e| error_status(&e))?;

    Ok(Json(RoundStatusResponse {
        users: ledger.round_summary(&round_id).len(),
        round_id,
        locked,
        lock_at: lock_at.map(|t| t.to_rfc3339()),
        fixtures: fixtures.len(),
    }))
}

/// GET /api/rounds/:id/fixtures
pub async fn get_round_fixtures(
    State(state): State<AppState>,
    Path(round_id): Path<String>,
) -> Result<Json<Vec<FixtureView>>, StatusCode> {
    let (_, fixtures) = state
        .ledger
        .round_context(&round_id)
        .map_err(|e| error_status(&e))?;

    Ok(Json(
        fixtures
            .into_iter()
            .map(|f| FixtureView {
                id: f.id,
                home_team: f.home_team,
                away_team: f.away_team,
                kickoff: f.kickoff.to_rfc3339(),
                odds_home: f.odds.home.to_string(),
                odds_draw: f.odds.draw.to_string(),
                odds_away: f.odds.away.to_string(),
            })
            .collect(),
    ))
}

/// GET /api/rounds/:id/summary
pub async fn get_round_summary(
    State(state): State<AppState>,
    Path(round_id): Path<String>,
) -> Result<Json<Vec<UserRoundTotals>>, StatusCode> {
    // Resolve the round first so unknown ids 404 rather than returning [].
    state
        .ledger
        .round_context(&round_id)
        .map_err(|e| error_status(&e))?;
    Ok(Json(state.ledger.round_summary(&round_id)))
}

/// GET /api/users/:user/rounds/:id
pub async fn get_user_round(
    State(state): State<AppState>,
    Path((user, round_id)): Path<(String, String)>,
) -> Result<Json<UserRoundResponse>, StatusCode> {
    state
        .ledger
        .round_context(&round_id)
        .map_err(|e| error_status(&e))?;

    Ok(Json(UserRoundResponse {
        total_open_stake: state.ledger.total_open_stake(&round_id, &user),
        bets: state.ledger.user_bets(&round_id, &user),
        user,
        round_id,
    }))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::fixtures::InMemoryFixtureCatalog;
    use crate::rounds::StaticRoundStore;
    use crate::types::{BetSlip, Fixture, OddsTriple, Pick, Round};
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn test_state() -> AppState {
        let rounds = Arc::new(
            StaticRoundStore::new(vec![Round {
                id: "GW7".to_string(),
                bookmaker: "Tetsu".to_string(),
                stake_step: 100,
                stake_cap: 5000,
                lock_offset_mins: 120,
            }])
            .unwrap(),
        );
        let kickoff = Utc.with_ymd_and_hms(2025, 10, 5, 15, 0, 0).unwrap();
        let catalog = Arc::new(InMemoryFixtureCatalog::new());
        catalog.upsert_fixture(
            "GW7",
            Fixture {
                id: "M1".to_string(),
                home_team: "Reds".to_string(),
                away_team: "Blues".to_string(),
                kickoff,
                odds: OddsTriple::new(dec!(1.90), dec!(3.40), dec!(4.20)),
            },
        );
        let clock = Arc::new(ManualClock::new(kickoff - Duration::days(1)));
        let ledger = Arc::new(BettingLedger::new(rounds, catalog, clock));
        ledger
            .place_bet(
                "GW7",
                "Aki",
                BetSlip {
                    fixture_id: "M1".to_string(),
                    pick: Pick::Home,
                    stake: 1000,
                },
            )
            .unwrap();
        Arc::new(DashboardState::new(ledger))
    }

    #[tokio::test]
    async fn test_get_rounds_handler() {
        let Json(rounds) = get_rounds(State(test_state())).await;
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].id, "GW7");
        assert!(!rounds[0].locked);
        assert!(rounds[0].lock_at.is_some());
    }

    #[tokio::test]
    async fn test_get_round_status_handler() {
        let Json(status) = get_round_status(State(test_state()), Path("GW7".to_string()))
            .await
            .unwrap();
        assert_eq!(status.fixtures, 1);
        assert_eq!(status.users, 1);
    }

    #[tokio::test]
    async fn test_unknown_round_is_404() {
        let err = get_round_status(State(test_state()), Path("GW99".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_user_round_handler() {
        let Json(resp) = get_user_round(
            State(test_state()),
            Path(("Aki".to_string(), "GW7".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(resp.total_open_stake, 1000);
        assert_eq!(resp.bets.len(), 1);
    }

    #[tokio::test]
    async fn test_get_user_round_empty_user() {
        let Json(resp) = get_user_round(
            State(test_state()),
            Path(("Nobody".to_string(), "GW7".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(resp.total_open_stake, 0);
        assert!(resp.bets.is_empty());
    }
}
