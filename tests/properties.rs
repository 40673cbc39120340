//! Invariant checks exercised through the public API, including the
//! cap invariant under concurrent writers.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::thread;

use gameweek::clock::ManualClock;
use gameweek::fixtures::InMemoryFixtureCatalog;
use gameweek::ledger::BettingLedger;
use gameweek::rounds::StaticRoundStore;
use gameweek::types::{BetSlip, Fixture, LedgerError, OddsTriple, Pick, Round};

fn kickoff() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 5, 15, 0, 0).unwrap()
}

fn round(cap: i64) -> Round {
    Round {
        id: "GW7".to_string(),
        bookmaker: "Tetsu".to_string(),
        stake_step: 100,
        stake_cap: cap,
        lock_offset_mins: 120,
    }
}

fn slip(fixture_id: &str, pick: Pick, stake: i64) -> BetSlip {
    BetSlip {
        fixture_id: fixture_id.to_string(),
        pick,
        stake,
    }
}

fn league(cap: i64, fixture_count: usize) -> (Arc<BettingLedger>, ManualClock) {
    let rounds = Arc::new(StaticRoundStore::new(vec![round(cap)]).unwrap());
    let catalog = Arc::new(InMemoryFixtureCatalog::new());
    for i in 0..fixture_count {
        catalog.upsert_fixture(
            "GW7",
            Fixture {
                id: format!("M{i}"),
                home_team: "Home".to_string(),
                away_team: "Away".to_string(),
                kickoff: kickoff() + Duration::hours(i as i64),
                odds: OddsTriple::new(dec!(2.00), dec!(3.00), dec!(4.00)),
            },
        );
    }
    let clock = ManualClock::new(kickoff() - Duration::days(2));
    let ledger = Arc::new(BettingLedger::new(
        rounds,
        catalog,
        Arc::new(clock.clone()),
    ));
    (ledger, clock)
}

#[test]
fn test_cap_never_exceeded_under_concurrent_writers() {
    let (ledger, _) = league(5000, 8);

    // Eight threads hammer the same user with bets on different
    // fixtures; the accepted total must never exceed the cap.
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    let _ = ledger.place_bet("GW7", "Aki", slip(&format!("M{i}"), Pick::Home, 1000));
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert!(ledger.total_open_stake("GW7", "Aki") <= 5000);
    // Something must have been accepted, too.
    assert!(ledger.total_open_stake("GW7", "Aki") > 0);
}

#[test]
fn test_settlement_idempotent_under_concurrent_feeds() {
    let (ledger, clock) = league(5000, 1);
    ledger.place_bet("GW7", "Aki", slip("M0", Pick::Home, 1000)).unwrap();
    clock.set(kickoff() + Duration::hours(2));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = ledger.clone();
            thread::spawn(move || ledger.settle("GW7", "M0", Pick::Home))
        })
        .collect();
    for h in handles {
        // Every racing call sees the same outcome, so none conflicts.
        h.join().unwrap().unwrap();
    }

    let summary = ledger.round_summary("GW7");
    assert_eq!(summary[0].total_payout, 2000);
    assert_eq!(summary[0].settled_bets, 1);
}

#[test]
fn test_replacement_is_last_write_wins() {
    let (ledger, _) = league(5000, 1);

    // However many times the sheet is resubmitted, one record remains
    // and it matches the last submission.
    for stake in [1000, 300, 2500, 700] {
        ledger.place_bet("GW7", "Aki", slip("M0", Pick::Home, stake)).unwrap();
    }
    let bets = ledger.user_bets("GW7", "Aki");
    assert_eq!(bets.len(), 1);
    assert_eq!(bets[0].stake, 700);
}

#[test]
fn test_rejected_batches_leave_no_trace() {
    let (ledger, _) = league(5000, 3);
    ledger.place_bet("GW7", "Aki", slip("M0", Pick::Home, 2000)).unwrap();
    let before = ledger.user_bets("GW7", "Aki");

    // Each of these fails a different rule; none may move the book.
    let attempts: Vec<Vec<BetSlip>> = vec![
        vec![slip("M1", Pick::Home, 250)],                              // off-step
        vec![slip("M9", Pick::Home, 100)],                              // unknown fixture
        vec![slip("M1", Pick::Home, 2000), slip("M2", Pick::Home, 2000)], // cap
        vec![slip("M1", Pick::Home, -100)],                             // negative
    ];
    for slips in attempts {
        assert!(ledger.place_bets("GW7", "Aki", slips).is_err());
        let after = ledger.user_bets("GW7", "Aki");
        assert_eq!(after.len(), before.len());
        assert_eq!(after[0].stake, 2000);
    }
}

#[test]
fn test_lock_applies_to_whole_round_not_per_fixture() {
    // M0 kicks off Saturday, M5 a full five hours later; once the
    // earliest fixture's offset passes, even the late one is closed.
    let (ledger, clock) = league(5000, 6);
    clock.set(kickoff() - Duration::minutes(119));

    for id in ["M0", "M5"] {
        let err = ledger.place_bet("GW7", "Aki", slip(id, Pick::Home, 100)).unwrap_err();
        assert!(matches!(err, LedgerError::RoundLocked { .. }));
    }
}

#[test]
fn test_whole_sheet_wipe_with_zero_stakes() {
    let (ledger, _) = league(5000, 3);
    ledger
        .place_bets(
            "GW7",
            "Aki",
            vec![
                slip("M0", Pick::Home, 2000),
                slip("M1", Pick::Draw, 1000),
                slip("M2", Pick::Away, 2000),
            ],
        )
        .unwrap();

    // Resubmitting everything at zero clears the exposure entirely.
    ledger
        .place_bets(
            "GW7",
            "Aki",
            vec![
                slip("M0", Pick::Home, 0),
                slip("M1", Pick::Draw, 0),
                slip("M2", Pick::Away, 0),
            ],
        )
        .unwrap();
    assert_eq!(ledger.total_open_stake("GW7", "Aki"), 0);

    // And the freed room is immediately usable.
    ledger.place_bet("GW7", "Aki", slip("M0", Pick::Home, 5000)).unwrap();
}
