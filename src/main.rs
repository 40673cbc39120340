//! GAMEWEEK — Social Football Prediction Ledger
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the ledger from disk (or starts fresh), serves the
//! monitoring dashboard, and autosaves until shutdown.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use gameweek::clock::SystemClock;
use gameweek::config::AppConfig;
use gameweek::dashboard::{self, routes::DashboardState};
use gameweek::fixtures::InMemoryFixtureCatalog;
use gameweek::ledger::{BettingLedger, OddsPolicy};
use gameweek::rounds::shared_round_store;
use gameweek::storage;

const BANNER: &str = r#"
  ____    _    __  __ _______        _______ _____ _  __
 / ___|  / \  |  \/  | ____\ \      / / ____| ____| |/ /
| |  _  / _ \ | |\/| |  _|  \ \ /\ / /|  _| |  _| | ' /
| |_| |/ ___ \| |  | | |___  \ V  V / | |___| |___| . \
 \____/_/   \_\_|  |_|_____|  \_/\_/  |_____|_____|_|\_\

  Social Football Prediction Ledger
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        game = %cfg.game.name,
        currency = %cfg.game.currency,
        rounds = cfg.rounds.len(),
        "GAMEWEEK starting up"
    );

    // -- Build stores from configuration ----------------------------------

    let rounds = shared_round_store(cfg.rounds.iter().map(|r| r.to_round()).collect())
        .context("Invalid round configuration")?;

    let catalog = Arc::new(InMemoryFixtureCatalog::new());
    for round_cfg in &cfg.rounds {
        catalog.add_round(&round_cfg.id);
        for fixture_cfg in &round_cfg.fixtures {
            catalog.upsert_fixture(&round_cfg.id, fixture_cfg.to_fixture());
        }
    }

    let odds_policy = if cfg.game.allow_unset_odds {
        OddsPolicy::AllowUnset
    } else {
        OddsPolicy::RejectUnset
    };

    let ledger = Arc::new(
        BettingLedger::new(rounds, catalog, Arc::new(SystemClock)).with_odds_policy(odds_policy),
    );

    // -- Restore ledger from disk ------------------------------------------

    let snapshot_file = cfg.game.snapshot_file.clone();
    match storage::load_snapshot(Some(&snapshot_file))? {
        Some(snapshot) => {
            info!(
                bets = snapshot.bets.len(),
                outcomes = snapshot.outcomes.len(),
                "Resumed from saved ledger"
            );
            ledger.restore(snapshot);
        }
        None => info!("Fresh ledger"),
    }

    // -- Dashboard ---------------------------------------------------------

    if cfg.dashboard.enabled {
        let state = Arc::new(DashboardState::new(ledger.clone()));
        dashboard::spawn_dashboard(state, cfg.dashboard.port)?;
    }

    // -- Autosave loop -----------------------------------------------------

    let autosave = Duration::from_secs(cfg.game.autosave_interval_secs.max(1));
    let mut interval = tokio::time::interval(autosave);
    interval.tick().await; // first tick fires immediately
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = autosave.as_secs(),
        "Ledger running. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = storage::save_snapshot(&ledger.export_snapshot(), Some(&snapshot_file)) {
                    error!(error = %e, "Autosave failed");
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    // Save final state
    storage::save_snapshot(&ledger.export_snapshot(), Some(&snapshot_file))?;
    info!("GAMEWEEK shut down cleanly.");

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gameweek=info"));

    let json_logging = std::env::var("GAMEWEEK_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
