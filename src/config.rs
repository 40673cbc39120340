//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs:
//! the game settings, the seeded rounds with their fixtures, and the
//! monitoring dashboard. Thresholds that move money (stake step, stake
//! cap, lock offset) have no serde defaults — a round that omits one
//! fails to parse rather than silently betting under different rules.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;

use crate::types::{Fixture, OddsTriple, Round};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub game: GameConfig,
    pub rounds: Vec<RoundConfig>,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    pub name: String,
    pub currency: String,
    /// Where the ledger snapshot lives on disk.
    pub snapshot_file: String,
    pub autosave_interval_secs: u64,
    /// Accept positive stakes on placeholder (1.0) odds when true.
    #[serde(default)]
    pub allow_unset_odds: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoundConfig {
    pub id: String,
    pub bookmaker: String,
    pub stake_step: i64,
    pub stake_cap: i64,
    pub lock_offset_mins: i64,
    #[serde(default)]
    pub fixtures: Vec<FixtureConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FixtureConfig {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub kickoff: DateTime<Utc>,
    /// Missing odds start as the 1.0 placeholder and get set later
    /// through the admin edit path.
    #[serde(default)]
    pub odds_home: Option<Decimal>,
    #[serde(default)]
    pub odds_draw: Option<Decimal>,
    #[serde(default)]
    pub odds_away: Option<Decimal>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }
}

impl RoundConfig {
    pub fn to_round(&self) -> Round {
        Round {
            id: self.id.clone(),
            bookmaker: self.bookmaker.clone(),
            stake_step: self.stake_step,
            stake_cap: self.stake_cap,
            lock_offset_mins: self.lock_offset_mins,
        }
    }
}

impl FixtureConfig {
    pub fn to_fixture(&self) -> Fixture {
        let odd = |o: Option<Decimal>| o.unwrap_or(OddsTriple::UNSET);
        Fixture {
            id: self.id.clone(),
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
            kickoff: self.kickoff,
            odds: OddsTriple::new(
                odd(self.odds_home),
                odd(self.odds_draw),
                odd(self.odds_away),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
        [game]
        name = "Friday League"
        currency = "JPY"
        snapshot_file = "gameweek_ledger.json"
        autosave_interval_secs = 60

        [dashboard]
        enabled = true
        port = 8787

        [[rounds]]
        id = "GW7"
        bookmaker = "Tetsu"
        stake_step = 100
        stake_cap = 5000
        lock_offset_mins = 120

        [[rounds.fixtures]]
        id = "M1"
        home_team = "Reds"
        away_team = "Blues"
        kickoff = "2025-10-05T15:00:00Z"
        odds_home = 1.90
        odds_draw = 3.40
        odds_away = 4.20

        [[rounds.fixtures]]
        id = "M2"
        home_team = "Greens"
        away_team = "Whites"
        kickoff = "2025-10-05T17:30:00Z"
    "#;

    #[test]
    fn test_parse_sample_config() {
        let cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.game.name, "Friday League");
        assert!(!cfg.game.allow_unset_odds);
        assert_eq!(cfg.dashboard.port, 8787);
        assert_eq!(cfg.rounds.len(), 1);

        let round = cfg.rounds[0].to_round();
        assert_eq!(round.stake_cap, 5000);
        assert_eq!(round.lock_offset_mins, 120);

        let m1 = cfg.rounds[0].fixtures[0].to_fixture();
        assert_eq!(m1.odds.home, dec!(1.90));

        // Omitted odds land on the placeholder.
        let m2 = cfg.rounds[0].fixtures[1].to_fixture();
        assert!(m2.odds.any_unset());
    }

    #[test]
    fn test_missing_threshold_fails_to_parse() {
        let broken = r#"
            [game]
            name = "x"
            currency = "JPY"
            snapshot_file = "l.json"
            autosave_interval_secs = 60

            [dashboard]
            enabled = false
            port = 8787

            [[rounds]]
            id = "GW7"
            bookmaker = "Tetsu"
            stake_step = 100
            lock_offset_mins = 120
        "#;
        // stake_cap is absent; there is no default to fall back to.
        assert!(toml::from_str::<AppConfig>(broken).is_err());
    }
}
