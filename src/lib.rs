//! GAMEWEEK — Social Football Prediction Ledger
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod clock;
pub mod config;
pub mod dashboard;
pub mod fixtures;
pub mod ledger;
pub mod rounds;
pub mod storage;
pub mod types;
