//! Log ingestion and match reconstruction for the UHC parser.
//!
//! Classifies raw server log lines into events, replays them into server
//! sessions and matches, validates which sessions count, merges player
//! identities across sessions and ranks the players.

pub mod analysis;
pub mod classifier;
pub mod highscore;
pub mod identity;
pub mod reader;
pub mod reconstructor;
pub mod validator;

pub use uhc_core as core;
