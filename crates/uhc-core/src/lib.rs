//! Core domain layer for the UHC parser.
//!
//! Holds the typed log events, the per-session server/player/team/match
//! model, configuration, and shared formatting and time helpers.

pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{ParserError, Result};
