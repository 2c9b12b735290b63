//! Typing practice on code snippets: the session engine, streaks, the
//! chapter catalog, a local JSON store and the leaderboard built on it.
//!
//! The terminal UI lives in the binary; everything here is usable without it.

pub mod config;
pub mod content;
pub mod engine;
pub mod logging;
pub mod session;
pub mod store;
