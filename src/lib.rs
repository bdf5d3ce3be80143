#![deny(missing_docs)]
//! Team Tracker Bot
//!
//! A Telegram bot that records how many messages each user posts in the
//! groups it is part of, and lets members query that activity from a
//! private chat.

/// Access control for activity reports
pub mod access;
/// Telegram bot handlers and UI
pub mod bot;
/// Configuration management
pub mod config;
/// Liveness HTTP endpoint
pub mod keepalive;
/// Log setup with secret redaction
pub mod logging;
/// Report and group list rendering
pub mod report;
/// Telegram runtime entrypoint
pub mod runner;
/// Storage layer (SQLite)
pub mod storage;
