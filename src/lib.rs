//! Daily Azerbaijani ↔ Persian language bot for a Telegram group.
//!
//! Morning words, midday grammar, evening quiz, and mention-triggered
//! correction and translation.

pub mod config;
pub mod content;
pub mod daily;
pub mod generator;
pub mod jobs;
pub mod mention;
pub mod quiz;
pub mod scheduler;
pub mod telegram;
