//! Lobby chat channel.

mod client;

pub use client::{ChatClient, SuppressionOutcome};
