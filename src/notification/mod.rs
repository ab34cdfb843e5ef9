//! General notification channel: alerts, lobby-activity marker and the
//! startup unread reconciliation.

mod client;

pub use client::{NotificationClient, NotificationOutcome};
