//! Prometheus metrics for the session client.
//!
//! Counters cover both live channels:
//! - Frames received and decode failures per channel
//! - Transport failures per channel
//! - Banner churn (shown, evicted by the visible cap)
//! - Suppression commands sent

mod helpers;

pub use helpers::{encode_metrics, BannerMetrics, ChannelMetrics};

use lazy_static::lazy_static;
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "elearning_client";

lazy_static! {
    // ============================================================================
    // Channel Metrics
    // ============================================================================

    /// Text frames received by channel
    pub static ref CHANNEL_MESSAGES_RECEIVED: IntCounterVec = register_int_counter_vec!(
        format!("{}_channel_messages_received_total", METRIC_PREFIX),
        "Total text frames received",
        &["channel"]
    ).unwrap();

    /// Frames dropped because they did not decode
    pub static ref CHANNEL_DECODE_ERRORS: IntCounterVec = register_int_counter_vec!(
        format!("{}_channel_decode_errors_total", METRIC_PREFIX),
        "Total frames dropped as malformed",
        &["channel"]
    ).unwrap();

    /// Transport failures (connect refused, reset, protocol error)
    pub static ref CHANNEL_TRANSPORT_ERRORS: IntCounterVec = register_int_counter_vec!(
        format!("{}_channel_transport_errors_total", METRIC_PREFIX),
        "Total transport failures",
        &["channel"]
    ).unwrap();

    /// Chat-alert suppression commands written to the notification channel
    pub static ref SUPPRESSION_COMMANDS_SENT: IntCounter = register_int_counter!(
        format!("{}_suppression_commands_sent_total", METRIC_PREFIX),
        "Total leave_chat_notifications commands sent"
    ).unwrap();

    // ============================================================================
    // Banner Metrics
    // ============================================================================

    pub static ref BANNERS_SHOWN: IntCounter = register_int_counter!(
        format!("{}_banners_shown_total", METRIC_PREFIX),
        "Total alert banners rendered"
    ).unwrap();

    /// Banners removed early because the visible cap was reached
    pub static ref BANNERS_EVICTED: IntCounter = register_int_counter!(
        format!("{}_banners_evicted_total", METRIC_PREFIX),
        "Total alert banners evicted before expiry"
    ).unwrap();
}
