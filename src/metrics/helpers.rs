//! Metrics helper structs for convenient metric recording

use prometheus::{Encoder, TextEncoder};

use crate::connection::ChannelKind;

use super::{
    BANNERS_EVICTED, BANNERS_SHOWN, CHANNEL_DECODE_ERRORS, CHANNEL_MESSAGES_RECEIVED,
    CHANNEL_TRANSPORT_ERRORS, SUPPRESSION_COMMANDS_SENT,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording per-channel metrics
pub struct ChannelMetrics;

impl ChannelMetrics {
    pub fn record_received(channel: ChannelKind) {
        CHANNEL_MESSAGES_RECEIVED
            .with_label_values(&[channel.as_str()])
            .inc();
    }

    pub fn record_decode_error(channel: ChannelKind) {
        CHANNEL_DECODE_ERRORS
            .with_label_values(&[channel.as_str()])
            .inc();
    }

    pub fn record_transport_error(channel: ChannelKind) {
        CHANNEL_TRANSPORT_ERRORS
            .with_label_values(&[channel.as_str()])
            .inc();
    }

    pub fn record_suppression_sent() {
        SUPPRESSION_COMMANDS_SENT.inc();
    }

    pub fn decode_errors(channel: ChannelKind) -> u64 {
        CHANNEL_DECODE_ERRORS
            .with_label_values(&[channel.as_str()])
            .get()
    }
}

/// Helper struct for recording banner metrics
pub struct BannerMetrics;

impl BannerMetrics {
    pub fn record_shown() {
        BANNERS_SHOWN.inc();
    }

    pub fn record_evicted(count: u64) {
        BANNERS_EVICTED.inc_by(count);
    }
}
