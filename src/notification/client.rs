use tokio::time::Instant;

use crate::api::UnreadNotification;
use crate::connection::{ChannelKind, ConnectionHandle};
use crate::error::Result;
use crate::metrics::ChannelMetrics;
use crate::ui::{BannerId, Indicator, Ui, UiSurface};
use crate::websocket::{ChannelMessage, SubscriptionUpdate};

/// What a notification frame turned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Lobby alert: chat indicator revealed, nothing rendered
    LobbyActivity,
    Banner(BannerId),
    Subscribed,
    /// Decoded but not meant for this channel
    Ignored,
    /// Malformed; no UI change
    Dropped,
}

/// Client for `/ws/notifications/`
pub struct NotificationClient {
    connection: ConnectionHandle,
    subscribed_groups: Vec<SubscriptionUpdate>,
    reconciliation_started: bool,
}

impl NotificationClient {
    pub fn new(connection: ConnectionHandle) -> Self {
        debug_assert_eq!(connection.channel(), ChannelKind::Notifications);
        Self {
            connection,
            subscribed_groups: Vec::new(),
            reconciliation_started: false,
        }
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    /// Groups the server added this session to since it connected
    pub fn subscribed_groups(&self) -> &[SubscriptionUpdate] {
        &self.subscribed_groups
    }

    pub fn on_open(&mut self) {
        tracing::info!(
            connection_id = %self.connection.id(),
            "Notification WebSocket connected"
        );
    }

    pub fn on_message<S: UiSurface>(
        &mut self,
        raw: &str,
        ui: &mut Ui<S>,
        now: Instant,
    ) -> NotificationOutcome {
        ChannelMetrics::record_received(ChannelKind::Notifications);

        let message = match ChannelMessage::decode(raw) {
            Ok(message) => message,
            Err(e) => {
                ChannelMetrics::record_decode_error(ChannelKind::Notifications);
                tracing::warn!(error = %e, len = raw.len(), "Dropping malformed notification");
                return NotificationOutcome::Dropped;
            }
        };

        tracing::debug!(message = ?message, "Notification received");

        match message {
            ChannelMessage::Alert(alert) if alert.is_lobby_alert() => {
                ui.reveal(Indicator::Chat);
                NotificationOutcome::LobbyActivity
            }
            ChannelMessage::Alert(alert) => {
                ui.reveal(Indicator::Notifications);
                let id = ui.show_alert(now, &alert.title, &alert.message);
                NotificationOutcome::Banner(id)
            }
            ChannelMessage::Subscription(update) => {
                tracing::debug!(
                    material_group = %update.material_group,
                    activity_group = %update.activity_group,
                    "Subscribed to course groups"
                );
                self.subscribed_groups.push(update);
                NotificationOutcome::Subscribed
            }
            other @ (ChannelMessage::Chat(_) | ChannelMessage::Control(_)) => {
                tracing::warn!(message = ?other, "Unexpected message on notification channel");
                NotificationOutcome::Ignored
            }
        }
    }

    pub fn on_close(&mut self, code: Option<u16>, reason: &str) {
        tracing::info!(code = ?code, reason = %reason, "Notification WebSocket closed");
    }

    pub fn on_error(&mut self, error: &str) {
        tracing::error!(error = %error, "Notification WebSocket error");
    }

    /// Claim the one reconciliation fetch. Returns `false` once claimed.
    pub fn begin_reconciliation(&mut self) -> bool {
        !std::mem::replace(&mut self.reconciliation_started, true)
    }

    /// Sync the notifications indicator with the server's unread listing.
    /// A failed fetch leaves the indicator as it is.
    pub fn apply_reconciliation<S: UiSurface>(
        &mut self,
        result: Result<Vec<UnreadNotification>>,
        ui: &mut Ui<S>,
    ) {
        match result {
            Ok(unread) if unread.is_empty() => {
                tracing::debug!("No unread notifications");
                ui.hide(Indicator::Notifications);
            }
            Ok(unread) => {
                tracing::debug!(unread = unread.len(), "Unread notifications pending");
                ui.reveal(Indicator::Notifications);
            }
            Err(e) => {
                tracing::error!(error = %e, "Unread notification check failed");
            }
        }
    }
}
