use chrono::Utc;

use crate::connection::{ChannelKind, ConnectionHandle, ConnectionState};
use crate::error::{ClientError, Result};
use crate::metrics::ChannelMetrics;
use crate::ui::{BubbleStyle, ChatBubble, Ui, UiSurface};
use crate::websocket::{ChannelMessage, ChatMessage, ChatPost, ControlCommand};

/// Result of asking the notification channel to stop relaying lobby alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressionOutcome {
    /// Written to the open notification channel
    Sent,
    /// Parked until the notification channel opens
    Deferred,
    /// Already sent or parked for this chat connection
    AlreadyRequested,
    /// The chat client was built without a notification channel
    MissingChannel,
    /// Notification channel is closed or errored
    ChannelDead,
}

/// Client for `/ws/lobby/`
pub struct ChatClient {
    connection: ConnectionHandle,
    /// Injected notification connection used for the suppression command
    notifications: Option<ConnectionHandle>,
    username: String,
    allow_empty: bool,
    suppression_requested: bool,
}

impl ChatClient {
    pub fn new(
        connection: ConnectionHandle,
        notifications: Option<ConnectionHandle>,
        username: impl Into<String>,
        allow_empty: bool,
    ) -> Self {
        let username = username.into();
        if username.is_empty() {
            tracing::warn!(
                error = %ClientError::configuration("session username"),
                "Own messages cannot be told apart"
            );
        }
        Self {
            connection,
            notifications,
            username,
            allow_empty,
            suppression_requested: false,
        }
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The chat view is live: stop the server duplicating lobby posts as
    /// notification alerts for this session.
    pub fn on_open(&mut self) -> SuppressionOutcome {
        tracing::info!(connection_id = %self.connection.id(), "Chat WebSocket connected");

        if self.suppression_requested {
            return SuppressionOutcome::AlreadyRequested;
        }

        let Some(notifications) = &self.notifications else {
            tracing::error!(
                error = %ClientError::configuration("notification channel"),
                "Cannot leave chat notifications"
            );
            return SuppressionOutcome::MissingChannel;
        };

        let payload = match ControlCommand::leave_chat_notifications().encode() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode suppression command");
                return SuppressionOutcome::ChannelDead;
            }
        };

        let state = notifications.state();
        let outcome = match state {
            ConnectionState::Open => match notifications.send(payload) {
                Ok(()) => SuppressionOutcome::Sent,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to leave chat notifications");
                    return SuppressionOutcome::ChannelDead;
                }
            },
            ConnectionState::Connecting => match notifications.send_on_open(payload) {
                Ok(()) => SuppressionOutcome::Deferred,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to defer leaving chat notifications");
                    return SuppressionOutcome::ChannelDead;
                }
            },
            ConnectionState::Closed | ConnectionState::Errored => {
                tracing::warn!(state = %state, "Notification channel is down, chat alerts stay on");
                return SuppressionOutcome::ChannelDead;
            }
        };

        self.suppression_requested = true;
        match outcome {
            SuppressionOutcome::Sent => {
                ChannelMetrics::record_suppression_sent();
                tracing::info!("Left chat notifications group");
            }
            _ => tracing::debug!("Leaving chat notifications once the notification channel opens"),
        }
        outcome
    }

    /// Post the compose text to the lobby and clear the compose field.
    pub fn submit<S: UiSurface>(&mut self, text: &str, ui: &mut Ui<S>) -> Result<()> {
        if !self.allow_empty && text.trim().is_empty() {
            return Err(ClientError::EmptyMessage);
        }

        let payload = ChatPost::new(text).encode()?;
        self.connection.send(payload)?;
        ui.clear_compose();
        Ok(())
    }

    /// Render an incoming lobby post. Returns the bubble style used, or
    /// `None` when the frame was dropped.
    pub fn on_message<S: UiSurface>(&mut self, raw: &str, ui: &mut Ui<S>) -> Option<BubbleStyle> {
        ChannelMetrics::record_received(ChannelKind::Chat);

        let message = match ChannelMessage::decode(raw) {
            Ok(ChannelMessage::Chat(message)) => message,
            Ok(other) => {
                tracing::warn!(message = ?other, "Unexpected message on chat channel");
                return None;
            }
            Err(e) => {
                ChannelMetrics::record_decode_error(ChannelKind::Chat);
                tracing::warn!(error = %e, len = raw.len(), "Dropping malformed chat message");
                return None;
            }
        };

        let bubble = self.bubble_for(message);
        let style = bubble.style;
        ui.append_bubble(&bubble);
        Some(style)
    }

    pub fn on_close(&mut self, code: Option<u16>, reason: &str) {
        tracing::info!(code = ?code, reason = %reason, "Chat WebSocket closed");
    }

    pub fn on_error(&mut self, error: &str) {
        tracing::error!(error = %error, "Chat WebSocket error");
    }

    fn bubble_for(&self, message: ChatMessage) -> ChatBubble {
        let style = if !self.username.is_empty() && message.username == self.username {
            BubbleStyle::Own
        } else {
            BubbleStyle::Other
        };
        ChatBubble {
            label: format!("{} {}", message.username, message.role_label()),
            sender: message.username,
            body: message.message,
            style,
            received_at: Utc::now(),
        }
    }
}
