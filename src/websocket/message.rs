use serde::{Deserialize, Serialize};

/// Alert text the server uses to announce a new lobby post
pub const LOBBY_ALERT_SENTINEL: &str = "New message in the public lobby";

/// Messages received on either channel.
///
/// The server does not tag its payloads, so variants are told apart by the
/// fields they carry. Order matters: `Chat` is tried before `Alert` because
/// both carry `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelMessage {
    Chat(ChatMessage),
    Control(ControlCommand),
    Subscription(SubscriptionUpdate),
    Alert(Alert),
}

/// A lobby post relayed to every participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub username: String,
    pub message: String,
    pub is_teacher: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Absent on lobby alerts
    #[serde(default)]
    pub title: String,
    pub message: String,
}

/// Sent when the user joins a course and the server adds the session to its groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    pub material_group: String,
    pub activity_group: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    LeaveChatNotifications,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlCommand {
    pub command: Command,
}

/// Outgoing lobby post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPost {
    pub message: String,
}

impl ChannelMessage {
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl Alert {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    /// True for the alert that only announces lobby activity
    pub fn is_lobby_alert(&self) -> bool {
        self.message == LOBBY_ALERT_SENTINEL
    }
}

impl ChatMessage {
    pub fn role_label(&self) -> &'static str {
        if self.is_teacher {
            "(Teacher) says"
        } else {
            "(Student) says"
        }
    }
}

impl ControlCommand {
    pub fn leave_chat_notifications() -> Self {
        Self {
            command: Command::LeaveChatNotifications,
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ChatPost {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
