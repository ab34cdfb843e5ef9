mod message;
pub mod transport;

pub use message::{
    Alert, ChannelMessage, ChatMessage, ChatPost, Command, ControlCommand, SubscriptionUpdate,
    LOBBY_ALERT_SENTINEL,
};
