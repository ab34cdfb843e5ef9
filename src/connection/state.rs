use std::fmt;

use crate::config::{LOBBY_PATH, NOTIFICATIONS_PATH};

/// Which of the two live channels a connection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Chat,
    Notifications,
}

impl ChannelKind {
    pub fn path(&self) -> &'static str {
        match self {
            ChannelKind::Chat => LOBBY_PATH,
            ChannelKind::Notifications => NOTIFICATIONS_PATH,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Chat => "chat",
            ChannelKind::Notifications => "notifications",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of one connection. There is no way back out of `Closed` or
/// `Errored`: a dead channel stays dead for the rest of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Errored,
}

impl ConnectionState {
    pub fn is_dead(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Errored)
    }

    /// Next state after `event`, or the rejected transition.
    pub fn on_event(self, event: &ConnectionEvent) -> Result<ConnectionState, InvalidTransition> {
        use ConnectionState::*;

        let next = match (self, event) {
            (Connecting, ConnectionEvent::Opened) => Open,
            (Open, ConnectionEvent::Message(_)) => Open,
            (Connecting | Open, ConnectionEvent::Errored(_)) => Errored,
            (Connecting | Open | Errored, ConnectionEvent::Closed { .. }) => Closed,
            (from, event) => {
                return Err(InvalidTransition {
                    from,
                    event: event.name(),
                })
            }
        };
        Ok(next)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closed => "closed",
            ConnectionState::Errored => "errored",
        };
        f.write_str(s)
    }
}

/// What the transport reports back to the session loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Opened,
    Message(String),
    Closed { code: Option<u16>, reason: String },
    Errored(String),
}

impl ConnectionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionEvent::Opened => "open",
            ConnectionEvent::Message(_) => "message",
            ConnectionEvent::Closed { .. } => "close",
            ConnectionEvent::Errored(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{event}' event is not valid while {from}")]
pub struct InvalidTransition {
    pub from: ConnectionState,
    pub event: &'static str,
}
