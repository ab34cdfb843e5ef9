//! Per-channel connection lifecycle.
//!
//! A [`ConnectionHandle`] owns the outbound half of one transport plus its
//! [`ConnectionState`]. Handles are cheap clones of a shared cell that lives on
//! the session loop's thread; the transport task never touches it and only
//! reports [`ConnectionEvent`]s back to the loop.

mod state;

pub use state::{ChannelKind, ConnectionEvent, ConnectionState, InvalidTransition};

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::error::{ClientError, Result};

/// Result of applying a lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub state: ConnectionState,
    /// Parked payloads actually handed to the writer on this transition
    pub flushed: usize,
}

/// Shared handle to one channel's connection
#[derive(Clone)]
pub struct ConnectionHandle {
    inner: Rc<RefCell<ConnectionInner>>,
}

struct ConnectionInner {
    id: Uuid,
    channel: ChannelKind,
    url: String,
    state: ConnectionState,
    outbound: mpsc::UnboundedSender<String>,
    /// Payloads parked until the connection opens (one-shot)
    on_open: Vec<String>,
}

impl ConnectionHandle {
    /// Wrap an outbound sender whose transport has been (or will be) started.
    pub fn new(
        channel: ChannelKind,
        url: impl Into<String>,
        outbound: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ConnectionInner {
                id: Uuid::new_v4(),
                channel,
                url: url.into(),
                state: ConnectionState::Connecting,
                outbound,
                on_open: Vec::new(),
            })),
        }
    }

    /// A connection with no transport behind it. Whatever the session sends
    /// shows up on the returned receiver; lifecycle events are injected by the
    /// caller.
    pub fn detached(channel: ChannelKind) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(channel, format!("detached:{}", channel.path()), tx), rx)
    }

    pub fn id(&self) -> Uuid {
        self.inner.borrow().id
    }

    pub fn channel(&self) -> ChannelKind {
        self.inner.borrow().channel
    }

    pub fn url(&self) -> String {
        self.inner.borrow().url.clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.borrow().state
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Number of payloads waiting for the open transition
    pub fn pending_on_open(&self) -> usize {
        self.inner.borrow().on_open.len()
    }

    /// Send a text frame. Only valid while `Open`; nothing is queued.
    pub fn send(&self, payload: String) -> Result<()> {
        let inner = self.inner.borrow();
        if inner.state != ConnectionState::Open {
            return Err(ClientError::NotOpen {
                channel: inner.channel,
                state: inner.state,
            });
        }
        inner
            .outbound
            .send(payload)
            .map_err(|_| ClientError::transport(inner.channel, "writer task has stopped"))
    }

    /// Send now if open, or once at the transition to `Open` if still connecting.
    pub fn send_on_open(&self, payload: String) -> Result<()> {
        let state = self.state();
        match state {
            ConnectionState::Open => self.send(payload),
            ConnectionState::Connecting => {
                self.inner.borrow_mut().on_open.push(payload);
                Ok(())
            }
            ConnectionState::Closed | ConnectionState::Errored => Err(ClientError::NotOpen {
                channel: self.channel(),
                state,
            }),
        }
    }

    /// Apply a lifecycle event. On the transition to `Open` every parked
    /// payload is flushed exactly once; on a dead transition they are dropped.
    pub fn apply(&self, event: &ConnectionEvent) -> std::result::Result<Transition, InvalidTransition> {
        let next = self.state().on_event(event)?;
        let parked = {
            let mut inner = self.inner.borrow_mut();
            inner.state = next;
            std::mem::take(&mut inner.on_open)
        };

        let mut flushed = 0;
        match next {
            ConnectionState::Open => {
                for payload in parked {
                    if let Err(e) = self.send(payload) {
                        tracing::warn!(
                            channel = %self.channel(),
                            error = %e,
                            "Failed to flush deferred payload"
                        );
                    } else {
                        flushed += 1;
                    }
                }
            }
            ConnectionState::Connecting => {
                self.inner.borrow_mut().on_open = parked;
            }
            ConnectionState::Closed | ConnectionState::Errored => {
                if !parked.is_empty() {
                    tracing::warn!(
                        channel = %self.channel(),
                        dropped = parked.len(),
                        "Connection died before opening, deferred payloads dropped"
                    );
                }
            }
        }

        Ok(Transition { state: next, flushed })
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ConnectionHandle")
            .field("id", &inner.id)
            .field("channel", &inner.channel)
            .field("state", &inner.state)
            .finish()
    }
}
