//! The session event loop.
//!
//! One loop owns both channel clients and the UI. Transports, the
//! reconciliation fetch, the compose input and the shutdown signal all feed
//! [`SessionEvent`]s into it, and banner timers wake it up; nothing else
//! mutates UI state. Handling an event never blocks.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::api::{NotificationsApi, UnreadNotification};
use crate::chat::ChatClient;
use crate::config::{ChatConfig, SessionConfig, Settings};
use crate::connection::{ChannelKind, ConnectionEvent, ConnectionHandle};
use crate::error::{ClientError, Result};
use crate::metrics::ChannelMetrics;
use crate::notification::NotificationClient;
use crate::ui::{Ui, UiSurface};
use crate::websocket::transport;

/// Everything the loop reacts to
#[derive(Debug)]
pub enum SessionEvent {
    Connection {
        channel: ChannelKind,
        event: ConnectionEvent,
    },
    /// The user pressed send with this compose text
    Compose(String),
    Reconciled(Result<Vec<UnreadNotification>>),
    Shutdown,
}

pub struct Session<S: UiSurface> {
    user_id: String,
    ui: Ui<S>,
    notifications: NotificationClient,
    chat: Option<ChatClient>,
    api: Option<Arc<dyn NotificationsApi>>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl<S: UiSurface> Session<S> {
    /// Open both channels for a logged-in page. The chat channel is only
    /// opened when the lobby view is enabled. Must run inside a tokio runtime.
    pub fn connect(settings: &Settings, surface: S, api: Option<Arc<dyn NotificationsApi>>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let notifications = transport::open(
            ChannelKind::Notifications,
            settings.notification_url(),
            events_tx.clone(),
        );
        let chat = settings
            .chat
            .enabled
            .then(|| transport::open(ChannelKind::Chat, settings.chat_url(), events_tx.clone()));

        let ui = Ui::new(surface, &settings.banners);
        Self::assemble(
            ui,
            notifications,
            chat,
            &settings.session,
            &settings.chat,
            api,
            events_tx,
            events_rx,
        )
    }

    /// Build a session over connections whose events the caller delivers,
    /// through [`Session::events`] or [`Session::handle`].
    pub fn new(
        ui: Ui<S>,
        notifications: ConnectionHandle,
        chat: Option<ConnectionHandle>,
        session: &SessionConfig,
        chat_config: &ChatConfig,
        api: Option<Arc<dyn NotificationsApi>>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self::assemble(
            ui,
            notifications,
            chat,
            session,
            chat_config,
            api,
            events_tx,
            events_rx,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        ui: Ui<S>,
        notifications: ConnectionHandle,
        chat: Option<ConnectionHandle>,
        session: &SessionConfig,
        chat_config: &ChatConfig,
        api: Option<Arc<dyn NotificationsApi>>,
        events_tx: mpsc::UnboundedSender<SessionEvent>,
        events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    ) -> Self {
        let chat = chat.map(|connection| {
            ChatClient::new(
                connection,
                Some(notifications.clone()),
                session.username.clone(),
                chat_config.allow_empty,
            )
        });

        Self {
            user_id: session.user_id.clone(),
            ui,
            notifications: NotificationClient::new(notifications),
            chat,
            api,
            events_tx,
            events_rx,
        }
    }

    /// Sender for feeding events into the loop
    pub fn events(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.events_tx.clone()
    }

    pub fn ui(&self) -> &Ui<S> {
        &self.ui
    }

    pub fn notifications(&self) -> &NotificationClient {
        &self.notifications
    }

    pub fn chat(&self) -> Option<&ChatClient> {
        self.chat.as_ref()
    }

    /// Run until a [`SessionEvent::Shutdown`] arrives.
    #[tracing::instrument(name = "session", skip(self), fields(user_id = %self.user_id))]
    pub async fn run(&mut self) {
        self.start_reconciliation();
        tracing::info!(chat = self.chat.is_some(), "Session started");

        loop {
            let deadline = self.ui.next_deadline();

            tokio::select! {
                event = self.events_rx.recv() => {
                    match event {
                        Some(SessionEvent::Shutdown) | None => break,
                        Some(event) => self.handle(event, Instant::now()),
                    }
                }
                _ = sleep_until(deadline) => {
                    self.ui.advance(Instant::now());
                }
            }
        }

        tracing::info!("Session ended");
    }

    /// Issue the one unread-notifications fetch. The result comes back as a
    /// [`SessionEvent::Reconciled`].
    pub fn start_reconciliation(&mut self) {
        if !self.notifications.begin_reconciliation() {
            return;
        }
        let Some(api) = self.api.clone() else {
            tracing::debug!("No REST client, skipping unread notification check");
            return;
        };
        if self.user_id.is_empty() {
            tracing::warn!(
                error = %ClientError::configuration("session user id"),
                "Skipping unread notification check"
            );
            return;
        }

        let user_id = self.user_id.clone();
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.unread_notifications(&user_id).await;
            let _ = events.send(SessionEvent::Reconciled(result));
        });
    }

    /// Apply one event at `now`
    pub fn handle(&mut self, event: SessionEvent, now: Instant) {
        self.ui.advance(now);

        match event {
            SessionEvent::Connection { channel, event } => {
                self.on_connection_event(channel, event, now);
            }
            SessionEvent::Compose(text) => self.on_compose(&text),
            SessionEvent::Reconciled(result) => {
                self.notifications.apply_reconciliation(result, &mut self.ui);
            }
            SessionEvent::Shutdown => {}
        }
    }

    fn on_compose(&mut self, text: &str) {
        let Some(chat) = self.chat.as_mut() else {
            tracing::warn!("Chat is not enabled for this session");
            return;
        };
        match chat.submit(text, &mut self.ui) {
            Ok(()) => {}
            Err(ClientError::EmptyMessage) => tracing::debug!("Ignoring empty chat message"),
            Err(e) => tracing::warn!(error = %e, "Chat message not sent"),
        }
    }

    fn on_connection_event(&mut self, channel: ChannelKind, event: ConnectionEvent, now: Instant) {
        let connection = match channel {
            ChannelKind::Notifications => self.notifications.connection().clone(),
            ChannelKind::Chat => match &self.chat {
                Some(chat) => chat.connection().clone(),
                None => {
                    tracing::warn!(event = event.name(), "Event for a chat channel that was never opened");
                    return;
                }
            },
        };

        let transition = match connection.apply(&event) {
            Ok(transition) => transition,
            Err(e) => {
                tracing::warn!(channel = %channel, error = %e, "Ignoring connection event");
                return;
            }
        };

        match (channel, event) {
            (ChannelKind::Notifications, ConnectionEvent::Opened) => {
                if transition.flushed > 0 {
                    ChannelMetrics::record_suppression_sent();
                    tracing::info!("Left chat notifications group");
                }
                self.notifications.on_open();
            }
            (ChannelKind::Notifications, ConnectionEvent::Message(raw)) => {
                self.notifications.on_message(&raw, &mut self.ui, now);
            }
            (ChannelKind::Notifications, ConnectionEvent::Closed { code, reason }) => {
                self.notifications.on_close(code, &reason);
            }
            (ChannelKind::Notifications, ConnectionEvent::Errored(error)) => {
                self.notifications.on_error(&error);
            }
            (ChannelKind::Chat, event) => {
                let Some(chat) = self.chat.as_mut() else {
                    return;
                };
                match event {
                    ConnectionEvent::Opened => {
                        chat.on_open();
                    }
                    ConnectionEvent::Message(raw) => {
                        chat.on_message(&raw, &mut self.ui);
                    }
                    ConnectionEvent::Closed { code, reason } => chat.on_close(code, &reason),
                    ConnectionEvent::Errored(error) => chat.on_error(&error),
                }
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
