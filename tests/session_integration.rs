//! Session loop integration tests
//!
//! These tests drive a full session (both channel clients, the UI
//! bookkeeping and the reconciliation fetch) with detached connections, so
//! no sockets or HTTP servers are involved.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

use elearning_realtime::api::{NotificationsApi, UnreadNotification};
use elearning_realtime::config::{BannerConfig, ChatConfig, SessionConfig};
use elearning_realtime::connection::{ChannelKind, ConnectionEvent, ConnectionHandle, ConnectionState};
use elearning_realtime::error::{ClientError, Result};
use elearning_realtime::session::{Session, SessionEvent};
use elearning_realtime::ui::{BubbleStyle, Indicator, Indicators, MemorySurface, Ui};

const LEAVE: &str = r#"{"command":"leave_chat_notifications"}"#;

/// Unread listing served from memory
struct FakeApi {
    unread: Mutex<Option<Result<Vec<UnreadNotification>>>>,
    calls: AtomicUsize,
}

impl FakeApi {
    fn returning(unread: Result<Vec<UnreadNotification>>) -> Arc<Self> {
        Arc::new(Self {
            unread: Mutex::new(Some(unread)),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl NotificationsApi for FakeApi {
    async fn unread_notifications(&self, _user_id: &str) -> Result<Vec<UnreadNotification>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.unread
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

struct TestEnvironment {
    session: Session<MemorySurface>,
    notifications_rx: UnboundedReceiver<String>,
    chat_rx: Option<UnboundedReceiver<String>>,
}

fn session_config() -> SessionConfig {
    SessionConfig {
        username: "alice".to_string(),
        user_id: "42".to_string(),
        csrf_token: "csrf".to_string(),
        session_cookie: String::new(),
    }
}

fn create_test_environment(
    with_chat: bool,
    indicators: Indicators,
    api: Option<Arc<dyn NotificationsApi>>,
) -> TestEnvironment {
    let (notifications, notifications_rx) = ConnectionHandle::detached(ChannelKind::Notifications);
    let (chat, chat_rx) = if with_chat {
        let (conn, rx) = ConnectionHandle::detached(ChannelKind::Chat);
        (Some(conn), Some(rx))
    } else {
        (None, None)
    };

    let ui = Ui::with_indicators(MemorySurface::new(), &BannerConfig::default(), indicators);
    let session = Session::new(
        ui,
        notifications,
        chat,
        &session_config(),
        &ChatConfig::default(),
        api,
    );

    TestEnvironment {
        session,
        notifications_rx,
        chat_rx,
    }
}

fn conn(channel: ChannelKind, event: ConnectionEvent) -> SessionEvent {
    SessionEvent::Connection { channel, event }
}

fn message(raw: &str) -> ConnectionEvent {
    ConnectionEvent::Message(raw.to_string())
}

// =============================================================================
// Cross-channel suppression
// =============================================================================

mod suppression_tests {
    use super::*;

    #[tokio::test]
    async fn test_notifications_open_first_sends_immediately() {
        let mut env = create_test_environment(true, Indicators::default(), None);
        let now = Instant::now();

        env.session
            .handle(conn(ChannelKind::Notifications, ConnectionEvent::Opened), now);
        assert!(env.notifications_rx.try_recv().is_err());

        env.session.handle(conn(ChannelKind::Chat, ConnectionEvent::Opened), now);
        assert_eq!(env.notifications_rx.try_recv().unwrap(), LEAVE);
        assert!(env.notifications_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_chat_open_first_sends_once_when_notifications_open() {
        let mut env = create_test_environment(true, Indicators::default(), None);
        let now = Instant::now();

        env.session.handle(conn(ChannelKind::Chat, ConnectionEvent::Opened), now);
        assert!(env.notifications_rx.try_recv().is_err());
        assert_eq!(env.session.notifications().connection().pending_on_open(), 1);

        env.session
            .handle(conn(ChannelKind::Notifications, ConnectionEvent::Opened), now);
        assert_eq!(env.notifications_rx.try_recv().unwrap(), LEAVE);

        // Later traffic never repeats the command
        env.session.handle(
            conn(
                ChannelKind::Notifications,
                message(r#"{"title": "t", "message": "m"}"#),
            ),
            now,
        );
        assert!(env.notifications_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notifications_failure_before_chat_open() {
        let mut env = create_test_environment(true, Indicators::default(), None);
        let now = Instant::now();

        env.session.handle(
            conn(
                ChannelKind::Notifications,
                ConnectionEvent::Errored("connection refused".to_string()),
            ),
            now,
        );
        env.session.handle(conn(ChannelKind::Chat, ConnectionEvent::Opened), now);

        assert!(env.notifications_rx.try_recv().is_err());
        assert_eq!(
            env.session.chat().unwrap().connection().state(),
            ConnectionState::Open
        );
    }

    #[tokio::test]
    async fn test_deferred_command_to_stopped_writer_is_dropped() {
        let env = create_test_environment(true, Indicators::default(), None);
        let TestEnvironment {
            mut session,
            notifications_rx,
            ..
        } = env;
        let now = Instant::now();

        session.handle(conn(ChannelKind::Chat, ConnectionEvent::Opened), now);
        assert_eq!(session.notifications().connection().pending_on_open(), 1);

        // Writer gone before the channel reports open
        drop(notifications_rx);
        session.handle(conn(ChannelKind::Notifications, ConnectionEvent::Opened), now);

        let notifications = session.notifications().connection();
        assert_eq!(notifications.state(), ConnectionState::Open);
        assert_eq!(notifications.pending_on_open(), 0);
        assert!(notifications.send("late".to_string()).is_err());
    }
}

// =============================================================================
// Notification channel behaviour
// =============================================================================

mod notification_tests {
    use super::*;

    #[tokio::test]
    async fn test_lobby_alert_sets_chat_indicator() {
        let mut env = create_test_environment(false, Indicators::default(), None);
        let now = Instant::now();

        env.session
            .handle(conn(ChannelKind::Notifications, ConnectionEvent::Opened), now);
        env.session.handle(
            conn(
                ChannelKind::Notifications,
                message(r#"{"message": "New message in the public lobby"}"#),
            ),
            now,
        );

        let ui = env.session.ui();
        assert!(ui.surface().indicator(Indicator::Chat));
        assert!(!ui.surface().indicator(Indicator::Notifications));
        assert_eq!(ui.surface().banners_shown(), 0);
    }

    #[tokio::test]
    async fn test_alert_banner_lifetime() {
        let mut env = create_test_environment(false, Indicators::default(), None);
        let t0 = Instant::now();

        env.session
            .handle(conn(ChannelKind::Notifications, ConnectionEvent::Opened), t0);
        env.session.handle(
            conn(
                ChannelKind::Notifications,
                message(r#"{"title": "New Activity", "message": "Lab 4 posted"}"#),
            ),
            t0,
        );

        assert!(env.session.ui().is_visible(Indicator::Notifications));
        assert_eq!(env.session.ui().surface().banners().len(), 1);

        let deadline = env.session.ui().next_deadline().unwrap();
        assert!(deadline >= t0 + Duration::from_secs(5));

        // Unrelated event before the fade changes nothing
        env.session.handle(SessionEvent::Compose("ignored".to_string()), t0 + Duration::from_millis(4999));
        assert_eq!(env.session.ui().surface().banners().len(), 1);
        assert!(!env.session.ui().surface().banners()[0].fading);

        env.session.handle(SessionEvent::Compose("ignored".to_string()), t0 + Duration::from_secs(7));
        assert!(env.session.ui().surface().banners().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_frames_leave_everything_untouched() {
        let mut env = create_test_environment(true, Indicators::default(), None);
        let now = Instant::now();

        env.session
            .handle(conn(ChannelKind::Notifications, ConnectionEvent::Opened), now);
        env.session.handle(conn(ChannelKind::Chat, ConnectionEvent::Opened), now);
        let writes = env.session.ui().surface().indicator_writes();

        for raw in ["{not json", r#"{"title": "no message"}"#, "42"] {
            env.session
                .handle(conn(ChannelKind::Notifications, message(raw)), now);
            env.session.handle(conn(ChannelKind::Chat, message(raw)), now);
        }

        let ui = env.session.ui();
        assert_eq!(ui.surface().indicator_writes(), writes);
        assert_eq!(ui.surface().banners_shown(), 0);
        assert!(ui.surface().transcript().is_empty());
        assert!(env.session.notifications().connection().is_open());
        assert!(env.session.chat().unwrap().connection().is_open());
    }

    #[tokio::test]
    async fn test_events_after_close_are_ignored() {
        let mut env = create_test_environment(false, Indicators::default(), None);
        let now = Instant::now();

        env.session
            .handle(conn(ChannelKind::Notifications, ConnectionEvent::Opened), now);
        env.session.handle(
            conn(
                ChannelKind::Notifications,
                ConnectionEvent::Closed {
                    code: Some(1006),
                    reason: String::new(),
                },
            ),
            now,
        );
        env.session.handle(
            conn(
                ChannelKind::Notifications,
                message(r#"{"title": "late", "message": "too late"}"#),
            ),
            now,
        );
        env.session
            .handle(conn(ChannelKind::Notifications, ConnectionEvent::Opened), now);

        assert_eq!(
            env.session.notifications().connection().state(),
            ConnectionState::Closed
        );
        assert_eq!(env.session.ui().surface().banners_shown(), 0);
    }
}

// =============================================================================
// Chat channel behaviour
// =============================================================================

mod chat_tests {
    use super::*;

    #[tokio::test]
    async fn test_transcript_styles_own_messages() {
        let mut env = create_test_environment(true, Indicators::default(), None);
        let now = Instant::now();

        env.session.handle(conn(ChannelKind::Chat, ConnectionEvent::Opened), now);
        env.session.handle(
            conn(
                ChannelKind::Chat,
                message(r#"{"username": "alice", "message": "hi", "is_teacher": false}"#),
            ),
            now,
        );
        env.session.handle(
            conn(
                ChannelKind::Chat,
                message(r#"{"username": "mr_smith", "message": "hello class", "is_teacher": true}"#),
            ),
            now,
        );

        let transcript = env.session.ui().surface().transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].style, BubbleStyle::Own);
        assert_eq!(transcript[1].style, BubbleStyle::Other);
        assert_eq!(transcript[1].label, "mr_smith (Teacher) says");
        assert!(env.session.ui().surface().scrolled_to_end());
    }

    #[tokio::test]
    async fn test_compose_posts_to_lobby() {
        let mut env = create_test_environment(true, Indicators::default(), None);
        let now = Instant::now();

        env.session.handle(conn(ChannelKind::Chat, ConnectionEvent::Opened), now);
        env.session
            .handle(SessionEvent::Compose("when is the exam?".to_string()), now);
        env.session.handle(SessionEvent::Compose("  ".to_string()), now);

        let chat_rx = env.chat_rx.as_mut().unwrap();
        assert_eq!(
            chat_rx.try_recv().unwrap(),
            r#"{"message":"when is the exam?"}"#
        );
        assert!(chat_rx.try_recv().is_err());
        assert_eq!(env.session.ui().surface().compose_clears(), 1);
    }

    #[tokio::test]
    async fn test_compose_before_open_is_not_sent() {
        let mut env = create_test_environment(true, Indicators::default(), None);

        env.session
            .handle(SessionEvent::Compose("too early".to_string()), Instant::now());

        assert!(env.chat_rx.as_mut().unwrap().try_recv().is_err());
        assert_eq!(env.session.ui().surface().compose_clears(), 0);
    }

    #[tokio::test]
    async fn test_chat_event_without_chat_channel() {
        let mut env = create_test_environment(false, Indicators::default(), None);
        env.session
            .handle(conn(ChannelKind::Chat, ConnectionEvent::Opened), Instant::now());
        assert!(env.session.chat().is_none());
        assert!(env.notifications_rx.try_recv().is_err());
    }
}

// =============================================================================
// Event loop
// =============================================================================

mod run_loop_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_banner_removed_between_five_and_seven_seconds() {
        let mut env = create_test_environment(false, Indicators::default(), None);
        let events = env.session.events();

        let driver = {
            let events = events.clone();
            async move {
                events
                    .send(conn(ChannelKind::Notifications, ConnectionEvent::Opened))
                    .unwrap();
                events
                    .send(conn(
                        ChannelKind::Notifications,
                        message(r#"{"title": "New Material", "message": "Notes"}"#),
                    ))
                    .unwrap();
                tokio::time::sleep(Duration::from_millis(4900)).await;
                events.send(SessionEvent::Shutdown).unwrap();
            }
        };
        tokio::join!(env.session.run(), driver);

        assert_eq!(env.session.ui().surface().banners().len(), 1);

        let driver = async move {
            tokio::time::sleep(Duration::from_millis(2100)).await;
            events.send(SessionEvent::Shutdown).unwrap();
        };
        tokio::join!(env.session.run(), driver);

        assert!(env.session.ui().surface().banners().is_empty());
        assert_eq!(env.session.ui().surface().faded_ids().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_reconciliation_hides_indicator() {
        let api = FakeApi::returning(Ok(Vec::new()));
        let mut env = create_test_environment(
            false,
            Indicators::new(false, true),
            Some(api.clone() as Arc<dyn NotificationsApi>),
        );
        let events = env.session.events();

        let driver = async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            events.send(SessionEvent::Shutdown).unwrap();
        };
        tokio::join!(env.session.run(), driver);

        assert!(!env.session.ui().is_visible(Indicator::Notifications));
        assert!(!env.session.ui().surface().indicator(Indicator::Notifications));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconciliation_runs_once() {
        let api = FakeApi::returning(Ok(vec![UnreadNotification {
            title: Some("New Enrollment".to_string()),
            message: None,
            read: Some(false),
        }]));
        let mut env = create_test_environment(
            false,
            Indicators::default(),
            Some(api.clone() as Arc<dyn NotificationsApi>),
        );
        let events = env.session.events();

        for _ in 0..2 {
            let events = events.clone();
            let driver = async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                events.send(SessionEvent::Shutdown).unwrap();
            };
            tokio::join!(env.session.run(), driver);
        }

        assert!(env.session.ui().is_visible(Indicator::Notifications));
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reconciliation_is_logged_only() {
        let api = FakeApi::returning(Err(ClientError::from_response(500, "")));
        let mut env = create_test_environment(
            false,
            Indicators::new(false, true),
            Some(api as Arc<dyn NotificationsApi>),
        );
        let events = env.session.events();

        let driver = async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            events.send(SessionEvent::Shutdown).unwrap();
        };
        tokio::join!(env.session.run(), driver);

        assert!(env.session.ui().is_visible(Indicator::Notifications));
        assert_eq!(env.session.ui().surface().indicator_writes(), 0);
    }
}
