use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::connection::{ChannelKind, ConnectionEvent, ConnectionHandle};
use crate::metrics::ChannelMetrics;
use crate::session::SessionEvent;

/// Open a channel: spawn its transport task and hand back the handle the
/// session uses to observe and write to it. The handle starts `Connecting`.
pub fn open(
    channel: ChannelKind,
    url: String,
    events: mpsc::UnboundedSender<SessionEvent>,
) -> ConnectionHandle {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<String>();
    let handle = ConnectionHandle::new(channel, url.clone(), outbound_tx);

    tokio::spawn(run_transport(channel, url, events, outbound_rx));

    handle
}

/// Drive one socket until it closes. Every lifecycle change is reported as a
/// [`SessionEvent::Connection`]; nothing here retries.
#[tracing::instrument(name = "ws.transport", skip(channel, events, outbound), fields(channel = %channel))]
async fn run_transport(
    channel: ChannelKind,
    url: String,
    events: mpsc::UnboundedSender<SessionEvent>,
    mut outbound: mpsc::UnboundedReceiver<String>,
) {
    let report = |event: ConnectionEvent| {
        // The loop is gone once the session ends; nothing left to tell.
        let _ = events.send(SessionEvent::Connection { channel, event });
    };

    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::error!(url = %url, error = %e, "WebSocket connect failed");
            ChannelMetrics::record_transport_error(channel);
            report(ConnectionEvent::Errored(e.to_string()));
            report(ConnectionEvent::Closed {
                code: None,
                reason: "connect failed".to_string(),
            });
            return;
        }
    };

    tracing::info!(url = %url, "WebSocket connected");
    report(ConnectionEvent::Opened);

    let (mut ws_sender, mut ws_receiver) = stream.split();

    // Task for writing queued payloads to the socket
    let writer = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if let Err(e) = ws_sender.send(Message::Text(text.into())).await {
                tracing::warn!(error = %e, "WebSocket write failed");
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    let mut close_frame: Option<(Option<u16>, String)> = None;

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                report(ConnectionEvent::Message(text.as_str().to_string()));
            }
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => report(ConnectionEvent::Message(text)),
                Err(_) => {
                    tracing::warn!(len = bytes.len(), "Dropping non UTF-8 binary frame");
                }
            },
            Ok(Message::Close(frame)) => {
                close_frame = Some(match frame {
                    Some(frame) => (Some(u16::from(frame.code)), frame.reason.as_str().to_string()),
                    None => (None, String::new()),
                });
                break;
            }
            Ok(_) => {
                // Ping/Pong are answered by tungstenite
            }
            Err(e) => {
                tracing::error!(error = %e, "WebSocket error");
                ChannelMetrics::record_transport_error(channel);
                report(ConnectionEvent::Errored(e.to_string()));
                break;
            }
        }
    }

    writer.abort();

    let (code, reason) = close_frame.unwrap_or((None, String::new()));
    tracing::info!(code = ?code, reason = %reason, "WebSocket closed");
    report(ConnectionEvent::Closed { code, reason });
}
