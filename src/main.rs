use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;

use elearning_realtime::api::{NotificationsApi, RestClient};
use elearning_realtime::config::Settings;
use elearning_realtime::metrics::encode_metrics;
use elearning_realtime::session::{Session, SessionEvent};
use elearning_realtime::telemetry::init_telemetry;
use elearning_realtime::ui::TerminalSurface;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    init_telemetry(&settings.logging)?;
    tracing::info!(host = %settings.server.host, "Configuration loaded");

    let api: Arc<dyn NotificationsApi> = Arc::new(RestClient::from_settings(&settings)?);
    let mut session = Session::connect(&settings, TerminalSurface::stdout(), Some(api));

    // Compose input: one line per message, EOF leaves the page
    tokio::spawn(read_compose(session.events()));
    tokio::spawn(shutdown_signal_handler(session.events()));

    session.run().await;

    match encode_metrics() {
        Ok(text) => tracing::debug!(metrics = %text, "Final metrics"),
        Err(e) => tracing::warn!(error = %e, "Failed to encode metrics"),
    }

    tracing::info!("Client shutdown complete");
    Ok(())
}

async fn read_compose(events: mpsc::UnboundedSender<SessionEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if events.send(SessionEvent::Compose(line)).is_err() {
                    return;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read compose input");
                break;
            }
        }
    }
    let _ = events.send(SessionEvent::Shutdown);
}

async fn shutdown_signal_handler(events: mpsc::UnboundedSender<SessionEvent>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, leaving session");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, leaving session");
        }
    }

    let _ = events.send(SessionEvent::Shutdown);
}
