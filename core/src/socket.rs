//! Live-link monitor over the device's websocket.
//!
//! The device pushes key and layer events on `/ws`. The console only needs
//! the link itself: an open socket means the device is reachable. The monitor
//! keeps reconnecting at a fixed interval and reports every change to the
//! shared `ConnectionTracker`.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use crate::config::ConsoleConfig;
use crate::status::{ConnectionStatus, ConnectionTracker};

pub struct SocketMonitor;

impl SocketMonitor {
    /// Start monitoring `url` on the current tokio runtime.
    pub fn spawn(url: &str, tracker: ConnectionTracker, reconnect_interval: Duration) -> SocketHandle {
        let url = url.to_string();
        let task = tokio::spawn(async move {
            loop {
                run_once(&url, &tracker).await;
                tokio::time::sleep(reconnect_interval).await;
            }
        });
        SocketHandle { task }
    }

    /// Monitor `config.socket_url`, retrying every `reconnect_interval_ms`.
    pub fn from_config(config: &ConsoleConfig, tracker: ConnectionTracker) -> SocketHandle {
        Self::spawn(&config.socket_url, tracker, config.reconnect_interval())
    }
}

/// Owns the monitor task. Dropping the handle leaves the task running.
#[derive(Debug)]
pub struct SocketHandle {
    task: JoinHandle<()>,
}

impl SocketHandle {
    pub fn shutdown(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run_once(url: &str, tracker: &ConnectionTracker) {
    tracker.refresh_switch().await;
    tracker.update_status(ConnectionStatus::Connecting, None);
    let mut socket = match tokio_tungstenite::connect_async(url).await {
        Ok((socket, _)) => socket,
        Err(err) => {
            tracing::debug!(url, error = %err, "websocket connect failed");
            tracker.update_status(
                ConnectionStatus::Disconnected,
                Some(format!("websocket: {err}")),
            );
            return;
        }
    };
    tracing::info!(url, "websocket connected");
    tracker.update_status(ConnectionStatus::Connected, None);

    let mut reason = None;
    while let Some(message) = socket.next().await {
        match message {
            Ok(Message::Text(text)) => tracing::trace!(%text, "device event"),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                reason = Some(format!("websocket: {err}"));
                break;
            }
        }
    }
    tracing::info!(url, ?reason, "websocket closed");
    tracker.update_status(
        ConnectionStatus::Disconnected,
        Some(reason.unwrap_or_else(|| "websocket closed".to_string())),
    );
}
