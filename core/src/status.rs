//! Live connection status shared by every request and the socket monitor.
//!
//! # Design
//! `ConnectionState` is only ever changed through `transition`, a pure
//! function of the previous state, the reported status and the clock.
//! `ConnectionTracker` owns the single live instance behind a
//! `tokio::sync::watch` channel so UI observers are pushed every change.
//!
//! When the "force mock" switch is on, every reported status is coerced to
//! `Mock` before the transition runs, so a forced-offline console never shows
//! a real disconnect.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Link health as reported to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    pub connected: bool,
    pub status: ConnectionStatus,
    pub last_connected: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub using_mock_data: bool,
}

impl ConnectionState {
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            status: ConnectionStatus::Disconnected,
            last_connected: None,
            error: None,
            using_mock_data: false,
        }
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::disconnected()
    }
}

/// Apply one reported status to `state`.
pub fn transition(
    state: &ConnectionState,
    status: ConnectionStatus,
    error: Option<String>,
    now: DateTime<Utc>,
) -> ConnectionState {
    let mut next = state.clone();
    next.status = status;
    next.error = error;
    match status {
        ConnectionStatus::Connecting => {}
        ConnectionStatus::Connected => {
            next.connected = true;
            next.using_mock_data = false;
            next.last_connected = Some(now);
        }
        ConnectionStatus::Disconnected => {
            next.connected = false;
            next.using_mock_data = false;
        }
        ConnectionStatus::Mock => {
            next.connected = true;
            next.using_mock_data = true;
            next.last_connected = Some(now);
        }
    }
    next
}

/// Read-only view of the persisted "always use mock data" setting.
///
/// `is_forced` is called on every status update and must not block.
/// Switches backed by slow storage cache the value and reload it in
/// `refresh`, which the executor awaits once per call.
#[async_trait]
pub trait MockSwitch: Send + Sync {
    fn is_forced(&self) -> bool;

    async fn refresh(&self) {}
}

/// In-memory switch; clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct SharedSwitch(Arc<AtomicBool>);

impl SharedSwitch {
    pub fn new(forced: bool) -> Self {
        Self(Arc::new(AtomicBool::new(forced)))
    }

    pub fn set(&self, forced: bool) {
        self.0.store(forced, Ordering::SeqCst);
    }
}

#[async_trait]
impl MockSwitch for SharedSwitch {
    fn is_forced(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Switch persisted as a small text file (`true`/`1` means forced).
///
/// The file is read once on construction and again on every `refresh`, so a
/// setting changed by the host application applies from the next call on.
/// A missing or unreadable file reads as "off".
#[derive(Debug, Clone)]
pub struct FileSwitch {
    path: PathBuf,
    cached: Arc<AtomicBool>,
}

impl FileSwitch {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let forced = std::fs::read_to_string(&path)
            .map(|raw| parse_flag(&raw))
            .unwrap_or(false);
        Self {
            path,
            cached: Arc::new(AtomicBool::new(forced)),
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[async_trait]
impl MockSwitch for FileSwitch {
    fn is_forced(&self) -> bool {
        self.cached.load(Ordering::SeqCst)
    }

    async fn refresh(&self) {
        let forced = tokio::fs::read_to_string(&self.path)
            .await
            .map(|raw| parse_flag(&raw))
            .unwrap_or(false);
        self.cached.store(forced, Ordering::SeqCst);
    }
}

/// Owner of the single shared `ConnectionState`.
///
/// Cheap to clone; clones observe and update the same state.
#[derive(Clone)]
pub struct ConnectionTracker {
    tx: Arc<watch::Sender<ConnectionState>>,
    switch: Arc<dyn MockSwitch>,
}

impl ConnectionTracker {
    pub fn new(switch: Arc<dyn MockSwitch>) -> Self {
        let initial = initial_state(switch.as_ref());
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx: Arc::new(tx),
            switch,
        }
    }

    pub fn mock_forced(&self) -> bool {
        self.switch.is_forced()
    }

    /// Reload the force-mock switch from its backing store.
    pub async fn refresh_switch(&self) {
        self.switch.refresh().await;
    }

    /// Record a status report, coercing it to `Mock` while mock mode is forced.
    pub fn update_status(&self, status: ConnectionStatus, error: Option<String>) {
        let status = if self.mock_forced() {
            ConnectionStatus::Mock
        } else {
            status
        };
        let now = Utc::now();
        self.tx.send_modify(|state| {
            *state = transition(state, status, error, now);
        });
        tracing::trace!(?status, "connection status updated");
    }

    /// Restore the initial state, re-entering mock mode if it is forced.
    pub fn reset(&self) {
        let initial = initial_state(self.switch.as_ref());
        self.tx.send_replace(initial);
    }

    pub fn current(&self) -> ConnectionState {
        self.tx.borrow().clone()
    }

    /// Receive every subsequent state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }
}

impl std::fmt::Debug for ConnectionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionTracker")
            .field("state", &*self.tx.borrow())
            .finish_non_exhaustive()
    }
}

fn initial_state(switch: &dyn MockSwitch) -> ConnectionState {
    let base = ConnectionState::disconnected();
    if switch.is_forced() {
        transition(&base, ConnectionStatus::Mock, None, Utc::now())
    } else {
        base
    }
}
