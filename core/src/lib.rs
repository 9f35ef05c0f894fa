//! Resilient access layer between the macropad console and its device.
//!
//! # Overview
//! Every request the console makes goes through one executor that bounds it
//! with a timeout, retries transient failures, and falls back to mock data or
//! a structural default when the device cannot be reached. A single
//! connection tracker records the outcome of every call so the UI can show
//! whether it is looking at live or mock data.
//!
//! # Design
//! - All state hangs off an explicitly built `ApiContext`; there are no
//!   globals, so tests run independent contexts side by side.
//! - I/O goes through the `Transport` trait. `ReqwestTransport` is the
//!   production implementation; `testing::ScriptedTransport` replays canned
//!   outcomes.
//! - The `api` module is the typed surface. It converts LED brightness
//!   between UI and firmware scales and orders macro ids.
//! - Config documents are passed through as `serde_json::Value`; only macros
//!   and wifi payloads are typed.

pub mod api;
pub mod config;
pub mod context;
pub mod endpoints;
pub mod error;
pub mod executor;
pub mod fallback;
pub mod http;
pub mod led;
pub mod mock;
pub mod socket;
pub mod status;
pub mod testing;
pub mod transport;
pub mod types;

pub use config::{ConfigError, ConsoleConfig};
pub use context::{ApiContext, ApiContextBuilder, RetryPolicy};
pub use endpoints::Endpoint;
pub use error::{ApiError, TransportError};
pub use executor::execute;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use mock::{MockRegistry, MockResolver};
pub use socket::{SocketHandle, SocketMonitor};
pub use status::{
    ConnectionState, ConnectionStatus, ConnectionTracker, FileSwitch, MockSwitch, SharedSwitch,
};
pub use transport::{ReqwestTransport, Transport};
pub use types::{Macro, MacroCommand, SystemStatus, WifiConfig, WifiNetwork, WifiStatus};
