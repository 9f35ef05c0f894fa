use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

/// What a scripted route does when called.
#[derive(Debug, Clone)]
pub enum Scripted {
    Respond(HttpResponse),
    Fail(TransportError),
    /// Never completes; only the executor's timeout ends the attempt.
    Hang,
}

type Routes = HashMap<String, VecDeque<Scripted>>;

/// A scriptable `Transport` for tests.
///
/// Routes are matched against the end of the request URL, the longest
/// matching key winning. Each route replays its queued outcomes in order and
/// keeps repeating the last one. Unscripted URLs fail with a connect error.
/// Every request is recorded for later assertions.
///
/// # Example
///
/// ```ignore
/// let transport = ScriptedTransport::new();
/// transport.respond("/config/info", 200, r#"{"name":"pad"}"#);
/// transport.hang("/config/leds");
/// ```
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    routes: Arc<Mutex<Routes>>,
    calls: Arc<Mutex<Vec<HttpRequest>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, key: &str, outcome: Scripted) {
        lock(&self.routes)
            .entry(key.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub fn respond(&self, key: &str, status: u16, body: &str) {
        self.push(key, Scripted::Respond(HttpResponse::new(status, body)));
    }

    pub fn fail(&self, key: &str, error: TransportError) {
        self.push(key, Scripted::Fail(error));
    }

    pub fn hang(&self, key: &str) {
        self.push(key, Scripted::Hang);
    }

    /// All requests seen so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.calls).clone()
    }

    /// Number of requests whose URL ends with `key`.
    pub fn count(&self, key: &str) -> usize {
        lock(&self.calls).iter().filter(|r| r.url.ends_with(key)).count()
    }

    pub fn last_request(&self, key: &str) -> Option<HttpRequest> {
        lock(&self.calls)
            .iter()
            .rev()
            .find(|r| r.url.ends_with(key))
            .cloned()
    }

    fn next_outcome(&self, url: &str) -> Option<Scripted> {
        let mut routes = lock(&self.routes);
        let key = routes
            .keys()
            .filter(|k| url.ends_with(k.as_str()))
            .max_by_key(|k| k.len())?
            .clone();
        let queue = routes.get_mut(&key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let outcome = self.next_outcome(&request.url);
        let url = request.url.clone();
        lock(&self.calls).push(request);
        match outcome {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(err)) => Err(err),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(TransportError::Connect(format!("connection refused: {url}"))),
        }
    }
}
