//! Request executor: one logical call against an unreliable device.
//!
//! # Design
//! A call moves through a small state machine:
//!
//! 1. mock short-circuit, when mock mode is forced and a mock exists (GET only);
//! 2. dispatch, bounded by the attempt timeout;
//! 3. classification of the outcome into success, terminal failure
//!    (any HTTP error status) or recoverable failure (timeout, transport);
//! 4. recovery of recoverable failures through one policy: retry after a
//!    fixed backoff until the attempt budget is spent, then mock data, then
//!    the endpoint's structural default, then the original error.
//!
//! Attempts are strictly sequential and every transition is reported to the
//! shared `ConnectionTracker`. Success bodies never fail to decode: JSON is
//! parsed, anything else is returned as text, empty bodies become `{}`.

use std::time::Duration;

use serde_json::Value;
use uuid::Uuid;

use crate::context::{ApiContext, RetryPolicy};
use crate::endpoints::Endpoint;
use crate::error::{ApiError, TransportError};
use crate::fallback;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::status::ConnectionStatus;

/// One network try for a logical call. Lives for the duration of the call.
#[derive(Debug, Clone)]
pub struct RequestAttempt {
    pub id: Uuid,
    pub endpoint: Endpoint,
    pub body: Option<String>,
    pub timeout: Duration,
    /// Zero-based index of the current dispatch.
    pub attempt: u32,
}

impl RequestAttempt {
    pub fn new(endpoint: Endpoint, body: Option<String>, timeout: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            endpoint,
            body,
            timeout,
            attempt: 0,
        }
    }

    pub fn can_retry(&self, policy: &RetryPolicy) -> bool {
        self.attempt + 1 < policy.max_attempts
    }
}

/// How a single dispatch ended, when it did not succeed.
#[derive(Debug)]
enum Failure {
    /// The device answered; retrying cannot change the answer.
    Terminal(ApiError),
    /// The link failed; the retry policy decides what happens next.
    Recoverable(ApiError),
}

/// Execute one logical call.
///
/// `timeout` overrides the context's default per-attempt timeout. Resolves
/// with the device payload, a mock payload, or the endpoint's structural
/// default; fails with an HTTP error, `NotImplemented`, or the last
/// connectivity error for endpoints with no fallback.
#[tracing::instrument(
    skip(ctx, endpoint, body, timeout),
    fields(
        method = %endpoint.method,
        path = %endpoint.path,
        group = ?endpoint.group(),
        request_id = tracing::field::Empty
    )
)]
pub async fn execute(
    ctx: &ApiContext,
    endpoint: &Endpoint,
    body: Option<&Value>,
    timeout: Option<Duration>,
) -> Result<Value, ApiError> {
    let body = body.map(serde_json::to_string).transpose()?;
    let mut attempt = RequestAttempt::new(
        endpoint.clone(),
        body,
        timeout.unwrap_or(ctx.default_timeout),
    );
    tracing::Span::current().record("request_id", tracing::field::display(attempt.id));
    ctx.tracker.refresh_switch().await;

    if let Some(value) = mock_short_circuit(ctx, endpoint).await {
        return Ok(value);
    }

    loop {
        match dispatch(ctx, &attempt).await {
            Ok(value) => return Ok(value),
            Err(Failure::Terminal(err)) => {
                tracing::error!(error = %err, "request failed");
                return Err(err);
            }
            Err(Failure::Recoverable(err)) => {
                if attempt.can_retry(&ctx.retry) {
                    tracing::warn!(
                        attempt = attempt.attempt + 1,
                        max_attempts = ctx.retry.max_attempts,
                        error = %err,
                        "retrying after backoff"
                    );
                    tokio::time::sleep(ctx.retry.backoff).await;
                    attempt.attempt += 1;
                    continue;
                }
                return recover(ctx, endpoint, err).await;
            }
        }
    }
}

fn mock_eligible(endpoint: &Endpoint) -> bool {
    endpoint.method == HttpMethod::Get
}

async fn mock_short_circuit(ctx: &ApiContext, endpoint: &Endpoint) -> Option<Value> {
    if !ctx.tracker.mock_forced() || !mock_eligible(endpoint) || !ctx.mocks.has_mock(&endpoint.path) {
        return None;
    }
    match ctx.mocks.fetch_mock(&endpoint.path).await {
        Ok(value) => {
            ctx.tracker.update_status(ConnectionStatus::Mock, None);
            tracing::info!("mock mode forced, serving mock data");
            Some(value)
        }
        Err(err) => {
            tracing::debug!(error = %err, "mock data unavailable, using the network");
            None
        }
    }
}

async fn dispatch(ctx: &ApiContext, attempt: &RequestAttempt) -> Result<Value, Failure> {
    let endpoint = &attempt.endpoint;
    ctx.tracker.update_status(ConnectionStatus::Connecting, None);

    let request = HttpRequest::json(
        endpoint.method,
        endpoint.url(&ctx.device_url),
        attempt.body.clone(),
    );
    tracing::debug!(attempt = attempt.attempt + 1, url = %request.url, "dispatching");

    let response = match tokio::time::timeout(attempt.timeout, ctx.transport.send(request)).await {
        Ok(Ok(response)) => response,
        Err(_) | Ok(Err(TransportError::Timeout)) => {
            let err = ApiError::Timeout {
                path: endpoint.path.clone(),
                timeout_ms: attempt.timeout.as_millis() as u64,
            };
            ctx.tracker
                .update_status(ConnectionStatus::Disconnected, Some(err.to_string()));
            return Err(Failure::Recoverable(err));
        }
        Ok(Err(TransportError::Connect(message))) => {
            let err = ApiError::Transport {
                path: endpoint.path.clone(),
                message,
            };
            ctx.tracker
                .update_status(ConnectionStatus::Disconnected, Some(err.to_string()));
            return Err(Failure::Recoverable(err));
        }
    };

    if response.is_success() {
        ctx.tracker.update_status(ConnectionStatus::Connected, None);
        return Ok(decode_body(&response));
    }

    let err = if response.status == 501 {
        ApiError::NotImplemented {
            path: endpoint.path.clone(),
        }
    } else {
        ApiError::Http {
            status: response.status,
            body: response.body,
        }
    };
    let detail = match &err {
        ApiError::NotImplemented { .. } => format!("HTTP 501: {err}"),
        other => other.to_string(),
    };
    ctx.tracker
        .update_status(ConnectionStatus::Disconnected, Some(detail));
    Err(Failure::Terminal(err))
}

/// Resolve a call whose retry budget is spent: mock data, then the
/// structural default, then the original error.
async fn recover(ctx: &ApiContext, endpoint: &Endpoint, err: ApiError) -> Result<Value, ApiError> {
    if ctx.fallback_to_mock && mock_eligible(endpoint) && ctx.mocks.has_mock(&endpoint.path) {
        match ctx.mocks.fetch_mock(&endpoint.path).await {
            Ok(value) => {
                tracing::info!(error = %err, "device unreachable, serving mock data");
                ctx.tracker.update_status(
                    ConnectionStatus::Mock,
                    Some(format!("device unreachable, showing mock data ({err})")),
                );
                return Ok(value);
            }
            Err(mock_err) => {
                tracing::warn!(error = %mock_err, "mock fallback failed");
            }
        }
    }

    if let Some(value) = fallback::default_for(endpoint) {
        tracing::info!(error = %err, "device unreachable, returning default payload");
        return Ok(value);
    }

    tracing::error!(error = %err, "retries exhausted");
    Err(err)
}

/// Decode a 2xx body without ever failing.
pub fn decode_body(response: &HttpResponse) -> Value {
    if response.status == 204 || response.body.trim().is_empty() {
        return Value::Object(Default::default());
    }
    match serde_json::from_str(&response.body) {
        Ok(value) => value,
        Err(_) => {
            tracing::debug!(
                content_type = response.header("content-type").unwrap_or("-"),
                "success body is not JSON, returning it as text"
            );
            Value::String(response.body.clone())
        }
    }
}
