//! Typed endpoint facade.
//!
//! Each operation is a fixed endpoint, method and body shape delegated to
//! `executor::execute`. The facade adds no retry or status logic of its own;
//! it only shapes payloads (brightness scaling, macro ordering, typed DTOs).

pub mod config;
pub mod macros;
pub mod wifi;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Decode a payload into `T`, falling back to `T::default()` when the device
/// sent an unexpected shape.
pub(crate) fn decode_or_default<T>(path: &str, value: Value) -> T
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_value(value) {
        Ok(decoded) => decoded,
        Err(err) => {
            tracing::warn!(%path, error = %err, "unexpected payload shape, using default");
            T::default()
        }
    }
}

pub(crate) fn to_body<T: Serialize>(data: &T) -> Result<Value, ApiError> {
    Ok(serde_json::to_value(data)?)
}
