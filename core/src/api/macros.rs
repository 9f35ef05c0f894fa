//! Stored macros.

use std::cmp::Ordering;

use serde_json::Value;

use super::{decode_or_default, to_body};
use crate::context::ApiContext;
use crate::endpoints::{self, macro_path, Endpoint};
use crate::error::ApiError;
use crate::executor::execute;
use crate::types::Macro;

/// Ids of all stored macros, in display order (see `compare_macro_ids`).
pub async fn list_macros(ctx: &ApiContext) -> Result<Vec<String>, ApiError> {
    let raw = execute(ctx, &Endpoint::get(endpoints::MACROS), None, None).await?;
    let mut ids = macro_ids(raw);
    ids.sort_by(|a, b| compare_macro_ids(a, b));
    Ok(ids)
}

pub async fn get_macro(ctx: &ApiContext, id: &str) -> Result<Macro, ApiError> {
    let path = macro_path(id);
    let raw = execute(ctx, &Endpoint::get(path.as_str()), None, None).await?;
    let mut decoded: Macro = decode_or_default(&path, raw);
    if decoded.id.is_empty() {
        decoded.id = id.to_string();
    }
    Ok(decoded)
}

/// Create or replace the macro stored under `id`.
pub async fn save_macro(ctx: &ApiContext, id: &str, data: &Macro) -> Result<Value, ApiError> {
    let body = to_body(data)?;
    execute(ctx, &Endpoint::post(macro_path(id)), Some(&body), None).await
}

pub async fn delete_macro(ctx: &ApiContext, id: &str) -> Result<(), ApiError> {
    execute(ctx, &Endpoint::delete(macro_path(id)), None, None).await?;
    Ok(())
}

/// Ordering for macro ids.
///
/// Ids named `<digits>_...` come first, ordered by that number; all other ids
/// follow in lexicographic order. Equal prefixes fall back to the full id.
pub fn compare_macro_ids(a: &str, b: &str) -> Ordering {
    match (numeric_prefix(a), numeric_prefix(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

// Prefixes too long for u64 are treated as plain names.
fn numeric_prefix(id: &str) -> Option<u64> {
    let (digits, _) = id.split_once('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

// Firmware lists ids as strings; some builds send `{ "id": ... }` objects.
fn macro_ids(raw: Value) -> Vec<String> {
    match raw {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(id) => Some(id),
                Value::Object(mut entry) => match entry.remove("id") {
                    Some(Value::String(id)) => Some(id),
                    _ => None,
                },
                _ => None,
            })
            .collect(),
        other => {
            tracing::warn!(payload = %other, "macro list is not an array");
            Vec::new()
        }
    }
}
