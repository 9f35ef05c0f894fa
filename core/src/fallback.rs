//! Minimal structurally-valid payloads returned when neither the device nor
//! mock data can answer a read.
//!
//! Only reads have defaults. A write that never reached the device must not
//! look like it succeeded, and a single macro has no meaningful empty shape.

use serde_json::{json, Value};

use crate::endpoints::{self, Endpoint};
use crate::http::HttpMethod;

pub fn default_for(endpoint: &Endpoint) -> Option<Value> {
    if endpoint.method != HttpMethod::Get {
        return None;
    }
    let value = match endpoint.path.as_str() {
        endpoints::CONFIG_COMPONENTS => json!({ "components": [] }),
        endpoints::CONFIG_ACTIONS => json!({ "actions": [] }),
        endpoints::CONFIG_LEDS => json!({ "leds": { "config": [] } }),
        endpoints::CONFIG_DISPLAY => json!({ "display": {} }),
        endpoints::CONFIG_INFO | endpoints::CONFIG_EXAMPLE | endpoints::CONFIG_REPORTS => json!({}),
        endpoints::MACROS | endpoints::WIFI_SCAN => json!([]),
        endpoints::WIFI_CONFIG => json!({ "ssid": "", "ap_mode": false }),
        endpoints::WIFI_STATUS => json!({
            "wifi": { "connected": false, "ip": "", "ssid": "", "ap_mode": false }
        }),
        _ => return None,
    };
    Some(value)
}

pub fn has_default(endpoint: &Endpoint) -> bool {
    default_for(endpoint).is_some()
}
