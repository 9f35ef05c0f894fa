//! Domain DTOs for the macropad API.
//!
//! # Design
//! Only payloads with a stable shape are typed: macros and wifi. The config
//! documents (components, actions, leds, display, ...) evolve with the
//! firmware and are passed through as `serde_json::Value`. Optional fields
//! default so older firmware that omits them still decodes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored macro.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Macro {
    /// Some firmware builds omit it; the path the macro came from is the id.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub commands: Vec<MacroCommand>,
}

/// One step of a macro. The fields besides `type` depend on the command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MacroCommand {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

/// A network found by a wifi scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WifiNetwork {
    pub ssid: String,
    /// Signal strength in dBm.
    #[serde(default)]
    pub rssi: i32,
    #[serde(default)]
    pub encryption: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<u8>,
}

/// Wifi configuration as reported by the device. The password is never
/// returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WifiConfig {
    #[serde(default)]
    pub ssid: String,
    #[serde(default)]
    pub ap_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sta_connected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sta_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap_ip: Option<String>,
}

/// Request payload for joining a network or switching to AP mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WifiConnectRequest {
    pub ssid: String,
    pub password: String,
    pub ap_mode: bool,
    pub ap_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WifiStatus {
    #[serde(default)]
    pub connected: bool,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub ssid: String,
    #[serde(default)]
    pub ap_mode: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SystemStatus {
    #[serde(default)]
    pub wifi: WifiStatus,
}
