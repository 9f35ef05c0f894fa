//! Wifi provisioning and link status.

use std::time::Duration;

use serde_json::Value;

use super::{decode_or_default, to_body};
use crate::context::ApiContext;
use crate::endpoints::{self, Endpoint};
use crate::error::ApiError;
use crate::executor::execute;
use crate::types::{SystemStatus, WifiConfig, WifiConnectRequest, WifiNetwork};

/// A scan keeps the radio busy for several seconds on the device.
pub const SCAN_TIMEOUT: Duration = Duration::from_secs(15);

pub async fn scan_networks(ctx: &ApiContext) -> Result<Vec<WifiNetwork>, ApiError> {
    let raw = execute(ctx, &Endpoint::get(endpoints::WIFI_SCAN), None, Some(SCAN_TIMEOUT)).await?;
    Ok(decode_or_default(endpoints::WIFI_SCAN, raw))
}

pub async fn get_wifi_config(ctx: &ApiContext) -> Result<WifiConfig, ApiError> {
    let raw = execute(ctx, &Endpoint::get(endpoints::WIFI_CONFIG), None, None).await?;
    Ok(decode_or_default(endpoints::WIFI_CONFIG, raw))
}

/// Join `ssid`, or switch the device into access point mode.
pub async fn connect_to_network(
    ctx: &ApiContext,
    ssid: &str,
    password: &str,
    ap_mode: bool,
    ap_name: &str,
) -> Result<Value, ApiError> {
    let request = WifiConnectRequest {
        ssid: ssid.to_string(),
        password: password.to_string(),
        ap_mode,
        ap_name: ap_name.to_string(),
    };
    let body = to_body(&request)?;
    execute(ctx, &Endpoint::post(endpoints::WIFI_CONFIG), Some(&body), None).await
}

pub async fn get_system_status(ctx: &ApiContext) -> Result<SystemStatus, ApiError> {
    let raw = execute(ctx, &Endpoint::get(endpoints::WIFI_STATUS), None, None).await?;
    Ok(decode_or_default(endpoints::WIFI_STATUS, raw))
}
