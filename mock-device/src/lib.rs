//! In-process stand-in for the macropad firmware's HTTP API.
//!
//! # Design
//! Serves the same routes as the device under `/api`, the `/ws` event socket,
//! and the console's static mock payloads under `/mock_data`. State lives in
//! a shared `Device` so tests can inspect it and inject faults (latency or a
//! forced status code) while the server runs. Config documents are stored in
//! firmware scale, exactly as the device keeps them.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path as UrlPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod telemetry;

/// The payload files shipped with this crate.
pub const BUNDLED_MOCK_DATA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/mock_data");

const CONFIG_DOCS: [&str; 6] = ["components", "actions", "example", "info", "leds", "display"];
const WRITABLE_DOCS: [&str; 4] = ["components", "actions", "leds", "display"];

/// Misbehavior applied to every `/api` request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Faults {
    pub latency: Duration,
    /// Answer with this status instead of running the handler.
    pub status: Option<StatusCode>,
}

#[derive(Debug, Default)]
pub struct Device {
    config: RwLock<HashMap<String, Value>>,
    macros: RwLock<BTreeMap<String, Value>>,
    wifi: RwLock<Value>,
    faults: Mutex<Faults>,
}

impl Device {
    /// A device with a plausible configuration, two layers of LEDs at half
    /// brightness, and a few macros.
    pub fn seeded() -> Self {
        let config = HashMap::from([
            (
                "components".to_string(),
                json!({"components": [
                    {"id": "button-1", "type": "button", "size": {"rows": 1, "columns": 1}, "start_location": {"row": 0, "column": 0}},
                    {"id": "encoder-1", "type": "encoder", "size": {"rows": 1, "columns": 1}, "start_location": {"row": 0, "column": 1}}
                ]}),
            ),
            ("actions".to_string(), json!({"actions": {"layers": []}})),
            ("example".to_string(), json!({"components": [], "actions": {"layers": []}})),
            (
                "info".to_string(),
                json!({"name": "Modular Macropad", "version": "1.2.0", "device_id": "MP-0001", "status": "ready"}),
            ),
            (
                "leds".to_string(),
                json!({"leds": {"brightness": 127, "config": [
                    {"id": 0, "color": "#ffffff", "brightness": 255},
                    {"id": 1, "color": "#0000ff", "brightness": 51}
                ]}}),
            ),
            ("display".to_string(), json!({"display": {"enabled": true, "contrast": 200}})),
        ]);
        let macros = BTreeMap::from([
            ("1_copy".to_string(), json!({"id": "1_copy", "name": "Copy", "description": "", "commands": [{"type": "keypress", "value": "c"}]})),
            ("10_paste".to_string(), json!({"id": "10_paste", "name": "Paste", "description": "", "commands": [{"type": "keypress", "value": "v"}]})),
            ("2_cut".to_string(), json!({"id": "2_cut", "name": "Cut", "description": "", "commands": []})),
            ("volume_up".to_string(), json!({"id": "volume_up", "name": "Volume up", "description": "", "commands": []})),
        ]);
        Self {
            config: RwLock::new(config),
            macros: RwLock::new(macros),
            wifi: RwLock::new(json!({
                "ssid": "home",
                "ap_mode": false,
                "sta_connected": true,
                "sta_ip": "192.168.1.50"
            })),
            faults: Mutex::new(Faults::default()),
        }
    }

    pub fn set_faults(&self, faults: Faults) {
        *self.lock_faults() = faults;
    }

    pub fn faults(&self) -> Faults {
        *self.lock_faults()
    }

    /// Stored copy of a config document, e.g. `"leds"`.
    pub async fn config_doc(&self, name: &str) -> Option<Value> {
        self.config.read().await.get(name).cloned()
    }

    fn lock_faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub type SharedDevice = Arc<Device>;

pub fn app() -> Router {
    app_with(Arc::new(Device::seeded()), Path::new(BUNDLED_MOCK_DATA))
}

pub fn app_with(device: SharedDevice, mock_data_dir: &Path) -> Router {
    let api = Router::new()
        .route("/config/{name}", get(get_config).post(update_config))
        .route("/macros", get(list_macros))
        .route("/macros/{id}", get(get_macro).post(save_macro).delete(delete_macro))
        .route("/wifi/scan", get(scan_networks))
        .route("/wifi/config", get(get_wifi_config).post(update_wifi_config))
        .route("/wifi/status", get(wifi_status))
        .route_layer(middleware::from_fn_with_state(device.clone(), apply_faults))
        .with_state(device);

    Router::new()
        .nest("/api", api)
        .route("/ws", get(open_socket))
        .nest_service("/mock_data", ServeDir::new(mock_data_dir))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, Arc::new(Device::seeded()), Path::new(BUNDLED_MOCK_DATA)).await
}

pub async fn serve(
    listener: TcpListener,
    device: SharedDevice,
    mock_data_dir: &Path,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(device, mock_data_dir)).await
}

async fn apply_faults(State(device): State<SharedDevice>, request: Request, next: Next) -> Response {
    let faults = device.faults();
    if !faults.latency.is_zero() {
        tokio::time::sleep(faults.latency).await;
    }
    if let Some(status) = faults.status {
        tracing::debug!(%status, uri = %request.uri(), "injected fault");
        return (status, "injected fault").into_response();
    }
    next.run(request).await
}

fn reports_unsupported() -> Response {
    (
        StatusCode::NOT_IMPLEMENTED,
        "reports are not supported by this firmware",
    )
        .into_response()
}

async fn get_config(State(device): State<SharedDevice>, UrlPath(name): UrlPath<String>) -> Response {
    if name == "reports" {
        return reports_unsupported();
    }
    match device.config_doc(&name).await {
        Some(doc) => Json(doc).into_response(),
        None => (StatusCode::NOT_FOUND, "unknown config document").into_response(),
    }
}

async fn update_config(
    State(device): State<SharedDevice>,
    UrlPath(name): UrlPath<String>,
    Json(doc): Json<Value>,
) -> Response {
    if name == "reports" {
        return reports_unsupported();
    }
    if !WRITABLE_DOCS.contains(&name.as_str()) {
        let status = if CONFIG_DOCS.contains(&name.as_str()) {
            StatusCode::METHOD_NOT_ALLOWED
        } else {
            StatusCode::NOT_FOUND
        };
        return (status, "config document is read-only").into_response();
    }
    tracing::info!(%name, "config updated");
    device.config.write().await.insert(name, doc);
    Json(json!({"status": "saved"})).into_response()
}

async fn list_macros(State(device): State<SharedDevice>) -> Json<Vec<String>> {
    Json(device.macros.read().await.keys().cloned().collect())
}

async fn get_macro(
    State(device): State<SharedDevice>,
    UrlPath(id): UrlPath<String>,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    device
        .macros
        .read()
        .await
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "macro not found"))
}

async fn save_macro(
    State(device): State<SharedDevice>,
    UrlPath(id): UrlPath<String>,
    Json(mut body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    let Some(fields) = body.as_object_mut() else {
        return Err((StatusCode::BAD_REQUEST, "macro must be an object"));
    };
    fields.insert("id".to_string(), Value::String(id.clone()));
    tracing::info!(%id, "macro saved");
    device.macros.write().await.insert(id.clone(), body);
    Ok(Json(json!({"status": "saved", "id": id})))
}

async fn delete_macro(
    State(device): State<SharedDevice>,
    UrlPath(id): UrlPath<String>,
) -> Result<StatusCode, (StatusCode, &'static str)> {
    device
        .macros
        .write()
        .await
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or((StatusCode::NOT_FOUND, "macro not found"))
}

async fn scan_networks() -> Json<Value> {
    Json(json!([
        {"ssid": "home", "rssi": -42, "encryption": "WPA2", "channel": 6},
        {"ssid": "office", "rssi": -67, "encryption": "WPA2", "channel": 11},
        {"ssid": "cafe", "rssi": -80, "encryption": "Open", "channel": 1}
    ]))
}

async fn get_wifi_config(State(device): State<SharedDevice>) -> Json<Value> {
    Json(device.wifi.read().await.clone())
}

#[derive(Debug, Deserialize)]
pub struct WifiRequest {
    #[serde(default)]
    pub ssid: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub ap_mode: bool,
    #[serde(default)]
    pub ap_name: String,
}

async fn update_wifi_config(
    State(device): State<SharedDevice>,
    Json(input): Json<WifiRequest>,
) -> Result<Json<Value>, (StatusCode, &'static str)> {
    if !input.ap_mode && input.ssid.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "ssid is required"));
    }
    if !input.ap_mode && input.password.len() < 8 {
        return Err((StatusCode::BAD_REQUEST, "password too short"));
    }
    let mut wifi = device.wifi.write().await;
    *wifi = if input.ap_mode {
        json!({"ssid": "", "ap_mode": true, "ap_name": input.ap_name, "ap_ip": "192.168.4.1"})
    } else {
        json!({"ssid": input.ssid, "ap_mode": false, "sta_connected": true, "sta_ip": "192.168.1.50"})
    };
    Ok(Json(json!({"status": "connecting"})))
}

async fn wifi_status(State(device): State<SharedDevice>) -> Json<Value> {
    let wifi = device.wifi.read().await;
    let ap_mode = wifi["ap_mode"].as_bool().unwrap_or(false);
    let ip = if ap_mode { &wifi["ap_ip"] } else { &wifi["sta_ip"] };
    Json(json!({"wifi": {
        "connected": wifi["sta_connected"].as_bool().unwrap_or(false),
        "ip": ip.as_str().unwrap_or(""),
        "ssid": wifi["ssid"].as_str().unwrap_or(""),
        "ap_mode": ap_mode
    }}))
}

async fn open_socket(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(stream_events)
}

async fn stream_events(mut socket: WebSocket) {
    let hello = json!({"type": "hello", "layer": "default"}).to_string();
    if socket.send(Message::Text(hello.into())).await.is_err() {
        return;
    }
    while let Some(Ok(message)) = socket.recv().await {
        if matches!(message, Message::Close(_)) {
            break;
        }
    }
    tracing::debug!("event socket closed");
}
