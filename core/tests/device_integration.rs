//! End-to-end checks against the mock device over real HTTP.
//!
//! # Design
//! Each test starts its own mock device on a random port in a background
//! thread, then drives the typed API through `ReqwestTransport`. Faults are
//! injected on the shared `Device` while the server runs.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use macropad_core::api::{config, macros, wifi};
use macropad_core::{
    ApiContext, ApiContextBuilder, ApiError, ConnectionStatus, ConsoleConfig, Macro,
    ReqwestTransport, RetryPolicy, SharedSwitch, SocketMonitor,
};
use mock_device::{Device, Faults, BUNDLED_MOCK_DATA};
use serde_json::json;

fn start_device() -> (String, Arc<Device>) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let device = Arc::new(Device::seeded());
    let shared = device.clone();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_device::serve(listener, shared, Path::new(BUNDLED_MOCK_DATA)).await
        })
        .unwrap();
    });

    (format!("http://{addr}"), device)
}

fn builder(base: &str) -> ApiContextBuilder {
    ApiContext::builder(&format!("{base}/api"), Arc::new(ReqwestTransport::new().unwrap()))
        .mock_data_url(&format!("{base}/mock_data"))
        .retry_policy(RetryPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(20),
        })
        .default_timeout(Duration::from_secs(2))
}

fn dead_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn leds_are_rescaled_both_ways() {
    let (base, device) = start_device();
    let ctx = builder(&base).build();

    let leds = config::get_leds(&ctx).await.unwrap();
    assert_eq!(leds["leds"]["brightness"], 10);
    assert_eq!(leds["leds"]["config"][0]["brightness"], 20);
    assert_eq!(ctx.tracker().current().status, ConnectionStatus::Connected);

    let mut edited = leds.clone();
    edited["leds"]["brightness"] = json!(5);
    config::update_leds(&ctx, &edited).await.unwrap();

    let stored = device.config_doc("leds").await.unwrap();
    assert_eq!(stored["leds"]["brightness"], 64);
    assert_eq!(stored["leds"]["config"][0]["brightness"], 255);
}

#[tokio::test]
async fn macros_are_listed_in_display_order() {
    let (base, _device) = start_device();
    let ctx = builder(&base).build();

    let ids = macros::list_macros(&ctx).await.unwrap();
    assert_eq!(ids, vec!["1_copy", "2_cut", "10_paste", "volume_up"]);

    let copy = macros::get_macro(&ctx, "1_copy").await.unwrap();
    assert_eq!(copy.name, "Copy");
}

#[tokio::test]
async fn macro_save_then_delete() {
    let (base, _device) = start_device();
    let ctx = builder(&base).build();
    let tab = Macro {
        id: "3_tab".into(),
        name: "Tab".into(),
        ..Default::default()
    };

    macros::save_macro(&ctx, "3_tab", &tab).await.unwrap();
    assert!(macros::list_macros(&ctx).await.unwrap().contains(&"3_tab".to_string()));

    macros::delete_macro(&ctx, "3_tab").await.unwrap();
    let err = macros::get_macro(&ctx, "3_tab").await.unwrap_err();
    assert_eq!(
        err,
        ApiError::Http {
            status: 404,
            body: "macro not found".into()
        }
    );
}

#[tokio::test]
async fn unsupported_endpoint_reports_501() {
    let (base, _device) = start_device();
    let ctx = builder(&base).build();

    let err = config::get_reports(&ctx).await.unwrap_err();
    assert_eq!(err.status(), Some(501));

    let state = ctx.tracker().current();
    assert_eq!(state.status, ConnectionStatus::Disconnected);
    assert!(state.error.unwrap().starts_with("HTTP 501"));
}

#[tokio::test]
async fn wifi_round_trip() {
    let (base, _device) = start_device();
    let ctx = builder(&base).build();

    let networks = wifi::scan_networks(&ctx).await.unwrap();
    assert_eq!(networks[0].ssid, "home");

    wifi::connect_to_network(&ctx, "", "", true, "macropad").await.unwrap();
    let status = wifi::get_system_status(&ctx).await.unwrap();
    assert!(status.wifi.ap_mode);
    assert_eq!(status.wifi.ip, "192.168.4.1");
    let cfg = wifi::get_wifi_config(&ctx).await.unwrap();
    assert_eq!(cfg.ap_name.as_deref(), Some("macropad"));
}

#[tokio::test]
async fn slow_device_falls_back_to_mock_data() {
    let (base, device) = start_device();
    device.set_faults(Faults {
        latency: Duration::from_millis(500),
        status: None,
    });
    let ctx = builder(&base).default_timeout(Duration::from_millis(100)).build();

    let info = config::get_info(&ctx).await.unwrap();
    assert_eq!(info["device_id"], "MOCK-123456");

    let state = ctx.tracker().current();
    assert_eq!(state.status, ConnectionStatus::Mock);
    assert!(state.using_mock_data);
    assert!(state.error.unwrap().contains("timed out"));

    // writes are never substituted
    let err = config::update_display(&ctx, &json!({"display": {}})).await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout { timeout_ms: 100, .. }));
}

#[tokio::test]
async fn forced_mock_mode_never_touches_the_device() {
    let (base, device) = start_device();
    device.set_faults(Faults {
        latency: Duration::from_secs(30),
        status: None,
    });
    let ctx = builder(&base)
        .mock_switch(Arc::new(SharedSwitch::new(true)))
        .build();

    let ids = macros::list_macros(&ctx).await.unwrap();
    assert_eq!(ids, vec!["1_copy", "10_paste", "volume_up"]);
    let paste = macros::get_macro(&ctx, "10_paste").await.unwrap();
    assert_eq!(paste.description, "Ctrl+V");
    assert_eq!(ctx.tracker().current().status, ConnectionStatus::Mock);
}

#[tokio::test]
async fn unreachable_device_without_mocks_uses_defaults() {
    let dead = dead_url();
    let ctx = builder(&dead).build();

    let leds = config::get_leds(&ctx).await.unwrap();
    assert_eq!(leds, json!({"leds": {"config": []}}));

    // no mock file and no default: the connectivity error surfaces
    let err = macros::get_macro(&ctx, "ghost").await.unwrap_err();
    assert!(err.is_connectivity());

    // the built-in payload still covers device info
    let info = config::get_info(&ctx).await.unwrap();
    assert_eq!(info["name"], "Modular Macropad (Mock)");
    assert_eq!(ctx.tracker().current().status, ConnectionStatus::Mock);
}

#[tokio::test]
async fn context_from_config_reaches_the_device() {
    let (base, _device) = start_device();
    let mut cfg = ConsoleConfig::default();
    cfg.apply_env(|key| match key {
        "MACROPAD_DEVICE_URL" => Some(format!("{base}/api")),
        "MACROPAD_MOCK_DATA_URL" => Some(format!("{base}/mock_data")),
        _ => None,
    });
    let ctx = ApiContext::from_config(&cfg).unwrap();

    let components = config::get_components(&ctx).await.unwrap();
    assert_eq!(components["components"][0]["id"], "button-1");
}

#[tokio::test]
async fn socket_monitor_tracks_the_event_socket() {
    let (base, _device) = start_device();
    let ctx = builder(&base).build();
    let mut rx = ctx.tracker().subscribe();
    let cfg = ConsoleConfig {
        socket_url: format!("{}/ws", base.replacen("http", "ws", 1)),
        reconnect_interval_ms: 50,
        ..ConsoleConfig::default()
    };

    let handle = SocketMonitor::from_config(&cfg, ctx.tracker().clone());
    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.status == ConnectionStatus::Connected),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(ctx.tracker().current().last_connected.is_some());
    handle.shutdown();
}
