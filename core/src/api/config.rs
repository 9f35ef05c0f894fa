//! Device configuration documents.

use serde_json::Value;

use crate::context::ApiContext;
use crate::endpoints::{self, Endpoint};
use crate::error::ApiError;
use crate::executor::execute;
use crate::led;

async fn read(ctx: &ApiContext, path: &str) -> Result<Value, ApiError> {
    execute(ctx, &Endpoint::get(path), None, None).await
}

async fn write(ctx: &ApiContext, path: &str, data: &Value) -> Result<Value, ApiError> {
    execute(ctx, &Endpoint::post(path), Some(data), None).await
}

pub async fn get_components(ctx: &ApiContext) -> Result<Value, ApiError> {
    read(ctx, endpoints::CONFIG_COMPONENTS).await
}

pub async fn update_components(ctx: &ApiContext, data: &Value) -> Result<Value, ApiError> {
    write(ctx, endpoints::CONFIG_COMPONENTS, data).await
}

pub async fn get_actions(ctx: &ApiContext) -> Result<Value, ApiError> {
    read(ctx, endpoints::CONFIG_ACTIONS).await
}

pub async fn update_actions(ctx: &ApiContext, data: &Value) -> Result<Value, ApiError> {
    write(ctx, endpoints::CONFIG_ACTIONS, data).await
}

pub async fn get_example(ctx: &ApiContext) -> Result<Value, ApiError> {
    read(ctx, endpoints::CONFIG_EXAMPLE).await
}

pub async fn get_info(ctx: &ApiContext) -> Result<Value, ApiError> {
    read(ctx, endpoints::CONFIG_INFO).await
}

/// LED configuration with every brightness in UI scale (0–20).
pub async fn get_leds(ctx: &ApiContext) -> Result<Value, ApiError> {
    let raw = read(ctx, endpoints::CONFIG_LEDS).await?;
    Ok(led::leds_to_ui(&raw))
}

/// Save LED configuration given in UI scale; the device receives 0–255.
pub async fn update_leds(ctx: &ApiContext, data: &Value) -> Result<Value, ApiError> {
    let firmware = led::leds_to_firmware(data);
    write(ctx, endpoints::CONFIG_LEDS, &firmware).await
}

pub async fn get_reports(ctx: &ApiContext) -> Result<Value, ApiError> {
    read(ctx, endpoints::CONFIG_REPORTS).await
}

pub async fn get_display(ctx: &ApiContext) -> Result<Value, ApiError> {
    read(ctx, endpoints::CONFIG_DISPLAY).await
}

pub async fn update_display(ctx: &ApiContext, data: &Value) -> Result<Value, ApiError> {
    write(ctx, endpoints::CONFIG_DISPLAY, data).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::http::HttpMethod;
    use crate::testing::ScriptedTransport;

    fn context(t: &ScriptedTransport) -> ApiContext {
        ApiContext::builder("http://pad/api", Arc::new(t.clone()))
            .mock_data_url("http://pad/mock_data")
            .build()
    }

    #[tokio::test]
    async fn get_leds_returns_ui_scale() {
        let t = ScriptedTransport::new();
        t.respond("/api/config/leds", 200, r#"{"leds":{"brightness":127,"config":[{"brightness":255}]}}"#);

        let leds = get_leds(&context(&t)).await.unwrap();
        assert_eq!(leds["leds"]["brightness"], 10);
        assert_eq!(leds["leds"]["config"][0]["brightness"], 20);
    }

    #[tokio::test]
    async fn update_leds_sends_firmware_scale() {
        let t = ScriptedTransport::new();
        t.respond("/api/config/leds", 200, r#"{"status":"ok"}"#);

        let reply = update_leds(&context(&t), &json!({"leds": {"brightness": 5}})).await.unwrap();
        assert_eq!(reply["status"], "ok");
        let req = t.last_request("/api/config/leds").unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        let sent: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent["leds"]["brightness"], 64);
    }

    #[tokio::test]
    async fn each_operation_hits_its_endpoint() {
        let t = ScriptedTransport::new();
        for path in [
            "/api/config/components",
            "/api/config/actions",
            "/api/config/example",
            "/api/config/info",
            "/api/config/reports",
            "/api/config/display",
        ] {
            t.respond(path, 200, "{}");
        }
        let ctx = context(&t);
        let data = json!({"k": 1});

        get_components(&ctx).await.unwrap();
        update_components(&ctx, &data).await.unwrap();
        get_actions(&ctx).await.unwrap();
        update_actions(&ctx, &data).await.unwrap();
        get_example(&ctx).await.unwrap();
        get_info(&ctx).await.unwrap();
        get_reports(&ctx).await.unwrap();
        get_display(&ctx).await.unwrap();
        update_display(&ctx, &data).await.unwrap();

        let calls: Vec<(HttpMethod, String)> = t
            .requests()
            .into_iter()
            .map(|r| (r.method, r.url.trim_start_matches("http://pad/api").to_string()))
            .collect();
        assert_eq!(
            calls,
            vec![
                (HttpMethod::Get, "/config/components".to_string()),
                (HttpMethod::Post, "/config/components".to_string()),
                (HttpMethod::Get, "/config/actions".to_string()),
                (HttpMethod::Post, "/config/actions".to_string()),
                (HttpMethod::Get, "/config/example".to_string()),
                (HttpMethod::Get, "/config/info".to_string()),
                (HttpMethod::Get, "/config/reports".to_string()),
                (HttpMethod::Get, "/config/display".to_string()),
                (HttpMethod::Post, "/config/display".to_string()),
            ]
        );
    }
}
