use std::path::PathBuf;
use std::sync::Arc;

use mock_device::{telemetry, Device};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let _guard = telemetry::init_tracing("info");
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let mock_dir = std::env::var("MOCK_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(mock_device::BUNDLED_MOCK_DATA));
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, mock_dir = %mock_dir.display(), "mock device listening");
    mock_device::serve(listener, Arc::new(Device::seeded()), &mock_dir).await
}
