use alloy::{
    providers::{DynProvider, Provider, ProviderBuilder, WsConnect},
    transports::http::reqwest::Url,
};
use anyhow::Error;
use tracing::debug;

/// Builds a read-only provider for a single endpoint.
///
/// `ws://` and `wss://` URLs get a WebSocket transport, `http://` and `https://` URLs an
/// HTTP transport. Any other scheme is rejected before a connection is attempted.
pub async fn create_read_only_provider(url: &str) -> Result<DynProvider, Error> {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        debug!("Creating WebSocket provider for {url}");
        let ws = WsConnect::new(url);
        Ok(ProviderBuilder::new()
            .connect_ws(ws)
            .await
            .map_err(|e| Error::msg(format!("Execution layer: Failed to connect to WS: {e}")))?
            .erased())
    } else if url.starts_with("http://") || url.starts_with("https://") {
        debug!("Creating HTTP provider for {url}");
        let url = Url::parse(url).map_err(|e| {
            anyhow::anyhow!("Failed to parse URL while creating HTTP provider: {e}")
        })?;
        Ok(ProviderBuilder::new().connect_http(url).erased())
    } else {
        Err(anyhow::anyhow!(
            "Invalid URL, only websocket and http are supported: {}",
            url
        ))
    }
}
