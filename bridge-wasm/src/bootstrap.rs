//! Convenience helpers for wiring the wasm bridge implementations together.
//!
//! Host shells call [`build_wasm_bridges`] once at startup and hand the
//! returned trait objects to the narration core. This mirrors the role that
//! the `bridge-desktop` crate plays for native targets.

use std::sync::Arc;

use bridge_traits::{
    audio::AudioPlayerFactory, error::Result as BridgeResult, http::HttpClient,
};

use crate::{audio::HtmlAudioPlayerFactory, http::WasmHttpClient};

/// Fully constructed wasm bridge objects ready for injection into the core.
pub struct WasmBridgeSet {
    /// HTTP client powered by browser `fetch`.
    pub http_client: Arc<dyn HttpClient>,
    /// Player factory backed by `HtmlAudioElement`.
    pub players: Arc<dyn AudioPlayerFactory>,
}

impl WasmBridgeSet {
    /// Convenience accessor to clone the HTTP client.
    pub fn http(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.http_client)
    }

    /// Convenience accessor to clone the player factory.
    pub fn players(&self) -> Arc<dyn AudioPlayerFactory> {
        Arc::clone(&self.players)
    }
}

/// Build the default wasm bridge stack.
///
/// Fails with `NotAvailable` outside a browser window context.
pub fn build_wasm_bridges() -> BridgeResult<WasmBridgeSet> {
    let http_client: Arc<dyn HttpClient> = Arc::new(WasmHttpClient::new()?);
    let players: Arc<dyn AudioPlayerFactory> = Arc::new(HtmlAudioPlayerFactory);

    Ok(WasmBridgeSet {
        http_client,
        players,
    })
}
