//! Error types for WebAssembly bridge implementations

use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Result type for WebAssembly bridge operations
pub type WasmResult<T> = Result<T, WasmError>;

/// Errors that can occur in WebAssembly bridge implementations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WasmError {
    /// JavaScript error from web-sys
    #[error("JavaScript error: {0}")]
    JavaScript(String),

    /// DOM exception, identified by its `name` (e.g. `NotAllowedError`)
    #[error("{name}: {message}")]
    Dom {
        /// Exception name
        name: String,
        /// Human-readable message
        message: String,
    },

    /// A browser API is missing in this context
    #[error("Browser API not available: {0}")]
    NotAvailable(String),
}

impl WasmError {
    /// Whether the browser refused the operation until a user gesture.
    pub fn is_not_allowed(&self) -> bool {
        matches!(self, WasmError::Dom { name, .. } if name == "NotAllowedError")
    }
}

impl From<WasmError> for bridge_traits::error::BridgeError {
    fn from(err: WasmError) -> Self {
        match err {
            WasmError::NotAvailable(what) => bridge_traits::error::BridgeError::NotAvailable(what),
            other => bridge_traits::error::BridgeError::OperationFailed(other.to_string()),
        }
    }
}

impl From<JsValue> for WasmError {
    fn from(js_value: JsValue) -> Self {
        if let Some(exception) = js_value.dyn_ref::<web_sys::DomException>() {
            return WasmError::Dom {
                name: exception.name(),
                message: exception.message(),
            };
        }
        let msg = if js_value.is_string() {
            js_value
                .as_string()
                .unwrap_or_else(|| "Unknown error".to_string())
        } else if let Some(error) = js_value.dyn_ref::<js_sys::Error>() {
            error.message().into()
        } else {
            format!("{:?}", js_value)
        };
        WasmError::JavaScript(msg)
    }
}
