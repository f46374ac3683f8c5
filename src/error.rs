use thiserror::Error;
use wasm_bindgen::JsValue;

/// Errors raised by the viewer core and its browser glue.
#[derive(Debug, Error)]
pub enum Error {
    /// Camera permission denied, no device, or no usable file.
    #[error("could not acquire video source: {0}")]
    SourceAcquisition(String),

    /// Source dimensions were queried before the first frame was decoded.
    #[error("source metadata not ready")]
    MetadataNotReady,

    /// The browser refused to enter or leave fullscreen.
    #[error("fullscreen transition failed: {0}")]
    Fullscreen(String),

    /// Shader compilation, framebuffer setup or other WebGL failure.
    #[error("gpu error: {0}")]
    Gpu(String),

    /// Missing element or failed DOM call.
    #[error("dom error: {0}")]
    Dom(String),

    /// Malformed inline configuration.
    #[error(transparent)]
    Config(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<JsValue> for Error {
    fn from(value: JsValue) -> Self {
        Error::Dom(describe_js(&value))
    }
}

impl From<Error> for JsValue {
    fn from(err: Error) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

/// Best-effort text for a thrown JS value (`DOMException` messages included).
pub fn describe_js(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{value:?}"))
}
