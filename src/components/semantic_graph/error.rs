use thiserror::Error;
use wasm_bindgen::JsValue;

/// Setup failures. The engine cannot run without a window and a 2d
/// context, so none of these are retried.
#[derive(Debug, Error)]
pub enum EngineError {
	#[error("no browser window available")]
	NoWindow,
	#[error("2d drawing context unavailable: {0}")]
	Context(String),
	#[error("failed to register `{event}` listener: {reason}")]
	Listener { event: &'static str, reason: String },
	#[error("animation frame request failed: {0}")]
	Frame(String),
}

/// Debug rendering of a thrown JS value.
pub(crate) fn describe(err: JsValue) -> String {
	err.as_string().unwrap_or_else(|| format!("{err:?}"))
}
