//! Crate error type. Shader diagnostics carry the compiler/linker log
//! verbatim so callers can surface it; everything else wraps the browser
//! failure that produced it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("WebGL2 rendering context unavailable")]
    ContextUnavailable,

    #[error("no window in this environment")]
    NoWindow,

    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("program failed to link: {0}")]
    ProgramLink(String),

    #[error("DOM operation failed: {0}")]
    Dom(String),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for Error {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        Error::Dom(format!("{value:?}"))
    }
}

#[cfg(target_arch = "wasm32")]
impl From<Error> for wasm_bindgen::JsValue {
    fn from(err: Error) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
