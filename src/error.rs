use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    #[error("browser global unavailable: {0}")]
    MissingGlobal(&'static str),

    #[error("element #{0} not found")]
    MissingElement(String),

    #[error("expected {0}")]
    UnexpectedType(&'static str),

    /// A call into JavaScript threw.
    #[error("{operation} failed: {message}")]
    Js {
        operation: &'static str,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("2d canvas context unavailable")]
    ContextUnavailable,

    /// The video element stopped delivering frames.
    #[error("video source detached")]
    SourceDetached,

    #[error("requestVideoFrameCallback is not supported")]
    FrameCallbackUnavailable,
}

impl ViewerError {
    /// Builds a `map_err` adapter tagging a thrown JS value with the call that threw it.
    pub fn js(operation: &'static str) -> impl FnOnce(JsValue) -> ViewerError {
        move |value| ViewerError::Js {
            operation,
            message: value
                .as_string()
                .or_else(|| {
                    value
                        .dyn_ref::<js_sys::Error>()
                        .map(|err| String::from(err.message()))
                })
                .unwrap_or_else(|| format!("{:?}", value)),
        }
    }

    /// Whether the render loop has to stop after this error.
    pub fn ends_render_loop(&self) -> bool {
        matches!(
            self,
            ViewerError::SourceDetached | ViewerError::FrameCallbackUnavailable
        )
    }
}

impl From<serde_wasm_bindgen::Error> for ViewerError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        ViewerError::Serialization(err.to_string())
    }
}

impl From<ViewerError> for JsValue {
    fn from(err: ViewerError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}
