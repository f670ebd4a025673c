use log::Level;
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::error::ViewerError;

/// Settings passed from JavaScript to `CameraViewer`. Every field is optional.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Id of the element the viewer builds its markup into.
    pub root_id: String,
    pub capture: CaptureConfig,
    pub overlay: OverlayStyle,
    pub log_level: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            root_id: "app".to_string(),
            capture: CaptureConfig::default(),
            overlay: OverlayStyle::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Reads a config object; `undefined` and `null` yield the defaults.
    pub fn from_js(value: JsValue) -> Result<Self, ViewerError> {
        if value.is_undefined() || value.is_null() {
            return Ok(Self::default());
        }
        serde_wasm_bindgen::from_value(value).map_err(|err| ViewerError::Config(err.to_string()))
    }

    pub fn level(&self) -> Result<Level, ViewerError> {
        self.log_level
            .parse()
            .map_err(|_| ViewerError::Config(format!("unknown log level `{}`", self.log_level)))
    }
}

/// Resolution requested from the camera. Audio is never requested.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayStyle {
    pub stroke_style: String,
    pub line_width: f64,
}

impl Default for OverlayStyle {
    // canvas 2d context defaults
    fn default() -> Self {
        Self {
            stroke_style: "#000000".to_string(),
            line_width: 1.0,
        }
    }
}
