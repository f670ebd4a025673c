use std::sync::Once;

use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod registry;
pub mod render;
pub mod types;
pub mod utils;
pub mod wasm;

pub use config::{CaptureConfig, OverlayStyle, ViewerConfig};
pub use error::ViewerError;
pub use registry::{
    needs_reenumeration, DevicePlatform, DeviceRegistry, EnumerationOutcome, ReconcileOutcome,
    Registry, RegistryEvent, RegistryState, SelectionOrigin,
};
pub use render::{
    DrawingSurface, FrameRenderer, FrameScheduler, RenderLoop, RenderOutcome, VideoSource,
};
pub use types::{Device, DeviceKind, FrameSize, Point};
pub use wasm::CameraViewer;

static INSTALL: Once = Once::new();

/// Panic hook and console logger; only the first call's level takes effect.
pub(crate) fn install(config: &ViewerConfig) -> Result<(), ViewerError> {
    let level = config.level()?;
    INSTALL.call_once(|| {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::new(level));
    });
    Ok(())
}

#[wasm_bindgen]
pub fn initialize(config: JsValue) -> Result<(), JsValue> {
    let config = ViewerConfig::from_js(config)?;
    install(&config)?;
    Ok(())
}
