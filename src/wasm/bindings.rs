use std::rc::Rc;

use futures::future::AbortHandle;
use js_sys::Promise;
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::Event;

use super::canvas::{CanvasSurface, VideoFrameScheduler};
use super::layout::Layout;
use super::media::{media_devices, needs_restart, BrowserMediaDevices, CameraCapture};
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::registry::{Registry, RegistryEvent};
use crate::render::{FrameRenderer, RenderLoop};

type BrowserRegistry = Registry<BrowserMediaDevices>;

/// Camera picker, live `<video>` and mirrored `<canvas>`, mounted into the page.
///
/// ```js
/// const viewer = new CameraViewer({ rootId: "app", logLevel: "debug" });
/// viewer.selectedDeviceId;   // "" until a camera is chosen or opened
/// await viewer.refreshDevices();
/// viewer.destroy();
/// ```
#[wasm_bindgen]
pub struct CameraViewer {
    registry: Rc<BrowserRegistry>,
    capture: Rc<CameraCapture>,
    layout: Layout,
    render_loop: AbortHandle,
    on_change: Closure<dyn FnMut(Event)>,
}

#[wasm_bindgen]
impl CameraViewer {
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<CameraViewer, JsValue> {
        let config = ViewerConfig::from_js(config)?;
        crate::install(&config)?;

        let window = web_sys::window().ok_or(ViewerError::MissingGlobal("window"))?;
        let document = window
            .document()
            .ok_or(ViewerError::MissingGlobal("document"))?;
        let layout = Layout::mount(&document, &config.root_id)?;
        let media_devices = media_devices(&window)?;

        let registry = Rc::new(Registry::new(BrowserMediaDevices::new(
            media_devices.clone(),
        )));
        let capture = Rc::new(CameraCapture::new(
            media_devices,
            layout.video.clone(),
            config.capture,
        ));
        subscribe_page(&registry, &capture, &layout);

        let on_change = {
            let registry = Rc::clone(&registry);
            let selector = layout.selector.clone();
            Closure::<dyn FnMut(Event)>::new(move |_event: Event| {
                registry.select(selector.value());
            })
        };
        layout
            .selector
            .element()
            .add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())
            .map_err(ViewerError::js("addEventListener"))?;

        {
            let registry = Rc::clone(&registry);
            spawn_local(async move {
                registry.enumerate().await;
            });
        }
        start_capture(&registry, &capture, registry.selected_device_id());

        let mut renderer: FrameRenderer<CanvasSurface> =
            FrameRenderer::new(config.overlay.clone());
        renderer.mount_source(layout.video.clone());
        match CanvasSurface::attach(layout.canvas.clone()) {
            Ok(surface) => renderer.mount_surface(surface),
            Err(err) => warn!("frames will not be mirrored: {}", err),
        }
        let (task, render_loop) =
            RenderLoop::new(renderer, VideoFrameScheduler::new(&layout.video)).spawn();
        spawn_local(task);

        info!("camera viewer mounted into #{}", config.root_id);
        Ok(CameraViewer {
            registry,
            capture,
            layout,
            render_loop,
            on_change,
        })
    }

    #[wasm_bindgen(getter, js_name = selectedDeviceId)]
    pub fn selected_device_id(&self) -> String {
        self.registry.selected_device_id()
    }

    /// The current video inputs as `{ deviceId, label, kind }` objects.
    pub fn devices(&self) -> Result<JsValue, JsValue> {
        let devices = self.registry.devices().to_vec();
        Ok(serde_wasm_bindgen::to_value(&devices).map_err(ViewerError::from)?)
    }

    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.registry.state().as_str().to_string()
    }

    pub fn select(&self, device_id: String) {
        self.registry.select(device_id);
    }

    /// Enumerates again; resolves with the number of video inputs.
    #[wasm_bindgen(js_name = refreshDevices)]
    pub fn refresh_devices(&self) -> Promise {
        let registry = Rc::clone(&self.registry);
        future_to_promise(async move {
            registry.enumerate().await;
            Ok(JsValue::from(registry.devices().len() as u32))
        })
    }

    /// Stops the render loop and the camera and removes the markup.
    pub fn destroy(&self) {
        self.teardown();
    }
}

impl CameraViewer {
    fn teardown(&self) {
        self.render_loop.abort();
        self.capture.stop();
        if let Err(err) = self
            .layout
            .selector
            .element()
            .remove_event_listener_with_callback("change", self.on_change.as_ref().unchecked_ref())
        {
            debug!("removeEventListener failed: {:?}", err);
        }
        self.layout.unmount();
    }
}

impl Drop for CameraViewer {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Keeps the `<select>` in step with the registry and reopens the camera when
/// the selection moves away from the device currently streaming.
fn subscribe_page(registry: &Rc<BrowserRegistry>, capture: &Rc<CameraCapture>, layout: &Layout) {
    let weak = Rc::downgrade(registry);
    let capture = Rc::clone(capture);
    let selector = layout.selector.clone();

    registry.subscribe(move |event| {
        let Some(registry) = weak.upgrade() else {
            return;
        };
        match event {
            RegistryEvent::DevicesChanged { devices } => {
                if let Err(err) = selector.render_devices(devices, &registry.selected_device_id()) {
                    warn!("could not list cameras: {}", err);
                }
            }
            RegistryEvent::SelectionChanged { device_id, .. } => {
                selector.show_selection(device_id);
                if needs_restart(capture.active_device_id().as_deref(), device_id) {
                    start_capture(&registry, &capture, device_id.clone());
                }
            }
        }
    });
}

fn start_capture(registry: &Rc<BrowserRegistry>, capture: &Rc<CameraCapture>, device_id: String) {
    let registry = Rc::clone(registry);
    let capture = Rc::clone(capture);
    spawn_local(async move {
        match capture.open(&device_id).await {
            Ok(Some(started)) => {
                registry.reconcile(started.device_id.as_deref()).await;
            }
            Ok(None) => {}
            Err(err) => warn!("could not open camera `{}`: {}", device_id, err),
        }
    });
}
