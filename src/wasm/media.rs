use std::cell::RefCell;

use futures::future::LocalBoxFuture;
use js_sys::Array;
use log::{debug, info};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    HtmlVideoElement, MediaDeviceInfo, MediaDeviceKind, MediaDevices, MediaStream,
    MediaStreamConstraints, MediaStreamTrack, Window,
};

use crate::config::CaptureConfig;
use crate::error::ViewerError;
use crate::registry::DevicePlatform;
use crate::types::{Device, DeviceKind, TrackSettings};
use crate::utils::{Sequence, Ticket};

pub fn media_devices(window: &Window) -> Result<MediaDevices, ViewerError> {
    window
        .navigator()
        .media_devices()
        .map_err(ViewerError::js("navigator.mediaDevices"))
}

/// `navigator.mediaDevices.enumerateDevices()`
pub struct BrowserMediaDevices {
    media_devices: MediaDevices,
}

impl BrowserMediaDevices {
    pub fn new(media_devices: MediaDevices) -> Self {
        Self { media_devices }
    }
}

impl DevicePlatform for BrowserMediaDevices {
    fn enumerate_devices(&self) -> LocalBoxFuture<'_, Result<Vec<Device>, ViewerError>> {
        Box::pin(async move {
            let promise = self
                .media_devices
                .enumerate_devices()
                .map_err(ViewerError::js("enumerateDevices"))?;
            let listing: Array = JsFuture::from(promise)
                .await
                .map_err(ViewerError::js("enumerateDevices"))?
                .dyn_into()
                .map_err(|_| ViewerError::UnexpectedType("device array"))?;

            listing
                .iter()
                .map(|entry| {
                    entry
                        .dyn_into::<MediaDeviceInfo>()
                        .map(|info| device_from_info(&info))
                        .map_err(|_| ViewerError::UnexpectedType("MediaDeviceInfo"))
                })
                .collect()
        })
    }
}

fn device_from_info(info: &MediaDeviceInfo) -> Device {
    let kind = match info.kind() {
        MediaDeviceKind::Videoinput => DeviceKind::VideoInput,
        MediaDeviceKind::Audioinput => DeviceKind::AudioInput,
        MediaDeviceKind::Audiooutput => DeviceKind::AudioOutput,
        _ => DeviceKind::Unknown,
    };
    Device::new(info.device_id(), info.label(), kind)
}

/// `getUserMedia` constraints. Audio is never requested.
#[derive(Serialize, Debug, PartialEq)]
pub struct CaptureConstraints {
    audio: bool,
    video: VideoConstraints,
}

#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
struct VideoConstraints {
    // empty lets the browser pick its default camera
    #[serde(skip_serializing_if = "String::is_empty")]
    device_id: String,
    width: u32,
    height: u32,
}

impl CaptureConstraints {
    pub fn new(device_id: &str, config: &CaptureConfig) -> Self {
        Self {
            audio: false,
            video: VideoConstraints {
                device_id: device_id.to_string(),
                width: config.width,
                height: config.height,
            },
        }
    }

    pub fn to_js(&self) -> Result<MediaStreamConstraints, ViewerError> {
        Ok(serde_wasm_bindgen::to_value(self)?.unchecked_into())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamStarted {
    /// What the video track reports it opened; `None` if withheld.
    pub device_id: Option<String>,
}

/// Whether a new selection calls for reopening the camera.
///
/// A stream reporting the device it opened moves the selection onto the
/// active device, which must not open it a second time.
pub fn needs_restart(active: Option<&str>, selected: &str) -> bool {
    active != Some(selected)
}

/// Decides which `getUserMedia` answers may still be shown.
///
/// Only the latest request is admitted; `close` turns away everything
/// still pending.
#[derive(Debug, Default)]
pub struct StreamGate {
    requests: Sequence,
}

impl StreamGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Ticket {
        self.requests.issue()
    }

    pub fn admits(&self, ticket: Ticket) -> bool {
        self.requests.is_current(ticket)
    }

    pub fn close(&mut self) {
        self.requests.issue();
    }
}

struct ActiveStream {
    stream: MediaStream,
    device_id: String,
}

/// Opens cameras into a `<video>` element, one stream at a time.
pub struct CameraCapture {
    media_devices: MediaDevices,
    video: HtmlVideoElement,
    config: CaptureConfig,
    active: RefCell<Option<ActiveStream>>,
    gate: RefCell<StreamGate>,
}

impl CameraCapture {
    pub fn new(media_devices: MediaDevices, video: HtmlVideoElement, config: CaptureConfig) -> Self {
        Self {
            media_devices,
            video,
            config,
            active: RefCell::new(None),
            gate: RefCell::new(StreamGate::new()),
        }
    }

    pub fn active_device_id(&self) -> Option<String> {
        self.active
            .borrow()
            .as_ref()
            .map(|active| active.device_id.clone())
    }

    /// Replaces the current stream with one from `device_id`.
    ///
    /// Returns `Ok(None)` when a later `open` or a `stop` overtook this one;
    /// its stream is stopped without ever being shown.
    pub async fn open(&self, device_id: &str) -> Result<Option<StreamStarted>, ViewerError> {
        let ticket = self.gate.borrow_mut().begin();
        let constraints = CaptureConstraints::new(device_id, &self.config).to_js()?;
        let promise = self
            .media_devices
            .get_user_media_with_constraints(&constraints)
            .map_err(ViewerError::js("getUserMedia"))?;
        let stream: MediaStream = JsFuture::from(promise)
            .await
            .map_err(ViewerError::js("getUserMedia"))?
            .dyn_into()
            .map_err(|_| ViewerError::UnexpectedType("MediaStream"))?;

        if !self.gate.borrow().admits(ticket) {
            debug!("dropping superseded stream for `{}`", device_id);
            stop_tracks(&stream);
            return Ok(None);
        }

        let settings = match video_settings(&stream) {
            Ok(settings) => settings,
            Err(err) => {
                stop_tracks(&stream);
                return Err(err);
            }
        };
        let granted = settings.granted_device_id().map(str::to_owned);

        self.release();
        self.video.set_src_object(Some(&stream));
        *self.active.borrow_mut() = Some(ActiveStream {
            stream,
            device_id: granted.clone().unwrap_or_else(|| device_id.to_string()),
        });

        if let Ok(playing) = self.video.play() {
            if let Err(err) = JsFuture::from(playing).await {
                debug!("play() rejected: {:?}", err);
            }
        }
        if !self.gate.borrow().admits(ticket) {
            return Ok(None);
        }

        info!(
            "camera stream started (requested `{}`, granted `{}`, {}x{})",
            device_id,
            granted.as_deref().unwrap_or_default(),
            settings.width.unwrap_or_default(),
            settings.height.unwrap_or_default()
        );
        Ok(Some(StreamStarted { device_id: granted }))
    }

    /// Stops the active stream and turns away any `open` still in flight.
    pub fn stop(&self) {
        self.gate.borrow_mut().close();
        self.release();
    }

    fn release(&self) {
        if let Some(active) = self.active.borrow_mut().take() {
            stop_tracks(&active.stream);
            self.video.set_src_object(None);
        }
    }
}

fn stop_tracks(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
            track.stop();
        }
    }
}

/// Settings of the first video track; empty when the stream has none.
fn video_settings(stream: &MediaStream) -> Result<TrackSettings, ViewerError> {
    let first = stream.get_video_tracks().get(0);
    if first.is_undefined() {
        return Ok(TrackSettings::default());
    }
    let track: MediaStreamTrack = first
        .dyn_into()
        .map_err(|_| ViewerError::UnexpectedType("MediaStreamTrack"))?;
    Ok(serde_wasm_bindgen::from_value(track.get_settings().into())?)
}
