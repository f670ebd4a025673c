// types.rs - Shared type definitions
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    AudioInput,
    AudioOutput,
    VideoInput,
    #[serde(other)]
    Unknown,
}

/// One entry of a device enumeration.
///
/// An empty `device_id` is the browser's placeholder for "default device"
/// and is reported before the page has been granted camera access.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    pub label: String,
    pub kind: DeviceKind,
}

impl Device {
    pub fn new(device_id: impl Into<String>, label: impl Into<String>, kind: DeviceKind) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
            kind,
        }
    }

    pub fn video(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(device_id, label, DeviceKind::VideoInput)
    }

    pub fn is_video_input(&self) -> bool {
        self.kind == DeviceKind::VideoInput
    }

    pub fn is_placeholder(&self) -> bool {
        self.device_id.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Subset of `MediaTrackSettings` read back from a live video track.
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackSettings {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl TrackSettings {
    /// The granted device id, or `None` when the browser withheld it.
    pub fn granted_device_id(&self) -> Option<&str> {
        self.device_id.as_deref().filter(|id| !id.is_empty())
    }
}
