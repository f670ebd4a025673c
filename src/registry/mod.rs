//! Camera list and selection state.
//!
//! [`DeviceRegistry`] is the plain state machine; [`Registry`] pairs it with
//! a [`DevicePlatform`] and the listeners that observe it.

mod handle;

pub use handle::{DevicePlatform, Listener, Registry};

use log::{debug, warn};
use serde::Serialize;

use crate::error::ViewerError;
use crate::types::Device;
use crate::utils::{Sequence, Ticket};

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RegistryState {
    Uninitialized,
    Enumerated,
    Selected,
    Reconciled,
}

impl RegistryState {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistryState::Uninitialized => "uninitialized",
            RegistryState::Enumerated => "enumerated",
            RegistryState::Selected => "selected",
            RegistryState::Reconciled => "reconciled",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionOrigin {
    User,
    Stream,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RegistryEvent {
    DevicesChanged { devices: Vec<Device> },
    SelectionChanged { device_id: String, origin: SelectionOrigin },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnumerationOutcome {
    Applied { devices: usize },
    /// A newer enumeration was issued while this one was in flight.
    Stale,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub selection_changed: bool,
    pub reenumerate: bool,
}

/// A lone device with an empty id is the browser's stand-in for "some camera"
/// before access is granted; once a stream is live, enumerating again yields
/// the concrete devices.
pub fn needs_reenumeration(devices: &[Device]) -> bool {
    matches!(devices, [only] if only.is_placeholder())
}

#[derive(Debug)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
    selected: String,
    state: RegistryState,
    enumerated: bool,
    enumerations: Sequence,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            selected: String::new(),
            state: RegistryState::Uninitialized,
            enumerated: false,
            enumerations: Sequence::new(),
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn selected_device_id(&self) -> &str {
        &self.selected
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    pub fn begin_enumeration(&mut self) -> Ticket {
        self.enumerations.issue()
    }

    /// Applies the platform's answer to the enumeration tagged `ticket`.
    ///
    /// Non-video entries are dropped. Failures and superseded answers leave
    /// the list as it was.
    pub fn complete_enumeration(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<Device>, ViewerError>,
    ) -> (EnumerationOutcome, Option<RegistryEvent>) {
        if !self.enumerations.is_current(ticket) {
            debug!("discarding enumeration #{}", ticket.number());
            return (EnumerationOutcome::Stale, None);
        }

        let reported = match result {
            Ok(reported) => reported,
            Err(err) => {
                warn!("device enumeration failed: {}", err);
                return (EnumerationOutcome::Failed, None);
            }
        };

        self.devices = reported
            .into_iter()
            .filter(Device::is_video_input)
            .collect();
        self.state = RegistryState::Enumerated;
        self.enumerated = true;
        debug!(
            "enumeration #{} found {} video input(s)",
            ticket.number(),
            self.devices.len()
        );

        (
            EnumerationOutcome::Applied {
                devices: self.devices.len(),
            },
            Some(RegistryEvent::DevicesChanged {
                devices: self.devices.clone(),
            }),
        )
    }

    /// Ids outside the current list are accepted as-is. Clearing the
    /// selection falls back to the enumeration state.
    pub fn select(&mut self, device_id: impl Into<String>) -> Option<RegistryEvent> {
        let device_id = device_id.into();
        if !device_id.is_empty() {
            self.state = RegistryState::Selected;
        } else if self.state == RegistryState::Selected {
            self.state = if self.enumerated {
                RegistryState::Enumerated
            } else {
                RegistryState::Uninitialized
            };
        }
        if device_id == self.selected {
            return None;
        }
        self.selected = device_id.clone();
        Some(RegistryEvent::SelectionChanged {
            device_id,
            origin: SelectionOrigin::User,
        })
    }

    /// Records the device a freshly started stream actually opened.
    pub fn reconcile(
        &mut self,
        stream_device_id: Option<&str>,
    ) -> (ReconcileOutcome, Option<RegistryEvent>) {
        let reenumerate = needs_reenumeration(&self.devices);

        let mut event = None;
        if let Some(granted) = stream_device_id.filter(|id| !id.is_empty()) {
            self.state = RegistryState::Reconciled;
            if granted != self.selected {
                self.selected = granted.to_string();
                event = Some(RegistryEvent::SelectionChanged {
                    device_id: self.selected.clone(),
                    origin: SelectionOrigin::Stream,
                });
            }
        }

        (
            ReconcileOutcome {
                selection_changed: event.is_some(),
                reenumerate,
            },
            event,
        )
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
