use std::cell::{Ref, RefCell};
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use log::{debug, info};

use super::{
    DeviceRegistry, EnumerationOutcome, ReconcileOutcome, RegistryEvent, RegistryState,
};
use crate::error::ViewerError;
use crate::types::Device;

/// Source of media device listings.
pub trait DevicePlatform {
    fn enumerate_devices(&self) -> LocalBoxFuture<'_, Result<Vec<Device>, ViewerError>>;
}

pub type Listener = Rc<dyn Fn(&RegistryEvent)>;

/// Shared handle over a [`DeviceRegistry`].
///
/// Every mutation finishes and releases the inner borrow before listeners run,
/// so a listener can read the registry or call back into it.
pub struct Registry<P> {
    state: RefCell<DeviceRegistry>,
    platform: P,
    listeners: RefCell<Vec<Listener>>,
}

impl<P: DevicePlatform> Registry<P> {
    pub fn new(platform: P) -> Self {
        Self {
            state: RefCell::new(DeviceRegistry::new()),
            platform,
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&RegistryEvent) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub fn devices(&self) -> Ref<'_, [Device]> {
        Ref::map(self.state.borrow(), |state| state.devices())
    }

    pub fn selected_device_id(&self) -> String {
        self.state.borrow().selected_device_id().to_string()
    }

    pub fn state(&self) -> RegistryState {
        self.state.borrow().state()
    }

    pub async fn enumerate(&self) -> EnumerationOutcome {
        let ticket = self.state.borrow_mut().begin_enumeration();
        let result = self.platform.enumerate_devices().await;
        let (outcome, event) = self.state.borrow_mut().complete_enumeration(ticket, result);
        self.notify(event);
        outcome
    }

    pub fn select(&self, device_id: impl Into<String>) {
        let device_id = device_id.into();
        info!("selected device `{}`", device_id);
        let event = self.state.borrow_mut().select(device_id);
        self.notify(event);
    }

    /// Called once per started stream with the device id its video track reports.
    pub async fn reconcile(&self, stream_device_id: Option<&str>) -> ReconcileOutcome {
        let (outcome, event) = self.state.borrow_mut().reconcile(stream_device_id);
        self.notify(event);

        if outcome.reenumerate {
            debug!("placeholder device listed, enumerating again");
            self.enumerate().await;
        }
        outcome
    }

    fn notify(&self, event: Option<RegistryEvent>) {
        let Some(event) = event else { return };
        // Snapshot so a listener may subscribe further listeners.
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SelectionOrigin;
    use crate::types::DeviceKind;
    use futures::executor::block_on;
    use std::cell::Cell;

    struct FakePlatform {
        answers: RefCell<Vec<Result<Vec<Device>, ViewerError>>>,
        calls: Cell<usize>,
    }

    impl FakePlatform {
        fn answering(answers: Vec<Result<Vec<Device>, ViewerError>>) -> Self {
            Self {
                answers: RefCell::new(answers),
                calls: Cell::new(0),
            }
        }
    }

    impl DevicePlatform for FakePlatform {
        fn enumerate_devices(&self) -> LocalBoxFuture<'_, Result<Vec<Device>, ViewerError>> {
            self.calls.set(self.calls.get() + 1);
            let mut answers = self.answers.borrow_mut();
            let answer = if answers.is_empty() {
                Ok(Vec::new())
            } else {
                answers.remove(0)
            };
            Box::pin(async move { answer })
        }
    }

    #[test]
    fn enumerate_notifies_listeners() {
        let registry = Rc::new(Registry::new(FakePlatform::answering(vec![Ok(vec![
            Device::new("mic", "Mic", DeviceKind::AudioInput),
            Device::video("cam-1", "Front"),
        ])])));
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = Rc::clone(&seen);
            let weak = Rc::downgrade(&registry);
            registry.subscribe(move |event| {
                // listeners may read the registry
                let registry = weak.upgrade().unwrap();
                seen.borrow_mut().push((event.clone(), registry.devices().len()));
            });
        }

        let outcome = block_on(registry.enumerate());

        assert_eq!(outcome, EnumerationOutcome::Applied { devices: 1 });
        assert_eq!(
            *seen.borrow(),
            vec![(
                RegistryEvent::DevicesChanged {
                    devices: vec![Device::video("cam-1", "Front")]
                },
                1
            )]
        );
    }

    #[test]
    fn failed_enumeration_is_swallowed() {
        let registry = Registry::new(FakePlatform::answering(vec![
            Ok(vec![Device::video("cam-1", "Front")]),
            Err(ViewerError::Js {
                operation: "enumerateDevices",
                message: "NotAllowedError".into(),
            }),
        ]));

        block_on(registry.enumerate());
        assert_eq!(block_on(registry.enumerate()), EnumerationOutcome::Failed);
        assert_eq!(&*registry.devices(), &[Device::video("cam-1", "Front")]);
    }

    #[test]
    fn reconcile_enumerates_once_for_placeholder() {
        let registry = Registry::new(FakePlatform::answering(vec![
            Ok(vec![Device::video("", "")]),
            Ok(vec![
                Device::video("cam-real-1", "Front"),
                Device::video("cam-real-2", "Back"),
            ]),
        ]));
        block_on(registry.enumerate());
        assert_eq!(registry.platform.calls.get(), 1);

        let outcome = block_on(registry.reconcile(Some("cam-real-1")));

        assert!(outcome.reenumerate);
        assert_eq!(registry.platform.calls.get(), 2);
        assert_eq!(registry.selected_device_id(), "cam-real-1");
        assert_eq!(registry.devices().len(), 2);
        assert_eq!(registry.state(), RegistryState::Enumerated);

        block_on(registry.reconcile(Some("cam-real-1")));
        assert_eq!(registry.platform.calls.get(), 2);
        assert_eq!(registry.state(), RegistryState::Reconciled);
    }

    #[test]
    fn selection_events_carry_origin() {
        let registry = Registry::new(FakePlatform::answering(Vec::new()));
        let origins = Rc::new(RefCell::new(Vec::new()));
        {
            let origins = Rc::clone(&origins);
            registry.subscribe(move |event| {
                if let RegistryEvent::SelectionChanged { origin, .. } = event {
                    origins.borrow_mut().push(*origin);
                }
            });
        }

        registry.select("cam-1");
        block_on(registry.reconcile(Some("cam-2")));

        assert_eq!(
            *origins.borrow(),
            vec![SelectionOrigin::User, SelectionOrigin::Stream]
        );
    }
}
