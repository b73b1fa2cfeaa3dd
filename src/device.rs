//! Public device handle.
//!
//! A [`Device`] owns one [`Session`] and the event-pump task that serializes
//! every transport event onto it, so session state is never mutated
//! concurrently. All operations are non-blocking; results arrive as
//! [`DeviceEvent`]s.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::debug;

use crate::ble::peripheral::BlePeripheralTransport;
use crate::ble::transport::{GattTransport, TransportEvent};
use crate::data::device_info::ManufacturerInfo;
use crate::data::mode::OperatingMode;
use crate::error::Result;
use crate::session::{ConnectionState, DeviceEvent, Session, SessionConfig};

/// Callback handle for unregistering callbacks.
pub struct CallbackHandle {
    id: u64,
    unregister_fn: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl CallbackHandle {
    fn new(id: u64, unregister_fn: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            id,
            unregister_fn: Some(Box::new(unregister_fn)),
        }
    }

    /// Unregister this callback.
    pub fn unregister(mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }

    /// Get the callback ID.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        if let Some(f) = self.unregister_fn.take() {
            f();
        }
    }
}

/// Handle to one wearable device session.
///
/// Generic over the transport backend; production code uses
/// [`Device::from_peripheral`], tests inject fakes.
pub struct Device<T>
where
    T: GattTransport + 'static,
    T::Handle: 'static,
{
    session: Arc<Mutex<Session<T>>>,
    pump: tokio::task::JoinHandle<()>,
    callback_counter: AtomicU64,
}

impl<T> Device<T>
where
    T: GattTransport + 'static,
    T::Handle: 'static,
{
    /// Create a device over a transport and its event stream, with default
    /// configuration.
    pub fn new(transport: T, events: mpsc::UnboundedReceiver<TransportEvent<T::Handle>>) -> Self {
        Self::with_config(transport, events, SessionConfig::default())
    }

    /// Create a device with the given session configuration.
    pub fn with_config(
        transport: T,
        mut events: mpsc::UnboundedReceiver<TransportEvent<T::Handle>>,
        config: SessionConfig,
    ) -> Self {
        let session = Arc::new(Mutex::new(Session::with_config(transport, config)));

        let pump_session = session.clone();
        let pump = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                pump_session.lock().handle_event(event);
            }
            debug!("Transport event channel closed");
        });

        Self {
            session,
            pump,
            callback_counter: AtomicU64::new(0),
        }
    }

    // === Operations ===

    /// Start the session. Non-blocking; progress arrives as events.
    pub fn connect(&self) {
        self.session.lock().connect();
    }

    /// End the session and clear all session state.
    pub fn disconnect(&self) {
        self.session.lock().disconnect();
    }

    /// Queue a raw command buffer for the inbound alert characteristic.
    pub fn enqueue_notification(&self, buffer: Vec<u8>) {
        self.session.lock().enqueue_notification(buffer);
    }

    /// Request a device clock re-sync.
    pub fn sync_time(&self) {
        self.session.lock().sync_time();
    }

    /// Remove the platform bond with the device.
    pub fn unpair(&self) -> Result<()> {
        self.session.lock().transport().remove_bond()
    }

    // === State ===

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.session.lock().connection_state()
    }

    /// Last mode reported by the device this session.
    pub fn mode(&self) -> Option<OperatingMode> {
        self.session.lock().mode()
    }

    /// Device information read during the discovery handshake.
    pub fn manufacturer_info(&self) -> ManufacturerInfo {
        self.session.lock().manufacturer_info().clone()
    }

    // === Events ===

    /// Subscribe to session events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<DeviceEvent> {
        self.session.lock().subscribe()
    }

    /// Register a callback invoked for every session event.
    pub fn on_event<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&DeviceEvent) + Send + Sync + 'static,
    {
        let callback_id = self.callback_counter.fetch_add(1, Ordering::SeqCst);
        let mut rx = self.subscribe_events();

        let handle = tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                callback(&event);
            }
        });

        CallbackHandle::new(callback_id, move || {
            handle.abort();
        })
    }
}

impl Device<BlePeripheralTransport> {
    /// Build a device over a btleplug peripheral.
    ///
    /// Also returns the transport so platform glue can report bond state
    /// changes via
    /// [`BlePeripheralTransport::report_bond_state`].
    pub fn from_peripheral(
        peripheral: btleplug::platform::Peripheral,
    ) -> (Self, BlePeripheralTransport) {
        let (transport, events) = BlePeripheralTransport::new(peripheral);
        (Self::new(transport.clone(), events), transport)
    }
}

impl<T> Drop for Device<T>
where
    T: GattTransport + 'static,
    T::Handle: 'static,
{
    fn drop(&mut self) {
        self.pump.abort();
    }
}

impl<T> std::fmt::Debug for Device<T>
where
    T: GattTransport + 'static,
    T::Handle: 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("connection_state", &self.connection_state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    struct NullTransport;

    impl GattTransport for NullTransport {
        type Handle = u32;

        fn connect(&self) -> Result<()> {
            Ok(())
        }

        fn disconnect(&self) -> Result<()> {
            Ok(())
        }

        fn discover_services(&self) -> Result<()> {
            Ok(())
        }

        fn read_characteristic(&self, _handle: &u32) -> Result<()> {
            Ok(())
        }

        fn write_characteristic(&self, _handle: &u32, _value: &[u8]) -> Result<()> {
            Ok(())
        }

        fn enable_notifications(&self, _handle: &u32) -> Result<()> {
            Ok(())
        }

        fn create_bond(&self) -> Result<()> {
            Ok(())
        }

        fn remove_bond(&self) -> Result<()> {
            Ok(())
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_pump_feeds_session() {
        let (tx, rx) = mpsc::unbounded_channel();
        let device = Device::new(NullTransport, rx);

        assert_eq!(device.connection_state(), ConnectionState::Disconnected);

        device.connect();
        assert_eq!(device.connection_state(), ConnectionState::Connecting);

        tx.send(TransportEvent::Connected).unwrap();
        settle().await;
        assert_eq!(
            device.connection_state(),
            ConnectionState::ServicesDiscovering
        );
    }

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        let (tx, rx) = mpsc::unbounded_channel();
        let device = Device::new(NullTransport, rx);
        let mut events = device.subscribe_events();

        device.connect();
        tx.send(TransportEvent::Connected).unwrap();
        settle().await;

        assert_eq!(
            events.try_recv().unwrap(),
            DeviceEvent::ConnectionStateChanged(true)
        );
    }

    #[tokio::test]
    async fn test_on_event_callback() {
        let (tx, rx) = mpsc::unbounded_channel();
        let device = Device::new(NullTransport, rx);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _handle = device.on_event(move |event| {
            sink.lock().push(event.clone());
        });

        device.connect();
        tx.send(TransportEvent::Connected).unwrap();
        settle().await;

        assert_eq!(
            seen.lock().as_slice(),
            &[DeviceEvent::ConnectionStateChanged(true)]
        );
    }

    #[tokio::test]
    async fn test_unpair_delegates_to_transport() {
        let (_tx, rx) = mpsc::unbounded_channel::<TransportEvent<u32>>();
        let device = Device::new(NullTransport, rx);
        assert!(device.unpair().is_ok());
    }
}
