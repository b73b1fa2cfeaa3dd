//! btleplug-backed transport.
//!
//! Adapts a [`btleplug`] peripheral to the [`GattTransport`] seam. Every
//! trait method spawns the underlying async operation and reports the
//! outcome on the event channel handed out by [`BlePeripheralTransport::new`],
//! so callers never block.
//!
//! Bonding is managed by the OS on every platform btleplug supports:
//! touching an encrypted characteristic raises the system pairing flow.
//! [`GattTransport::create_bond`] therefore only records the expectation, and
//! platform glue reports the outcome through
//! [`BlePeripheralTransport::report_bond_state`].

use btleplug::api::{Characteristic as GattCharacteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use futures::stream::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::ble::transport::{GattStatus, GattTransport, TransportEvent};
use crate::error::{Error, Result};

/// Events produced by the btleplug transport.
pub type BleTransportEvent = TransportEvent<GattCharacteristic>;

/// GATT transport backed by a btleplug peripheral.
#[derive(Clone)]
pub struct BlePeripheralTransport {
    peripheral: Peripheral,
    event_tx: mpsc::UnboundedSender<BleTransportEvent>,
    watching: Arc<AtomicBool>,
}

impl BlePeripheralTransport {
    /// Interval for the link watchdog that detects dropped connections.
    const LINK_POLL_INTERVAL: Duration = Duration::from_secs(1);

    /// Wrap a peripheral. Returns the transport and the event stream to feed
    /// into a session.
    pub fn new(peripheral: Peripheral) -> (Self, mpsc::UnboundedReceiver<BleTransportEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        (
            Self {
                peripheral,
                event_tx,
                watching: Arc::new(AtomicBool::new(false)),
            },
            event_rx,
        )
    }

    /// Forward a platform bond state report to the session.
    pub fn report_bond_state(&self, bonded: bool) {
        let _ = self
            .event_tx
            .send(TransportEvent::BondStateChanged { bonded });
    }

    /// Start the notification pump and the link watchdog, once.
    fn spawn_watchers(&self) {
        if self.watching.swap(true, Ordering::SeqCst) {
            return;
        }

        let peripheral = self.peripheral.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let mut notifications = match peripheral.notifications().await {
                Ok(stream) => stream,
                Err(e) => {
                    error!("Failed to open notification stream: {}", e);
                    return;
                }
            };

            while let Some(notification) = notifications.next().await {
                debug!(
                    "Notification from {}: {} bytes",
                    notification.uuid,
                    notification.value.len()
                );
                let sent = event_tx.send(TransportEvent::NotificationReceived {
                    uuid: notification.uuid,
                    value: notification.value,
                });
                if sent.is_err() {
                    break;
                }
            }

            debug!("Notification stream ended");
        });

        // btleplug has no portable per-peripheral disconnect callback, so
        // the watchdog polls the link state.
        let peripheral = self.peripheral.clone();
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let mut was_connected = true;
            loop {
                tokio::time::sleep(Self::LINK_POLL_INTERVAL).await;
                if event_tx.is_closed() {
                    break;
                }

                let connected = peripheral.is_connected().await.unwrap_or(false);
                if was_connected && !connected {
                    info!("Link watchdog detected disconnect");
                    let _ = event_tx.send(TransportEvent::Disconnected);
                }
                was_connected = connected;
            }
        });
    }

    fn status_for(e: &btleplug::Error) -> GattStatus {
        match e {
            btleplug::Error::PermissionDenied => GattStatus::InsufficientAuthentication,
            _ => GattStatus::Failure,
        }
    }
}

impl GattTransport for BlePeripheralTransport {
    type Handle = GattCharacteristic;

    fn connect(&self) -> Result<()> {
        let peripheral = self.peripheral.clone();
        let event_tx = self.event_tx.clone();
        let transport = self.clone();

        tokio::spawn(async move {
            match peripheral.connect().await {
                Ok(()) => {
                    info!("Connected to peripheral");
                    transport.spawn_watchers();
                    let _ = event_tx.send(TransportEvent::Connected);
                }
                Err(e) => {
                    warn!("Connect attempt failed: {}", e);
                    let _ = event_tx.send(TransportEvent::Disconnected);
                }
            }
        });

        Ok(())
    }

    fn disconnect(&self) -> Result<()> {
        let peripheral = self.peripheral.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            if let Err(e) = peripheral.disconnect().await {
                warn!("Disconnect failed: {}", e);
            }
            let _ = event_tx.send(TransportEvent::Disconnected);
        });

        Ok(())
    }

    fn discover_services(&self) -> Result<()> {
        let peripheral = self.peripheral.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            if let Err(e) = peripheral.discover_services().await {
                error!("Service discovery failed: {}", e);
                return;
            }

            let mut discovered = Vec::new();
            for service in peripheral.services() {
                for characteristic in service.characteristics {
                    debug!(
                        "Found characteristic {} in service {}",
                        characteristic.uuid, service.uuid
                    );
                    discovered.push((characteristic.uuid, characteristic));
                }
            }

            debug!("Discovered {} characteristics", discovered.len());
            let _ = event_tx.send(TransportEvent::ServicesDiscovered(discovered));
        });

        Ok(())
    }

    fn read_characteristic(&self, handle: &GattCharacteristic) -> Result<()> {
        let peripheral = self.peripheral.clone();
        let event_tx = self.event_tx.clone();
        let characteristic = handle.clone();

        tokio::spawn(async move {
            let event = match peripheral.read(&characteristic).await {
                Ok(value) => TransportEvent::CharacteristicRead {
                    uuid: characteristic.uuid,
                    value,
                    status: GattStatus::Success,
                },
                Err(e) => {
                    warn!("Read of {} failed: {}", characteristic.uuid, e);
                    TransportEvent::CharacteristicRead {
                        uuid: characteristic.uuid,
                        value: Vec::new(),
                        status: BlePeripheralTransport::status_for(&e),
                    }
                }
            };
            let _ = event_tx.send(event);
        });

        Ok(())
    }

    fn write_characteristic(&self, handle: &GattCharacteristic, value: &[u8]) -> Result<()> {
        let peripheral = self.peripheral.clone();
        let event_tx = self.event_tx.clone();
        let characteristic = handle.clone();
        let value = value.to_vec();

        tokio::spawn(async move {
            let status = match peripheral
                .write(&characteristic, &value, WriteType::WithResponse)
                .await
            {
                Ok(()) => GattStatus::Success,
                Err(e) => {
                    warn!("Write to {} failed: {}", characteristic.uuid, e);
                    BlePeripheralTransport::status_for(&e)
                }
            };
            let _ = event_tx.send(TransportEvent::CharacteristicWritten {
                uuid: characteristic.uuid,
                status,
            });
        });

        Ok(())
    }

    fn enable_notifications(&self, handle: &GattCharacteristic) -> Result<()> {
        let peripheral = self.peripheral.clone();
        let event_tx = self.event_tx.clone();
        let characteristic = handle.clone();

        tokio::spawn(async move {
            let status = match peripheral.subscribe(&characteristic).await {
                Ok(()) => GattStatus::Success,
                Err(e) => {
                    warn!("Subscribe to {} failed: {}", characteristic.uuid, e);
                    BlePeripheralTransport::status_for(&e)
                }
            };
            let _ = event_tx.send(TransportEvent::CharacteristicWritten {
                uuid: characteristic.uuid,
                status,
            });
        });

        Ok(())
    }

    fn create_bond(&self) -> Result<()> {
        // The OS raises its pairing flow when an encrypted characteristic is
        // touched; platform glue reports the result via report_bond_state.
        info!("Delegating bonding to the platform pairing flow");
        Ok(())
    }

    fn remove_bond(&self) -> Result<()> {
        Err(Error::NotSupported {
            operation: "bond removal requires the platform pairing API".to_string(),
        })
    }
}

impl std::fmt::Debug for BlePeripheralTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlePeripheralTransport")
            .field("peripheral", &self.peripheral.id())
            .finish()
    }
}
