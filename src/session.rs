//! Device session state machine.
//!
//! A [`Session`] owns the single logical connection to one paired device and
//! drives it through connect → discover → (bond if required) → ready. Once
//! ready it runs a fixed handshake (set time, read device info, enable
//! battery notifications) and then hands control to the [`Scheduler`] for the
//! steady-state read rotation.
//!
//! The transport supports exactly one outstanding GATT operation, so the
//! session is written as a synchronous event handler: every transport
//! callback arrives as a [`TransportEvent`] and is processed to completion
//! before the next one. All session state (discovered handles, queues, mode)
//! is owned by the instance, never shared.

use std::collections::HashMap;

use chrono::Local;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ble::characteristic::Characteristic;
use crate::ble::transport::{GattStatus, GattTransport, TransportEvent};
use crate::data::device_info::ManufacturerInfo;
use crate::data::mode::OperatingMode;
use crate::data::readings::SensorValue;
use crate::protocol::commands::set_time_command;
use crate::protocol::decode::decode_reading;
use crate::scheduler::{ScheduledOp, Scheduler};

/// Connection state of a device session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No session in progress.
    #[default]
    Disconnected,
    /// Waiting for the physical link to come up.
    Connecting,
    /// Link is up, GATT services are being discovered.
    ServicesDiscovering,
    /// The device rejected an operation pending bonding.
    AuthenticationRequired,
    /// Platform bonding is in progress.
    Bonding,
    /// Steady state: the read rotation is running.
    Ready,
}

impl ConnectionState {
    /// Check if the session reached the steady state.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Check if a session is in progress at all.
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::ServicesDiscovering => write!(f, "ServicesDiscovering"),
            Self::AuthenticationRequired => write!(f, "AuthenticationRequired"),
            Self::Bonding => write!(f, "Bonding"),
            Self::Ready => write!(f, "Ready"),
        }
    }
}

/// Progress of a time synchronization write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSyncPhase {
    /// The set-time command went on the wire.
    Started,
    /// The set-time command completed.
    Finished,
}

/// Event emitted by a session to its collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    /// The link availability flipped.
    ConnectionStateChanged(bool),
    /// The device reported a new operating mode.
    ModeChanged(OperatingMode),
    /// A sensor payload was decoded.
    ReadingAvailable {
        /// The characteristic the value came from.
        characteristic: Characteristic,
        /// The decoded value.
        value: SensorValue,
    },
    /// Bonding is required before the session can proceed.
    NeedsBonding,
    /// Bonding failed; the session is over and a manual re-pair is needed.
    BondFailed,
    /// Time synchronization progress.
    TimeSyncProgress(TimeSyncPhase),
}

/// Tunables for a device session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Reconnect attempts after a dropped link before giving up.
    ///
    /// `None` (the default) retries forever: the device's companion app
    /// reconnects immediately and without bound. Set a limit to opt out of
    /// the tight retry loop.
    pub max_reconnect_attempts: Option<u32>,
}

/// The GATT operation currently on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    /// Set-time command write.
    TimeSync,
    /// Queued alert command write.
    Notification,
    /// Device info read during the handshake chain.
    InfoRead(Characteristic),
    /// Steady-state rotation read.
    Poll(Characteristic),
    /// Battery notification enable.
    EnableBatteryNotifications,
}

/// State machine for one logical device session.
///
/// Generic over the [`GattTransport`] backend; production code uses the
/// btleplug-backed transport, tests drive the machine directly with fakes.
pub struct Session<T: GattTransport> {
    transport: T,
    config: SessionConfig,
    state: ConnectionState,
    handles: HashMap<Characteristic, T::Handle>,
    scheduler: Scheduler,
    mode: Option<OperatingMode>,
    manufacturer_info: ManufacturerInfo,
    should_sync_time: bool,
    in_flight: Option<InFlight>,
    reconnect_attempts: u32,
    event_tx: broadcast::Sender<DeviceEvent>,
}

impl<T: GattTransport> Session<T> {
    /// Create a session with default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, SessionConfig::default())
    }

    /// Create a session with the given configuration.
    pub fn with_config(transport: T, config: SessionConfig) -> Self {
        let (event_tx, _) = broadcast::channel(64);

        Self {
            transport,
            config,
            state: ConnectionState::Disconnected,
            handles: HashMap::new(),
            scheduler: Scheduler::new(),
            mode: None,
            manufacturer_info: ManufacturerInfo::default(),
            should_sync_time: false,
            in_flight: None,
            reconnect_attempts: 0,
            event_tx,
        }
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.event_tx.subscribe()
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    /// Last mode reported by the device, if any was observed this session.
    pub fn mode(&self) -> Option<OperatingMode> {
        self.mode
    }

    /// Device information read during the discovery handshake.
    pub fn manufacturer_info(&self) -> &ManufacturerInfo {
        &self.manufacturer_info
    }

    /// The transport backend.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    // === Public operations ===
    // All non-blocking: they initiate work, results arrive as events.

    /// Start a session.
    pub fn connect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            debug!("Connect requested while {}, ignoring", self.state);
            return;
        }

        info!("Connecting to device");
        self.reconnect_attempts = 0;
        self.set_state(ConnectionState::Connecting);
        self.issue("connect", self.transport.connect());
    }

    /// End the session.
    ///
    /// Safe from any state. Halts scheduling and clears all session-owned
    /// state immediately; a late transport disconnect report is then a no-op.
    pub fn disconnect(&mut self) {
        if self.state == ConnectionState::Disconnected {
            debug!("Disconnect requested on a closed session");
            return;
        }

        info!("Closing device session");
        self.clear_session_state();
        self.mode = None;
        self.set_state(ConnectionState::Disconnected);
        self.issue("disconnect", self.transport.disconnect());
        self.emit(DeviceEvent::ConnectionStateChanged(false));
    }

    /// Queue a raw command buffer for the inbound alert characteristic.
    ///
    /// The buffer pre-empts the next scheduled poll; the rotation resumes
    /// unchanged afterwards.
    pub fn enqueue_notification(&mut self, buffer: Vec<u8>) {
        debug!("Queueing {} byte alert command", buffer.len());
        self.scheduler.enqueue_notification(buffer);
    }

    /// Request a device clock re-sync.
    ///
    /// The set-time command is written once the current operation completes
    /// and its completion re-runs the device info chain.
    pub fn sync_time(&mut self) {
        if !self.state.is_ready() || !self.handles.contains_key(&Characteristic::AlertIn) {
            warn!("Time not set: session not ready");
            return;
        }

        self.should_sync_time = true;
    }

    // === Event handling ===

    /// Feed one transport event through the state machine.
    pub fn handle_event(&mut self, event: TransportEvent<T::Handle>) {
        match event {
            TransportEvent::Connected => self.on_connected(),
            TransportEvent::Disconnected => self.on_disconnected(),
            TransportEvent::ServicesDiscovered(list) => self.on_services_discovered(list),
            TransportEvent::CharacteristicRead {
                uuid,
                value,
                status,
            } => self.on_read_complete(uuid, value, status),
            TransportEvent::CharacteristicWritten { uuid, status } => {
                self.on_write_complete(uuid, status)
            }
            TransportEvent::NotificationReceived { uuid, value } => {
                self.on_notification(uuid, value)
            }
            TransportEvent::InsufficientAuthentication => self.enter_bonding_path(),
            TransportEvent::BondStateChanged { bonded } => self.on_bond_state_changed(bonded),
        }
    }

    fn on_connected(&mut self) {
        if self.state != ConnectionState::Connecting {
            debug!("Ignoring link-up while {}", self.state);
            return;
        }

        info!("Link established, discovering services");
        self.reconnect_attempts = 0;
        self.set_state(ConnectionState::ServicesDiscovering);
        self.emit(DeviceEvent::ConnectionStateChanged(true));
        self.issue("service discovery", self.transport.discover_services());
    }

    fn on_disconnected(&mut self) {
        if self.state == ConnectionState::Disconnected {
            // Final transport report after an explicit disconnect.
            debug!("Ignoring link-down for a closed session");
            return;
        }

        info!("Link lost");
        self.handles.clear();
        self.in_flight = None;
        self.emit(DeviceEvent::ConnectionStateChanged(false));

        self.reconnect_attempts += 1;
        if let Some(max) = self.config.max_reconnect_attempts {
            if self.reconnect_attempts > max {
                warn!("Giving up after {} reconnect attempts", max);
                self.scheduler.clear();
                self.set_state(ConnectionState::Disconnected);
                return;
            }
        }

        self.set_state(ConnectionState::Connecting);
        self.issue("reconnect", self.transport.connect());
    }

    fn on_services_discovered(&mut self, list: Vec<(Uuid, T::Handle)>) {
        if self.state != ConnectionState::ServicesDiscovering {
            debug!("Ignoring discovery result while {}", self.state);
            return;
        }

        if list.is_empty() {
            info!("No services found");
        }

        self.handles.clear();
        for (uuid, handle) in list {
            match Characteristic::by_uuid(&uuid) {
                Some(characteristic) => {
                    debug!("{:?}: {:?}", characteristic.category(), characteristic);
                    self.handles.insert(characteristic, handle);
                }
                None => debug!("Unknown characteristic: {}", uuid),
            }
        }

        self.set_state(ConnectionState::Ready);
        self.start_handshake();
    }

    /// Fixed post-discovery handshake: set time, then the device info chain,
    /// then battery notifications, then the rotation.
    fn start_handshake(&mut self) {
        if self.handles.contains_key(&Characteristic::AlertIn) {
            self.write_time();
        } else {
            warn!("Alert channel not discovered, skipping time sync");
            self.read_info(Characteristic::Manufacturer);
        }
    }

    fn write_time(&mut self) {
        self.should_sync_time = false;

        let Some(handle) = self.handles.get(&Characteristic::AlertIn).cloned() else {
            warn!("Time not set: alert channel missing");
            self.schedule_next();
            return;
        };

        debug!("Setting device time");
        let command = set_time_command(&Local::now());
        self.in_flight = Some(InFlight::TimeSync);
        self.emit(DeviceEvent::TimeSyncProgress(TimeSyncPhase::Started));
        self.issue(
            "time write",
            self.transport.write_characteristic(&handle, &command),
        );
    }

    fn read_info(&mut self, characteristic: Characteristic) {
        match self.handles.get(&characteristic).cloned() {
            Some(handle) => {
                self.in_flight = Some(InFlight::InfoRead(characteristic));
                self.issue(
                    "device info read",
                    self.transport.read_characteristic(&handle),
                );
            }
            None => {
                warn!("{:?} not discovered, skipping", characteristic);
                self.advance_handshake(characteristic, None);
            }
        }
    }

    /// One step of the info chain: manufacturer → firmware revision → mode.
    /// `value` is `None` when the read failed or the handle is missing; the
    /// chain still advances.
    fn advance_handshake(&mut self, step: Characteristic, value: Option<&[u8]>) {
        match step {
            Characteristic::Manufacturer => {
                if let Some(value) = value {
                    self.manufacturer_info.manufacturer =
                        String::from_utf8_lossy(value).into_owned();
                }
                self.read_info(Characteristic::FirmwareRevision);
            }
            Characteristic::FirmwareRevision => {
                if let Some(value) = value {
                    self.manufacturer_info.firmware_revision =
                        String::from_utf8_lossy(value).into_owned();
                }
                self.read_info(Characteristic::Mode);
            }
            Characteristic::Mode => {
                if let Some(value) = value {
                    match value.first() {
                        Some(&symbol) => self.observe_mode_byte(symbol),
                        None => warn!("Empty mode payload"),
                    }
                }
                self.enable_battery_notifications();
            }
            _ => warn!("Not a handshake step: {:?}", step),
        }
    }

    fn enable_battery_notifications(&mut self) {
        match self.handles.get(&Characteristic::Battery).cloned() {
            Some(handle) => {
                self.in_flight = Some(InFlight::EnableBatteryNotifications);
                self.issue(
                    "battery notification enable",
                    self.transport.enable_notifications(&handle),
                );
            }
            None => {
                warn!("Battery characteristic not discovered");
                self.schedule_next();
            }
        }
    }

    fn on_read_complete(&mut self, uuid: Uuid, value: Vec<u8>, status: GattStatus) {
        if status == GattStatus::InsufficientAuthentication {
            self.enter_bonding_path();
            return;
        }

        if self.state != ConnectionState::Ready {
            debug!("Ignoring read completion ({}) while {}", uuid, self.state);
            return;
        }

        let Some(op) = self.in_flight.take() else {
            debug!("Read completion with nothing in flight: {}", uuid);
            return;
        };

        match op {
            InFlight::InfoRead(step) => {
                if status.is_success() {
                    self.advance_handshake(step, Some(&value));
                } else {
                    warn!("{:?} read failed, continuing handshake", step);
                    self.advance_handshake(step, None);
                }
            }
            InFlight::Poll(characteristic) => {
                if status.is_success() {
                    self.process_reading(characteristic, &value);
                } else {
                    warn!("Read of {:?} failed, continuing rotation", characteristic);
                }
                self.after_poll();
            }
            other => warn!("Unexpected read completion ({}) during {:?}", uuid, other),
        }
    }

    fn on_write_complete(&mut self, uuid: Uuid, status: GattStatus) {
        if status == GattStatus::InsufficientAuthentication {
            self.enter_bonding_path();
            return;
        }

        if self.state != ConnectionState::Ready {
            debug!("Ignoring write completion ({}) while {}", uuid, self.state);
            return;
        }

        let Some(op) = self.in_flight.take() else {
            debug!("Write completion with nothing in flight: {}", uuid);
            return;
        };

        match op {
            InFlight::TimeSync => {
                if status.is_success() {
                    info!("Device time set");
                } else {
                    warn!("Time write failed, continuing handshake");
                }
                self.emit(DeviceEvent::TimeSyncProgress(TimeSyncPhase::Finished));
                self.read_info(Characteristic::Manufacturer);
            }
            InFlight::Notification => {
                if !status.is_success() {
                    warn!("Alert command write failed");
                }
                self.schedule_next();
            }
            InFlight::EnableBatteryNotifications => {
                if !status.is_success() {
                    warn!("Battery notification enable failed");
                }
                debug!("Handshake complete, starting read rotation");
                self.schedule_next();
            }
            other => warn!("Unexpected write completion ({}) during {:?}", uuid, other),
        }
    }

    fn on_notification(&mut self, uuid: Uuid, value: Vec<u8>) {
        let characteristic = Characteristic::by_uuid(&uuid);
        debug!("Characteristic changed: {:?}", characteristic);

        // The battery characteristic is the only one the session subscribes
        // to; anything else is noise.
        if characteristic == Some(Characteristic::Battery) {
            self.process_reading(Characteristic::Battery, &value);
        }
    }

    fn process_reading(&mut self, characteristic: Characteristic, data: &[u8]) {
        if characteristic == Characteristic::Mode {
            match data.first() {
                Some(&symbol) => self.observe_mode_byte(symbol),
                None => warn!("Empty mode payload"),
            }
            return;
        }

        match decode_reading(characteristic, data) {
            Ok(value) => self.emit(DeviceEvent::ReadingAvailable {
                characteristic,
                value,
            }),
            Err(e) => warn!("Skipping unreadable payload: {}", e),
        }
    }

    fn observe_mode_byte(&mut self, symbol: u8) {
        let Some(new_mode) = OperatingMode::from_symbol(symbol) else {
            warn!("Unknown mode byte {:#04x}, keeping {:?}", symbol, self.mode);
            return;
        };

        if self.mode == Some(new_mode) {
            return;
        }

        info!("Mode changed. New mode is: {}", new_mode);
        self.mode = Some(new_mode);
        self.scheduler.rebuild_polling_queue();
        self.emit(DeviceEvent::ModeChanged(new_mode));
    }

    /// Continuation after a rotation read: a pending time re-sync wins, then
    /// the scheduler decides between queued alerts and the next poll.
    fn after_poll(&mut self) {
        if self.should_sync_time {
            self.write_time();
            return;
        }

        self.schedule_next();
    }

    fn schedule_next(&mut self) {
        if self.state != ConnectionState::Ready {
            return;
        }

        // Entries whose handle never showed up in discovery are skipped;
        // bounded so a session with nothing readable goes idle instead of
        // spinning.
        let mut skipped_reads = 0;
        loop {
            match self.scheduler.next_operation() {
                Some(ScheduledOp::Notification(buffer)) => {
                    let Some(handle) = self.handles.get(&Characteristic::AlertIn).cloned() else {
                        warn!("Alert channel missing, dropping queued command");
                        continue;
                    };
                    self.in_flight = Some(InFlight::Notification);
                    self.issue(
                        "alert write",
                        self.transport.write_characteristic(&handle, &buffer),
                    );
                    return;
                }
                Some(ScheduledOp::Read(characteristic)) => {
                    let Some(handle) = self.handles.get(&characteristic).cloned() else {
                        debug!("{:?} not discovered, skipping", characteristic);
                        skipped_reads += 1;
                        if skipped_reads >= self.scheduler.polling_len() {
                            break;
                        }
                        continue;
                    };
                    self.in_flight = Some(InFlight::Poll(characteristic));
                    self.issue("poll read", self.transport.read_characteristic(&handle));
                    return;
                }
                None => break,
            }
        }

        debug!("Nothing to schedule, rotation idle");
        self.in_flight = None;
    }

    fn enter_bonding_path(&mut self) {
        match self.state {
            ConnectionState::AuthenticationRequired | ConnectionState::Bonding => {
                debug!("Already bonding");
                return;
            }
            ConnectionState::Disconnected => return,
            _ => {}
        }

        info!("Insufficient authentication, requesting bond");
        self.in_flight = None;
        self.set_state(ConnectionState::AuthenticationRequired);
        self.emit(DeviceEvent::NeedsBonding);

        match self.transport.create_bond() {
            Ok(()) => self.set_state(ConnectionState::Bonding),
            Err(e) => warn!("Failed to initiate bonding: {}", e),
        }
    }

    fn on_bond_state_changed(&mut self, bonded: bool) {
        if !matches!(
            self.state,
            ConnectionState::AuthenticationRequired | ConnectionState::Bonding
        ) {
            debug!(
                "Ignoring bond state change (bonded: {}) while {}",
                bonded, self.state
            );
            return;
        }

        if bonded {
            info!("Bonded, re-discovering services");
            self.set_state(ConnectionState::ServicesDiscovering);
            self.issue("service discovery", self.transport.discover_services());
        } else {
            warn!("Bonding failed");
            self.clear_session_state();
            self.mode = None;
            self.set_state(ConnectionState::Disconnected);
            self.emit(DeviceEvent::BondFailed);
            self.emit(DeviceEvent::ConnectionStateChanged(false));
        }
    }

    // === Internal ===

    fn clear_session_state(&mut self) {
        self.handles.clear();
        self.scheduler.clear();
        self.in_flight = None;
        self.should_sync_time = false;
    }

    fn set_state(&mut self, new_state: ConnectionState) {
        if self.state != new_state {
            debug!("Connection state changed: {} -> {}", self.state, new_state);
            self.state = new_state;
        }
    }

    fn emit(&self, event: DeviceEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Log a failed initiation. Transport errors never escape the session.
    fn issue(&self, operation: &str, result: crate::error::Result<()>) {
        if let Err(e) = result {
            warn!("Failed to initiate {}: {}", operation, e);
        }
    }
}

impl<T: GattTransport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("mode", &self.mode)
            .field("discovered", &self.handles.len())
            .finish()
    }
}
