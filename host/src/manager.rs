//! The BLE manager.
use core::cell::RefCell;

use bt_hci::param::BdAddr;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::{ManagerConfig, MAX_ADV_DATA_LEN, MAX_ATTR_LEN};
use crate::connection_tracker::{ConnectionTracker, Resolution};
use crate::lifecycle::Lifecycle;
use crate::outbox::NotificationOutbox;
use crate::rendezvous::AttributeRendezvous;
use crate::request_table::RequestTable;
use crate::stack::{BleStack, LookupError, StackError};
use crate::types::gatt::{
    AttrControl, AttrValue, AttributeType, Characteristic, CharacteristicElement, ConnId, DbAttrKind, Descriptor,
    DescriptorElement, GattIf, GattStatus, Service, ServiceId, WriteType,
};
use crate::types::uuid::Uuid;
use crate::{Address, BleManagerError, Error};

struct State {
    lifecycle: Lifecycle,
    server_if: Option<GattIf>,
    client_if: Option<GattIf>,
    connections: ConnectionTracker,
    requests: RequestTable,
    outbox: NotificationOutbox,
}

impl State {
    const fn new() -> Self {
        Self {
            lifecycle: Lifecycle::Disabled,
            server_if: None,
            client_if: None,
            connections: ConnectionTracker::new(),
            requests: RequestTable::new(),
            outbox: NotificationOutbox::new(),
        }
    }

    fn reset(&mut self) {
        self.server_if = None;
        self.client_if = None;
        self.connections.reset();
        self.requests.clear();
        self.outbox.reset();
    }
}

/// Turns an asynchronous, callback-driven BLE stack into blocking operations for one caller.
///
/// The foreground context calls the operations. The stack's callback context reports completions
/// through the `on_*` methods. Both share the manager by reference; all state sits behind a
/// blocking mutex of type `M`, never held while a stack command runs.
///
/// Only `add_service`, `add_characteristic`, `add_descriptor` and `start_service` wait for their
/// completion event, with no timeout. Other operations return once the stack accepted the command.
pub struct BleManager<M: RawMutex, S: BleStack> {
    stack: S,
    config: ManagerConfig,
    state: Mutex<M, RefCell<State>>,
    created: AttributeRendezvous<M>,
}

fn command<T, E: StackError>(what: &str, result: Result<T, E>) -> Result<T, BleManagerError<E>> {
    result.map_err(|e| {
        warn!("[manager] {} refused: {:?}", what, e);
        BleManagerError::Stack(e)
    })
}

fn rejected<E>(error: Error) -> BleManagerError<E> {
    debug!("[manager] rejected: {:?}", error);
    BleManagerError::Manager(error)
}

fn check_len(len: usize, max: usize) -> Result<(), Error> {
    if len > max {
        Err(Error::PayloadTooLarge { len, max })
    } else {
        Ok(())
    }
}

impl<M: RawMutex, S: BleStack> BleManager<M, S> {
    /// Create a manager with the default configuration.
    pub fn new(stack: S) -> Self {
        Self::with_config(stack, ManagerConfig::default())
    }

    /// Create a manager.
    pub fn with_config(stack: S, config: ManagerConfig) -> Self {
        Self {
            stack,
            config,
            state: Mutex::new(RefCell::new(State::new())),
            created: AttributeRendezvous::new(),
        }
    }

    /// The underlying stack.
    pub fn stack(&self) -> &S {
        &self.stack
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        self.state.lock(|state| f(&mut state.borrow_mut()))
    }

    fn server_if(&self) -> GattIf {
        self.with_state(|s| s.server_if).unwrap_or(GattIf::NONE)
    }

    fn client_if(&self) -> GattIf {
        self.with_state(|s| s.client_if).unwrap_or(GattIf::NONE)
    }

    fn connected_peer(&self) -> Result<Address, BleManagerError<S::Error>> {
        self.with_state(|s| s.connections.connected())
            .ok_or(Error::NotConnected)
            .map_err(rejected)
    }

    /// Bring the stack up: controller, host, then security parameters.
    ///
    /// Stops at the first failing step and leaves the manager [`Lifecycle::Faulted`]. Only allowed
    /// while [`Lifecycle::Disabled`].
    pub fn enable(&self) -> Result<(), BleManagerError<S::Error>> {
        self.with_state(|s| s.lifecycle.start_enable()).map_err(rejected)?;
        let result = self.bring_up();
        self.with_state(|s| s.lifecycle.finish_enable(result.is_ok()));
        match &result {
            Ok(()) => info!("[manager] enabled"),
            Err(_) => warn!("[manager] enable failed, stack left partially initialized"),
        }
        result
    }

    fn bring_up(&self) -> Result<(), BleManagerError<S::Error>> {
        command("controller init", self.stack.controller_init())?;
        command("controller enable", self.stack.controller_enable())?;
        command("host init", self.stack.host_init())?;
        command("host enable", self.stack.host_enable())?;
        for param in self.config.security.params() {
            command("set security param", self.stack.set_security_param(param))?;
        }
        Ok(())
    }

    /// Reset all manager state and tear the stack down in reverse order.
    ///
    /// Allowed in every state. A manager that is already disabled only has its state reset. Teardown
    /// stops at the first failing step, which leaves the manager [`Lifecycle::Faulted`].
    pub fn disable(&self) -> Result<(), BleManagerError<S::Error>> {
        let running = self.with_state(|s| {
            s.reset();
            s.lifecycle.start_disable()
        });
        self.created.reset();
        if !running {
            debug!("[manager] already disabled");
            return Ok(());
        }
        let result = self.tear_down();
        self.with_state(|s| s.lifecycle.finish_disable(result.is_ok()));
        if result.is_ok() {
            info!("[manager] disabled");
        }
        result
    }

    fn tear_down(&self) -> Result<(), BleManagerError<S::Error>> {
        command("host disable", self.stack.host_disable())?;
        command("host deinit", self.stack.host_deinit())?;
        command("controller disable", self.stack.controller_disable())?;
        command("controller deinit", self.stack.controller_deinit())?;
        Ok(())
    }

    /// Current lifecycle state.
    pub fn lifecycle(&self) -> Lifecycle {
        self.with_state(|s| s.lifecycle)
    }

    /// Record the interface assigned to the GATT server application.
    pub fn set_server_interface(&self, gatt_if: GattIf) {
        debug!("[manager] server interface {}", gatt_if.0);
        self.with_state(|s| s.server_if = Some(gatt_if));
    }

    /// Record the interface assigned to the GATT client application.
    pub fn set_client_interface(&self, gatt_if: GattIf) {
        debug!("[manager] client interface {}", gatt_if.0);
        self.with_state(|s| s.client_if = Some(gatt_if));
    }

    pub fn server_interface(&self) -> Option<GattIf> {
        self.with_state(|s| s.server_if)
    }

    pub fn client_interface(&self) -> Option<GattIf> {
        self.with_state(|s| s.client_if)
    }

    // Issue a creation command and block until its completion arrives.
    fn create(&self, what: &str, issue: impl FnOnce(&S) -> Result<(), S::Error>) -> Result<u16, BleManagerError<S::Error>> {
        self.created.arm();
        command(what, issue(&self.stack))?;
        let created = self.created.await_result();
        if !created.status.is_ok() {
            warn!("[manager] {} completed with status {}", what, created.status);
            return Err(BleManagerError::Manager(Error::Status(created.status)));
        }
        trace!("[manager] {} -> handle {}", what, created.handle);
        Ok(created.handle)
    }

    /// Create a primary service and write its handle back into `service`.
    pub fn add_service(&self, service: &mut Service) -> Result<(), BleManagerError<S::Error>> {
        let id = ServiceId {
            uuid: service.uuid.clone(),
            inst_id: 0,
            is_primary: true,
        };
        let num_handles = service.num_handles();
        let gatt_if = self.server_if();
        service.handle = self.create("create service", |stack| stack.create_service(gatt_if, &id, num_handles))?;
        Ok(())
    }

    /// Add a characteristic to the service at `service_handle` and write its value handle back.
    ///
    /// Requests on the characteristic are answered through the `send_*_response` operations.
    pub fn add_characteristic(
        &self,
        service_handle: u16,
        characteristic: &mut Characteristic,
    ) -> Result<(), BleManagerError<S::Error>> {
        characteristic.value_handle = self.create("add characteristic", |stack| {
            stack.add_characteristic(
                service_handle,
                &characteristic.uuid,
                characteristic.permissions,
                characteristic.properties,
                AttrControl::ResponseByApp,
            )
        })?;
        Ok(())
    }

    /// Add a descriptor to the last characteristic of the service and write its handle back.
    pub fn add_descriptor(&self, service_handle: u16, descriptor: &mut Descriptor) -> Result<(), BleManagerError<S::Error>> {
        descriptor.handle = self.create("add descriptor", |stack| {
            stack.add_descriptor(
                service_handle,
                &descriptor.uuid,
                descriptor.permissions,
                AttrControl::ResponseByApp,
            )
        })?;
        Ok(())
    }

    /// Start the service at `service_handle`.
    pub fn start_service(&self, service_handle: u16) -> Result<(), BleManagerError<S::Error>> {
        self.create("start service", |stack| stack.start_service(service_handle))?;
        Ok(())
    }

    /// Configure and start scanning until stopped.
    pub fn start_scan(&self) -> Result<(), BleManagerError<S::Error>> {
        command("set scan params", self.stack.set_scan_params(&self.config.scan))?;
        command("start scanning", self.stack.start_scanning(0))
    }

    pub fn stop_scan(&self) -> Result<(), BleManagerError<S::Error>> {
        command("stop scanning", self.stack.stop_scanning())
    }

    /// Set the raw advertising payload and start advertising.
    pub fn start_adv(&self, adv_data: &[u8]) -> Result<(), BleManagerError<S::Error>> {
        check_len(adv_data.len(), MAX_ADV_DATA_LEN).map_err(rejected)?;
        command("config adv data", self.stack.config_adv_data_raw(adv_data))?;
        command("start advertising", self.stack.start_advertising(&self.config.adv))
    }

    pub fn stop_adv(&self) -> Result<(), BleManagerError<S::Error>> {
        command("stop advertising", self.stack.stop_advertising())
    }

    /// Connect to `peer`.
    ///
    /// Scanning is stopped first. The peer is remembered so its address type can be adopted when
    /// the link comes up.
    pub fn connect(&self, peer: Address) -> Result<(), BleManagerError<S::Error>> {
        if let Err(e) = self.stack.stop_scanning() {
            debug!("[manager] stop scanning before connect: {:?}", e);
        }
        self.with_state(|s| s.connections.begin_connecting(peer));
        let result = command("open", self.stack.open(self.client_if(), peer, true));
        if result.is_err() {
            self.with_state(|s| {
                if s.connections.connecting() == Some(peer) {
                    s.connections.connect_failed();
                }
            });
        }
        result
    }

    /// Close the link. Connection state is cleared by the disconnected event.
    pub fn disconnect(&self, conn_id: ConnId) -> Result<(), BleManagerError<S::Error>> {
        command("close", self.stack.close(self.client_if(), conn_id))
    }

    /// Start encryption with the connected peer.
    pub fn send_pair_request(&self) -> Result<(), BleManagerError<S::Error>> {
        let peer = self.connected_peer()?;
        command(
            "set encryption",
            self.stack.set_encryption(&peer.addr, self.config.security.action),
        )
    }

    /// Accept or reject the connected peer's pairing request.
    pub fn send_pair_response(&self, accept: bool) -> Result<(), BleManagerError<S::Error>> {
        let peer = self.connected_peer()?;
        command("security response", self.stack.security_response(&peer.addr, accept))
    }

    /// Answer the connected peer's passkey request.
    pub fn send_passkey_response(&self, accept: bool, passkey: u32) -> Result<(), BleManagerError<S::Error>> {
        let peer = self.connected_peer()?;
        command("passkey reply", self.stack.passkey_reply(&peer.addr, accept, passkey))
    }

    /// Search the peer's services, all of them when `uuid` is `None`.
    pub fn discover_services(&self, conn_id: ConnId, uuid: Option<&Uuid>) -> Result<(), BleManagerError<S::Error>> {
        command("search service", self.stack.search_service(self.client_if(), conn_id, uuid))
    }

    /// Read a remote characteristic value or descriptor.
    pub fn send_read_request(&self, conn_id: ConnId, handle: u16) -> Result<(), BleManagerError<S::Error>> {
        let gatt_if = self.client_if();
        match self.get_attribute_type(conn_id, handle)? {
            AttributeType::Characteristic => command(
                "read characteristic",
                self.stack.read_characteristic(gatt_if, conn_id, handle),
            ),
            AttributeType::Descriptor => command("read descriptor", self.stack.read_descriptor(gatt_if, conn_id, handle)),
        }
    }

    /// Write a remote characteristic value or descriptor.
    pub fn send_write_request(
        &self,
        conn_id: ConnId,
        handle: u16,
        value: &[u8],
        no_response: bool,
    ) -> Result<(), BleManagerError<S::Error>> {
        check_len(value.len(), MAX_ATTR_LEN).map_err(rejected)?;
        let write_type = if no_response {
            WriteType::WithoutResponse
        } else {
            WriteType::WithResponse
        };
        let gatt_if = self.client_if();
        match self.get_attribute_type(conn_id, handle)? {
            AttributeType::Characteristic => command(
                "write characteristic",
                self.stack
                    .write_characteristic(gatt_if, conn_id, handle, value, write_type),
            ),
            AttributeType::Descriptor => command(
                "write descriptor",
                self.stack.write_descriptor(gatt_if, conn_id, handle, value, write_type),
            ),
        }
    }

    fn respond(
        &self,
        conn_id: ConnId,
        trans_id: u32,
        status: GattStatus,
        value: Option<&AttrValue>,
    ) -> Result<(), BleManagerError<S::Error>> {
        command(
            "send response",
            self.stack.send_response(self.server_if(), conn_id, trans_id, status, value),
        )
    }

    /// Answer the outstanding read request on `handle`.
    pub fn send_read_response(
        &self,
        conn_id: ConnId,
        handle: u16,
        status: GattStatus,
        value: &[u8],
    ) -> Result<(), BleManagerError<S::Error>> {
        let value = AttrValue::new(handle, 0, value).map_err(rejected)?;
        let trans_id = self
            .with_state(|s| s.requests.attribute.try_take(handle))
            .map_err(rejected)?;
        self.respond(conn_id, trans_id, status, Some(&value))
    }

    /// Answer the outstanding write request on `handle`.
    pub fn send_write_response(
        &self,
        conn_id: ConnId,
        handle: u16,
        status: GattStatus,
    ) -> Result<(), BleManagerError<S::Error>> {
        let trans_id = self
            .with_state(|s| s.requests.attribute.try_take(handle))
            .map_err(rejected)?;
        self.respond(conn_id, trans_id, status, None)
    }

    /// Answer the outstanding prepare-write request on `handle`, echoing the prepared value.
    pub fn send_prepare_write_response(
        &self,
        conn_id: ConnId,
        handle: u16,
        status: GattStatus,
        value: &[u8],
        offset: u16,
    ) -> Result<(), BleManagerError<S::Error>> {
        let value = AttrValue::new(handle, offset, value).map_err(rejected)?;
        let trans_id = self
            .with_state(|s| s.requests.attribute.try_take(handle))
            .map_err(rejected)?;
        self.respond(conn_id, trans_id, status, Some(&value))
    }

    /// Answer the execute-write request for the writes prepared on `handle`.
    pub fn send_execute_write_response(
        &self,
        conn_id: ConnId,
        handle: u16,
        status: GattStatus,
    ) -> Result<(), BleManagerError<S::Error>> {
        let trans_id = self
            .with_state(|s| s.requests.prepare_write.try_take(handle))
            .map_err(rejected)?;
        self.respond(conn_id, trans_id, status, None)
    }

    /// Send an indication (`confirm`) or a notification.
    ///
    /// On success the handle can be read back once with [`Self::take_notification_handle`].
    pub fn send_notification(
        &self,
        conn_id: ConnId,
        handle: u16,
        value: &[u8],
        confirm: bool,
    ) -> Result<(), BleManagerError<S::Error>> {
        check_len(value.len(), MAX_ATTR_LEN).map_err(rejected)?;
        self.with_state(|s| s.outbox.mark_sent(handle));
        let result = command(
            "send indicate",
            self.stack.send_indicate(self.server_if(), conn_id, handle, value, confirm),
        );
        if result.is_err() {
            self.with_state(|s| s.outbox.rollback(handle));
        }
        result
    }

    /// Number of attributes in `start..=end` of the peer's database, not counting the service
    /// attribute itself. Saturates at 255.
    pub fn get_num_attributes(&self, conn_id: ConnId, start: u16, end: u16) -> Result<u8, BleManagerError<S::Error>> {
        let count = command(
            "get attr count",
            self.stack
                .get_attr_count(self.client_if(), conn_id, DbAttrKind::All, start, end),
        )?;
        Ok(u8::try_from(count.saturating_sub(1)).unwrap_or(u8::MAX))
    }

    /// The `offset`th characteristic in `start..=end`. [`Error::NotFound`] once exhausted.
    pub fn get_characteristic(
        &self,
        conn_id: ConnId,
        start: u16,
        end: u16,
        offset: u16,
    ) -> Result<CharacteristicElement, BleManagerError<S::Error>> {
        self.stack
            .get_characteristic(self.client_if(), conn_id, start, end, offset)
            .map_err(|e| lookup_failed("get characteristic", e))
    }

    /// The `offset`th descriptor of the characteristic at `char_handle`. [`Error::NotFound`] once
    /// exhausted.
    pub fn get_descriptor(
        &self,
        conn_id: ConnId,
        char_handle: u16,
        offset: u16,
    ) -> Result<DescriptorElement, BleManagerError<S::Error>> {
        self.stack
            .get_descriptor(self.client_if(), conn_id, char_handle, offset)
            .map_err(|e| lookup_failed("get descriptor", e))
    }

    /// Whether the remote `handle` is a characteristic value or a descriptor.
    pub fn get_attribute_type(&self, conn_id: ConnId, handle: u16) -> Result<AttributeType, BleManagerError<S::Error>> {
        let count = command(
            "get attr count",
            self.stack
                .get_attr_count(self.client_if(), conn_id, DbAttrKind::Characteristic, handle, handle),
        )?;
        Ok(if count == 1 {
            AttributeType::Characteristic
        } else {
            AttributeType::Descriptor
        })
    }

    /// A link came up. Returns the peer with its resolved address type.
    ///
    /// If the peer is not the one passed to `connect`, its address type is assumed public and a
    /// client link is opened with that type, so GATT client operations have a link to work on.
    pub fn on_connected(&self, conn_id: ConnId, addr: BdAddr) -> Address {
        if let Err(e) = self.stack.stop_advertising() {
            debug!("[manager] stop advertising on connect: {:?}", e);
        }
        let resolution = self.with_state(|s| s.connections.connect_succeeded(conn_id, addr));
        if let Resolution::Inferred(peer) = resolution {
            warn!("[manager] address type of {:?} unknown, assuming public", peer.addr);
            if let Err(e) = self.stack.open(self.client_if(), peer, true) {
                warn!("[manager] open for incoming link refused: {:?}", e);
            }
        }
        info!("[manager] connected, conn_id {}", conn_id.0);
        resolution.address()
    }

    pub fn on_connect_failed(&self) {
        debug!("[manager] connection attempt failed");
        self.with_state(|s| s.connections.connect_failed());
    }

    pub fn on_disconnected(&self) {
        info!("[manager] disconnected");
        self.with_state(|s| s.connections.disconnected());
    }

    /// Completion of a service, characteristic or descriptor creation, or of a service start.
    pub fn on_attribute_created(&self, status: GattStatus, handle: u16) {
        self.created.complete(status, handle);
    }

    /// A read or write request arrived on the local server.
    pub fn on_attribute_request(&self, handle: u16, trans_id: u32) {
        self.with_state(|s| s.requests.attribute.record(handle, trans_id));
    }

    /// A prepare-write request arrived on the local server.
    ///
    /// It is answered with `send_prepare_write_response`. The handle is also remembered for the
    /// execute-write that follows.
    pub fn on_prepare_write_request(&self, handle: u16, trans_id: u32) {
        self.with_state(|s| {
            s.requests.attribute.record(handle, trans_id);
            s.requests.prepare_write.record_chunk(handle, trans_id);
        });
    }

    /// An execute-write request arrived for the prepared writes.
    pub fn on_execute_write_request(&self, trans_id: u32) {
        let handle = self.with_state(|s| s.requests.prepare_write.retag(trans_id));
        if handle.is_none() {
            warn!("[manager] execute write (trans_id {}) without prepared write", trans_id);
        }
    }

    /// A characteristic was found on the connected peer: subscribe to its notifications.
    pub fn on_characteristic_discovered(&self, handle: u16) {
        let Some(peer) = self.with_state(|s| s.connections.connected()) else {
            debug!("[manager] characteristic {} discovered without a connected peer", handle);
            return;
        };
        if let Err(e) = self.stack.register_for_notify(self.client_if(), &peer.addr, handle) {
            warn!("[manager] register for notify on {} refused: {:?}", handle, e);
        }
    }

    /// Peer of the pending connection attempt.
    pub fn connecting_device(&self) -> Option<Address> {
        self.with_state(|s| s.connections.connecting())
    }

    /// Connected peer.
    pub fn connected_device(&self) -> Option<Address> {
        self.with_state(|s| s.connections.connected())
    }

    pub fn connected_conn_id(&self) -> Option<ConnId> {
        self.with_state(|s| s.connections.conn_id())
    }

    /// Handle of the last notification sent, cleared by the call.
    pub fn take_notification_handle(&self) -> Option<u16> {
        self.with_state(|s| s.outbox.take())
    }

    /// Handle with prepared writes awaiting execution.
    pub fn pending_prepare_write(&self) -> Option<u16> {
        self.with_state(|s| s.requests.prepare_write.pending().map(|p| p.handle))
    }
}

fn lookup_failed<E: StackError>(what: &str, error: LookupError<E>) -> BleManagerError<E> {
    match error {
        LookupError::NotFound | LookupError::InvalidOffset => {
            trace!("[manager] {}: exhausted", what);
            BleManagerError::Manager(Error::NotFound)
        }
        LookupError::Stack(e) => {
            warn!("[manager] {} failed: {:?}", what, e);
            BleManagerError::Stack(e)
        }
    }
}
