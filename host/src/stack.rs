//! The BLE stack driven by the manager.
//!
//! Commands return as soon as the stack accepted or refused them. Their completions arrive later
//! through the stack's own callback context, which forwards them to the `on_*` inputs of
//! [`BleManager`](crate::BleManager).
use bt_hci::param::BdAddr;

use crate::advertise::AdvParams;
use crate::scan::ScanParams;
use crate::types::gatt::{
    AttrControl, AttrValue, AttributePermissions, CharacteristicElement, CharacteristicProps, ConnId, DbAttrKind,
    DescriptorElement, GattIf, GattStatus, ServiceId, WriteType,
};
use crate::types::security::{SecurityAction, SecurityParam};
use crate::types::uuid::Uuid;
use crate::Address;

/// Error type of a [`BleStack`].
#[cfg(not(feature = "defmt"))]
pub trait StackError: core::fmt::Debug {}
#[cfg(not(feature = "defmt"))]
impl<T: core::fmt::Debug> StackError for T {}

/// Error type of a [`BleStack`].
#[cfg(feature = "defmt")]
pub trait StackError: core::fmt::Debug + defmt::Format {}
#[cfg(feature = "defmt")]
impl<T: core::fmt::Debug + defmt::Format> StackError for T {}

/// Outcome of an attribute lookup in the client's cached database.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError<E> {
    /// No attribute in the given range.
    NotFound,
    /// The offset is past the last attribute in the range.
    InvalidOffset,
    /// The lookup itself failed.
    Stack(E),
}

/// Command interface of an asynchronous, callback-driven BLE stack.
pub trait BleStack {
    /// Error returned when the stack refuses a command.
    type Error: StackError;

    // Bring-up and teardown.

    /// Initialize the controller.
    fn controller_init(&self) -> Result<(), Self::Error>;
    /// Enable the controller in BLE mode.
    fn controller_enable(&self) -> Result<(), Self::Error>;
    /// Disable the controller.
    fn controller_disable(&self) -> Result<(), Self::Error>;
    /// Release the controller.
    fn controller_deinit(&self) -> Result<(), Self::Error>;
    /// Initialize the host stack.
    fn host_init(&self) -> Result<(), Self::Error>;
    /// Enable the host stack.
    fn host_enable(&self) -> Result<(), Self::Error>;
    /// Disable the host stack.
    fn host_disable(&self) -> Result<(), Self::Error>;
    /// Release the host stack.
    fn host_deinit(&self) -> Result<(), Self::Error>;
    /// Set one security manager parameter.
    fn set_security_param(&self, param: SecurityParam) -> Result<(), Self::Error>;

    // GATT server construction. Each completes with an attribute-created event.

    /// Create a service reserving `num_handles` attribute handles.
    fn create_service(&self, gatt_if: GattIf, service: &ServiceId, num_handles: u16) -> Result<(), Self::Error>;
    /// Add a characteristic to the service at `service_handle`.
    fn add_characteristic(
        &self,
        service_handle: u16,
        uuid: &Uuid,
        permissions: AttributePermissions,
        properties: CharacteristicProps,
        control: AttrControl,
    ) -> Result<(), Self::Error>;
    /// Add a descriptor to the last characteristic of the service at `service_handle`.
    fn add_descriptor(
        &self,
        service_handle: u16,
        uuid: &Uuid,
        permissions: AttributePermissions,
        control: AttrControl,
    ) -> Result<(), Self::Error>;
    /// Start the service at `service_handle`.
    fn start_service(&self, service_handle: u16) -> Result<(), Self::Error>;

    // GAP.

    /// Configure scanning.
    fn set_scan_params(&self, params: &ScanParams) -> Result<(), Self::Error>;
    /// Start scanning for `duration_secs` seconds, 0 scans until stopped.
    fn start_scanning(&self, duration_secs: u32) -> Result<(), Self::Error>;
    /// Stop scanning.
    fn stop_scanning(&self) -> Result<(), Self::Error>;
    /// Set the raw advertising payload.
    fn config_adv_data_raw(&self, data: &[u8]) -> Result<(), Self::Error>;
    /// Start advertising.
    fn start_advertising(&self, params: &AdvParams) -> Result<(), Self::Error>;
    /// Stop advertising.
    fn stop_advertising(&self) -> Result<(), Self::Error>;

    // GATT client connection.

    /// Open a GATT client link to `peer`, `direct` for a direct (not background) connection.
    fn open(&self, gatt_if: GattIf, peer: Address, direct: bool) -> Result<(), Self::Error>;
    /// Close a GATT client link.
    fn close(&self, gatt_if: GattIf, conn_id: ConnId) -> Result<(), Self::Error>;

    // Security manager.

    /// Start encryption on the link to `peer`.
    fn set_encryption(&self, peer: &BdAddr, action: SecurityAction) -> Result<(), Self::Error>;
    /// Accept or reject a pairing request from `peer`.
    fn security_response(&self, peer: &BdAddr, accept: bool) -> Result<(), Self::Error>;
    /// Answer a passkey request from `peer`.
    fn passkey_reply(&self, peer: &BdAddr, accept: bool, passkey: u32) -> Result<(), Self::Error>;

    // GATT client.

    /// Search the peer's services, all of them when `filter` is `None`.
    fn search_service(&self, gatt_if: GattIf, conn_id: ConnId, filter: Option<&Uuid>) -> Result<(), Self::Error>;
    /// Read a characteristic value.
    fn read_characteristic(&self, gatt_if: GattIf, conn_id: ConnId, handle: u16) -> Result<(), Self::Error>;
    /// Read a descriptor.
    fn read_descriptor(&self, gatt_if: GattIf, conn_id: ConnId, handle: u16) -> Result<(), Self::Error>;
    /// Write a characteristic value.
    fn write_characteristic(
        &self,
        gatt_if: GattIf,
        conn_id: ConnId,
        handle: u16,
        value: &[u8],
        write_type: WriteType,
    ) -> Result<(), Self::Error>;
    /// Write a descriptor.
    fn write_descriptor(
        &self,
        gatt_if: GattIf,
        conn_id: ConnId,
        handle: u16,
        value: &[u8],
        write_type: WriteType,
    ) -> Result<(), Self::Error>;
    /// Register for notifications and indications on `handle` of `peer`.
    fn register_for_notify(&self, gatt_if: GattIf, peer: &BdAddr, handle: u16) -> Result<(), Self::Error>;

    // GATT server.

    /// Answer the request identified by `trans_id`.
    fn send_response(
        &self,
        gatt_if: GattIf,
        conn_id: ConnId,
        trans_id: u32,
        status: GattStatus,
        value: Option<&AttrValue>,
    ) -> Result<(), Self::Error>;
    /// Send an indication (`confirm`) or a notification.
    fn send_indicate(
        &self,
        gatt_if: GattIf,
        conn_id: ConnId,
        handle: u16,
        value: &[u8],
        confirm: bool,
    ) -> Result<(), Self::Error>;

    // Client database cache.

    /// Count attributes of `kind` in `start..=end`.
    fn get_attr_count(
        &self,
        gatt_if: GattIf,
        conn_id: ConnId,
        kind: DbAttrKind,
        start: u16,
        end: u16,
    ) -> Result<u16, Self::Error>;
    /// The `offset`th characteristic in `start..=end`.
    fn get_characteristic(
        &self,
        gatt_if: GattIf,
        conn_id: ConnId,
        start: u16,
        end: u16,
        offset: u16,
    ) -> Result<CharacteristicElement, LookupError<Self::Error>>;
    /// The `offset`th descriptor of the characteristic at `char_handle`.
    fn get_descriptor(
        &self,
        gatt_if: GattIf,
        conn_id: ConnId,
        char_handle: u16,
        offset: u16,
    ) -> Result<DescriptorElement, LookupError<Self::Error>>;
}
