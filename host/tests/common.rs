use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

use ble_manager::advertise::AdvParams;
use ble_manager::scan::ScanParams;
use ble_manager::stack::{BleStack, LookupError};
use ble_manager::types::gatt::{
    AttrControl, AttrValue, AttributePermissions, CharacteristicElement, CharacteristicProps, ConnId, DbAttrKind,
    DescriptorElement, GattIf, GattStatus, ServiceId, WriteType,
};
use ble_manager::types::security::{SecurityAction, SecurityParam};
use ble_manager::{Address, DeviceAddress, Uuid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Refused;

/// Completion event delivered by the stack's callback context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub status: GattStatus,
    pub handle: u16,
}

/// A stack that accepts every command and reports attribute creation on a channel, like a real
/// stack's callback task would.
pub struct LoopbackStack {
    completions: Mutex<Sender<Completion>>,
    next_handle: AtomicU16,
    pub responses: Mutex<Vec<(u32, GattStatus, Option<AttrValue>)>>,
}

impl LoopbackStack {
    pub fn new() -> (Self, Receiver<Completion>) {
        let (tx, rx) = channel();
        (
            Self {
                completions: Mutex::new(tx),
                next_handle: AtomicU16::new(0x0028),
                responses: Mutex::new(Vec::new()),
            },
            rx,
        )
    }

    fn complete(&self, handle: u16) -> Result<(), Refused> {
        self.completions
            .lock()
            .unwrap()
            .send(Completion {
                status: GattStatus::OK,
                handle,
            })
            .map_err(|_| Refused)
    }

    fn allocate(&self, count: u16) -> u16 {
        self.next_handle.fetch_add(count, Ordering::SeqCst) + count - 1
    }
}

impl BleStack for LoopbackStack {
    type Error = Refused;

    fn controller_init(&self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn controller_enable(&self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn controller_disable(&self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn controller_deinit(&self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn host_init(&self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn host_enable(&self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn host_disable(&self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn host_deinit(&self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn set_security_param(&self, _param: SecurityParam) -> Result<(), Self::Error> {
        Ok(())
    }

    fn create_service(&self, _gatt_if: GattIf, _service: &ServiceId, _num_handles: u16) -> Result<(), Self::Error> {
        let handle = self.allocate(1);
        self.complete(handle)
    }

    fn add_characteristic(
        &self,
        _service_handle: u16,
        _uuid: &Uuid,
        _permissions: AttributePermissions,
        _properties: CharacteristicProps,
        _control: AttrControl,
    ) -> Result<(), Self::Error> {
        // Declaration, then value.
        let handle = self.allocate(2);
        self.complete(handle)
    }

    fn add_descriptor(
        &self,
        _service_handle: u16,
        _uuid: &Uuid,
        _permissions: AttributePermissions,
        _control: AttrControl,
    ) -> Result<(), Self::Error> {
        let handle = self.allocate(1);
        self.complete(handle)
    }

    fn start_service(&self, service_handle: u16) -> Result<(), Self::Error> {
        self.complete(service_handle)
    }

    fn set_scan_params(&self, _params: &ScanParams) -> Result<(), Self::Error> {
        Ok(())
    }
    fn start_scanning(&self, _duration_secs: u32) -> Result<(), Self::Error> {
        Ok(())
    }
    fn stop_scanning(&self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn config_adv_data_raw(&self, _data: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }
    fn start_advertising(&self, _params: &AdvParams) -> Result<(), Self::Error> {
        Ok(())
    }
    fn stop_advertising(&self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn open(&self, _gatt_if: GattIf, _peer: Address, _direct: bool) -> Result<(), Self::Error> {
        Ok(())
    }
    fn close(&self, _gatt_if: GattIf, _conn_id: ConnId) -> Result<(), Self::Error> {
        Ok(())
    }
    fn set_encryption(&self, _peer: &DeviceAddress, _action: SecurityAction) -> Result<(), Self::Error> {
        Ok(())
    }
    fn security_response(&self, _peer: &DeviceAddress, _accept: bool) -> Result<(), Self::Error> {
        Ok(())
    }
    fn passkey_reply(&self, _peer: &DeviceAddress, _accept: bool, _passkey: u32) -> Result<(), Self::Error> {
        Ok(())
    }
    fn search_service(&self, _gatt_if: GattIf, _conn_id: ConnId, _filter: Option<&Uuid>) -> Result<(), Self::Error> {
        Ok(())
    }
    fn read_characteristic(&self, _gatt_if: GattIf, _conn_id: ConnId, _handle: u16) -> Result<(), Self::Error> {
        Ok(())
    }
    fn read_descriptor(&self, _gatt_if: GattIf, _conn_id: ConnId, _handle: u16) -> Result<(), Self::Error> {
        Ok(())
    }
    fn write_characteristic(
        &self,
        _gatt_if: GattIf,
        _conn_id: ConnId,
        _handle: u16,
        _value: &[u8],
        _write_type: WriteType,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
    fn write_descriptor(
        &self,
        _gatt_if: GattIf,
        _conn_id: ConnId,
        _handle: u16,
        _value: &[u8],
        _write_type: WriteType,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
    fn register_for_notify(&self, _gatt_if: GattIf, _peer: &DeviceAddress, _handle: u16) -> Result<(), Self::Error> {
        Ok(())
    }

    fn send_response(
        &self,
        _gatt_if: GattIf,
        _conn_id: ConnId,
        trans_id: u32,
        status: GattStatus,
        value: Option<&AttrValue>,
    ) -> Result<(), Self::Error> {
        self.responses.lock().unwrap().push((trans_id, status, value.cloned()));
        Ok(())
    }

    fn send_indicate(
        &self,
        _gatt_if: GattIf,
        _conn_id: ConnId,
        _handle: u16,
        _value: &[u8],
        _confirm: bool,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    fn get_attr_count(
        &self,
        _gatt_if: GattIf,
        _conn_id: ConnId,
        _kind: DbAttrKind,
        _start: u16,
        _end: u16,
    ) -> Result<u16, Self::Error> {
        Ok(0)
    }

    fn get_characteristic(
        &self,
        _gatt_if: GattIf,
        _conn_id: ConnId,
        _start: u16,
        _end: u16,
        _offset: u16,
    ) -> Result<CharacteristicElement, LookupError<Self::Error>> {
        Err(LookupError::NotFound)
    }

    fn get_descriptor(
        &self,
        _gatt_if: GattIf,
        _conn_id: ConnId,
        _char_handle: u16,
        _offset: u16,
    ) -> Result<DescriptorElement, LookupError<Self::Error>> {
        Err(LookupError::NotFound)
    }
}
