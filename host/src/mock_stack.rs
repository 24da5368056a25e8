use std::sync::Mutex;
use std::vec::Vec;

use bt_hci::param::BdAddr;

use crate::advertise::AdvParams;
use crate::scan::ScanParams;
use crate::stack::{BleStack, LookupError};
use crate::types::gatt::{
    AttrControl, AttrValue, AttributePermissions, CharacteristicElement, CharacteristicProps, ConnId, DbAttrKind,
    DescriptorElement, GattIf, GattStatus, ServiceId, WriteType,
};
use crate::types::security::{SecurityAction, SecurityParam};
use crate::types::uuid::Uuid;
use crate::Address;

/// A command received by [`MockStack`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ControllerInit,
    ControllerEnable,
    ControllerDisable,
    ControllerDeinit,
    HostInit,
    HostEnable,
    HostDisable,
    HostDeinit,
    SetSecurityParam(SecurityParam),
    CreateService {
        gatt_if: GattIf,
        uuid: Uuid,
        num_handles: u16,
    },
    AddCharacteristic {
        service_handle: u16,
        uuid: Uuid,
        properties: CharacteristicProps,
        control: AttrControl,
    },
    AddDescriptor {
        service_handle: u16,
        uuid: Uuid,
        control: AttrControl,
    },
    StartService(u16),
    SetScanParams,
    StartScanning(u32),
    StopScanning,
    ConfigAdvData(Vec<u8>),
    StartAdvertising,
    StopAdvertising,
    Open {
        gatt_if: GattIf,
        peer: Address,
        direct: bool,
    },
    Close(ConnId),
    SetEncryption(BdAddr, SecurityAction),
    SecurityResponse(BdAddr, bool),
    PasskeyReply(BdAddr, bool, u32),
    SearchService(Option<Uuid>),
    ReadCharacteristic(u16),
    ReadDescriptor(u16),
    WriteCharacteristic {
        handle: u16,
        len: usize,
        write_type: WriteType,
    },
    WriteDescriptor {
        handle: u16,
        len: usize,
        write_type: WriteType,
    },
    RegisterForNotify(BdAddr, u16),
    SendResponse {
        gatt_if: GattIf,
        trans_id: u32,
        status: GattStatus,
        value: Option<AttrValue>,
    },
    SendIndicate {
        handle: u16,
        confirm: bool,
    },
    GetAttrCount {
        kind: DbAttrKind,
        start: u16,
        end: u16,
    },
    GetCharacteristic(u16),
    GetDescriptor(u16),
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockError {
    Refused,
}

/// Records every command. Commands matching the `fail_when` predicate are recorded, then refused.
pub struct MockStack {
    commands: Mutex<Vec<Command>>,
    fail_when: Mutex<fn(&Command) -> bool>,
    characteristic_handles: Mutex<Vec<u16>>,
    attr_count: Mutex<u16>,
    characteristics: Mutex<Vec<CharacteristicElement>>,
    descriptors: Mutex<Vec<DescriptorElement>>,
}

impl MockStack {
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(Vec::new()),
            fail_when: Mutex::new(never as fn(&Command) -> bool),
            characteristic_handles: Mutex::new(Vec::new()),
            attr_count: Mutex::new(0),
            characteristics: Mutex::new(Vec::new()),
            descriptors: Mutex::new(Vec::new()),
        }
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.commands.lock().unwrap().clear();
    }

    pub fn fail_when(&self, predicate: fn(&Command) -> bool) {
        *self.fail_when.lock().unwrap() = predicate;
    }

    /// Handles counted as characteristics by `get_attr_count`.
    pub fn set_characteristic_handles(&self, handles: &[u16]) {
        *self.characteristic_handles.lock().unwrap() = handles.to_vec();
    }

    /// Count returned by `get_attr_count` over all attributes.
    pub fn set_attr_count(&self, count: u16) {
        *self.attr_count.lock().unwrap() = count;
    }

    pub fn set_characteristics(&self, characteristics: &[CharacteristicElement]) {
        *self.characteristics.lock().unwrap() = characteristics.to_vec();
    }

    pub fn set_descriptors(&self, descriptors: &[DescriptorElement]) {
        *self.descriptors.lock().unwrap() = descriptors.to_vec();
    }

    fn record(&self, command: Command) -> Result<(), MockError> {
        let fail = (*self.fail_when.lock().unwrap())(&command);
        self.commands.lock().unwrap().push(command);
        if fail {
            Err(MockError::Refused)
        } else {
            Ok(())
        }
    }
}

fn never(_: &Command) -> bool {
    false
}

fn element<T: Clone>(elements: &[T], offset: u16) -> Result<T, LookupError<MockError>> {
    if elements.is_empty() {
        return Err(LookupError::NotFound);
    }
    elements.get(offset as usize).cloned().ok_or(LookupError::InvalidOffset)
}

impl BleStack for MockStack {
    type Error = MockError;

    fn controller_init(&self) -> Result<(), Self::Error> {
        self.record(Command::ControllerInit)
    }

    fn controller_enable(&self) -> Result<(), Self::Error> {
        self.record(Command::ControllerEnable)
    }

    fn controller_disable(&self) -> Result<(), Self::Error> {
        self.record(Command::ControllerDisable)
    }

    fn controller_deinit(&self) -> Result<(), Self::Error> {
        self.record(Command::ControllerDeinit)
    }

    fn host_init(&self) -> Result<(), Self::Error> {
        self.record(Command::HostInit)
    }

    fn host_enable(&self) -> Result<(), Self::Error> {
        self.record(Command::HostEnable)
    }

    fn host_disable(&self) -> Result<(), Self::Error> {
        self.record(Command::HostDisable)
    }

    fn host_deinit(&self) -> Result<(), Self::Error> {
        self.record(Command::HostDeinit)
    }

    fn set_security_param(&self, param: SecurityParam) -> Result<(), Self::Error> {
        self.record(Command::SetSecurityParam(param))
    }

    fn create_service(&self, gatt_if: GattIf, service: &ServiceId, num_handles: u16) -> Result<(), Self::Error> {
        assert!(service.is_primary);
        self.record(Command::CreateService {
            gatt_if,
            uuid: service.uuid.clone(),
            num_handles,
        })
    }

    fn add_characteristic(
        &self,
        service_handle: u16,
        uuid: &Uuid,
        _permissions: AttributePermissions,
        properties: CharacteristicProps,
        control: AttrControl,
    ) -> Result<(), Self::Error> {
        self.record(Command::AddCharacteristic {
            service_handle,
            uuid: uuid.clone(),
            properties,
            control,
        })
    }

    fn add_descriptor(
        &self,
        service_handle: u16,
        uuid: &Uuid,
        _permissions: AttributePermissions,
        control: AttrControl,
    ) -> Result<(), Self::Error> {
        self.record(Command::AddDescriptor {
            service_handle,
            uuid: uuid.clone(),
            control,
        })
    }

    fn start_service(&self, service_handle: u16) -> Result<(), Self::Error> {
        self.record(Command::StartService(service_handle))
    }

    fn set_scan_params(&self, _params: &ScanParams) -> Result<(), Self::Error> {
        self.record(Command::SetScanParams)
    }

    fn start_scanning(&self, duration_secs: u32) -> Result<(), Self::Error> {
        self.record(Command::StartScanning(duration_secs))
    }

    fn stop_scanning(&self) -> Result<(), Self::Error> {
        self.record(Command::StopScanning)
    }

    fn config_adv_data_raw(&self, data: &[u8]) -> Result<(), Self::Error> {
        self.record(Command::ConfigAdvData(data.to_vec()))
    }

    fn start_advertising(&self, _params: &AdvParams) -> Result<(), Self::Error> {
        self.record(Command::StartAdvertising)
    }

    fn stop_advertising(&self) -> Result<(), Self::Error> {
        self.record(Command::StopAdvertising)
    }

    fn open(&self, gatt_if: GattIf, peer: Address, direct: bool) -> Result<(), Self::Error> {
        self.record(Command::Open { gatt_if, peer, direct })
    }

    fn close(&self, _gatt_if: GattIf, conn_id: ConnId) -> Result<(), Self::Error> {
        self.record(Command::Close(conn_id))
    }

    fn set_encryption(&self, peer: &BdAddr, action: SecurityAction) -> Result<(), Self::Error> {
        self.record(Command::SetEncryption(*peer, action))
    }

    fn security_response(&self, peer: &BdAddr, accept: bool) -> Result<(), Self::Error> {
        self.record(Command::SecurityResponse(*peer, accept))
    }

    fn passkey_reply(&self, peer: &BdAddr, accept: bool, passkey: u32) -> Result<(), Self::Error> {
        self.record(Command::PasskeyReply(*peer, accept, passkey))
    }

    fn search_service(&self, _gatt_if: GattIf, _conn_id: ConnId, filter: Option<&Uuid>) -> Result<(), Self::Error> {
        self.record(Command::SearchService(filter.cloned()))
    }

    fn read_characteristic(&self, _gatt_if: GattIf, _conn_id: ConnId, handle: u16) -> Result<(), Self::Error> {
        self.record(Command::ReadCharacteristic(handle))
    }

    fn read_descriptor(&self, _gatt_if: GattIf, _conn_id: ConnId, handle: u16) -> Result<(), Self::Error> {
        self.record(Command::ReadDescriptor(handle))
    }

    fn write_characteristic(
        &self,
        _gatt_if: GattIf,
        _conn_id: ConnId,
        handle: u16,
        value: &[u8],
        write_type: WriteType,
    ) -> Result<(), Self::Error> {
        self.record(Command::WriteCharacteristic {
            handle,
            len: value.len(),
            write_type,
        })
    }

    fn write_descriptor(
        &self,
        _gatt_if: GattIf,
        _conn_id: ConnId,
        handle: u16,
        value: &[u8],
        write_type: WriteType,
    ) -> Result<(), Self::Error> {
        self.record(Command::WriteDescriptor {
            handle,
            len: value.len(),
            write_type,
        })
    }

    fn register_for_notify(&self, _gatt_if: GattIf, peer: &BdAddr, handle: u16) -> Result<(), Self::Error> {
        self.record(Command::RegisterForNotify(*peer, handle))
    }

    fn send_response(
        &self,
        gatt_if: GattIf,
        _conn_id: ConnId,
        trans_id: u32,
        status: GattStatus,
        value: Option<&AttrValue>,
    ) -> Result<(), Self::Error> {
        self.record(Command::SendResponse {
            gatt_if,
            trans_id,
            status,
            value: value.cloned(),
        })
    }

    fn send_indicate(
        &self,
        _gatt_if: GattIf,
        _conn_id: ConnId,
        handle: u16,
        _value: &[u8],
        confirm: bool,
    ) -> Result<(), Self::Error> {
        self.record(Command::SendIndicate { handle, confirm })
    }

    fn get_attr_count(
        &self,
        _gatt_if: GattIf,
        _conn_id: ConnId,
        kind: DbAttrKind,
        start: u16,
        end: u16,
    ) -> Result<u16, Self::Error> {
        self.record(Command::GetAttrCount { kind, start, end })?;
        Ok(match kind {
            DbAttrKind::All => *self.attr_count.lock().unwrap(),
            DbAttrKind::Characteristic => self
                .characteristic_handles
                .lock()
                .unwrap()
                .iter()
                .filter(|h| (start..=end).contains(*h))
                .count() as u16,
        })
    }

    fn get_characteristic(
        &self,
        _gatt_if: GattIf,
        _conn_id: ConnId,
        _start: u16,
        _end: u16,
        offset: u16,
    ) -> Result<CharacteristicElement, LookupError<Self::Error>> {
        self.record(Command::GetCharacteristic(offset)).map_err(LookupError::Stack)?;
        element(self.characteristics.lock().unwrap().as_slice(), offset)
    }

    fn get_descriptor(
        &self,
        _gatt_if: GattIf,
        _conn_id: ConnId,
        _char_handle: u16,
        offset: u16,
    ) -> Result<DescriptorElement, LookupError<Self::Error>> {
        self.record(Command::GetDescriptor(offset)).map_err(LookupError::Stack)?;
        element(self.descriptors.lock().unwrap().as_slice(), offset)
    }
}
