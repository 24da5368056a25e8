//! GATT identifiers, status codes and attribute records.
use core::fmt::Display;

use heapless::Vec;

use crate::config::MAX_ATTR_LEN;
use crate::types::uuid::Uuid;
use crate::Error;

/// Interface id assigned by the stack when the GATT server or client application registers.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GattIf(pub u8);

impl GattIf {
    /// No interface registered.
    pub const NONE: Self = Self(0xff);
}

/// Connection id assigned by the stack to an established link.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnId(pub u16);

/// Status reported by the stack for attribute operations and sent back in server responses.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GattStatus {
    value: u8,
}

impl GattStatus {
    /// Success
    pub const OK: Self = Self { value: 0x00 };
    /// Attempted to use a handle that isn't valid on this server
    pub const INVALID_HANDLE: Self = Self { value: 0x01 };
    /// The attribute cannot be read
    pub const READ_NOT_PERMITTED: Self = Self { value: 0x02 };
    /// The attribute cannot be written
    pub const WRITE_NOT_PERMITTED: Self = Self { value: 0x03 };
    /// The attribute requires authentication before it can be read or written
    pub const INSUFFICIENT_AUTHENTICATION: Self = Self { value: 0x05 };
    /// The request is not supported
    pub const REQUEST_NOT_SUPPORTED: Self = Self { value: 0x06 };
    /// Offset specified was past the end of the attribute
    pub const INVALID_OFFSET: Self = Self { value: 0x07 };
    /// Too many prepare writes have been queued
    pub const PREPARE_QUEUE_FULL: Self = Self { value: 0x09 };
    /// No attribute found within the given attribute handle range
    pub const NOT_FOUND: Self = Self { value: 0x0a };
    /// The attribute value length is invalid for the operation
    pub const INVALID_ATTRIBUTE_LENGTH: Self = Self { value: 0x0d };
    /// The stack ran out of resources
    pub const NO_RESOURCES: Self = Self { value: 0x80 };
    /// Internal stack error
    pub const INTERNAL_ERROR: Self = Self { value: 0x81 };
    /// The attribute database is full
    pub const DB_FULL: Self = Self { value: 0x83 };
    /// Generic error
    pub const ERROR: Self = Self { value: 0x85 };
    /// The service was already started
    pub const SERVICE_STARTED: Self = Self { value: 0x8c };

    /// Wrap a raw status code.
    pub const fn new(value: u8) -> Self {
        Self { value }
    }

    /// Raw status code.
    pub const fn raw(&self) -> u8 {
        self.value
    }

    /// True for [`GattStatus::OK`].
    pub const fn is_ok(&self) -> bool {
        self.value == Self::OK.value
    }
}

impl Display for GattStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            Self::OK => f.write_str("ok"),
            Self::INVALID_HANDLE => f.write_str("invalid handle"),
            Self::READ_NOT_PERMITTED => f.write_str("read not permitted"),
            Self::WRITE_NOT_PERMITTED => f.write_str("write not permitted"),
            Self::INSUFFICIENT_AUTHENTICATION => f.write_str("insufficient authentication"),
            Self::REQUEST_NOT_SUPPORTED => f.write_str("request not supported"),
            Self::INVALID_OFFSET => f.write_str("invalid offset"),
            Self::PREPARE_QUEUE_FULL => f.write_str("prepare queue full"),
            Self::NOT_FOUND => f.write_str("attribute not found"),
            Self::INVALID_ATTRIBUTE_LENGTH => f.write_str("invalid attribute value length"),
            Self::NO_RESOURCES => f.write_str("no resources"),
            Self::INTERNAL_ERROR => f.write_str("internal error"),
            Self::DB_FULL => f.write_str("attribute database full"),
            Self::ERROR => f.write_str("error"),
            Self::SERVICE_STARTED => f.write_str("service already started"),
            other => write!(f, "unknown status 0x{:02x}", other.value),
        }
    }
}

/// Attribute access permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributePermission {
    /// Readable.
    Read = 1 << 0,
    /// Readable over an encrypted link.
    ReadEncrypted = 1 << 1,
    /// Readable over an encrypted, MITM-protected link.
    ReadEncryptedMitm = 1 << 2,
    /// Writable.
    Write = 1 << 4,
    /// Writable over an encrypted link.
    WriteEncrypted = 1 << 5,
    /// Writable over an encrypted, MITM-protected link.
    WriteEncryptedMitm = 1 << 6,
}

/// Set of [`AttributePermission`]s.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AttributePermissions(pub u16);

impl<const T: usize> From<[AttributePermission; T]> for AttributePermissions {
    fn from(perms: [AttributePermission; T]) -> Self {
        let mut val: u16 = 0;
        for perm in perms {
            val |= perm as u16;
        }
        AttributePermissions(val)
    }
}

impl AttributePermissions {
    /// Check if any of the permissions are set.
    pub fn any(&self, perms: &[AttributePermission]) -> bool {
        perms.iter().any(|p| (*p as u16) & self.0 != 0)
    }
}

/// Characteristic properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicProp {
    /// Broadcast
    Broadcast = 0x01,
    /// Read
    Read = 0x02,
    /// Write without response
    WriteWithoutResponse = 0x04,
    /// Write
    Write = 0x08,
    /// Notify
    Notify = 0x10,
    /// Indicate
    Indicate = 0x20,
    /// Authenticated writes
    AuthenticatedWrite = 0x40,
    /// Extended properties
    Extended = 0x80,
}

/// Set of [`CharacteristicProp`]s.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicProps(pub u8);

impl<const T: usize> From<[CharacteristicProp; T]> for CharacteristicProps {
    fn from(props: [CharacteristicProp; T]) -> Self {
        let mut val: u8 = 0;
        for prop in props {
            val |= prop as u8;
        }
        CharacteristicProps(val)
    }
}

impl CharacteristicProps {
    /// Check if any of the properties are set.
    pub fn any(&self, props: &[CharacteristicProp]) -> bool {
        props.iter().any(|p| (*p as u8) & self.0 != 0)
    }
}

/// Who answers read and write requests on a created attribute.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrControl {
    /// The stack answers from its own copy of the value.
    AutoResponse,
    /// Requests are forwarded and answered through `send_response`.
    ResponseByApp,
}

/// Identity of a service to create.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceId {
    /// Service UUID.
    pub uuid: Uuid,
    /// Instance id, distinguishes services sharing a UUID.
    pub inst_id: u8,
    /// Primary or secondary service.
    pub is_primary: bool,
}

/// A GATT service to create on the local server.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    /// Service UUID.
    pub uuid: Uuid,
    /// Number of characteristics that will be added to this service.
    pub num_characteristics: u8,
    /// Number of descriptors that will be added to this service.
    pub num_descriptors: u8,
    /// Handle assigned by the stack, set by `add_service`.
    pub handle: u16,
}

impl Service {
    /// Create a new service description. The handle is assigned when the service is added.
    pub fn new<U: Into<Uuid>>(uuid: U, num_characteristics: u8, num_descriptors: u8) -> Self {
        Self {
            uuid: uuid.into(),
            num_characteristics,
            num_descriptors,
            handle: 0,
        }
    }

    /// Number of attribute handles to reserve for this service.
    ///
    /// One for the service declaration, two per characteristic (declaration and value) and one per
    /// descriptor.
    pub fn num_handles(&self) -> u16 {
        1 + 2 * self.num_characteristics as u16 + self.num_descriptors as u16
    }
}

/// A characteristic to add to a local service.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Characteristic {
    /// Characteristic UUID.
    pub uuid: Uuid,
    /// Value permissions.
    pub permissions: AttributePermissions,
    /// Characteristic properties.
    pub properties: CharacteristicProps,
    /// Handle of the value attribute, set by `add_characteristic`.
    pub value_handle: u16,
}

impl Characteristic {
    /// Create a new characteristic description.
    pub fn new<U, P, Q>(uuid: U, permissions: P, properties: Q) -> Self
    where
        U: Into<Uuid>,
        P: Into<AttributePermissions>,
        Q: Into<CharacteristicProps>,
    {
        Self {
            uuid: uuid.into(),
            permissions: permissions.into(),
            properties: properties.into(),
            value_handle: 0,
        }
    }
}

/// A descriptor to add to the most recently added characteristic.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Descriptor UUID.
    pub uuid: Uuid,
    /// Descriptor permissions.
    pub permissions: AttributePermissions,
    /// Handle assigned by the stack, set by `add_descriptor`.
    pub handle: u16,
}

impl Descriptor {
    /// Create a new descriptor description.
    pub fn new<U: Into<Uuid>, P: Into<AttributePermissions>>(uuid: U, permissions: P) -> Self {
        Self {
            uuid: uuid.into(),
            permissions: permissions.into(),
            handle: 0,
        }
    }
}

/// Attribute value carried in a server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrValue {
    /// Attribute handle.
    pub handle: u16,
    /// Offset of the value, non-zero for prepared writes.
    pub offset: u16,
    /// Value bytes.
    pub value: Vec<u8, MAX_ATTR_LEN>,
}

impl AttrValue {
    /// Copy `value` into a response, failing if it exceeds [`MAX_ATTR_LEN`].
    pub fn new(handle: u16, offset: u16, value: &[u8]) -> Result<Self, Error> {
        let value = Vec::from_slice(value).map_err(|_| Error::PayloadTooLarge {
            len: value.len(),
            max: MAX_ATTR_LEN,
        })?;
        Ok(Self { handle, offset, value })
    }
}

/// Write procedure used by the GATT client.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteType {
    /// Write request, acknowledged by the server.
    WithResponse,
    /// Write command, not acknowledged.
    WithoutResponse,
}

/// Class of attributes to count in the client's cached view of a peer's database.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbAttrKind {
    /// Every attribute.
    All,
    /// Characteristic attributes only.
    Characteristic,
}

/// Whether a remote handle is a characteristic value or a descriptor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    /// Characteristic value.
    Characteristic,
    /// Characteristic descriptor.
    Descriptor,
}

/// A characteristic found in a peer's database.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicElement {
    /// Value handle.
    pub char_handle: u16,
    /// Characteristic properties.
    pub properties: CharacteristicProps,
    /// Characteristic UUID.
    pub uuid: Uuid,
}

/// A descriptor found in a peer's database.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorElement {
    /// Descriptor handle.
    pub handle: u16,
    /// Descriptor UUID.
    pub uuid: Uuid,
}
