//! A blocking, dual-role BLE manager.
//!
//! The manager sits between a single foreground consumer and an asynchronous, callback-driven BLE
//! stack. The consumer calls the operations on [`BleManager`]; the stack's callback context
//! reports completions through the `on_*` event inputs. Attribute creation calls block until the
//! matching completion arrives, everything else returns as soon as the stack accepted the command.
#![cfg_attr(not(test), no_std)]

use bt_hci::param::{AddrKind, BdAddr};

mod fmt;

pub mod advertise;
pub mod config;
pub mod connection_tracker;
pub mod lifecycle;
pub mod manager;
pub mod outbox;
pub mod rendezvous;
pub mod request_table;
pub mod scan;
pub mod stack;
pub mod types;

#[cfg(test)]
mod mock_stack;

pub use bt_hci::param::{AddrKind as AddressKind, BdAddr as DeviceAddress};
pub use lifecycle::Lifecycle;
pub use manager::BleManager;
pub use stack::BleStack;
pub use types::gatt::GattStatus;
pub use types::uuid::Uuid;

/// A BLE device address together with its address type.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Address {
    /// Public or random.
    pub kind: AddrKind,
    /// The 6 address bytes.
    pub addr: BdAddr,
}

impl Address {
    /// Create a new public address.
    pub fn public(val: [u8; 6]) -> Self {
        Self {
            kind: AddrKind::PUBLIC,
            addr: BdAddr::new(val),
        }
    }

    /// Create a new random address.
    pub fn random(val: [u8; 6]) -> Self {
        Self {
            kind: AddrKind::RANDOM,
            addr: BdAddr::new(val),
        }
    }
}

/// Errors raised by the manager itself, before or after talking to the stack.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The stack completed an attribute operation with a non-success status.
    Status(GattStatus),
    /// A response referenced a handle that does not match the outstanding request.
    HandleMismatch {
        /// Handle of the outstanding request, if any.
        expected: Option<u16>,
        /// Handle given by the caller.
        actual: u16,
    },
    /// Payload is larger than the stack accepts.
    PayloadTooLarge {
        /// Payload length.
        len: usize,
        /// Largest accepted length.
        max: usize,
    },
    /// Enumeration exhausted: no element at this offset or in this range.
    NotFound,
    /// The operation needs a connected peer and there is none.
    NotConnected,
    /// The operation is not allowed in the current lifecycle state.
    InvalidState(Lifecycle),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Status(status) => write!(f, "attribute operation completed with status {}", status),
            Error::HandleMismatch {
                expected: Some(expected),
                actual,
            } => write!(f, "no outstanding request on handle {} (pending: {})", actual, expected),
            Error::HandleMismatch { expected: None, actual } => {
                write!(f, "no outstanding request on handle {}", actual)
            }
            Error::PayloadTooLarge { len, max } => write!(f, "payload of {} bytes exceeds {} bytes", len, max),
            Error::NotFound => f.write_str("not found"),
            Error::NotConnected => f.write_str("no connected peer"),
            Error::InvalidState(state) => write!(f, "not allowed while {:?}", state),
        }
    }
}

/// Error type returned by [`BleManager`] operations.
#[derive(Debug, PartialEq)]
pub enum BleManagerError<E> {
    /// The stack refused the command.
    Stack(E),
    /// The manager rejected or failed the operation.
    Manager(Error),
}

impl<E> From<Error> for BleManagerError<E> {
    fn from(value: Error) -> Self {
        Self::Manager(value)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for BleManagerError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BleManagerError::Stack(e) => write!(f, "stack error: {:?}", e),
            BleManagerError::Manager(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for BleManagerError<E>
where
    E: defmt::Format,
{
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            BleManagerError::Stack(e) => {
                defmt::write!(fmt, "Stack({})", e)
            }
            BleManagerError::Manager(e) => {
                defmt::write!(fmt, "Manager({})", e)
            }
        }
    }
}
