//! Configuration.
//!
//! Limits imposed by the stack are compile-time constants. Procedure parameters have defaults and
//! can be overridden at runtime through [`ManagerConfig`].
use crate::advertise::AdvParams;
use crate::scan::ScanParams;
use crate::types::security::SecurityConfig;

/// Largest attribute value accepted by the stack.
///
/// Writes, notifications, read responses and prepare-write responses carrying more than this are
/// rejected before anything is sent.
///
/// Default: 512.
pub const MAX_ATTR_LEN: usize = 512;

/// Largest legacy advertising payload.
///
/// Default: 31.
pub const MAX_ADV_DATA_LEN: usize = 31;

/// Convert milliseconds to scan or advertising interval units of 0.625 ms.
pub const fn interval_from_millis(ms: u32) -> u16 {
    let units = ms as u64 * 1000 / 625;
    if units > u16::MAX as u64 {
        u16::MAX
    } else {
        units as u16
    }
}

/// Runtime configuration of a [`BleManager`](crate::BleManager).
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, Default)]
pub struct ManagerConfig {
    /// Used by `start_scan`.
    pub scan: ScanParams,
    /// Used by `start_adv`.
    pub adv: AdvParams,
    /// Applied by `enable` and used by `send_pair_request`.
    pub security: SecurityConfig,
}
