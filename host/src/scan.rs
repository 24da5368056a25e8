//! Scan parameters.
pub use bt_hci::param::{AddrKind, LeScanKind, ScanningFilterPolicy};

use crate::config::interval_from_millis;

/// Parameters applied by `start_scan` before scanning starts.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy)]
pub struct ScanParams {
    /// Active scanning sends scan requests to advertisers.
    pub scan_type: LeScanKind,
    /// Own address type used in scan requests.
    pub own_addr_kind: AddrKind,
    /// Which advertisers are reported.
    pub filter_policy: ScanningFilterPolicy,
    /// Scan interval in units of 0.625 ms.
    pub interval: u16,
    /// Scan window in units of 0.625 ms.
    pub window: u16,
    /// Drop duplicate advertising reports.
    pub filter_duplicates: bool,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            scan_type: LeScanKind::Active,
            own_addr_kind: AddrKind::PUBLIC,
            filter_policy: ScanningFilterPolicy::BasicUnfiltered,
            interval: interval_from_millis(100),
            window: interval_from_millis(50),
            filter_duplicates: false,
        }
    }
}
