//! Advertising parameters.
pub use bt_hci::param::{AddrKind, AdvChannelMap, AdvFilterPolicy, AdvKind};

use crate::config::interval_from_millis;

/// Parameters applied by `start_adv` once the advertising payload is configured.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Copy, Clone, Debug)]
pub struct AdvParams {
    /// Minimum advertising interval in units of 0.625 ms.
    pub interval_min: u16,
    /// Maximum advertising interval in units of 0.625 ms.
    pub interval_max: u16,
    /// Advertising PDU type.
    pub adv_type: AdvKind,
    /// Own address type.
    pub own_addr_kind: AddrKind,
    pub channel_map: AdvChannelMap,
    pub filter_policy: AdvFilterPolicy,
}

impl Default for AdvParams {
    fn default() -> Self {
        Self {
            interval_min: interval_from_millis(150),
            interval_max: interval_from_millis(150),
            adv_type: AdvKind::AdvInd,
            own_addr_kind: AddrKind::PUBLIC,
            channel_map: AdvChannelMap::ALL,
            filter_policy: AdvFilterPolicy::default(),
        }
    }
}
