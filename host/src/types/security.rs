//! Pairing and encryption parameters.
use super::capabilities::IoCapabilities;

/// Authentication requirements requested during pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AuthReq {
    /// No bonding.
    NoBond,
    /// Bond with the peer, keys are distributed and kept by the stack.
    Bond,
    /// MITM protection without bonding.
    Mitm,
    /// Bonding with MITM protection.
    BondMitm,
    /// LE secure connections with bonding.
    SecureConnBond,
    /// LE secure connections with bonding and MITM protection.
    SecureConnBondMitm,
}

impl From<AuthReq> for u8 {
    fn from(val: AuthReq) -> u8 {
        match val {
            AuthReq::NoBond => 0x00,
            AuthReq::Bond => 0x01,
            AuthReq::Mitm => 0x04,
            AuthReq::BondMitm => 0x05,
            AuthReq::SecureConnBond => 0x09,
            AuthReq::SecureConnBondMitm => 0x0d,
        }
    }
}

/// Encryption level requested when starting encryption on a link.
///
/// If the peer is already bonded the stack checks the stored long term key instead of pairing again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecurityAction {
    /// Encryption, MITM protection decided by the stack.
    Encrypt,
    /// Encryption without MITM protection.
    EncryptNoMitm,
    /// Encryption with MITM protection.
    EncryptMitm,
}

/// One security manager parameter, configured once when the stack is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecurityParam {
    /// Local I/O capabilities.
    IoCapabilities(IoCapabilities),
    /// Authentication requirements.
    AuthReq(AuthReq),
}

/// Security configuration used by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SecurityConfig {
    /// I/O capabilities set at enable time.
    pub io_capabilities: IoCapabilities,
    /// Authentication requirements set at enable time.
    pub auth_req: AuthReq,
    /// Action used by pair requests.
    pub action: SecurityAction,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            io_capabilities: IoCapabilities::NoInputNoOutput,
            auth_req: AuthReq::Bond,
            action: SecurityAction::EncryptMitm,
        }
    }
}

impl SecurityConfig {
    /// Parameters in the order they are applied by `enable()`.
    pub fn params(&self) -> [SecurityParam; 2] {
        [
            SecurityParam::IoCapabilities(self.io_capabilities),
            SecurityParam::AuthReq(self.auth_req),
        ]
    }
}
