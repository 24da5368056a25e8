//! Connection state across GAP/GATT events.
//!
//! The stack reports a bare device address when a link comes up. When the link is the one we
//! initiated with `connect`, the address type recorded then is adopted. Otherwise the peer type is
//! unknown and assumed to be public. That guess is a best-effort heuristic, not something the
//! protocol guarantees: a peer with a random address that connects to us is recorded as public.
use bt_hci::param::BdAddr;

use crate::types::gatt::ConnId;
use crate::Address;

/// How the address type of a newly connected peer was determined.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// The peer is the one being connected to, its recorded address type was adopted.
    Adopted(Address),
    /// The peer was not being connected to, the address type was assumed public.
    Inferred(Address),
}

impl Resolution {
    /// The resolved peer address.
    pub fn address(&self) -> Address {
        match self {
            Resolution::Adopted(addr) | Resolution::Inferred(addr) => *addr,
        }
    }
}

/// Connecting and connected peer.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    connecting: Option<Address>,
    connected: Option<(Address, ConnId)>,
}

impl ConnectionTracker {
    /// Create a tracker with no peer.
    pub const fn new() -> Self {
        Self {
            connecting: None,
            connected: None,
        }
    }

    /// Record the peer of an outgoing connection attempt.
    pub fn begin_connecting(&mut self, peer: Address) {
        if let Some(previous) = self.connecting.replace(peer) {
            debug!("[tracker] connection attempt to {:?} superseded", previous.addr);
        }
    }

    /// A link to `addr` came up with id `conn_id`.
    ///
    /// A pending connection attempt to another peer stays pending.
    pub fn connect_succeeded(&mut self, conn_id: ConnId, addr: BdAddr) -> Resolution {
        let resolution = match self.connecting {
            Some(peer) if peer.addr == addr => {
                self.connecting = None;
                Resolution::Adopted(peer)
            }
            _ => Resolution::Inferred(Address {
                kind: bt_hci::param::AddrKind::PUBLIC,
                addr,
            }),
        };
        self.connected = Some((resolution.address(), conn_id));
        resolution
    }

    /// The outgoing connection attempt failed.
    pub fn connect_failed(&mut self) {
        self.connecting = None;
    }

    /// The connected peer went away.
    pub fn disconnected(&mut self) {
        self.connected = None;
    }

    /// Peer of the pending connection attempt.
    pub fn connecting(&self) -> Option<Address> {
        self.connecting
    }

    /// Connected peer.
    pub fn connected(&self) -> Option<Address> {
        self.connected.map(|(addr, _)| addr)
    }

    /// Id of the connected link.
    pub fn conn_id(&self) -> Option<ConnId> {
        self.connected.map(|(_, id)| id)
    }

    /// Forget both peers.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
