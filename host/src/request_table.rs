//! Correlation of incoming server requests with the responses sent back.
use crate::Error;

/// An incoming request waiting for its response.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    /// Attribute the request targets.
    pub handle: u16,
    /// Transaction id to echo in the response.
    pub trans_id: u32,
}

/// One outstanding request. A second request before the first is answered replaces it.
#[derive(Debug, Default)]
pub struct RequestSlot {
    pending: Option<PendingRequest>,
}

impl RequestSlot {
    /// Create an empty slot.
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Record an incoming request.
    pub fn record(&mut self, handle: u16, trans_id: u32) {
        if let Some(lost) = self.pending.replace(PendingRequest { handle, trans_id }) {
            warn!(
                "[requests] unanswered request on handle {} (trans_id {}) replaced",
                lost.handle, lost.trans_id
            );
        }
    }

    /// Record one chunk of a prepared write.
    ///
    /// Chunks for the handle already pending only refresh its transaction id.
    pub fn record_chunk(&mut self, handle: u16, trans_id: u32) {
        match self.pending.as_mut() {
            Some(pending) if pending.handle == handle => pending.trans_id = trans_id,
            _ => self.record(handle, trans_id),
        }
    }

    /// Consume the request on `handle`, returning its transaction id.
    ///
    /// On a mismatch the slot is left untouched.
    pub fn try_take(&mut self, handle: u16) -> Result<u32, Error> {
        match self.pending {
            Some(pending) if pending.handle == handle => {
                self.pending = None;
                Ok(pending.trans_id)
            }
            other => Err(Error::HandleMismatch {
                expected: other.map(|p| p.handle),
                actual: handle,
            }),
        }
    }

    /// Replace the transaction id of the outstanding request, returning its handle.
    ///
    /// An execute-write arrives with its own transaction id for the handle prepared earlier.
    pub fn retag(&mut self, trans_id: u32) -> Option<u16> {
        let pending = self.pending.as_mut()?;
        pending.trans_id = trans_id;
        Some(pending.handle)
    }

    /// The outstanding request, if any.
    pub fn pending(&self) -> Option<PendingRequest> {
        self.pending
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}

/// Outstanding requests, one per request class.
#[derive(Debug, Default)]
pub struct RequestTable {
    /// Read, write and prepare-write requests.
    pub attribute: RequestSlot,
    /// Prepared writes awaiting execution.
    pub prepare_write: RequestSlot,
}

impl RequestTable {
    pub const fn new() -> Self {
        Self {
            attribute: RequestSlot::new(),
            prepare_write: RequestSlot::new(),
        }
    }

    /// Drop every outstanding request.
    pub fn clear(&mut self) {
        self.attribute.clear();
        self.prepare_write.clear();
    }
}
