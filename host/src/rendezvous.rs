//! Rendezvous between an attribute creation call and its completion event.
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;

use crate::types::gatt::GattStatus;

/// Result of an attribute creation, as reported by the stack.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Created {
    /// Completion status.
    pub status: GattStatus,
    /// Handle of the created attribute, meaningless unless `status` is OK.
    pub handle: u16,
}

/// Single slot handing one creation result from the stack's callback context to the blocked caller.
///
/// At most one creation may be in flight: `arm` before issuing the command, then `await_result`.
/// There is no timeout. A stack that never completes the command blocks the caller forever.
pub struct AttributeRendezvous<M: RawMutex> {
    signal: Signal<M, Created>,
}

impl<M: RawMutex> Default for AttributeRendezvous<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> AttributeRendezvous<M> {
    /// Create an idle rendezvous.
    pub const fn new() -> Self {
        Self { signal: Signal::new() }
    }

    /// Prepare for one outstanding creation, dropping any result nobody waited for.
    pub fn arm(&self) {
        self.signal.reset();
    }

    /// Store the result and release the waiter.
    pub fn complete(&self, status: GattStatus, handle: u16) {
        self.signal.signal(Created { status, handle });
    }

    /// Wait for the result.
    pub async fn wait(&self) -> Created {
        self.signal.wait().await
    }

    /// Block the calling context until the result is available.
    ///
    /// This busy-polls the signal. On a priority-scheduled target the caller must not outrank the
    /// context that calls [`complete`](Self::complete), or it starves it. Async callers use
    /// [`wait`](Self::wait) instead.
    pub fn await_result(&self) -> Created {
        embassy_futures::block_on(self.wait())
    }

    /// Drop any stored result.
    pub fn reset(&self) {
        self.signal.reset();
    }
}
