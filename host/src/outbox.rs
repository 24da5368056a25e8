//! Handle of the last notification or indication handed to the stack.

/// Single-slot record of the attribute most recently notified or indicated.
#[derive(Debug, Default)]
pub struct NotificationOutbox {
    handle: Option<u16>,
}

impl NotificationOutbox {
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Record a dispatched notification, replacing any unread one.
    pub fn mark_sent(&mut self, handle: u16) {
        self.handle = Some(handle);
    }

    /// Return and clear the recorded handle.
    pub fn take(&mut self) -> Option<u16> {
        self.handle.take()
    }

    /// Undo `mark_sent(handle)` after the stack refused the dispatch.
    ///
    /// A slot holding another handle is left alone.
    pub fn rollback(&mut self, handle: u16) {
        if self.handle == Some(handle) {
            self.handle = None;
        }
    }

    pub fn reset(&mut self) {
        self.handle = None;
    }
}
