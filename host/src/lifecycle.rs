//! Enable/disable state machine.
use crate::Error;

/// Lifecycle of the underlying stack.
///
/// `Faulted` is entered when bring-up or teardown fails partway. The stack is then in an unknown
/// state and must not be enabled again without a full controller reset; `disable` is still allowed.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Stack down.
    #[default]
    Disabled,
    /// Bring-up in progress.
    Enabling,
    /// Stack up.
    Enabled,
    /// Teardown in progress.
    Disabling,
    /// Bring-up or teardown failed partway.
    Faulted,
}

impl Lifecycle {
    /// Enter `Enabling`. Only allowed from `Disabled`.
    pub fn start_enable(&mut self) -> Result<(), Error> {
        match self {
            Lifecycle::Disabled => {
                *self = Lifecycle::Enabling;
                Ok(())
            }
            other => Err(Error::InvalidState(*other)),
        }
    }

    /// Leave `Enabling`.
    pub fn finish_enable(&mut self, ok: bool) {
        *self = if ok { Lifecycle::Enabled } else { Lifecycle::Faulted };
    }

    /// Enter `Disabling`. Allowed from every state.
    ///
    /// Returns `false` when the stack is already down and there is nothing to tear down.
    pub fn start_disable(&mut self) -> bool {
        if *self == Lifecycle::Disabled {
            return false;
        }
        *self = Lifecycle::Disabling;
        true
    }

    /// Leave `Disabling`.
    pub fn finish_disable(&mut self, ok: bool) {
        *self = if ok { Lifecycle::Disabled } else { Lifecycle::Faulted };
    }

    pub fn is_enabled(&self) -> bool {
        *self == Lifecycle::Enabled
    }
}
