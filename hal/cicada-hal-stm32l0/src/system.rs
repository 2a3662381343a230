//! System-level wrappers
//!
//! Low-power entry and debug-port handling sit on top of the system
//! library's [`SystemOps`]. The one piece of logic owned here is the SWD
//! bookkeeping: the debug pins burn tens of microamps in stop mode, so the
//! first sleep entry disables them unless the application explicitly
//! pinned them on.

use cicada_hal::system::SystemOps;

/// Full system reset; never returns
pub fn reset() -> ! {
    cortex_m::peripheral::SCB::sys_reset()
}

/// Default power behavior between events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerPolicy {
    /// Stay running
    #[default]
    Run,
    /// Sleep whenever idle
    Sleep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwdState {
    /// Power-on default: pins active, no decision made yet
    Untouched,
    Enabled,
    Disabled,
    /// Application demands a live debug port; sleep entry must not touch it
    Pinned,
}

/// System facade owning the power-save policy and SWD bookkeeping
pub struct System<S> {
    ops: S,
    policy: PowerPolicy,
    swd: SwdState,
}

impl<S: SystemOps> System<S> {
    pub fn new(ops: S) -> Self {
        Self {
            ops,
            policy: PowerPolicy::Run,
            swd: SwdState::Untouched,
        }
    }

    /// Sleep when idle
    pub fn enable_power_save(&mut self) {
        self.policy = PowerPolicy::Sleep;
    }

    /// Stay running when idle
    pub fn disable_power_save(&mut self) {
        self.policy = PowerPolicy::Run;
    }

    pub fn policy(&self) -> PowerPolicy {
        self.policy
    }

    /// Enter sleep for up to `timeout_ms` milliseconds
    ///
    /// First entry disables the SWD pins unless they are pinned on.
    pub fn sleep(&mut self, timeout_ms: u32) {
        self.disarm_swd();
        self.ops.sleep(timeout_ms);
    }

    /// Enter deep sleep for up to `timeout_ms` milliseconds
    pub fn deepsleep(&mut self, timeout_ms: u32) {
        self.disarm_swd();
        self.ops.deepsleep(timeout_ms);
    }

    /// Enter standby; wakeup is a reset
    pub fn standby(&mut self, timeout_ms: u32) {
        self.ops.standby(timeout_ms);
    }

    /// Post an application wakeup event
    pub fn wakeup(&mut self) {
        self.ops.wakeup();
    }

    /// Reconfigure the bus clocks
    pub fn configure_clocks(&mut self, hclk: u32, pclk1: u32, pclk2: u32) -> bool {
        self.ops.configure_clocks(hclk, pclk1, pclk2)
    }

    /// Re-enable the SWD pins
    pub fn swd_enable(&mut self) {
        if self.swd != SwdState::Pinned {
            self.ops.swd_enable();
            self.swd = SwdState::Enabled;
        }
    }

    /// Disable the SWD pins
    pub fn swd_disable(&mut self) {
        if self.swd != SwdState::Pinned {
            self.ops.swd_disable();
            self.swd = SwdState::Disabled;
        }
    }

    /// Keep the SWD pins alive across sleep entry (debugger attached)
    pub fn pin_swd(&mut self) {
        self.ops.swd_enable();
        self.swd = SwdState::Pinned;
    }

    fn disarm_swd(&mut self) {
        if self.swd == SwdState::Untouched {
            self.ops.swd_disable();
            self.swd = SwdState::Disabled;
        }
    }
}
