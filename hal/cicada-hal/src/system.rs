//! System-level collaborator traits
//!
//! Clock-tree configuration, low-power entry and the debug-port switches
//! are properties of the chip's system library; the wrappers in the chip
//! HAL only sequence calls into it. This trait captures that seam.

/// Low-power and debug-port operations provided by the system library
pub trait SystemOps {
    /// Enter sleep (core clock gated, peripherals running) for up to
    /// `timeout_ms` milliseconds, or until a wakeup event
    fn sleep(&mut self, timeout_ms: u32);

    /// Enter deep sleep (regulator in low-power mode, most clocks stopped)
    fn deepsleep(&mut self, timeout_ms: u32);

    /// Enter standby; returns only if entry was refused
    fn standby(&mut self, timeout_ms: u32);

    /// Post an application wakeup event
    fn wakeup(&mut self);

    /// Reconfigure the bus clocks
    ///
    /// Returns false if the clock tree rejects the combination; the
    /// frequency math is the system library's, not ours.
    fn configure_clocks(&mut self, hclk: u32, pclk1: u32, pclk2: u32) -> bool;

    /// Enable the SWD debug port pins
    fn swd_enable(&mut self);

    /// Disable the SWD debug port pins (reclaims them as GPIO, required
    /// before the lowest-power modes)
    fn swd_disable(&mut self);
}

/// Independent watchdog
///
/// Once started the watchdog cannot be stopped; `feed` must be called
/// within the configured timeout or the chip resets.
pub trait Watchdog {
    /// Start the watchdog with the given timeout in milliseconds
    fn start(&mut self, timeout_ms: u32);

    /// Reload the watchdog counter
    fn feed(&mut self);
}
