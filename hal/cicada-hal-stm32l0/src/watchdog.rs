//! Independent watchdog (IWDG)
//!
//! Clocked from the ~37 kHz LSI; once started it cannot be stopped, only
//! fed. Registers per RM0376: the key register gates all configuration.

use core::ptr;

use cicada_hal::system::Watchdog;

const IWDG_BASE: u32 = 0x4000_3000;

const IWDG_KR: *mut u32 = IWDG_BASE as *mut u32;
const IWDG_PR: *mut u32 = (IWDG_BASE + 0x04) as *mut u32;
const IWDG_RLR: *mut u32 = (IWDG_BASE + 0x08) as *mut u32;
const IWDG_SR: *const u32 = (IWDG_BASE + 0x0C) as *const u32;

const KEY_ACCESS: u32 = 0x5555;
const KEY_RELOAD: u32 = 0xAAAA;
const KEY_START: u32 = 0xCCCC;

/// Nominal LSI frequency
const LSI_HZ: u64 = 37_000;

const MAX_RELOAD: u64 = 0x1000;

/// Independent watchdog handle
pub struct Iwdg {
    _priv: (),
}

impl Iwdg {
    pub const fn new() -> Self {
        Self { _priv: () }
    }
}

impl Default for Iwdg {
    fn default() -> Self {
        Self::new()
    }
}

impl Watchdog for Iwdg {
    fn start(&mut self, timeout_ms: u32) {
        let (prescaler, reload) = timing(timeout_ms);

        unsafe {
            ptr::write_volatile(IWDG_KR, KEY_ACCESS);
            ptr::write_volatile(IWDG_PR, u32::from(prescaler));
            ptr::write_volatile(IWDG_RLR, u32::from(reload));
            // Wait for the register updates to propagate to the LSI domain
            while ptr::read_volatile(IWDG_SR) != 0 {}
            ptr::write_volatile(IWDG_KR, KEY_RELOAD);
            ptr::write_volatile(IWDG_KR, KEY_START);
        }
    }

    fn feed(&mut self) {
        unsafe { ptr::write_volatile(IWDG_KR, KEY_RELOAD) };
    }
}

/// Pick the smallest prescaler that fits `timeout_ms` in the 12-bit
/// reload counter
///
/// Returns the PR field value and the RLR reload value. Timeouts beyond
/// the hardware maximum (~28 s) saturate.
fn timing(timeout_ms: u32) -> (u8, u16) {
    let ticks = u64::from(timeout_ms) * LSI_HZ / 1000;

    for pr in 0u8..=6 {
        let divider = 4u64 << pr;
        let reload = ticks.div_ceil(divider);
        if reload <= MAX_RELOAD {
            return (pr, reload.max(1) as u16 - 1);
        }
    }

    (6, (MAX_RELOAD - 1) as u16)
}
