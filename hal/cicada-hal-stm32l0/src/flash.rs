//! Main-flash geometry and validated erase/program wrappers
//!
//! The erase/program engine is the system library's, reached through the
//! [`MainFlash`] contract; these wrappers add the range/alignment checks
//! from `cicada-core::flashmap` and the unlock/lock bracketing.

use core::ops::Range;

use cicada_core::flashmap::{self, FLASH_BASE};
use cicada_hal::flash::{FlashError, MainFlash};

/// Main flash size for the selected chip variant
#[cfg(feature = "stm32l052")]
pub const FLASH_SIZE: u32 = 64 * 1024; // 64KB single bank
#[cfg(all(
    any(feature = "stm32l072", feature = "stm32l082"),
    not(feature = "stm32l052")
))]
pub const FLASH_SIZE: u32 = 192 * 1024; // 192KB dual bank
#[cfg(not(any(feature = "stm32l052", feature = "stm32l072", feature = "stm32l082")))]
pub const FLASH_SIZE: u32 = 192 * 1024; // Default

/// The main flash array
pub const MAIN_FLASH: Range<u32> = FLASH_BASE..FLASH_BASE + FLASH_SIZE;

/// Base of the second bank on dual-bank parts
pub const BANK2_BASE: u32 = FLASH_BASE + FLASH_SIZE / 2;

/// Erase `count` bytes starting at `address`
///
/// The count is rounded up to whole half-pages; the address must sit on a
/// half-page boundary and the extent stay inside the array. Locks are
/// closed again whatever the outcome.
pub fn erase(flash: &mut impl MainFlash, address: u32, count: u32) -> Result<(), FlashError> {
    let count = flashmap::erase_extent(&MAIN_FLASH, address, count)?;

    if !flash.unlock() {
        return Err(FlashError::Locked);
    }
    let result = flash.erase(address, count);
    flash.lock();

    result
}

/// Program `data` starting at `address`
///
/// Address and length must be word aligned and in bounds. Programming
/// nothing is a successful no-op that never touches the locks.
pub fn program(flash: &mut impl MainFlash, address: u32, data: &[u8]) -> Result<(), FlashError> {
    flashmap::check_program(&MAIN_FLASH, address, data.len() as u32)?;

    if data.is_empty() {
        return Ok(());
    }

    if !flash.unlock() {
        return Err(FlashError::Locked);
    }
    let result = flash.program(address, data);
    flash.lock();

    result
}
