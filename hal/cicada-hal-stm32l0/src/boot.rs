//! Boot-control entry points
//!
//! Two ways into new firmware: flipping the boot-bank option bit so the
//! chip boots the other bank's image, and wiping the application images so
//! the ROM bootloader takes over on the next reset.

use cicada_core::flashmap::HALF_PAGE_SIZE;
use cicada_core::optbyte::OptionBytes;
use cicada_hal::flash::{FlashError, MainFlash};
use cicada_hal::optbyte::{NvmArbiter, OptionByteError};
use core::convert::Infallible;

use crate::flash::{BANK2_BASE, MAIN_FLASH};
use crate::optbyte::FlashRegs;
use crate::system;

/// Option-byte slot holding the boot configuration (RM0376 table 25)
const BOOT_SLOT: u8 = 1;

/// Boot-configuration value with the bank-swap bit (`BFB2`) set
const BOOT_BANK2_VALUE: u16 = 0x80F0;

/// Select the second flash bank for the next boot
///
/// No-op if the bank-swap bit is already set. Otherwise programs the boot
/// option slot and triggers an option-byte reload, which resets the chip -
/// on that path this function does not return. On failure the locks are
/// closed again before the error is propagated.
pub fn select_boot_bank<A: NvmArbiter>(
    ob: &mut OptionBytes<FlashRegs, A>,
) -> Result<(), OptionByteError> {
    if ob.regs().boot_bank_flipped() {
        return Ok(());
    }

    ob.unlock()?;

    match ob.program(BOOT_SLOT, BOOT_BANK2_VALUE) {
        Ok(()) => ob.regs_mut().launch_option_reload(),
        Err(e) => {
            ob.lock();
            Err(e)
        }
    }
}

/// Erase the application images and reset into the bootloader
///
/// Knocks out the first half-page of each bank - second bank first, so an
/// interrupted sequence never leaves the backup image bootable while the
/// primary is gone - then resets. Returns only on failure, with the locks
/// closed again.
pub fn enter_update_mode(flash: &mut impl MainFlash) -> Result<Infallible, FlashError> {
    if !flash.unlock() {
        return Err(FlashError::Locked);
    }

    let wiped = flash
        .erase(BANK2_BASE, HALF_PAGE_SIZE)
        .and_then(|()| flash.erase(MAIN_FLASH.start, HALF_PAGE_SIZE));

    match wiped {
        Ok(()) => system::reset(),
        Err(e) => {
            flash.lock();
            Err(e)
        }
    }
}
