//! Main-flash range and alignment validation
//!
//! The erase/program engine itself lives in the system library; these
//! helpers hold the pure rules the wrappers apply before touching it.
//! Erase works on half-pages (128 bytes), programming on 32-bit words.

use core::ops::Range;

use cicada_hal::flash::FlashError;

/// Base address of the main flash array
pub const FLASH_BASE: u32 = 0x0800_0000;

/// Erase granule
pub const HALF_PAGE_SIZE: u32 = 128;

/// Program granule
pub const WORD_SIZE: u32 = 4;

/// Validate an erase request and round the byte count up to whole
/// half-pages
///
/// Returns the rounded count. The start address must already sit on a
/// half-page boundary; the rounded extent must stay inside `flash`.
pub fn erase_extent(flash: &Range<u32>, address: u32, count: u32) -> Result<u32, FlashError> {
    if address % HALF_PAGE_SIZE != 0 {
        return Err(FlashError::Misaligned);
    }

    let count = count
        .checked_add(HALF_PAGE_SIZE - 1)
        .ok_or(FlashError::OutOfBounds)?
        & !(HALF_PAGE_SIZE - 1);

    let end = address.checked_add(count).ok_or(FlashError::OutOfBounds)?;
    if address < flash.start || end > flash.end {
        return Err(FlashError::OutOfBounds);
    }

    Ok(count)
}

/// Validate a program request
///
/// Address and length must be word aligned and the extent must stay
/// inside `flash`. A zero-length program is valid and a no-op.
pub fn check_program(flash: &Range<u32>, address: u32, len: u32) -> Result<(), FlashError> {
    if address % WORD_SIZE != 0 || len % WORD_SIZE != 0 {
        return Err(FlashError::Misaligned);
    }

    let end = address.checked_add(len).ok_or(FlashError::OutOfBounds)?;
    if address < flash.start || end > flash.end {
        return Err(FlashError::OutOfBounds);
    }

    Ok(())
}
