//! STM32L0 flash-controller register block for option-byte programming
//!
//! Register layout per RM0367/RM0376, FLASH registers at 0x4002_2000 and
//! the option-byte block at 0x1FF8_0000 (five 32-bit slots, 4-byte
//! stride). The two-level lock (PELOCK over the controller, OPTLOCK over
//! the option bytes) opens only through the fixed key sequences below.

use core::cell::Cell;
use core::ptr;

use cicada_hal::optbyte::OptionByteRegs;
use critical_section::Mutex;

const FLASH_R_BASE: u32 = 0x4002_2000;

const FLASH_PECR: *mut u32 = (FLASH_R_BASE + 0x04) as *mut u32;
const FLASH_PEKEYR: *mut u32 = (FLASH_R_BASE + 0x0C) as *mut u32;
const FLASH_OPTKEYR: *mut u32 = (FLASH_R_BASE + 0x14) as *mut u32;
const FLASH_SR: *mut u32 = (FLASH_R_BASE + 0x18) as *mut u32;
const FLASH_OPTR: *const u32 = (FLASH_R_BASE + 0x1C) as *const u32;

/// Option-byte block base address
const OB_BASE: u32 = 0x1FF8_0000;

const PECR_PELOCK: u32 = 1 << 0;
const PECR_OPTLOCK: u32 = 1 << 2;
const PECR_OBL_LAUNCH: u32 = 1 << 18;

const SR_BSY: u32 = 1 << 0;
const SR_EOP: u32 = 1 << 1;

const OPTR_BFB2: u32 = 1 << 23;

// PECR/data-EEPROM write access keys
const PEKEY1: u32 = 0x89AB_CDEF;
const PEKEY2: u32 = 0x0203_0405;

// Option-byte block write access keys
const OPTKEY1: u32 = 0xFBEA_D9C8;
const OPTKEY2: u32 = 0x2425_2627;

static REGS_TAKEN: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

/// Owned handle to the flash-controller registers
///
/// The lock registers, key registers and status register are globally
/// shared hardware; holding the handle is what entitles code to sequence
/// a programming operation, so only one handle exists.
pub struct FlashRegs {
    _priv: (),
}

impl FlashRegs {
    /// Take the register handle; returns `None` after the first call
    pub fn take() -> Option<Self> {
        critical_section::with(|cs| {
            if REGS_TAKEN.borrow(cs).replace(true) {
                None
            } else {
                Some(FlashRegs { _priv: () })
            }
        })
    }

    /// Conjure a second handle
    ///
    /// # Safety
    ///
    /// Callers must guarantee no programming sequence is in flight on any
    /// other handle; the hardware serializes nothing.
    pub unsafe fn steal() -> Self {
        FlashRegs { _priv: () }
    }

    /// Whether the boot-bank-swap option bit (`BFB2`) is currently set
    pub fn boot_bank_flipped(&self) -> bool {
        unsafe { ptr::read_volatile(FLASH_OPTR) & OPTR_BFB2 != 0 }
    }

    /// Reload the option bytes from NVM (`OBL_LAUNCH`)
    ///
    /// The reload is a system reset; this never returns.
    pub fn launch_option_reload(&mut self) -> ! {
        unsafe {
            let pecr = ptr::read_volatile(FLASH_PECR);
            ptr::write_volatile(FLASH_PECR, pecr | PECR_OBL_LAUNCH);
        }
        loop {
            cortex_m::asm::nop();
        }
    }

    fn pecr(&self) -> u32 {
        unsafe { ptr::read_volatile(FLASH_PECR) }
    }
}

impl OptionByteRegs for FlashRegs {
    fn pe_locked(&self) -> bool {
        self.pecr() & PECR_PELOCK != 0
    }

    fn opt_locked(&self) -> bool {
        self.pecr() & PECR_OPTLOCK != 0
    }

    fn write_pe_keys(&mut self) {
        unsafe {
            ptr::write_volatile(FLASH_PEKEYR, PEKEY1);
            ptr::write_volatile(FLASH_PEKEYR, PEKEY2);
        }
    }

    fn write_opt_keys(&mut self) {
        unsafe {
            ptr::write_volatile(FLASH_OPTKEYR, OPTKEY1);
            ptr::write_volatile(FLASH_OPTKEYR, OPTKEY2);
        }
    }

    fn set_pe_lock(&mut self) {
        unsafe { ptr::write_volatile(FLASH_PECR, self.pecr() | PECR_PELOCK) };
    }

    fn set_opt_lock(&mut self) {
        unsafe { ptr::write_volatile(FLASH_PECR, self.pecr() | PECR_OPTLOCK) };
    }

    fn program_word(&mut self, slot: u8, word: u32) {
        ob_program_word(slot, word);
    }

    fn end_of_op(&self) -> bool {
        unsafe { ptr::read_volatile(FLASH_SR) & SR_EOP != 0 }
    }

    fn clear_end_of_op(&mut self) {
        // Write-one-to-clear
        unsafe { ptr::write_volatile(FLASH_SR, SR_EOP) };
    }
}

/// Write one option word and wait out the busy window
///
/// Runs from RAM: the section below lands in `.data`, which the
/// cortex-m-rt startup copies out of flash. While the controller is busy
/// the NVM array stalls the bus, so code fetching from flash - including
/// this very sequence if it were left there - would hang mid-operation.
/// The placement is safety-critical, not cosmetic; `inline(never)` keeps
/// callers in flash from pulling the body back in.
#[link_section = ".data.cicada_hal_stm32l0.ob_program_word"]
#[inline(never)]
fn ob_program_word(slot: u8, word: u32) {
    let addr = (OB_BASE + u32::from(slot) * 4) as *mut u32;

    unsafe { ptr::write_volatile(addr, word) };

    // Order the slot write ahead of the status polling
    cortex_m::asm::dmb();

    while unsafe { ptr::read_volatile(FLASH_SR) } & SR_BSY != 0 {}
}
