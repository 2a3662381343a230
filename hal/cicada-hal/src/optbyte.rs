//! Option-byte hardware abstractions
//!
//! The option bytes are a small block of non-volatile configuration words
//! controlling boot and protection behavior, written through the flash
//! controller behind a two-level lock (`PELOCK` gating the controller,
//! `OPTLOCK` gating the option-byte block). These traits expose exactly the
//! register surface the programming sequence in `cicada-core` needs, so the
//! sequence itself can be exercised on the host against a fake.

/// Errors from an option-byte programming sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OptionByteError {
    /// Slot index beyond the last option-byte word
    InvalidSlot,
    /// The option lock is (still) set; no write may be attempted
    OptLockHeld,
    /// Hardware did not report end-of-operation after the write
    Program,
}

/// Flash-controller register surface for option-byte programming
///
/// Implementations map directly onto the controller's PECR, key and status
/// registers. Methods are split so the caller controls the sequencing and
/// the critical-section placement; implementations must not add locking of
/// their own.
pub trait OptionByteRegs {
    /// Read the primary write-protection lock (`PELOCK`)
    fn pe_locked(&self) -> bool;

    /// Read the option-byte lock (`OPTLOCK`)
    fn opt_locked(&self) -> bool;

    /// Write the two-value key sequence that opens the primary lock
    ///
    /// Must be called with interrupts masked; the two key writes form one
    /// atomic pair as far as the hardware is concerned.
    fn write_pe_keys(&mut self);

    /// Write the two-value key sequence that opens the option lock
    ///
    /// Same atomicity requirement as [`write_pe_keys`](Self::write_pe_keys).
    fn write_opt_keys(&mut self);

    /// Set the primary lock bit
    fn set_pe_lock(&mut self);

    /// Set the option lock bit
    fn set_opt_lock(&mut self);

    /// Write one 32-bit word to the given option-byte slot and wait for the
    /// controller to finish
    ///
    /// Contract: performs the volatile slot write, issues a memory barrier,
    /// then spins on the busy flag and returns only once it reads clear.
    /// On real hardware this primitive must execute from a memory region
    /// that stays resident while the NVM array is busy (see the STM32L0
    /// implementation); that placement is safety-critical, not cosmetic.
    /// The spin is unbounded by design - hardware guarantees the timing.
    fn program_word(&mut self, slot: u8, word: u32);

    /// Read the end-of-operation flag (`EOP`)
    fn end_of_op(&self) -> bool;

    /// Acknowledge the end-of-operation flag (write-one-to-clear)
    fn clear_end_of_op(&mut self);
}

/// Acquire/release notifications toward whatever else shares the flash
/// controller (typically the EEPROM-emulation layer)
///
/// These are notifications, not gates: `acquire` cannot refuse, it only
/// tells the collaborator to suspend conflicting NVM activity until the
/// matching `release`. The programming sequence calls them in balanced
/// pairs even on failure paths.
pub trait NvmArbiter {
    /// A protected-memory operation is about to start
    fn acquire(&mut self);

    /// The protected-memory section is no longer needed
    fn release(&mut self);
}

/// Default arbiter for systems with no concurrent NVM user
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopArbiter;

impl NvmArbiter for NoopArbiter {
    fn acquire(&mut self) {}
    fn release(&mut self) {}
}
