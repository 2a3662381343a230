//! Option-byte programming sequence
//!
//! The option bytes live behind a two-level lock: `PELOCK` protects the
//! flash controller as a whole, `OPTLOCK` the option-byte block. A write
//! is a 32-bit word whose high half must be the complement of the low
//! half; the hardware rejects anything else.
//!
//! The sequence is deliberately asymmetric: [`OptionBytes::unlock`]
//! acquires the shared-controller arbiter and opens the locks, but closing
//! them again is the caller's job via [`OptionBytes::lock`] - except on an
//! unlock failure, where the arbiter is released before returning. Only
//! the key-write pairs run with interrupts masked; the busy spin inside
//! the write primitive runs with interrupts enabled, so ISRs keep working
//! while the hardware is physically programming.
//!
//! Only one programming sequence may be in flight system-wide. That is a
//! convention between callers, not something this type enforces.

use cicada_hal::optbyte::{NoopArbiter, NvmArbiter, OptionByteError, OptionByteRegs};

/// Number of option-byte slots (indices 0 through 4)
pub const SLOT_COUNT: usize = 5;

/// Highest valid slot index
pub const MAX_SLOT: u8 = 4;

/// Build the 32-bit word for an option-byte slot
///
/// Low half is the configuration value, high half its bitwise complement
/// (hardware-enforced redundancy check). The complement is always derived
/// here, never supplied by callers.
pub const fn option_word(value: u16) -> u32 {
    ((!value as u32) << 16) | value as u32
}

/// Option-byte programmer
///
/// Owns the register handle and the arbiter for the duration of the
/// board's option-byte access. One operation is the sequence
/// `unlock` -> `program` -> `lock`; [`write_slot`](Self::write_slot)
/// packages that for the common case.
pub struct OptionBytes<R, A = NoopArbiter> {
    regs: R,
    arbiter: A,
}

impl<R: OptionByteRegs> OptionBytes<R> {
    /// Create a programmer with no shared-controller arbitration
    pub fn new(regs: R) -> Self {
        Self::with_arbiter(regs, NoopArbiter)
    }
}

impl<R: OptionByteRegs, A: NvmArbiter> OptionBytes<R, A> {
    /// Create a programmer with the given arbiter
    pub fn with_arbiter(regs: R, arbiter: A) -> Self {
        Self { regs, arbiter }
    }

    /// Get access to the underlying register handle
    pub fn regs(&self) -> &R {
        &self.regs
    }

    /// Get mutable access to the underlying register handle
    ///
    /// For chip-specific operations outside the programming sequence
    /// (e.g. triggering an option-byte reload).
    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Open both locks
    ///
    /// Notifies the arbiter first, then presents the key sequences inside
    /// one critical section: the primary keys if `PELOCK` is set, and the
    /// option keys only once `PELOCK` is confirmed clear. Idempotent if
    /// already unlocked.
    ///
    /// On failure the arbiter is released here and the caller must not
    /// attempt a write.
    pub fn unlock(&mut self) -> Result<(), OptionByteError> {
        self.arbiter.acquire();

        critical_section::with(|_| {
            if self.regs.pe_locked() {
                self.regs.write_pe_keys();
            }

            // The option keys are only presented once the primary lock is
            // confirmed clear; the hardware ignores them otherwise. This
            // also covers the state where PELOCK is already open but
            // OPTLOCK is still closed.
            if !self.regs.pe_locked() {
                if self.regs.opt_locked() {
                    self.regs.write_opt_keys();
                }
            }
        });

        if self.regs.opt_locked() {
            self.arbiter.release();
            return Err(OptionByteError::OptLockHeld);
        }

        Ok(())
    }

    /// Program one option-byte slot
    ///
    /// Requires a prior successful [`unlock`](Self::unlock); the lock state
    /// is checked as a precondition and a held lock fails without touching
    /// the slot region. Out-of-range slots fail the same way.
    ///
    /// The write itself runs with interrupts enabled and blocks until the
    /// controller clears its busy flag. Afterwards the end-of-operation
    /// flag decides the outcome: set means success (and is acknowledged
    /// write-one-to-clear), clear means the hardware rejected the write
    /// and [`OptionByteError::Program`] is returned.
    pub fn program(&mut self, slot: u8, value: u16) -> Result<(), OptionByteError> {
        if slot > MAX_SLOT {
            return Err(OptionByteError::InvalidSlot);
        }

        if self.regs.opt_locked() {
            return Err(OptionByteError::OptLockHeld);
        }

        self.regs.program_word(slot, option_word(value));

        if self.regs.end_of_op() {
            self.regs.clear_end_of_op();
            Ok(())
        } else {
            Err(OptionByteError::Program)
        }
    }

    /// Close both locks and release the arbiter
    ///
    /// Always runs the full sequence; re-locking an already-locked
    /// controller is a hardware no-op. Exactly one release notification
    /// per call.
    pub fn lock(&mut self) {
        critical_section::with(|_| {
            self.regs.set_pe_lock();
            self.regs.set_opt_lock();
        });

        self.arbiter.release();
    }

    /// One complete programming operation: unlock, program, lock
    ///
    /// On unlock failure the slot is untouched and the arbiter has already
    /// been released; otherwise the locks are closed again whatever the
    /// program outcome.
    pub fn write_slot(&mut self, slot: u8, value: u16) -> Result<(), OptionByteError> {
        self.unlock()?;
        let result = self.program(slot, value);
        self.lock();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Acquire,
        Release,
        PeKeys,
        OptKeys,
        Write(u8, u32),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    /// Fake register block standing in for the flash controller
    struct FakeRegs {
        pe_locked: bool,
        opt_locked: bool,
        /// Whether the hardware accepts the respective key sequence
        pe_keys_accepted: bool,
        opt_keys_accepted: bool,
        /// Whether a slot write latches the end-of-operation flag
        write_succeeds: bool,
        eop: bool,
        slots: [Option<u32>; SLOT_COUNT],
        log: Log,
    }

    impl FakeRegs {
        fn new(log: Log) -> Self {
            Self {
                pe_locked: true,
                opt_locked: true,
                pe_keys_accepted: true,
                opt_keys_accepted: true,
                write_succeeds: true,
                eop: false,
                slots: [None; SLOT_COUNT],
                log,
            }
        }
    }

    impl OptionByteRegs for FakeRegs {
        fn pe_locked(&self) -> bool {
            self.pe_locked
        }

        fn opt_locked(&self) -> bool {
            self.opt_locked
        }

        fn write_pe_keys(&mut self) {
            self.log.borrow_mut().push(Event::PeKeys);
            if self.pe_keys_accepted {
                self.pe_locked = false;
            }
        }

        fn write_opt_keys(&mut self) {
            self.log.borrow_mut().push(Event::OptKeys);
            if self.opt_keys_accepted {
                self.opt_locked = false;
            }
        }

        fn set_pe_lock(&mut self) {
            self.pe_locked = true;
        }

        fn set_opt_lock(&mut self) {
            self.opt_locked = true;
        }

        fn program_word(&mut self, slot: u8, word: u32) {
            self.log.borrow_mut().push(Event::Write(slot, word));
            self.slots[slot as usize] = Some(word);
            self.eop = self.write_succeeds;
        }

        fn end_of_op(&self) -> bool {
            self.eop
        }

        fn clear_end_of_op(&mut self) {
            self.eop = false;
        }
    }

    /// Arbiter that records its notifications
    struct LoggingArbiter {
        log: Log,
    }

    impl NvmArbiter for LoggingArbiter {
        fn acquire(&mut self) {
            self.log.borrow_mut().push(Event::Acquire);
        }

        fn release(&mut self) {
            self.log.borrow_mut().push(Event::Release);
        }
    }

    fn programmer() -> (OptionBytes<FakeRegs, LoggingArbiter>, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let regs = FakeRegs::new(log.clone());
        let arbiter = LoggingArbiter { log: log.clone() };
        (OptionBytes::with_arbiter(regs, arbiter), log)
    }

    fn releases(log: &Log) -> usize {
        log.borrow().iter().filter(|e| **e == Event::Release).count()
    }

    #[test]
    fn test_option_word_all_values() {
        for v in 0..=u16::MAX {
            let word = option_word(v);
            assert_eq!(word & 0xFFFF, v as u32);
            assert_eq!(word >> 16, (v as u32) ^ 0xFFFF);
        }
    }

    #[test]
    fn test_option_word_known_value() {
        assert_eq!(option_word(0x80F0), 0x7F0F_80F0);
        assert_eq!(option_word(0x0000), 0xFFFF_0000);
        assert_eq!(option_word(0xFFFF), 0x0000_FFFF);
    }

    #[test]
    fn test_unlock_opens_both_locks() {
        let (mut ob, log) = programmer();
        assert_eq!(ob.unlock(), Ok(()));
        assert!(!ob.regs().pe_locked());
        assert!(!ob.regs().opt_locked());
        // Acquire strictly precedes the key sequences
        assert_eq!(
            log.borrow().as_slice(),
            &[Event::Acquire, Event::PeKeys, Event::OptKeys]
        );
    }

    #[test]
    fn test_unlock_idempotent_when_already_open() {
        let (mut ob, log) = programmer();
        ob.regs_mut().pe_locked = false;
        ob.regs_mut().opt_locked = false;
        assert_eq!(ob.unlock(), Ok(()));
        // No key sequence needed, and no release: the operation is open
        assert_eq!(log.borrow().as_slice(), &[Event::Acquire]);
    }

    #[test]
    fn test_unlock_tolerates_pe_open_opt_closed() {
        let (mut ob, log) = programmer();
        ob.regs_mut().pe_locked = false;
        assert_eq!(ob.unlock(), Ok(()));
        assert_eq!(log.borrow().as_slice(), &[Event::Acquire, Event::OptKeys]);
    }

    #[test]
    fn test_unlock_failure_releases_arbiter() {
        let (mut ob, log) = programmer();
        ob.regs_mut().opt_keys_accepted = false;
        assert_eq!(ob.unlock(), Err(OptionByteError::OptLockHeld));
        assert!(ob.regs().opt_locked());
        assert_eq!(releases(&log), 1);
    }

    #[test]
    fn test_unlock_skips_opt_keys_when_pe_stays_locked() {
        let (mut ob, log) = programmer();
        ob.regs_mut().pe_keys_accepted = false;
        assert_eq!(ob.unlock(), Err(OptionByteError::OptLockHeld));
        // The option keys must not be presented while PELOCK is set
        assert_eq!(
            log.borrow().as_slice(),
            &[Event::Acquire, Event::PeKeys, Event::Release]
        );
    }

    #[test]
    fn test_unlock_runs_key_sequence_even_if_arbiter_busy() {
        // The arbiter hooks are notifications, not gates: an "unavailable"
        // collaborator cannot veto the key sequence.
        let (mut ob, log) = programmer();
        assert_eq!(ob.unlock(), Ok(()));
        let events = log.borrow();
        assert!(events.contains(&Event::PeKeys));
        assert!(events.contains(&Event::OptKeys));
        assert_eq!(events[0], Event::Acquire);
    }

    #[test]
    fn test_program_invalid_slot() {
        let (mut ob, log) = programmer();
        ob.unlock().unwrap();
        log.borrow_mut().clear();

        assert_eq!(ob.program(5, 0x0000), Err(OptionByteError::InvalidSlot));
        assert_eq!(ob.program(255, 0x1234), Err(OptionByteError::InvalidSlot));
        // No hardware access, slots untouched, lock state unchanged
        assert!(log.borrow().is_empty());
        assert_eq!(ob.regs().slots, [None; SLOT_COUNT]);
        assert!(!ob.regs().opt_locked());
    }

    #[test]
    fn test_program_guarded_by_lock_state() {
        let (mut ob, log) = programmer();
        // No unlock: the precondition check must refuse the write
        assert_eq!(ob.program(1, 0x80F0), Err(OptionByteError::OptLockHeld));
        assert!(log.borrow().is_empty());
        assert_eq!(ob.regs().slots, [None; SLOT_COUNT]);
    }

    #[test]
    fn test_program_writes_derived_word() {
        let (mut ob, _log) = programmer();
        ob.unlock().unwrap();
        assert_eq!(ob.program(1, 0x80F0), Ok(()));
        assert_eq!(ob.regs().slots[1], Some(0x7F0F_80F0));
        // EOP acknowledged on success
        assert!(!ob.regs().end_of_op());
    }

    #[test]
    fn test_program_reports_hardware_failure() {
        // EOP never latching is an explicit error, not silence
        let (mut ob, _log) = programmer();
        ob.regs_mut().write_succeeds = false;
        ob.unlock().unwrap();
        assert_eq!(ob.program(0, 0xABCD), Err(OptionByteError::Program));
    }

    #[test]
    fn test_lock_sets_both_and_releases_once() {
        let (mut ob, log) = programmer();
        ob.unlock().unwrap();
        ob.lock();
        assert!(ob.regs().pe_locked());
        assert!(ob.regs().opt_locked());
        assert_eq!(releases(&log), 1);
    }

    #[test]
    fn test_lock_idempotent() {
        let (mut ob, log) = programmer();
        ob.lock();
        let (pe, opt) = (ob.regs().pe_locked(), ob.regs().opt_locked());
        ob.lock();
        assert_eq!((ob.regs().pe_locked(), ob.regs().opt_locked()), (pe, opt));
        assert!(pe && opt);
        // Still one release per call
        assert_eq!(releases(&log), 2);
    }

    #[test]
    fn test_end_to_end_sequence() {
        let (mut ob, _log) = programmer();
        assert_eq!(ob.unlock(), Ok(()));
        assert_eq!(ob.program(1, 0x80F0), Ok(()));
        assert_eq!(ob.regs().slots[1], Some(0x7F0F_80F0));
        ob.lock();
        assert!(ob.regs().pe_locked());
        assert!(ob.regs().opt_locked());
    }

    #[test]
    fn test_write_slot_full_operation() {
        let (mut ob, log) = programmer();
        assert_eq!(ob.write_slot(2, 0x1234), Ok(()));
        assert_eq!(ob.regs().slots[2], Some(option_word(0x1234)));
        assert!(ob.regs().pe_locked());
        assert!(ob.regs().opt_locked());
        assert_eq!(releases(&log), 1);
    }

    #[test]
    fn test_write_slot_unlock_failure_skips_write() {
        let (mut ob, log) = programmer();
        ob.regs_mut().opt_keys_accepted = false;
        assert_eq!(ob.write_slot(0, 0x1234), Err(OptionByteError::OptLockHeld));
        assert_eq!(ob.regs().slots, [None; SLOT_COUNT]);
        assert_eq!(releases(&log), 1);
    }

    #[test]
    fn test_write_slot_relocks_after_invalid_slot() {
        let (mut ob, log) = programmer();
        assert_eq!(ob.write_slot(9, 0x1234), Err(OptionByteError::InvalidSlot));
        assert!(ob.regs().pe_locked());
        assert!(ob.regs().opt_locked());
        assert_eq!(releases(&log), 1);
    }
}
