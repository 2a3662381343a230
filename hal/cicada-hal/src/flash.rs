//! Main program-flash abstractions
//!
//! The actual erase/program engine lives in the chip's system library and
//! is out of scope here; this trait captures the contract the wrappers in
//! the chip HAL rely on. Address and alignment validation is done before
//! these methods are reached (see `cicada-core::flashmap`).

/// Errors from main-flash operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// Address or length not aligned to the required granule
    Misaligned,
    /// Range falls outside the main flash array
    OutOfBounds,
    /// The controller would not unlock
    Locked,
    /// The underlying driver reported a failure
    Driver,
}

/// Main program-flash driver contract
///
/// Erase granule is the half-page (128 bytes), program granule is the
/// 32-bit word. `erase` and `program` assume the controller is already
/// unlocked; callers bracket them with `unlock`/`lock`.
pub trait MainFlash {
    /// Open the program-memory locks. Returns false if the controller
    /// would not unlock (e.g. held by a conflicting context).
    fn unlock(&mut self) -> bool;

    /// Close the program-memory locks. Always safe to call.
    fn lock(&mut self);

    /// Erase `count` bytes starting at `address`
    ///
    /// Both must already be half-page aligned and in bounds.
    fn erase(&mut self, address: u32, count: u32) -> Result<(), FlashError>;

    /// Program `data` starting at `address`
    ///
    /// Address and length must already be word aligned and in bounds.
    fn program(&mut self, address: u32, data: &[u8]) -> Result<(), FlashError>;
}
