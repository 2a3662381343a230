//! STM32L0-specific HAL for the Cicada boards
//!
//! Implements the `cicada-hal` traits against the STM32L0 flash controller
//! and watchdog, and provides the board-level entry points built on top of
//! the sequencing logic in `cicada-core`:
//!
//! - Option-byte register block and boot-bank selection
//! - Main-flash erase/program wrappers with range validation
//! - Bootloader-entry handshake pump over `embedded-io`
//! - Independent watchdog, system reset, low-power wrappers
//!
//! # Features
//!
//! - `stm32l052` / `stm32l072` / `stm32l082` - select the chip variant
//!   (flash geometry); defaults to the 192K dual-bank parts
//! - `critical-section-impl` - provide the single-core critical-section
//!   implementation from this crate
//! - `defmt` - enable debug formatting support
//!
//! All raw MMIO of the workspace is confined to this crate.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod boot;
pub mod flash;
pub mod handshake;
pub mod optbyte;
pub mod system;
pub mod watchdog;

pub use optbyte::FlashRegs;
pub use watchdog::Iwdg;
