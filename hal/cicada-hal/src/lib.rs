//! Cicada Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits implemented by the
//! chip-specific HALs (currently STM32L0). The board-agnostic logic in
//! `cicada-core` is written against these traits only, which keeps it
//! host-testable against fake register blocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │      Application firmware               │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cicada-core (sequencing logic)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cicada-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  cicada-hal-stm32l0 (MMIO)              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`optbyte::OptionByteRegs`] - Flash-controller option-byte surface
//! - [`optbyte::NvmArbiter`] - Shared-controller acquire/release hooks
//! - [`flash::MainFlash`] - Main program-flash driver contract
//! - [`system::SystemOps`] - Low-power and debug-port collaborator
//! - [`system::Watchdog`] - Independent watchdog

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod optbyte;
pub mod system;

// Re-export key traits at crate root for convenience
pub use flash::{FlashError, MainFlash};
pub use optbyte::{NoopArbiter, NvmArbiter, OptionByteError, OptionByteRegs};
pub use system::{SystemOps, Watchdog};
