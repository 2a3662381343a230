//! Board-agnostic chip-support logic for Cicada boards
//!
//! This crate contains the parts of the chip-support layer that carry real
//! sequencing logic and therefore deserve host-side tests:
//!
//! - Option-byte programming sequence (lock handling, word derivation,
//!   completion check)
//! - Main-flash range and alignment validation
//! - Bootloader-entry serial handshake state machine
//!
//! Hardware access goes through the traits in `cicada-hal`; nothing in
//! here touches registers directly.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod flashmap;
pub mod handshake;
pub mod optbyte;
