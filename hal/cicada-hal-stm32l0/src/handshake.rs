//! Blocking pump for the bootloader-entry handshake
//!
//! Drives the `cicada-core` state machine over an `embedded-io` UART.
//! Called from the firmware's idle loop when traffic arrives from the
//! companion MCU; returns quickly when no handshake is in progress.

use cicada_core::handshake::{Action, UpdateHandshake, CONFIRM_REQUEST, TRIGGER};
use embedded_io::{Read, ReadReady, Write};

/// Result of one pump pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandshakeOutcome {
    /// No handshake was requested; resume normal traffic
    NotRequested,
    /// A handshake started but was aborted (wrong byte or timeout)
    Aborted,
    /// Handshake confirmed: the caller should enter update mode now
    Confirmed,
}

/// Run the handshake until it resolves
///
/// `now_ms` is a free-running millisecond counter. On [`Confirmed`] the
/// receive side has been drained and the caller is expected to invoke
/// [`crate::boot::enter_update_mode`].
///
/// [`Confirmed`]: HandshakeOutcome::Confirmed
pub fn poll_update_request<U>(
    uart: &mut U,
    mut now_ms: impl FnMut() -> u32,
) -> Result<HandshakeOutcome, U::Error>
where
    U: Read + ReadReady + Write,
{
    let mut hs = UpdateHandshake::new();

    loop {
        if uart.read_ready()? {
            let mut byte = [0u8; 1];
            if uart.read(&mut byte)? == 0 {
                continue;
            }

            match hs.feed(byte[0], now_ms()) {
                Action::None => {
                    if !hs.in_progress() {
                        return Ok(HandshakeOutcome::NotRequested);
                    }
                }
                Action::EchoTrigger => {
                    // Get our pending traffic out before echoing, so the
                    // companion sees the echo as the last byte
                    uart.flush()?;
                    uart.write_all(&[TRIGGER])?;
                }
                Action::RequestConfirm => {
                    uart.write_all(&[CONFIRM_REQUEST])?;
                    uart.flush()?;
                }
                Action::EnterUpdateMode => {
                    drain(uart)?;
                    return Ok(HandshakeOutcome::Confirmed);
                }
                Action::Abort => return Ok(HandshakeOutcome::Aborted),
            }
        } else if !hs.in_progress() {
            return Ok(HandshakeOutcome::NotRequested);
        } else if hs.poll(now_ms()) == Action::Abort {
            return Ok(HandshakeOutcome::Aborted);
        }
    }
}

fn drain<U: Read + ReadReady>(uart: &mut U) -> Result<(), U::Error> {
    let mut byte = [0u8; 1];
    while uart.read_ready()? {
        if uart.read(&mut byte)? == 0 {
            break;
        }
    }
    Ok(())
}
