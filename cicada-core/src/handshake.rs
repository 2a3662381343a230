//! Bootloader-entry serial handshake
//!
//! The companion radio MCU can ask the board to drop into its firmware
//! bootloader over the shared UART. The exchange is deliberately awkward
//! so random traffic cannot trigger it:
//!
//! 1. Companion sends ESC; we flush our transmit side and echo ESC back.
//! 2. Companion sends a second ESC within 1000 ms (it gets the long
//!    window because it may still be draining traffic we sent earlier).
//! 3. We send `b` to request confirmation.
//! 4. Companion confirms with `c` within 100 ms; we enter update mode.
//!
//! Any unexpected byte or an expired window aborts the exchange. This
//! module is the pure state machine: the caller feeds it received bytes
//! plus a millisecond timestamp and performs the returned [`Action`] on
//! the wire. The chip HAL provides the blocking pump.

/// Byte that opens (and re-arms) the handshake
pub const TRIGGER: u8 = 0x1B;

/// Confirmation request we send after the second trigger
pub const CONFIRM_REQUEST: u8 = b'b';

/// Confirmation byte expected from the companion
pub const CONFIRM: u8 = b'c';

/// Window for the second trigger byte, in milliseconds
pub const RETRIGGER_WINDOW_MS: u32 = 1000;

/// Window for the confirmation byte, in milliseconds
pub const CONFIRM_WINDOW_MS: u32 = 100;

/// What the caller must do on the wire after feeding a byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Nothing; keep feeding bytes
    None,
    /// Flush pending transmit data, then echo the trigger byte back
    EchoTrigger,
    /// Send the confirmation request and flush
    RequestConfirm,
    /// Handshake complete: drain the receive side and enter update mode
    EnterUpdateMode,
    /// Handshake aborted; resume normal traffic
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// First trigger seen and echoed; waiting for the second
    AwaitRetrigger { since: u32 },
    /// Confirmation requested; waiting for the confirm byte
    AwaitConfirm { since: u32 },
}

/// Handshake state machine
///
/// Timestamps are a free-running millisecond counter; wrap-around is
/// handled, windows just must be shorter than half the counter range.
#[derive(Debug, Clone, Copy)]
pub struct UpdateHandshake {
    state: State,
}

impl UpdateHandshake {
    pub const fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Feed one received byte
    pub fn feed(&mut self, byte: u8, now_ms: u32) -> Action {
        match self.state {
            State::Idle => {
                if byte == TRIGGER {
                    self.state = State::AwaitRetrigger { since: now_ms };
                    Action::EchoTrigger
                } else {
                    Action::None
                }
            }
            State::AwaitRetrigger { since } => {
                if expired(since, now_ms, RETRIGGER_WINDOW_MS) {
                    self.state = State::Idle;
                    Action::Abort
                } else if byte == TRIGGER {
                    self.state = State::AwaitConfirm { since: now_ms };
                    Action::RequestConfirm
                } else {
                    self.state = State::Idle;
                    Action::Abort
                }
            }
            State::AwaitConfirm { since } => {
                if expired(since, now_ms, CONFIRM_WINDOW_MS) {
                    self.state = State::Idle;
                    Action::Abort
                } else if byte == CONFIRM {
                    self.state = State::Idle;
                    Action::EnterUpdateMode
                } else {
                    self.state = State::Idle;
                    Action::Abort
                }
            }
        }
    }

    /// Check the current window without a received byte
    ///
    /// Called from the pump's idle loop so a silent companion cannot park
    /// the machine mid-handshake.
    pub fn poll(&mut self, now_ms: u32) -> Action {
        let timed_out = match self.state {
            State::Idle => false,
            State::AwaitRetrigger { since } => expired(since, now_ms, RETRIGGER_WINDOW_MS),
            State::AwaitConfirm { since } => expired(since, now_ms, CONFIRM_WINDOW_MS),
        };

        if timed_out {
            self.state = State::Idle;
            Action::Abort
        } else {
            Action::None
        }
    }

    /// Whether a handshake is currently in progress
    pub fn in_progress(&self) -> bool {
        self.state != State::Idle
    }
}

impl Default for UpdateHandshake {
    fn default() -> Self {
        Self::new()
    }
}

fn expired(since: u32, now: u32, window_ms: u32) -> bool {
    now.wrapping_sub(since) > window_ms
}
