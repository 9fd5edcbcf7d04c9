// SPDX-License-Identifier: MIT
//
// Key input — a blocking single-byte read with timeout tolerance.
//
// Raw mode is configured with VMIN=0 / VTIME=1, so every read() on stdin
// returns within a tenth of a second whether or not a key arrived. That
// keeps the process responsive to signals while "idle", at the cost of
// reads that legitimately return nothing. This module hides that detail:
// a timed-out read is a reason to try again, not an error, and the caller
// sees exactly one byte per call.
#![allow(unsafe_code)]

use std::io;

use crate::error::TermError;

/// Block until one byte of input arrives and return it.
///
/// Loops a one-byte read against stdin. A zero-byte return (the raw-mode
/// read timeout) and `EAGAIN` both mean "no data yet" — retry. Anything
/// else is a real failure.
///
/// # Errors
///
/// Returns [`TermError::Input`] for any read failure other than the
/// timeout condition.
#[cfg(unix)]
pub fn read_key() -> Result<u8, TermError> {
    loop {
        let mut byte: u8 = 0;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };

        match n {
            1 => return Ok(byte),
            // VTIME expired with no data — wait for the next key.
            0 => {}
            _ => {
                let err = io::Error::last_os_error();
                // Some platforms report the timeout as EAGAIN instead
                // of an empty read.
                if err.raw_os_error() != Some(libc::EAGAIN) {
                    return Err(TermError::Input(err));
                }
            }
        }
    }
}

#[cfg(not(unix))]
pub fn read_key() -> Result<u8, TermError> {
    use std::io::Read;

    let mut byte = [0u8; 1];
    io::stdin()
        .read_exact(&mut byte)
        .map_err(TermError::Input)?;
    Ok(byte[0])
}

/// Map a printable key to its control-key form (`ctrl(b'q')` → 0x11).
///
/// Terminals transmit Ctrl combinations by clearing the top three bits
/// of the base character.
#[inline]
#[must_use]
pub const fn ctrl(key: u8) -> u8 {
    key & 0x1f
}

// ─── Tests ───────────────────────────────────────────────────────────────────
