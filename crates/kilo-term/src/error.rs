// SPDX-License-Identifier: MIT
//
// Error types for terminal control.
//
// Every terminal-I/O failure except the raw-mode read timeout is fatal:
// the caller restores the terminal, clears the screen, prints the message,
// and exits nonzero. There is no retry path, so one flat enum with a
// variant per failing operation is all the structure we need.

use std::io;

use thiserror::Error;

/// A fatal terminal-control failure.
///
/// Each variant names the operation that failed; the wrapped
/// [`io::Error`] carries the OS-level cause where one exists.
#[derive(Debug, Error)]
pub enum TermError {
    /// Reading the terminal's current attributes failed — stdin is not
    /// a terminal, or the device query itself errored.
    #[error("failed to query terminal attributes: {0}")]
    Query(#[source] io::Error),

    /// Applying the raw-mode attribute set failed.
    #[error("failed to configure terminal attributes: {0}")]
    Config(#[source] io::Error),

    /// Neither the geometry ioctl nor the cursor-position fallback
    /// produced usable window dimensions.
    #[error("unable to determine window size")]
    SizeUnavailable,

    /// A stdin read failed for a reason other than the raw-mode timeout.
    #[error("failed to read key from stdin: {0}")]
    Input(#[source] io::Error),

    /// Writing a frame (or a control sequence) to stdout failed.
    #[error("failed to write to stdout: {0}")]
    Output(#[source] io::Error),
}

// ─── Tests ───────────────────────────────────────────────────────────────────
