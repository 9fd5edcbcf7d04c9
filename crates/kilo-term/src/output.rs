// SPDX-License-Identifier: MIT
//
// Frame output buffering.
//
// A `RenderBuffer` accumulates all the ANSI bytes of one frame in memory so
// the entire refresh can be issued as a single write() syscall. Writing a
// frame as many small writes lets the terminal repaint mid-frame — the
// visible result is flicker. One buffer, one write, one visible update.
//
// The buffer lives for exactly one refresh: the renderer creates it, fills
// it, and flushing consumes it. Nothing is retained across frames.

use std::io::{self, Write};

use crate::error::TermError;

/// Expected upper bound for one frame of tilde rows and cursor moves.
/// Pre-allocating avoids mid-frame reallocation in the common case.
const FRAME_CAPACITY: usize = 4096;

/// An append-only byte buffer holding one frame of terminal output.
///
/// Append via the [`Write`] impl (or [`push_bytes`](Self::push_bytes));
/// flushing with [`flush_stdout`](Self::flush_stdout) writes the whole
/// accumulated frame in one syscall and consumes the buffer. There is no
/// partial flush — frame atomicity depends on exactly one write per refresh.
#[derive(Debug)]
pub struct RenderBuffer {
    buf: Vec<u8>,
}

impl RenderBuffer {
    /// Create an empty buffer with room for a typical frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(FRAME_CAPACITY),
        }
    }

    /// Append raw bytes to the end of the buffer.
    ///
    /// Existing content is preserved; this is the only mutation.
    #[inline]
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Write the entire frame to stdout in one syscall and release the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Output`] if writing to stdout fails.
    pub fn flush_stdout(self) -> Result<(), TermError> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(&self.buf).map_err(TermError::Output)?;
        stdout.flush().map_err(TermError::Output)
    }

    /// Write the entire frame to an arbitrary writer and release the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Output`] if writing to `w` fails.
    pub fn flush_to(self, w: &mut impl Write) -> Result<(), TermError> {
        w.write_all(&self.buf).map_err(TermError::Output)?;
        w.flush().map_err(TermError::Output)
    }
}

impl Write for RenderBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing via flush_stdout() / flush_to().
        Ok(())
    }
}

impl Default for RenderBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
