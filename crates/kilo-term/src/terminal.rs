// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, window size, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, and raw fd reads/writes. These
// are the standard POSIX interfaces for terminal control — there is no
// safe alternative. Each unsafe block is minimal and documented.
#![allow(unsafe_code)]
//
// This module owns the terminal's raw state. Entering raw mode returns a
// guard; dropping the guard restores the original termios, so restoration
// runs on every exit path — normal return, explicit quit, or a propagated
// error. A panic hook covers the one path Drop cannot: it writes a restore
// sequence directly to fd 1 (bypassing Rust's stdout lock, which the
// panicking thread may hold mid-frame) and reapplies the saved termios
// before the original panic handler prints its message.
//
// The window size resolver speaks two protocols: the TIOCGWINSZ ioctl,
// and — for terminals that report zero columns — a cursor-position-report
// round trip: push the cursor to the bottom-right corner, ask where it
// landed, parse the reply.

use std::io::{self, Write};
use std::sync::{Mutex, Once};

use crate::ansi;
use crate::error::TermError;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of columns (width in character cells).
    pub cols: u16,
    /// Number of rows (height in character cells).
    pub rows: u16,
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal, the query fails, or the
/// reported geometry is degenerate (zero columns or rows).
#[cfg(unix)]
#[must_use]
pub fn query_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size {
            cols: ws.ws_col,
            rows: ws.ws_row,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn query_size() -> Option<Size> {
    None
}

/// Check whether stdin is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Cursor Position Report ─────────────────────────────────────────────────

/// Upper bound on a cursor position report, terminator included.
///
/// `ESC [ <row> ; <col> R` is at most 12 bytes for any real terminal;
/// 32 leaves slack while still bounding how much a misbehaving terminal
/// can make us read.
const REPORT_MAX: usize = 32;

/// Parse a cursor position report: `ESC [ <row> ; <col> R`.
///
/// The grammar is fixed: literal `ESC [`, two decimal integers separated
/// by `;`, terminated by `R`, nothing after. Anything else — wrong prefix,
/// missing terminator, non-digit fields, or a reply longer than
/// [`REPORT_MAX`] — is rejected.
#[must_use]
pub fn parse_cursor_report(reply: &[u8]) -> Option<Size> {
    if reply.len() > REPORT_MAX {
        return None;
    }
    let body = reply.strip_prefix(b"\x1b[")?.strip_suffix(b"R")?;
    let sep = body.iter().position(|&b| b == b';')?;
    let rows = parse_decimal(&body[..sep])?;
    let cols = parse_decimal(&body[sep + 1..])?;
    Some(Size { cols, rows })
}

/// Parse a non-empty run of ASCII digits as a `u16`.
fn parse_decimal(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() {
        return None;
    }
    let mut value: u16 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value
            .checked_mul(10)?
            .checked_add(u16::from(b - b'0'))?;
    }
    Some(value)
}

/// Resolve the window size, falling back to the cursor-position protocol.
///
/// The ioctl is tried first. If it fails or reports zero columns, the
/// fallback pushes the cursor to the bottom-right corner (the terminal
/// clamps at the real edges), requests a cursor position report, and
/// parses the reply off stdin. Raw mode must already be active: the reply
/// arrives unechoed and the read timeout bounds the wait for terminals
/// that never answer.
///
/// # Errors
///
/// Returns [`TermError::SizeUnavailable`] if both strategies fail,
/// [`TermError::Output`] / [`TermError::Input`] if the fallback's own
/// I/O errors out.
pub fn resolve_size() -> Result<Size, TermError> {
    if let Some(size) = query_size() {
        return Ok(size);
    }
    fallback_size()
}

#[cfg(unix)]
fn fallback_size() -> Result<Size, TermError> {
    {
        let mut stdout = io::stdout().lock();
        ansi::cursor_force_bottom_right(&mut stdout).map_err(TermError::Output)?;
        ansi::request_cursor_position(&mut stdout).map_err(TermError::Output)?;
        stdout.flush().map_err(TermError::Output)?;
    }

    let reply = read_cursor_report()?;
    match parse_cursor_report(&reply) {
        Some(size) if size.cols > 0 && size.rows > 0 => Ok(size),
        _ => Err(TermError::SizeUnavailable),
    }
}

#[cfg(not(unix))]
fn fallback_size() -> Result<Size, TermError> {
    Err(TermError::SizeUnavailable)
}

/// Read the terminal's reply to the cursor position request.
///
/// Reads stdin byte-by-byte up to the `R` terminator. The scan is bounded
/// at [`REPORT_MAX`] bytes; a flooding terminal just hands the parser an
/// unterminated buffer it will reject. A zero-byte read (the raw-mode
/// `VTIME` timeout) means the terminal stopped talking — return whatever
/// arrived and let the parser decide.
#[cfg(unix)]
fn read_cursor_report() -> Result<Vec<u8>, TermError> {
    let mut reply = Vec::with_capacity(REPORT_MAX);

    while reply.len() < REPORT_MAX {
        let mut byte: u8 = 0;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };

        if n < 0 {
            let err = io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::EAGAIN) {
                break;
            }
            return Err(TermError::Input(err));
        }
        if n == 0 {
            break;
        }

        reply.push(byte);
        if byte == b'R' {
            break;
        }
    }

    Ok(reply)
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`RawMode`] guard owns its own copy, but the panic hook can't
/// access it. This global backup — behind a [`Mutex`], not `static mut` —
/// lets the hook restore the terminal without the guard.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Restore termios from the global backup. Best-effort, ignores errors.
#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
            }
        }
    }
}

/// Screen cleanup sequence for emergency use: clear the screen, home the
/// cursor, and show it again (a panic mid-frame leaves it hidden).
const EMERGENCY_RESTORE: &[u8] = b"\x1b[2J\x1b[H\x1b[?25h";

/// Panic hook guard — ensures the hook is installed at most once per process.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the error.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the error message. The hook
/// writes [`EMERGENCY_RESTORE`] directly to fd 1 (bypassing Rust's stdout
/// lock to avoid deadlock), restores termios, then delegates to the
/// original panic handler so the error prints to a working terminal.
fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

/// Write the screen cleanup sequence directly to stdout's file descriptor.
///
/// Bypasses Rust's `io::stdout()` lock to avoid deadlocking if the panic
/// occurred while the lock was held (e.g., mid-frame flush).
fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── RawMode ────────────────────────────────────────────────────────────────

/// Raw-mode guard with RAII cleanup.
///
/// [`enable`](Self::enable) captures the terminal's original line
/// discipline, applies the raw configuration, and returns a guard. The
/// original configuration is reapplied exactly once, when the guard drops
/// — hold it for the whole session so every exit path restores the shell.
///
/// # Example
///
/// ```no_run
/// use kilo_term::terminal::RawMode;
///
/// let _raw = RawMode::enable()?;
/// // ... render frames, read keys ...
/// // Terminal is restored when `_raw` drops — even on panic.
/// # Ok::<(), kilo_term::error::TermError>(())
/// ```
pub struct RawMode {
    /// Original termios saved before any mutation.
    #[cfg(unix)]
    original: libc::termios,
}

impl RawMode {
    /// Capture the original terminal configuration and enter raw mode.
    ///
    /// The raw configuration disables software flow control, CR-to-NL
    /// translation, parity checking, break-interrupts, and high-bit
    /// stripping on input; output post-processing; and echo, canonical
    /// input, signal keys, and extended input processing. Character size
    /// is forced to 8 bits. `VMIN = 0` with `VTIME = 1` makes every read
    /// return within a tenth of a second even when no key arrives, so the
    /// process never blocks indefinitely on stdin.
    ///
    /// # Errors
    ///
    /// Returns [`TermError::Query`] if the original attributes cannot be
    /// read (stdin is not a terminal), [`TermError::Config`] if applying
    /// the raw configuration fails.
    #[cfg(unix)]
    pub fn enable() -> Result<Self, TermError> {
        install_panic_hook();

        unsafe {
            let mut original: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &raw mut original) != 0 {
                return Err(TermError::Query(io::Error::last_os_error()));
            }

            // Save to the global backup for the panic hook.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(original);
            }

            let mut termios = original;
            termios.c_iflag &=
                !(libc::BRKINT | libc::ICRNL | libc::INPCK | libc::ISTRIP | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_cflag |= libc::CS8;
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);

            // VMIN=0, VTIME=1: read() returns after at most a tenth of a
            // second, with or without data.
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 1;

            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(TermError::Config(io::Error::last_os_error()));
            }

            Ok(Self { original })
        }
    }

    /// Non-unix stub: raw mode is a no-op.
    #[cfg(not(unix))]
    pub fn enable() -> Result<Self, TermError> {
        install_panic_hook();
        Ok(Self {})
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const self.original);
            }

            // Clear the global backup — we've restored successfully.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
