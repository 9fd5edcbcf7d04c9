// SPDX-License-Identifier: MIT
//
// kilo — a minimal terminal screen editor front-end.
//
// This is the binary that wires the kilo-term crate into an editor shell:
//
//   kilo-term → raw mode, window size, escape output, key input
//   main.rs   → editor state, screen rendering, key dispatch, control loop
//
// The loop is strictly alternating: render a frame, block for one key,
// dispatch it. Each frame is accumulated in a RenderBuffer and written
// with a single syscall — hide cursor, home, tilde rows with the centered
// welcome banner, position cursor, show cursor.
//
// Raw mode is a scoped resource: `run` holds the RawMode guard for the
// whole session, so the original terminal attributes come back on every
// exit path — quit key, I/O error, or panic (via the kilo-term panic
// hook). After the guard releases, `main` clears the screen directly and
// reports any error to a now-working terminal.
#![allow(unsafe_code)] // sigaction for SIGWINCH; no safe alternative.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};

use kilo_term::ansi;
use kilo_term::error::TermError;
use kilo_term::input::{self, ctrl};
use kilo_term::output::RenderBuffer;
use kilo_term::terminal::{self, RawMode, Size};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Version shown in the welcome banner.
const KILO_VERSION: &str = env!("CARGO_PKG_VERSION");

// ─── SIGWINCH ────────────────────────────────────────────────────────────────

/// Global flag set by the SIGWINCH handler. Checked each loop iteration.
static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Install a signal handler for SIGWINCH (terminal resize).
///
/// The handler simply sets the [`SIGWINCH_RECEIVED`] flag. This is
/// async-signal-safe: writing to an atomic is one of the few operations
/// permitted inside signal handlers.
#[cfg(unix)]
fn install_sigwinch_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
fn install_sigwinch_handler() {
    // No-op on non-unix platforms.
}

// ─── Editor ─────────────────────────────────────────────────────────────────

/// What the control loop does after dispatching a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Keep looping.
    Continue,
    /// Leave the loop cleanly.
    Quit,
}

/// The editor session state: cursor position and terminal dimensions.
///
/// Owned by the control loop, mutated by key dispatch, read by rendering.
/// The saved terminal mode lives in the [`RawMode`] guard held by `run`,
/// not here — restoration is the guard's job, not the editor's.
struct Editor {
    /// Cursor column, 0-indexed.
    cx: u16,
    /// Cursor row, 0-indexed.
    cy: u16,
    /// Terminal dimensions from the last size resolution.
    size: Size,
}

impl Editor {
    /// Create an editor with the cursor at the top-left corner.
    const fn new(size: Size) -> Self {
        Self { cx: 0, cy: 0, size }
    }

    /// Adopt a new terminal size, keeping the cursor on screen.
    fn resize(&mut self, size: Size) {
        self.size = size;
        self.cx = self.cx.min(size.cols.saturating_sub(1));
        self.cy = self.cy.min(size.rows.saturating_sub(1));
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Build one complete frame into a fresh [`RenderBuffer`].
    ///
    /// Escape-sequence order matters: hide the cursor before touching
    /// anything (no flicker), home, draw every row, park the cursor at
    /// its logical position, show it again. The whole frame goes out in
    /// one write, so the terminal never observes an intermediate state.
    fn build_frame(&self) -> RenderBuffer {
        let mut buf = RenderBuffer::new();

        // Writes to a Vec-backed buffer cannot fail.
        ansi::cursor_hide(&mut buf).ok();
        ansi::cursor_home(&mut buf).ok();

        self.draw_rows(&mut buf);

        ansi::cursor_to(&mut buf, self.cx, self.cy).ok();
        ansi::cursor_show(&mut buf).ok();

        buf
    }

    /// Draw all screen rows: tildes, with the welcome banner a third of
    /// the way down.
    ///
    /// Every row ends with clear-to-end-of-line so nothing survives from
    /// a previous, differently-sized frame; every row but the last ends
    /// with `\r\n` (raw mode disables output post-processing, so a bare
    /// `\n` would not return the carriage).
    fn draw_rows(&self, buf: &mut RenderBuffer) {
        let rows = self.size.rows;

        for y in 0..rows {
            if y == rows / 3 {
                self.draw_welcome(buf);
            } else {
                buf.push_bytes(b"~");
            }

            ansi::clear_line(buf).ok();
            if y < rows.saturating_sub(1) {
                buf.push_bytes(b"\r\n");
            }
        }
    }

    /// Draw the centered welcome banner, truncated to the terminal width.
    ///
    /// Centering uses floor division; the leading `~` counts as the first
    /// padding column. When the padding rounds to zero the banner text
    /// starts at the left edge with no marker.
    fn draw_welcome(&self, buf: &mut RenderBuffer) {
        let cols = usize::from(self.size.cols);

        let welcome = format!("kilo editor -- version {KILO_VERSION}");
        let welcome = truncate_to_width(&welcome, cols);

        let mut padding = (cols - welcome.width()) / 2;
        if padding > 0 {
            buf.push_bytes(b"~");
            padding -= 1;
        }
        for _ in 0..padding {
            buf.push_bytes(b" ");
        }

        buf.push_bytes(welcome.as_bytes());
    }

    /// Render the current frame to the terminal as a single write.
    fn refresh_screen(&self) -> Result<(), TermError> {
        self.build_frame().flush_stdout()
    }

    // ── Key dispatch ────────────────────────────────────────────────

    /// Dispatch one key: quit on Ctrl-Q, move on `w`/`a`/`s`/`d`,
    /// ignore everything else.
    fn process_key(&mut self, key: u8) -> Action {
        if key == ctrl(b'q') {
            return Action::Quit;
        }

        match key {
            b'w' | b'a' | b's' | b'd' => self.move_cursor(key),
            _ => {}
        }
        Action::Continue
    }

    /// Move the cursor one cell, clamped to the visible screen rectangle.
    fn move_cursor(&mut self, key: u8) {
        match key {
            b'a' => self.cx = self.cx.saturating_sub(1),
            b'd' => {
                if self.cx + 1 < self.size.cols {
                    self.cx += 1;
                }
            }
            b'w' => self.cy = self.cy.saturating_sub(1),
            b's' => {
                if self.cy + 1 < self.size.rows {
                    self.cy += 1;
                }
            }
            _ => {}
        }
    }
}

/// Truncate `s` to at most `max` terminal columns, on a character boundary.
fn truncate_to_width(s: &str, max: usize) -> &str {
    let mut width = 0;
    for (idx, ch) in s.char_indices() {
        let w = ch.width().unwrap_or(0);
        if width + w > max {
            return &s[..idx];
        }
        width += w;
    }
    s
}

// ─── Entry point ────────────────────────────────────────────────────────────

/// The session: raw mode for the whole scope, then the render/key loop.
fn run() -> Result<(), TermError> {
    let _raw = RawMode::enable()?;
    let size = terminal::resolve_size()?;
    install_sigwinch_handler();

    let mut editor = Editor::new(size);

    loop {
        if SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed) {
            // Only the ioctl here — the escape-sequence fallback would
            // interleave its reply with live keyboard input.
            if let Some(new_size) = terminal::query_size() {
                editor.resize(new_size);
            }
        }

        editor.refresh_screen()?;

        let key = input::read_key()?;
        if editor.process_key(key) == Action::Quit {
            return Ok(());
        }
    }
}

/// Clear the screen and home the cursor, bypassing any frame buffer.
///
/// Used after the session ends (cleanly or not): render state may be
/// inconsistent, so this writes straight to the given writer.
fn cleanup_screen(w: &mut impl Write) {
    ansi::clear_screen(w).ok();
    ansi::cursor_home(w).ok();
    w.flush().ok();
}

fn main() -> ExitCode {
    if !terminal::is_tty() {
        eprintln!("kilo: stdin is not a terminal");
        return ExitCode::FAILURE;
    }

    let result = run();

    // The RawMode guard dropped inside run() — the shell is sane again.
    // Leave it a clean screen, whatever happened.
    cleanup_screen(&mut io::stdout().lock());

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("kilo: {err}");
            ExitCode::FAILURE
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// An editor over a fixed-size virtual terminal.
    fn editor(cols: u16, rows: u16) -> Editor {
        Editor::new(Size { cols, rows })
    }

    /// Feed a sequence of key bytes through dispatch.
    fn feed(e: &mut Editor, keys: &[u8]) {
        for &key in keys {
            assert_eq!(e.process_key(key), Action::Continue);
        }
    }

    /// Render the editor's frame and return it as a string.
    fn frame(e: &Editor) -> String {
        String::from_utf8(e.build_frame().as_bytes().to_vec()).unwrap()
    }

    /// The frame's row contents: control prefix and cursor parking
    /// stripped, rows split on the `\r\n` separators.
    fn rows_of(e: &Editor) -> Vec<String> {
        let f = frame(e);
        let body = f
            .strip_prefix("\x1b[?25l\x1b[H")
            .expect("frame must start with hide + home");
        // Everything up to the last clear-to-end-of-line belongs to rows.
        let end = body.rfind("\x1b[K").expect("last row must clear the line") + 3;
        body[..end]
            .split("\r\n")
            .map(|row| row.trim_end_matches("\x1b[K").to_string())
            .collect()
    }

    const WELCOME: &str = concat!("kilo editor -- version ", env!("CARGO_PKG_VERSION"));

    // ── Frame structure ─────────────────────────────────────────────

    #[test]
    fn frame_hides_homes_then_shows() {
        let f = frame(&editor(80, 24));
        assert!(f.starts_with("\x1b[?25l\x1b[H"));
        assert!(f.ends_with("\x1b[?25h"));
    }

    #[test]
    fn frame_clears_every_row() {
        let f = frame(&editor(80, 24));
        assert_eq!(f.matches("\x1b[K").count(), 24);
    }

    #[test]
    fn frame_separates_rows_except_last() {
        let f = frame(&editor(80, 24));
        assert_eq!(f.matches("\r\n").count(), 23);
    }

    #[test]
    fn frame_parks_cursor_before_showing_it() {
        let mut e = editor(80, 24);
        feed(&mut e, &[b'd', b'd', b's']);
        let f = frame(&e);
        // cx=2, cy=1 → 1-indexed CUP (2;3).
        assert!(f.ends_with("\x1b[2;3H\x1b[?25h"));
    }

    #[test]
    fn frame_single_row_terminal() {
        let e = editor(80, 1);
        let f = frame(&e);
        assert!(!f.contains("\r\n"));
        assert_eq!(f.matches("\x1b[K").count(), 1);
    }

    // ── Rows and banner ─────────────────────────────────────────────

    #[test]
    fn every_non_banner_row_is_a_tilde() {
        let e = editor(80, 24);
        let rows = rows_of(&e);
        assert_eq!(rows.len(), 24);
        for (y, row) in rows.iter().enumerate() {
            if y == 8 {
                continue; // banner row
            }
            assert_eq!(row, "~", "row {y}");
        }
    }

    #[test]
    fn banner_sits_a_third_of_the_way_down() {
        let e = editor(80, 24);
        let rows = rows_of(&e);
        assert!(rows[24 / 3].contains("kilo editor -- version"));
    }

    #[test]
    fn banner_is_centered_with_tilde_as_first_pad_column() {
        let e = editor(80, 24);
        let row = &rows_of(&e)[8];

        let padding = (80 - WELCOME.len()) / 2;
        let mut expected = String::from("~");
        expected.push_str(&" ".repeat(padding - 1));
        expected.push_str(WELCOME);
        assert_eq!(row, &expected);
        assert!(row.len() <= 80);
    }

    #[test]
    fn banner_truncates_on_narrow_terminal() {
        let e = editor(10, 24);
        let row = &rows_of(&e)[8];
        assert_eq!(row, &WELCOME[..10]);
    }

    #[test]
    fn banner_with_zero_padding_has_no_leading_tilde() {
        // Terminal exactly as wide as the banner: padding rounds to 0.
        #[allow(clippy::cast_possible_truncation)]
        let e = editor(WELCOME.len() as u16, 24);
        let row = &rows_of(&e)[8];
        assert_eq!(row, WELCOME);
    }

    #[test]
    fn banner_with_padding_one_is_just_the_tilde() {
        // Two spare columns: padding is 1, absorbed entirely by the tilde.
        #[allow(clippy::cast_possible_truncation)]
        let e = editor(WELCOME.len() as u16 + 2, 24);
        let row = &rows_of(&e)[8];
        assert_eq!(row, &format!("~{WELCOME}"));
    }

    // ── Width truncation ────────────────────────────────────────────

    #[test]
    fn truncate_shorter_string_unchanged() {
        assert_eq!(truncate_to_width("abc", 10), "abc");
    }

    #[test]
    fn truncate_cuts_at_exact_width() {
        assert_eq!(truncate_to_width("abcdef", 4), "abcd");
    }

    #[test]
    fn truncate_respects_wide_characters() {
        // '中' is two columns; cutting at 3 can't split it.
        assert_eq!(truncate_to_width("a中b", 3), "a中");
        assert_eq!(truncate_to_width("a中b", 2), "a");
    }

    // ── Cursor movement ─────────────────────────────────────────────

    #[test]
    fn d_three_times_moves_right_three() {
        let mut e = editor(80, 24);
        feed(&mut e, &[b'd', b'd', b'd']);
        assert_eq!(e.cx, 3);
        assert_eq!(e.cy, 0);
    }

    #[test]
    fn wasd_round_trip_returns_home() {
        let mut e = editor(80, 24);
        feed(&mut e, &[b'd', b's', b'a', b'w']);
        assert_eq!((e.cx, e.cy), (0, 0));
    }

    #[test]
    fn movement_clamps_at_top_left() {
        let mut e = editor(80, 24);
        feed(&mut e, &[b'a', b'w', b'a', b'w']);
        assert_eq!((e.cx, e.cy), (0, 0));
    }

    #[test]
    fn movement_clamps_at_bottom_right() {
        let mut e = editor(3, 2);
        feed(&mut e, &[b'd', b'd', b'd', b'd', b's', b's', b's']);
        assert_eq!((e.cx, e.cy), (2, 1));
    }

    #[test]
    fn unmapped_key_moves_nothing() {
        let mut e = editor(80, 24);
        feed(&mut e, &[b'x', b'!', 0x1b]);
        assert_eq!((e.cx, e.cy), (0, 0));
    }

    // ── Quit ────────────────────────────────────────────────────────

    #[test]
    fn ctrl_q_quits() {
        let mut e = editor(80, 24);
        assert_eq!(e.process_key(ctrl(b'q')), Action::Quit);
    }

    #[test]
    fn plain_q_does_not_quit() {
        let mut e = editor(80, 24);
        assert_eq!(e.process_key(b'q'), Action::Continue);
    }

    // ── Resize ──────────────────────────────────────────────────────

    #[test]
    fn resize_adopts_new_dimensions() {
        let mut e = editor(80, 24);
        e.resize(Size {
            cols: 120,
            rows: 40,
        });
        assert_eq!(
            e.size,
            Size {
                cols: 120,
                rows: 40
            }
        );
    }

    #[test]
    fn resize_pulls_cursor_back_on_screen() {
        let mut e = editor(80, 24);
        feed(&mut e, &[b'd'; 50]);
        feed(&mut e, &[b's'; 20]);
        assert_eq!((e.cx, e.cy), (50, 20));

        e.resize(Size { cols: 40, rows: 10 });
        assert_eq!((e.cx, e.cy), (39, 9));
    }

    #[test]
    fn frame_tracks_resize() {
        let mut e = editor(80, 24);
        e.resize(Size { cols: 80, rows: 10 });
        assert_eq!(frame(&e).matches("\x1b[K").count(), 10);
    }

    // ── Cleanup ─────────────────────────────────────────────────────

    #[test]
    fn cleanup_emits_exactly_one_clear_then_home() {
        let mut out = Vec::new();
        cleanup_screen(&mut out);
        let s = String::from_utf8(out).unwrap();
        assert_eq!(s, "\x1b[2J\x1b[H");
        assert_eq!(s.matches("\x1b[2J").count(), 1);
    }
}
