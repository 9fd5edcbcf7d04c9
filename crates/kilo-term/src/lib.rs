// SPDX-License-Identifier: MIT
//
// kilo-term — terminal control for the kilo editor.
//
// Everything the editor needs to own a terminal, and nothing more:
// raw mode with guaranteed restoration, window size discovery (ioctl
// with a cursor-position-report fallback), escape-sequence generation,
// a frame buffer flushed as a single write, and a blocking key read.
//
// This crate intentionally avoids external TUI frameworks (ratatui,
// crossterm) in favor of direct terminal control via ANSI escape
// sequences and raw termios. Every byte sent to the terminal is
// accounted for.

pub mod ansi;
pub mod error;
pub mod input;
pub mod output;
pub mod terminal;
