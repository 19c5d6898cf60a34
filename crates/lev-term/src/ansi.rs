// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No
// state, no decisions about when to emit — the renderer composes a
// frame, this module just knows the byte-level encoding of every
// terminal command the viewer needs.
//
// Cursor positions are 0-indexed in our API and converted to 1-indexed
// for the terminal (the ANSI standard is 1-based).
//
// All functions return `io::Result` propagated from the underlying
// writer. In practice they never fail when writing to the frame buffer
// (backed by a Vec).

use std::io::{self, Write};

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to the top-left corner (CUP with no arguments).
#[inline]
pub fn cursor_home(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[H")
}

/// Move the cursor to `(x, y)` using the CUP (Cursor Position) sequence.
///
/// Our coordinates are 0-indexed; ANSI CUP is 1-indexed.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", y + 1, x + 1)
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

/// Push the cursor toward the bottom-right corner with large relative
/// moves (CUF 999, CUD 999). The terminal clamps at the edge, so a
/// following cursor-position report reveals the window size. Used only
/// by the geometry fallback when `TIOCGWINSZ` fails.
#[inline]
pub fn cursor_to_bottom_right(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[999C\x1b[999B")
}

/// Request a cursor position report (DSR 6). The terminal answers on
/// stdin with `ESC [ <row> ; <col> R`.
#[inline]
pub fn request_cursor_position(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[6n")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Erase the entire display (ED 2).
#[inline]
pub fn erase_display(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Enter the alternate screen buffer (DEC Private Mode 1049).
///
/// The alternate screen preserves the original terminal content; on
/// exit the user's shell scrollback reappears untouched.
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h")
}

/// Exit the alternate screen buffer and restore original content.
#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

// ─── Text attributes ────────────────────────────────────────────────────────

/// Start inverted video (SGR 7). Used for the status bar.
#[inline]
pub fn invert_on(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[7m")
}

/// End inverted video (SGR with no arguments — resets all attributes).
#[inline]
pub fn invert_off(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[m")
}

// ─── Mouse tracking ─────────────────────────────────────────────────────────

/// Enable X10-style mouse press reporting (DEC Private Mode 1000).
///
/// Wheel events arrive as `ESC [ M` followed by a 3-byte payload; the
/// key decoder maps wheel up/down to line motion.
#[inline]
pub fn enable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1000h")
}

/// Disable mouse press reporting.
#[inline]
pub fn disable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1000l")
}

// ─── Misc ───────────────────────────────────────────────────────────────────

/// Ring the terminal bell.
#[inline]
pub fn bell(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x07")
}

// ─── Tests ───────────────────────────────────────────────────────────────────
