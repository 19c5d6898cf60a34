// SPDX-License-Identifier: MIT
//
// Terminal key decoder.
//
// Turns the raw stdin byte stream into logical keys: Emacs-style
// control bytes, arrow/page/home/end escape sequences, and mouse wheel
// reports (X10 mode 1000).
//
// # Design
//
// Escape sequences have no length prefix, so the only way to tell a
// lone Escape keypress from the start of `ESC [ A` is time: raw mode
// runs with VMIN=0 / VTIME=1, and a read that comes back empty
// mid-sequence means the user pressed Escape and nothing more is
// coming. The decoder is an explicit finite-state machine — one
// enumerated state per position in a sequence, one pure transition
// function — so every byte/timeout combination is independently
// testable without a terminal.
//
// The decoder reads through a `ByteSource` rather than stdin directly;
// tests drive it with a scripted source.

use crate::error::Result;
use crate::terminal::read_stdin_byte;

const ESC: u8 = 0x1b;
const CTRL_C: u8 = 0x03;
const CTRL_X: u8 = 0x18;

// ─── Keys ───────────────────────────────────────────────────────────────────

/// A logical key event — the closed set the viewer dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Move one character right (C-f, right arrow).
    ForwardChar,
    /// Move one character left (C-b, left arrow).
    BackwardChar,
    /// Move one line down (C-n, down arrow, wheel down).
    NextLine,
    /// Move one line up (C-p, up arrow, wheel up).
    PrevLine,
    /// Move to the start of the line (C-a).
    LineStart,
    /// Move to the end of the line (C-e).
    LineEnd,
    /// Page up (M-v, Page Up key).
    ScrollUp,
    /// Page down (C-v, Page Down key).
    ScrollDown,
    /// Jump to the first line (M-<, Home).
    BufferStart,
    /// Jump past the last line (M->, End).
    BufferEnd,
    /// Forward delete (the Delete key). Decoded but unused — the
    /// viewer does not mutate text.
    DeleteForward,
    /// Backward delete (Backspace). Decoded but unused.
    DeleteBackward,
    /// C-c pressed immediately after C-x.
    Quit,
    /// A bare Escape keypress, or any sequence we don't recognize.
    Escape,
    /// Any other single byte, carried verbatim.
    Other(u8),
}

// ─── Byte source ────────────────────────────────────────────────────────────

/// A stream of bytes with a bounded read timeout.
///
/// `Ok(None)` means the read timed out with no data — never an error.
/// The production source is raw-mode stdin; tests use a script.
pub trait ByteSource {
    /// Read one byte, or `None` on timeout.
    ///
    /// # Errors
    ///
    /// Propagates a genuine I/O failure of the underlying read.
    fn read_byte(&mut self) -> Result<Option<u8>>;
}

/// Raw-mode stdin, one byte per read under the VMIN=0 / VTIME=1
/// discipline established by the terminal session.
#[derive(Debug, Default)]
pub struct StdinSource;

impl ByteSource for StdinSource {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        read_stdin_byte()
    }
}

// ─── State machine ──────────────────────────────────────────────────────────

/// Decoder position within a partially-read escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Consumed `ESC`, nothing else.
    AfterEsc,
    /// Consumed `ESC [`.
    AfterCsi,
    /// Consumed `ESC [ <digit>`; a `~` completes the sequence.
    TildeWait(u8),
    /// Consumed `ESC 0` — alternate Home/End encoding.
    AltHomeEnd,
    /// Consumed `ESC [ M`; draining the 3-byte mouse payload. The
    /// button byte decides the key, the two coordinate bytes are
    /// consumed and ignored.
    MousePayload { button: Option<u8>, remaining: u8 },
    /// Unrecognized byte after `ESC`; consume one more byte, then give
    /// up as a bare Escape.
    Discard,
}

/// Outcome of feeding one byte to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Next(State),
    Emit(Key),
}

/// The transition function: current state + one byte → next state or a
/// finished key. Pure, so every edge is testable in isolation.
const fn transition(state: State, byte: u8) -> Step {
    match state {
        State::AfterEsc => match byte {
            b'v' => Step::Emit(Key::ScrollUp),
            b'<' => Step::Emit(Key::BufferStart),
            b'>' => Step::Emit(Key::BufferEnd),
            b'[' => Step::Next(State::AfterCsi),
            b'0' => Step::Next(State::AltHomeEnd),
            _ => Step::Next(State::Discard),
        },
        State::AfterCsi => match byte {
            b'0'..=b'9' => Step::Next(State::TildeWait(byte)),
            b'A' => Step::Emit(Key::PrevLine),
            b'B' => Step::Emit(Key::NextLine),
            b'C' => Step::Emit(Key::ForwardChar),
            b'D' => Step::Emit(Key::BackwardChar),
            b'H' => Step::Emit(Key::BufferStart),
            b'F' => Step::Emit(Key::BufferEnd),
            b'M' => Step::Next(State::MousePayload {
                button: None,
                remaining: 3,
            }),
            _ => Step::Emit(Key::Escape),
        },
        State::TildeWait(digit) => match byte {
            b'~' => Step::Emit(tilde_key(digit)),
            _ => Step::Emit(Key::Escape),
        },
        State::AltHomeEnd => match byte {
            b'H' => Step::Emit(Key::BufferStart),
            b'F' => Step::Emit(Key::BufferEnd),
            _ => Step::Emit(Key::Escape),
        },
        State::MousePayload { button, remaining } => {
            let button = match button {
                None => Some(byte),
                some => some,
            };
            if remaining > 1 {
                Step::Next(State::MousePayload {
                    button,
                    remaining: remaining - 1,
                })
            } else {
                Step::Emit(mouse_key(button))
            }
        }
        State::Discard => Step::Emit(Key::Escape),
    }
}

/// Map a `ESC [ <digit> ~` sequence to its key.
const fn tilde_key(digit: u8) -> Key {
    match digit {
        b'5' => Key::ScrollUp,
        b'6' => Key::ScrollDown,
        b'1' | b'7' => Key::BufferStart,
        b'4' | b'8' => Key::BufferEnd,
        b'3' => Key::DeleteForward,
        _ => Key::Escape,
    }
}

/// Map the button byte of an X10 mouse report. 96/97 are the wheel;
/// clicks and anything else are ignored as a failed sequence.
const fn mouse_key(button: Option<u8>) -> Key {
    match button {
        Some(96) => Key::PrevLine,
        Some(97) => Key::NextLine,
        _ => Key::Escape,
    }
}

/// Map a single non-escape byte to its key.
const fn plain_key(byte: u8) -> Key {
    match byte {
        0x06 => Key::ForwardChar,  // C-f
        0x02 => Key::BackwardChar, // C-b
        0x0e => Key::NextLine,     // C-n
        0x10 => Key::PrevLine,     // C-p
        0x01 => Key::LineStart,    // C-a
        0x05 => Key::LineEnd,      // C-e
        0x16 => Key::ScrollDown,   // C-v
        0x7f => Key::DeleteBackward,
        b => Key::Other(b),
    }
}

// ─── Decoder ────────────────────────────────────────────────────────────────

/// Streaming key decoder over a [`ByteSource`].
///
/// Remembers the previously decoded key across calls, which is how the
/// two-stroke quit chord (C-x C-c) is recognized.
pub struct Decoder<S> {
    source: S,
    prev: Option<Key>,
}

impl Decoder<StdinSource> {
    /// A decoder reading raw-mode stdin.
    #[must_use]
    pub const fn stdin() -> Self {
        Self::new(StdinSource)
    }
}

impl<S: ByteSource> Decoder<S> {
    /// Wrap a byte source.
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self { source, prev: None }
    }

    /// Decode the next logical key, blocking until one arrives.
    ///
    /// # Errors
    ///
    /// Propagates a genuine read failure from the source; timeouts are
    /// handled internally and never surface as errors.
    pub fn next_key(&mut self) -> Result<Key> {
        loop {
            if let Some(key) = self.poll_key()? {
                return Ok(key);
            }
        }
    }

    /// Decode one logical key, or `None` if the terminal is idle (the
    /// first read timed out with no data). Lets the caller interleave
    /// other work — resize handling — with input.
    ///
    /// # Errors
    ///
    /// Propagates a genuine read failure from the source.
    pub fn poll_key(&mut self) -> Result<Option<Key>> {
        let Some(first) = self.source.read_byte()? else {
            return Ok(None);
        };
        let mut key = self.decode_from(first)?;
        if key == Key::Other(CTRL_C) && self.prev == Some(Key::Other(CTRL_X)) {
            key = Key::Quit;
        }
        self.prev = Some(key);
        Ok(Some(key))
    }

    fn decode_from(&mut self, first: u8) -> Result<Key> {
        if first != ESC {
            return Ok(plain_key(first));
        }

        // Inside a sequence the timeout is authoritative: a short read
        // at any point means "that was a bare Escape after all."
        let mut state = State::AfterEsc;
        loop {
            let Some(byte) = self.source.read_byte()? else {
                return Ok(Key::Escape);
            };
            match transition(state, byte) {
                Step::Next(next) => state = next,
                Step::Emit(key) => return Ok(key),
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::TermError;

    /// Scripted byte source: `Some(b)` delivers a byte, `None` is a
    /// timeout. An exhausted script times out forever.
    struct Script(VecDeque<Option<u8>>);

    impl ByteSource for Script {
        fn read_byte(&mut self) -> Result<Option<u8>> {
            Ok(self.0.pop_front().unwrap_or(None))
        }
    }

    /// A source whose reads fail outright.
    struct Broken;

    impl ByteSource for Broken {
        fn read_byte(&mut self) -> Result<Option<u8>> {
            Err(TermError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "gone",
            )))
        }
    }

    fn decoder(bytes: &[u8]) -> Decoder<Script> {
        Decoder::new(Script(bytes.iter().copied().map(Some).collect()))
    }

    fn decode(bytes: &[u8]) -> Key {
        decoder(bytes).next_key().unwrap()
    }

    // ── Plain control bytes ─────────────────────────────────────────

    #[test]
    fn emacs_control_bytes() {
        assert_eq!(decode(b"\x06"), Key::ForwardChar);
        assert_eq!(decode(b"\x02"), Key::BackwardChar);
        assert_eq!(decode(b"\x0e"), Key::NextLine);
        assert_eq!(decode(b"\x10"), Key::PrevLine);
        assert_eq!(decode(b"\x01"), Key::LineStart);
        assert_eq!(decode(b"\x05"), Key::LineEnd);
        assert_eq!(decode(b"\x16"), Key::ScrollDown);
        assert_eq!(decode(b"\x7f"), Key::DeleteBackward);
    }

    #[test]
    fn unmapped_byte_passes_through() {
        assert_eq!(decode(b"q"), Key::Other(b'q'));
        assert_eq!(decode(b" "), Key::Other(b' '));
    }

    #[test]
    fn leading_timeouts_are_skipped() {
        let script = Script(VecDeque::from(vec![None, None, Some(0x06)]));
        assert_eq!(Decoder::new(script).next_key().unwrap(), Key::ForwardChar);
    }

    #[test]
    fn poll_reports_idle_without_consuming() {
        let script = Script(VecDeque::from(vec![None, Some(0x06)]));
        let mut d = Decoder::new(script);
        assert_eq!(d.poll_key().unwrap(), None);
        assert_eq!(d.poll_key().unwrap(), Some(Key::ForwardChar));
    }

    #[test]
    fn quit_chord_survives_idle_gap() {
        let script = Script(VecDeque::from(vec![Some(0x18), None, Some(0x03)]));
        let mut d = Decoder::new(script);
        assert_eq!(d.poll_key().unwrap(), Some(Key::Other(0x18)));
        assert_eq!(d.poll_key().unwrap(), None);
        assert_eq!(d.poll_key().unwrap(), Some(Key::Quit));
    }

    // ── Quit chord ──────────────────────────────────────────────────

    #[test]
    fn ctrl_x_ctrl_c_quits() {
        let mut d = decoder(b"\x18\x03");
        assert_eq!(d.next_key().unwrap(), Key::Other(0x18));
        assert_eq!(d.next_key().unwrap(), Key::Quit);
    }

    #[test]
    fn ctrl_c_alone_does_not_quit() {
        assert_eq!(decode(b"\x03"), Key::Other(0x03));
    }

    #[test]
    fn intervening_key_breaks_the_chord() {
        let mut d = decoder(b"\x18\x1b[A\x03");
        assert_eq!(d.next_key().unwrap(), Key::Other(0x18));
        assert_eq!(d.next_key().unwrap(), Key::PrevLine);
        assert_eq!(d.next_key().unwrap(), Key::Other(0x03));
    }

    // ── Bare escape and meta bindings ───────────────────────────────

    #[test]
    fn lone_escape_times_out_to_escape() {
        assert_eq!(decode(b"\x1b"), Key::Escape);
    }

    #[test]
    fn meta_v_scrolls_up() {
        assert_eq!(decode(b"\x1bv"), Key::ScrollUp);
    }

    #[test]
    fn meta_angle_brackets_jump_buffer() {
        assert_eq!(decode(b"\x1b<"), Key::BufferStart);
        assert_eq!(decode(b"\x1b>"), Key::BufferEnd);
    }

    #[test]
    fn unknown_meta_byte_consumes_and_escapes() {
        let mut d = decoder(b"\x1bxq");
        // ESC x <next byte> collapses to Escape, consuming the 'q'.
        assert_eq!(d.next_key().unwrap(), Key::Escape);
    }

    // ── CSI letter sequences ────────────────────────────────────────

    #[test]
    fn arrow_keys() {
        assert_eq!(decode(b"\x1b[A"), Key::PrevLine);
        assert_eq!(decode(b"\x1b[B"), Key::NextLine);
        assert_eq!(decode(b"\x1b[C"), Key::ForwardChar);
        assert_eq!(decode(b"\x1b[D"), Key::BackwardChar);
    }

    #[test]
    fn csi_home_end() {
        assert_eq!(decode(b"\x1b[H"), Key::BufferStart);
        assert_eq!(decode(b"\x1b[F"), Key::BufferEnd);
    }

    #[test]
    fn unknown_csi_letter_escapes() {
        assert_eq!(decode(b"\x1b[Z"), Key::Escape);
    }

    // ── CSI tilde sequences ─────────────────────────────────────────

    #[test]
    fn page_keys() {
        assert_eq!(decode(b"\x1b[5~"), Key::ScrollUp);
        assert_eq!(decode(b"\x1b[6~"), Key::ScrollDown);
    }

    #[test]
    fn home_end_tilde_variants() {
        assert_eq!(decode(b"\x1b[1~"), Key::BufferStart);
        assert_eq!(decode(b"\x1b[7~"), Key::BufferStart);
        assert_eq!(decode(b"\x1b[4~"), Key::BufferEnd);
        assert_eq!(decode(b"\x1b[8~"), Key::BufferEnd);
    }

    #[test]
    fn delete_key() {
        assert_eq!(decode(b"\x1b[3~"), Key::DeleteForward);
    }

    #[test]
    fn unmapped_digit_escapes() {
        assert_eq!(decode(b"\x1b[2~"), Key::Escape);
    }

    #[test]
    fn digit_without_tilde_escapes() {
        assert_eq!(decode(b"\x1b[5x"), Key::Escape);
    }

    // ── Alternate home/end encoding ─────────────────────────────────

    #[test]
    fn alt_home_end_encoding() {
        assert_eq!(decode(b"\x1b0H"), Key::BufferStart);
        assert_eq!(decode(b"\x1b0F"), Key::BufferEnd);
    }

    #[test]
    fn alt_encoding_unknown_letter_escapes() {
        assert_eq!(decode(b"\x1b0Z"), Key::Escape);
    }

    // ── Mouse reports ───────────────────────────────────────────────

    #[test]
    fn wheel_up_scrolls_line_up() {
        // Button 96 (wheel up), then arbitrary x/y payload bytes.
        assert_eq!(decode(b"\x1b[M\x60!!"), Key::PrevLine);
    }

    #[test]
    fn wheel_down_scrolls_line_down() {
        assert_eq!(decode(b"\x1b[M\x61!!"), Key::NextLine);
    }

    #[test]
    fn mouse_click_is_ignored() {
        // Button 32 (left press) is not a wheel event.
        assert_eq!(decode(b"\x1b[M\x20!!"), Key::Escape);
    }

    #[test]
    fn truncated_mouse_payload_escapes() {
        assert_eq!(decode(b"\x1b[M\x60"), Key::Escape);
    }

    // ── Short reads ─────────────────────────────────────────────────

    #[test]
    fn timeout_after_csi_escapes() {
        assert_eq!(decode(b"\x1b["), Key::Escape);
    }

    #[test]
    fn timeout_after_digit_escapes() {
        assert_eq!(decode(b"\x1b[5"), Key::Escape);
    }

    #[test]
    fn explicit_mid_sequence_timeout() {
        let script = Script(VecDeque::from(vec![Some(0x1b), Some(b'['), None]));
        assert_eq!(Decoder::new(script).next_key().unwrap(), Key::Escape);
    }

    // ── Error propagation ───────────────────────────────────────────

    #[test]
    fn read_failure_is_fatal() {
        let mut d = Decoder::new(Broken);
        assert!(matches!(d.next_key(), Err(TermError::Io(_))));
    }

    // ── Transition table spot checks ────────────────────────────────

    #[test]
    fn transition_prefers_digit_over_letter() {
        assert_eq!(
            transition(State::AfterCsi, b'5'),
            Step::Next(State::TildeWait(b'5'))
        );
    }

    #[test]
    fn mouse_payload_counts_down() {
        let s = transition(
            State::MousePayload {
                button: None,
                remaining: 3,
            },
            96,
        );
        assert_eq!(
            s,
            Step::Next(State::MousePayload {
                button: Some(96),
                remaining: 2,
            })
        );
    }
}
