// SPDX-License-Identifier: MIT
//
// lev-term — Terminal control and input decoding for lev.
//
// Direct VT100/xterm control via raw termios and hand-written escape
// sequences. No crossterm, no abstraction layer: a viewer this small
// owns every byte it sends to the terminal and every byte it reads
// back. The crate splits into:
//
//   ansi     → escape sequence emitters (pure, write to any `Write`)
//   terminal → raw-mode session lifecycle, window geometry, SIGWINCH
//   key      → byte-stream decoder turning stdin into logical keys
//   error    → the typed failure modes of all of the above

pub mod ansi;
pub mod error;
pub mod key;
pub mod terminal;

pub use error::TermError;
