// SPDX-License-Identifier: MIT
//
// Terminal error taxonomy.
//
// Every fatal condition the terminal layer can hit has its own variant,
// so the binary can report a precise message after the screen has been
// restored. A read that merely times out is NOT an error — timeouts are
// how the key decoder tells a lone Escape from an escape sequence.

use std::io;

use thiserror::Error;

/// Failures of the terminal session and input layer. All are fatal to
/// the viewer; none should be swallowed.
#[derive(Debug, Error)]
pub enum TermError {
    /// stdin or stdout is not an interactive terminal device.
    #[error("stdin and stdout must be terminal devices")]
    NotATerminal,

    /// Getting or setting terminal attributes failed.
    #[error("failed setting terminal attributes: {0}")]
    Setup(#[source] io::Error),

    /// Both the ioctl query and the cursor-report fallback failed.
    #[error("cannot determine terminal window size")]
    WindowSizeUnavailable,

    /// An underlying read or write syscall failed (as opposed to
    /// timing out).
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TermError>;
