// SPDX-License-Identifier: MIT
//
// Terminal control — raw mode, alternate screen, and RAII cleanup.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, sigaction, and raw fd reads
// and writes. These are the standard POSIX interfaces for terminal
// control — there is no safe alternative. Each unsafe block is minimal.
#![allow(unsafe_code)]
//
// The `Session` owns the terminal's raw state. Entering switches to
// raw mode with VMIN=0 / VTIME=1 — reads return within ~100ms, which
// is what lets the key decoder tell a lone Escape keypress from the
// first byte of an escape sequence. Cleanup is guaranteed on drop, and
// a panic hook writes a pre-built restore sequence directly to fd 1 so
// a panic mid-frame never leaves the user's shell in raw mode.
//
// Window geometry has two paths: the TIOCGWINSZ ioctl, and a fallback
// that parks the cursor at the bottom-right corner and asks the
// terminal where it ended up via a device status report.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};

use crate::ansi;
use crate::error::{Result, TermError};

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Number of rows (height in character cells).
    pub rows: u16,
    /// Number of columns (width in character cells).
    pub cols: u16,
}

// ─── Terminal queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if the query fails or reports zero columns — some
/// terminals answer the ioctl but lie, which is what the cursor-report
/// fallback exists for.
#[cfg(unix)]
#[must_use]
fn query_size_ioctl() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };

    if result == 0 && ws.ws_col > 0 {
        Some(Size {
            rows: ws.ws_row,
            cols: ws.ws_col,
        })
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
fn query_size_ioctl() -> Option<Size> {
    None
}

/// Check whether both stdin and stdout are connected to a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe {
        libc::isatty(libc::STDIN_FILENO) != 0 && libc::isatty(libc::STDOUT_FILENO) != 0
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

/// Read one byte from stdin, honoring the raw-mode VTIME timeout.
///
/// Returns `Ok(None)` when the read times out with no data — the
/// decoder relies on this to resolve escape-sequence ambiguity. EINTR
/// is retried; any other failure is a real I/O error.
#[cfg(unix)]
pub(crate) fn read_stdin_byte() -> Result<Option<u8>> {
    let mut byte = 0u8;
    loop {
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };
        match n {
            1 => return Ok(Some(byte)),
            0 => return Ok(None),
            _ => {
                let err = io::Error::last_os_error();
                if err.kind() != io::ErrorKind::Interrupted {
                    return Err(TermError::Io(err));
                }
            }
        }
    }
}

#[cfg(not(unix))]
pub(crate) fn read_stdin_byte() -> Result<Option<u8>> {
    Err(TermError::Io(io::Error::new(
        io::ErrorKind::Unsupported,
        "raw terminal input requires unix",
    )))
}

// ─── Resize notification ────────────────────────────────────────────────────

/// Single-slot pending-resize flag set by the SIGWINCH handler.
///
/// The handler does nothing but store a bool — the only work that is
/// async-signal-safe. The main loop drains the flag at the top of each
/// iteration, re-queries geometry, and redraws.
static RESIZE_PENDING: AtomicBool = AtomicBool::new(false);

/// Handler installation guard — at most once per process.
static RESIZE_HOOK_INSTALLED: Once = Once::new();

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    RESIZE_PENDING.store(true, Ordering::Relaxed);
}

#[cfg(unix)]
fn install_resize_handler() {
    RESIZE_HOOK_INSTALLED.call_once(|| unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    });
}

#[cfg(not(unix))]
fn install_resize_handler() {}

/// Drain the pending-resize flag. Returns `true` at most once per
/// SIGWINCH delivery.
pub fn take_resize() -> bool {
    RESIZE_PENDING.swap(false, Ordering::Relaxed)
}

// ─── Panic-safe terminal restore ────────────────────────────────────────────

/// Global backup of original termios for panic recovery.
///
/// The [`Session`] owns its own copy, but the panic hook can't access
/// it. This backup — behind a [`Mutex`], not `static mut` — lets the
/// hook restore cooked mode without the struct.
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

/// Complete terminal restore sequence for emergency use: disable mouse
/// tracking, show the cursor, exit the alternate screen. Alternate
/// screen exit is last so the restored shell content shows no viewer
/// artifacts.
const EMERGENCY_RESTORE: &[u8] = b"\x1b[?1000l\x1b[?25h\x1b[?1049l";

/// Panic hook guard — ensures the hook is installed at most once.
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Install a panic hook that restores the terminal before printing the
/// error.
///
/// Without this, a panic in raw mode leaves the user's terminal broken:
/// no echo, no line editing, no way to read the error message. The hook
/// writes [`EMERGENCY_RESTORE`] directly to fd 1 (bypassing Rust's
/// stdout lock to avoid deadlock if the panic happened mid-flush),
/// restores termios, then delegates to the original panic handler.
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

/// Write the restore sequence directly to stdout's file descriptor.
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

// ─── Cursor report parsing ──────────────────────────────────────────────────

/// Parse a device status report reply, `ESC [ <row> ; <col>` (the
/// terminating `R` already stripped by the reader).
///
/// Number parsing is done directly on the byte slice — the reply
/// arrives interleaved with raw-mode input and is never valid UTF-8
/// territory worth allocating for.
fn parse_cursor_report(buf: &[u8]) -> Option<Size> {
    let rest = buf.strip_prefix(b"\x1b[")?;
    let sep = rest.iter().position(|&b| b == b';')?;
    let rows = parse_u16(&rest[..sep])?;
    let cols = parse_u16(&rest[sep + 1..])?;
    Some(Size { rows, cols })
}

/// Parse a non-empty all-digit byte slice as a u16.
fn parse_u16(buf: &[u8]) -> Option<u16> {
    if buf.is_empty() {
        return None;
    }
    let mut val: u16 = 0;
    for &b in buf {
        if !b.is_ascii_digit() {
            return None;
        }
        val = val
            .checked_mul(10)?
            .checked_add(u16::from(b - b'0'))?;
    }
    Some(val)
}

// ─── Session ────────────────────────────────────────────────────────────────

/// Raw-mode terminal session with RAII cleanup.
///
/// [`enter`](Self::enter) switches to full-screen mode (raw termios,
/// alternate screen, mouse tracking); the terminal is restored when the
/// session is dropped — even on panic, and on every error path out of
/// the main loop.
pub struct Session {
    /// Original termios saved before entering raw mode.
    #[cfg(unix)]
    original_termios: Option<libc::termios>,

    /// Whether we're in full-screen raw mode.
    active: bool,
}

impl Session {
    /// Create an inactive session. Does not touch the terminal.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            active: false,
        }
    }

    /// Whether the session currently holds the terminal in raw mode.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Enter full-screen raw mode.
    ///
    /// Validates that stdin and stdout are terminals, saves the current
    /// attributes, disables canonical buffering / echo / signal keys /
    /// output post-processing, sets VMIN=0 VTIME=1 so reads never block
    /// longer than ~100ms, then enables the alternate screen and mouse
    /// tracking. Installs the panic hook and the SIGWINCH handler.
    ///
    /// Idempotent: entering an active session is a no-op.
    ///
    /// # Errors
    ///
    /// [`TermError::NotATerminal`] if either stdio stream is not
    /// interactive; [`TermError::Setup`] if termios get/set fails;
    /// [`TermError::Io`] if writing the mode switches fails.
    pub fn enter(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }

        if !is_tty() {
            return Err(TermError::NotATerminal);
        }

        install_panic_hook();
        self.enable_raw_mode()?;
        install_resize_handler();

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::enter_alt_screen(&mut lock)?;
        ansi::enable_mouse(&mut lock)?;
        lock.flush()?;

        self.active = true;
        Ok(())
    }

    /// Leave raw mode and restore the terminal.
    ///
    /// Disables mouse tracking, exits the alternate screen, restores
    /// the saved attributes. Idempotent; also invoked from `Drop`.
    ///
    /// # Errors
    ///
    /// [`TermError::Io`] if terminal output fails, [`TermError::Setup`]
    /// if the attribute restore fails.
    pub fn leave(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::disable_mouse(&mut lock)?;
        ansi::cursor_show(&mut lock)?;
        ansi::exit_alt_screen(&mut lock)?;
        lock.flush()?;
        drop(lock);

        self.disable_raw_mode()?;
        self.active = false;
        Ok(())
    }

    /// Query the terminal window size.
    ///
    /// Primary path is the `TIOCGWINSZ` ioctl. When that fails (or
    /// reports zero columns), fall back to parking the cursor at the
    /// bottom-right corner and reading a cursor position report back
    /// from the input stream.
    ///
    /// # Errors
    ///
    /// [`TermError::WindowSizeUnavailable`] when both paths fail;
    /// [`TermError::Io`] if the fallback's reads or writes fail outright.
    pub fn window_size(&self) -> Result<Size> {
        if let Some(size) = query_size_ioctl() {
            return Ok(size);
        }
        self.query_size_by_cursor()
    }

    /// Geometry fallback: bottom-right park + device status report.
    fn query_size_by_cursor(&self) -> Result<Size> {
        // Needs raw mode — the reply must not be echoed or line-buffered.
        if !self.active {
            return Err(TermError::WindowSizeUnavailable);
        }

        {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            ansi::cursor_to_bottom_right(&mut lock)?;
            ansi::request_cursor_position(&mut lock)?;
            lock.flush()?;
        }

        // Collect the reply up to the terminating 'R'. A timeout mid-
        // reply means the terminal never answered.
        let mut reply = Vec::with_capacity(16);
        loop {
            match read_stdin_byte()? {
                Some(b'R') => break,
                Some(b) if reply.len() < 31 => reply.push(b),
                _ => return Err(TermError::WindowSizeUnavailable),
            }
        }

        parse_cursor_report(&reply).ok_or(TermError::WindowSizeUnavailable)
    }

    // ── Raw mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> Result<()> {
        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) != 0 {
                return Err(TermError::Setup(io::Error::last_os_error()));
            }

            // Save original for restore, plus the panic hook's backup.
            self.original_termios = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            termios.c_iflag &= !(libc::BRKINT
                | libc::INPCK
                | libc::PARMRK
                | libc::INLCR
                | libc::IGNCR
                | libc::ISTRIP
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;

            // VMIN=0, VTIME=1: reads return within 1/10s even with no
            // data, so escape sequences can be told apart from a lone
            // Escape keypress.
            termios.c_cc[libc::VMIN] = 0;
            termios.c_cc[libc::VTIME] = 1;

            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(TermError::Setup(io::Error::last_os_error()));
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> Result<()> {
        if let Some(ref original) = self.original_termios {
            unsafe {
                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original) != 0 {
                    return Err(TermError::Setup(io::Error::last_os_error()));
                }
            }

            // Clear the backup — restore succeeded.
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }

            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    // ── Size ──────────────────────────────────────────────────────────

    #[test]
    fn size_equality() {
        assert_eq!(Size { rows: 24, cols: 80 }, Size { rows: 24, cols: 80 });
        assert_ne!(Size { rows: 24, cols: 80 }, Size { rows: 40, cols: 120 });
    }

    // ── Cursor report parsing ────────────────────────────────────────

    #[test]
    fn cursor_report_parses() {
        assert_eq!(
            parse_cursor_report(b"\x1b[24;80"),
            Some(Size { rows: 24, cols: 80 })
        );
    }

    #[test]
    fn cursor_report_large_values() {
        assert_eq!(
            parse_cursor_report(b"\x1b[500;1000"),
            Some(Size { rows: 500, cols: 1000 })
        );
    }

    #[test]
    fn cursor_report_requires_csi_prefix() {
        assert_eq!(parse_cursor_report(b"[24;80"), None);
        assert_eq!(parse_cursor_report(b"24;80"), None);
    }

    #[test]
    fn cursor_report_requires_both_fields() {
        assert_eq!(parse_cursor_report(b"\x1b[24"), None);
        assert_eq!(parse_cursor_report(b"\x1b[24;"), None);
        assert_eq!(parse_cursor_report(b"\x1b[;80"), None);
    }

    #[test]
    fn cursor_report_rejects_garbage() {
        assert_eq!(parse_cursor_report(b"\x1b[2a;80"), None);
        assert_eq!(parse_cursor_report(b""), None);
    }

    #[test]
    fn parse_u16_overflow_is_none() {
        assert_eq!(parse_u16(b"99999"), None);
    }

    // ── Emergency restore sequence ──────────────────────────────────

    #[test]
    fn emergency_restore_exits_alt_screen_last() {
        let s = std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
        assert!(s.ends_with("\x1b[?1049l"));
    }

    #[test]
    fn emergency_restore_contains_all_sequences() {
        let s = std::str::from_utf8(EMERGENCY_RESTORE).unwrap();
        assert!(s.contains("\x1b[?1000l"), "must disable mouse tracking");
        assert!(s.contains("\x1b[?25h"), "must show cursor");
    }

    // ── Resize flag ─────────────────────────────────────────────────

    #[test]
    fn take_resize_drains_the_flag() {
        RESIZE_PENDING.store(true, Ordering::Relaxed);
        assert!(take_resize());
        assert!(!take_resize());
    }

    // ── Session ─────────────────────────────────────────────────────

    #[test]
    fn session_starts_inactive() {
        let session = Session::new();
        assert!(!session.is_active());
    }

    #[test]
    fn leave_without_enter_is_noop() {
        let mut session = Session::new();
        session.leave().unwrap();
        assert!(!session.is_active());
    }

    #[test]
    fn enter_off_terminal_fails() {
        // Test harnesses run without a tty; entering must refuse
        // rather than mangle a pipe. Skip when run interactively.
        if is_tty() {
            return;
        }
        let mut session = Session::new();
        assert!(matches!(session.enter(), Err(TermError::NotATerminal)));
        assert!(!session.is_active());
    }

    #[test]
    fn drop_without_enter_is_safe() {
        let session = Session::new();
        drop(session);
    }
}
