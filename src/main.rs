// SPDX-License-Identifier: MIT
//
// lev — a little terminal file viewer.
//
// This is the main binary that wires together the crates:
//
//   lev-term → raw-mode session, escape sequences, key decoding
//   lev-view → document, rows, cursor, viewport
//
// The Viewer owns the loop. Each iteration drains the pending-resize
// flag, repaints, and decodes one key:
//
//   stdin → decoder → dispatch → cursor/viewport mutation
//   scroll → compose frame → one write to stdout
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ text rows                    │  ← h - 2 rows
//   ├──────────────────────────────┤
//   │ status bar (INVERSE)         │  ← 1 row
//   ├──────────────────────────────┤
//   │ message bar                  │  ← 1 row
//   └──────────────────────────────┘

use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, info};

use lev_term::ansi;
use lev_term::key::{Decoder, Key};
use lev_term::terminal::{self, Session};
use lev_term::TermError;
use lev_view::cursor::{Cursor, Move, MoveOutcome};
use lev_view::status::StatusMessage;
use lev_view::view::Viewport;
use lev_view::{Document, DocumentError};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const LOG_FILE: &str = "lev.log";

// ─── Errors ─────────────────────────────────────────────────────────────────

/// Everything that can end the viewer abnormally.
#[derive(Debug, Error)]
enum FatalError {
    #[error(transparent)]
    Term(#[from] TermError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("terminal write failed: {0}")]
    Io(#[from] io::Error),
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// Send tracing output to a log file in the working directory. Stdout
/// belongs to the frame renderer, so logs can never go there. Logging
/// is diagnostic only — if the file can't be opened, run without it.
fn init_logging() {
    let Ok(file) = OpenOptions::new().create(true).append(true).open(LOG_FILE) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

// ─── Viewer ─────────────────────────────────────────────────────────────────

/// What the loop should do after a key is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Continue,
    Quit,
}

/// The viewer: one document, one cursor, one window.
struct Viewer {
    session: Session,
    doc: Document,
    cursor: Cursor,
    viewport: Viewport,
    status: Option<StatusMessage>,
}

impl Viewer {
    fn new(doc: Document) -> Self {
        Self {
            session: Session::new(),
            doc,
            cursor: Cursor::new(),
            viewport: Viewport::new(0, 0),
            status: None,
        }
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage::new(text));
    }

    /// Re-query the window and reserve the bottom two rows for the bars.
    fn update_geometry(&mut self) -> Result<(), FatalError> {
        let size = self.session.window_size()?;
        self.viewport.rows = usize::from(size.rows).saturating_sub(2);
        self.viewport.cols = usize::from(size.cols);
        debug!(rows = size.rows, cols = size.cols, "window geometry");
        Ok(())
    }

    // ── Input dispatch ──────────────────────────────────────────────

    fn dispatch(&mut self, key: Key) -> Result<Action, FatalError> {
        match key {
            Key::Quit => return Ok(Action::Quit),
            Key::ForwardChar => self.move_cursor(Move::ForwardChar)?,
            Key::BackwardChar => self.move_cursor(Move::BackwardChar)?,
            Key::NextLine => self.move_cursor(Move::NextLine)?,
            Key::PrevLine => self.move_cursor(Move::PrevLine)?,
            Key::LineStart => self.cursor.line_start(),
            Key::LineEnd => self.cursor.line_end(&self.doc),
            Key::ScrollUp => self.page_move(Move::PrevLine)?,
            Key::ScrollDown => self.page_move(Move::NextLine)?,
            Key::BufferStart => {
                self.cursor.buffer_start();
                self.viewport.row_offset = 0;
            }
            Key::BufferEnd => self.cursor.buffer_end(&self.doc),
            // A viewer never edits; delete keys and stray input do
            // nothing.
            Key::DeleteForward | Key::DeleteBackward | Key::Escape | Key::Other(_) => {}
        }
        Ok(Action::Continue)
    }

    fn move_cursor(&mut self, motion: Move) -> Result<(), FatalError> {
        if self.cursor.step(motion, &self.doc) == MoveOutcome::AtBoundary {
            self.end_of_buffer()?;
        }
        Ok(())
    }

    /// Page motion: jump the cursor to the window edge, then replay
    /// single-line moves so the viewport slides with nearly a full
    /// screen of overlap context.
    fn page_move(&mut self, motion: Move) -> Result<(), FatalError> {
        if motion == Move::PrevLine {
            self.cursor.cy = self.viewport.row_offset;
        } else {
            self.cursor.cy = (self.viewport.row_offset + self.viewport.rows)
                .saturating_sub(1)
                .min(self.doc.num_rows());
        }

        let mut steps = self.viewport.rows.saturating_sub(4);
        while steps > 0 {
            if self.cursor.step(motion, &self.doc) == MoveOutcome::AtBoundary {
                self.end_of_buffer()?;
                break;
            }
            steps -= 1;
        }
        Ok(())
    }

    /// Bell plus a transient message — the document edge pushed back.
    fn end_of_buffer(&mut self) -> Result<(), FatalError> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::bell(&mut lock)?;
        lock.flush()?;
        self.set_status("End of buffer");
        Ok(())
    }

    // ── Rendering ───────────────────────────────────────────────────

    /// Reconcile the viewport with the cursor, then push one complete
    /// frame to the terminal in a single write.
    fn refresh(&mut self) -> Result<(), FatalError> {
        self.viewport.scroll(&mut self.cursor, &self.doc);
        let frame = self.compose_frame()?;

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(&frame)?;
        lock.flush()?;
        Ok(())
    }

    /// Build the full frame in memory: hide cursor, repaint every row,
    /// bars, then park the cursor and reveal it. One buffer, so the
    /// terminal never shows a half-painted screen.
    fn compose_frame(&self) -> io::Result<Vec<u8>> {
        let mut frame = Vec::with_capacity((self.viewport.rows + 2) * self.viewport.cols);

        ansi::cursor_hide(&mut frame)?;
        ansi::cursor_home(&mut frame)?;
        ansi::erase_display(&mut frame)?;

        self.draw_rows(&mut frame);
        self.draw_status_bar(&mut frame)?;
        self.draw_message_bar(&mut frame);

        let x = clamp_u16(self.cursor.rx.saturating_sub(self.viewport.col_offset));
        let y = clamp_u16(self.cursor.cy.saturating_sub(self.viewport.row_offset));
        ansi::cursor_to(&mut frame, x, y)?;
        ansi::cursor_show(&mut frame)?;

        Ok(frame)
    }

    fn draw_rows(&self, frame: &mut Vec<u8>) {
        for j in 0..self.viewport.rows {
            let filerow = j + self.viewport.row_offset;
            if let Some(row) = self.doc.row(filerow) {
                // Horizontal scroll: clip the rendered bytes to the
                // window.
                let rendered = row.rendered();
                let start = self.viewport.col_offset.min(rendered.len());
                let end = (start + self.viewport.cols).min(rendered.len());
                frame.extend_from_slice(&rendered[start..end]);
            } else if self.doc.is_empty() && j == self.welcome_row() {
                self.draw_welcome(frame);
            }
            frame.extend_from_slice(b"\r\n");
        }
    }

    /// The welcome banner sits a little above center.
    const fn welcome_row(&self) -> usize {
        self.viewport.rows / 2 - self.viewport.rows / 8
    }

    fn draw_welcome(&self, frame: &mut Vec<u8>) {
        let mut welcome = format!("lev -- version {VERSION}");
        welcome.truncate(self.viewport.cols);
        let padding = (self.viewport.cols - welcome.len()) / 2;
        for _ in 0..padding {
            frame.push(b' ');
        }
        frame.extend_from_slice(welcome.as_bytes());
    }

    fn draw_status_bar(&self, frame: &mut Vec<u8>) -> io::Result<()> {
        ansi::invert_on(frame)?;

        let name = self
            .doc
            .path()
            .map_or_else(|| String::from("*no-file*"), |p| p.display().to_string());
        let mut status = format!(
            " -:**-  {name:.20} -- line {}/{}",
            self.cursor.cy + 1,
            self.doc.num_rows()
        );
        truncate_to_width(&mut status, self.viewport.cols);

        frame.extend_from_slice(status.as_bytes());
        for _ in status.len()..self.viewport.cols {
            frame.push(b' ');
        }

        ansi::invert_off(frame)?;
        frame.extend_from_slice(b"\r\n");
        Ok(())
    }

    fn draw_message_bar(&self, frame: &mut Vec<u8>) {
        if let Some(msg) = &self.status {
            if msg.is_visible() {
                let mut text = msg.text().to_string();
                truncate_to_width(&mut text, self.viewport.cols);
                frame.extend_from_slice(text.as_bytes());
            }
        }
    }

    // ── Main loop ───────────────────────────────────────────────────

    fn run(&mut self) -> Result<(), FatalError> {
        self.session.enter()?;
        self.update_geometry()?;
        self.set_status("C-x C-c to quit");

        let mut keys = Decoder::stdin();
        self.refresh()?;
        loop {
            // Resizes are only flagged by the signal handler; all the
            // real work happens here, off signal context.
            if terminal::take_resize() {
                self.update_geometry()?;
                self.refresh()?;
            }

            let Some(key) = keys.poll_key()? else {
                continue;
            };
            match self.dispatch(key)? {
                Action::Quit => break,
                Action::Continue => self.refresh()?,
            }
        }

        info!("quit");
        self.clear_screen()?;
        self.session.leave()?;
        Ok(())
    }

    fn clear_screen(&self) -> Result<(), FatalError> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        ansi::erase_display(&mut lock)?;
        ansi::cursor_home(&mut lock)?;
        lock.flush()?;
        Ok(())
    }
}

/// Screen coordinates are bounded by the window, which is u16-sized.
fn clamp_u16(v: usize) -> u16 {
    u16::try_from(v).unwrap_or(u16::MAX)
}

/// Shorten a string to at most `max` bytes without splitting a UTF-8
/// character.
fn truncate_to_width(s: &mut String, max: usize) {
    while s.len() > max {
        s.pop();
    }
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn run(path: Option<PathBuf>) -> Result<(), FatalError> {
    info!(version = VERSION, "startup");

    let doc = match &path {
        Some(p) => {
            let doc = Document::open(p)?;
            info!(path = %p.display(), rows = doc.num_rows(), "opened");
            doc
        }
        None => Document::new(),
    };

    Viewer::new(doc).run()
}

fn main() {
    init_logging();

    let mut args = env::args_os().skip(1);
    let path = args.next().map(PathBuf::from);
    if args.next().is_some() {
        eprintln!("usage: lev [file]");
        process::exit(1);
    }

    if let Err(err) = run(path) {
        // The session restores the terminal on drop before this prints.
        eprintln!("lev: {err}");
        process::exit(1);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
