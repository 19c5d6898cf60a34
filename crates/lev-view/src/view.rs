// SPDX-License-Identifier: MIT
//
// Viewport reconciliation: keep the cursor inside the visible window
// by sliding the window, never the cursor.

use crate::cursor::Cursor;
use crate::document::Document;

/// The rectangle of the document currently on screen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// First visible document row.
    pub row_offset: usize,
    /// First visible render column.
    pub col_offset: usize,
    /// Text rows available (screen rows minus the two bars).
    pub rows: usize,
    /// Screen columns.
    pub cols: usize,
}

impl Viewport {
    #[must_use]
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self {
            row_offset: 0,
            col_offset: 0,
            rows,
            cols,
        }
    }

    /// Recompute the cursor's render column and slide the offsets the
    /// minimum distance needed to bring the cursor on screen. Called
    /// once before each frame; applying it twice in a row changes
    /// nothing.
    pub fn scroll(&mut self, cursor: &mut Cursor, doc: &Document) {
        cursor.rx = doc
            .row(cursor.cy)
            .map_or(0, |row| row.cx_to_rx(cursor.cx));

        // A window too short or narrow for any text still reconciles
        // as if it held one cell, so `row_offset <= cy` and
        // `col_offset <= rx` hold even at zero size.
        let rows = self.rows.max(1);
        let cols = self.cols.max(1);

        if cursor.cy < self.row_offset {
            self.row_offset = cursor.cy;
        } else if cursor.cy >= self.row_offset + rows {
            self.row_offset = cursor.cy + 1 - rows;
        }

        if cursor.rx < self.col_offset {
            self.col_offset = cursor.rx;
        } else if cursor.rx >= self.col_offset + cols {
            self.col_offset = cursor.rx + 1 - cols;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
