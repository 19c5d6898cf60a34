// SPDX-License-Identifier: MIT
//
// Cursor movement over a document.
//
// The cursor tracks a raw-byte position (`cx`, `cy`) plus the render
// column `rx` derived from it before each frame. `cy` ranges over
// `0..=num_rows` — the index one past the last row is a valid resting
// place, an empty virtual line at the end of the document.

use crate::document::Document;

/// A requested cursor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    ForwardChar,
    BackwardChar,
    NextLine,
    PrevLine,
}

/// Whether a motion changed the cursor or hit a document edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    AtBoundary,
}

/// Cursor position in document space.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Byte column within the current row's raw bytes.
    pub cx: usize,
    /// Row index, up to and including the sentinel row `num_rows`.
    pub cy: usize,
    /// Render column, recomputed from `cx` during scrolling.
    pub rx: usize,
}

impl Cursor {
    #[must_use]
    pub const fn new() -> Self {
        Self { cx: 0, cy: 0, rx: 0 }
    }

    fn row_len(doc: &Document, cy: usize) -> usize {
        doc.row(cy).map_or(0, |row| row.len())
    }

    /// Apply one motion, wrapping horizontally at row edges and
    /// snapping `cx` back inside the row after vertical moves.
    pub fn step(&mut self, motion: Move, doc: &Document) -> MoveOutcome {
        let outcome = match motion {
            Move::BackwardChar => {
                if self.cx > 0 {
                    self.cx -= 1;
                    MoveOutcome::Moved
                } else if self.cy > 0 {
                    // Wrap to the end of the previous row.
                    self.cy -= 1;
                    self.cx = Self::row_len(doc, self.cy);
                    MoveOutcome::Moved
                } else {
                    MoveOutcome::AtBoundary
                }
            }
            Move::ForwardChar => {
                let len = Self::row_len(doc, self.cy);
                if self.cx < len {
                    self.cx += 1;
                    MoveOutcome::Moved
                } else if self.cy < doc.num_rows() {
                    // Wrap to the start of the next row.
                    self.cy += 1;
                    self.cx = 0;
                    MoveOutcome::Moved
                } else {
                    MoveOutcome::AtBoundary
                }
            }
            Move::PrevLine => {
                if self.cy > 0 {
                    self.cy -= 1;
                    MoveOutcome::Moved
                } else {
                    MoveOutcome::AtBoundary
                }
            }
            Move::NextLine => {
                if self.cy < doc.num_rows() {
                    self.cy += 1;
                    MoveOutcome::Moved
                } else {
                    MoveOutcome::AtBoundary
                }
            }
        };

        // A vertical move can land on a shorter row.
        let len = Self::row_len(doc, self.cy);
        if self.cx > len {
            self.cx = len;
        }

        outcome
    }

    pub fn line_start(&mut self) {
        self.cx = 0;
    }

    pub fn line_end(&mut self, doc: &Document) {
        self.cx = Self::row_len(doc, self.cy);
    }

    pub fn buffer_start(&mut self) {
        self.cx = 0;
        self.cy = 0;
    }

    /// Jump to the sentinel row past the last line.
    pub fn buffer_end(&mut self, doc: &Document) {
        self.cx = 0;
        self.cy = doc.num_rows();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn doc(lines: &[&[u8]]) -> Document {
        let mut doc = Document::new();
        for line in lines {
            doc.push_line(line.to_vec());
        }
        doc
    }

    #[test]
    fn backward_at_origin_is_boundary() {
        let doc = doc(&[b"abc"]);
        let mut cur = Cursor::new();
        assert_eq!(cur.step(Move::BackwardChar, &doc), MoveOutcome::AtBoundary);
        assert_eq!(cur, Cursor::new());
    }

    #[test]
    fn forward_wraps_to_next_row() {
        let doc = doc(&[b"ab", b"cd"]);
        let mut cur = Cursor { cx: 2, cy: 0, rx: 0 };
        assert_eq!(cur.step(Move::ForwardChar, &doc), MoveOutcome::Moved);
        assert_eq!((cur.cx, cur.cy), (0, 1));
    }

    #[test]
    fn backward_wraps_to_previous_row_end() {
        let doc = doc(&[b"abc", b"d"]);
        let mut cur = Cursor { cx: 0, cy: 1, rx: 0 };
        assert_eq!(cur.step(Move::BackwardChar, &doc), MoveOutcome::Moved);
        assert_eq!((cur.cx, cur.cy), (3, 0));
    }

    #[test]
    fn forward_stops_at_sentinel_row() {
        let doc = doc(&[b"a"]);
        let mut cur = Cursor { cx: 0, cy: 1, rx: 0 };
        assert_eq!(cur.step(Move::ForwardChar, &doc), MoveOutcome::AtBoundary);
        assert_eq!((cur.cx, cur.cy), (0, 1));
    }

    #[test]
    fn next_line_reaches_sentinel_then_stops() {
        let doc = doc(&[b"a", b"b"]);
        let mut cur = Cursor::new();
        assert_eq!(cur.step(Move::NextLine, &doc), MoveOutcome::Moved);
        assert_eq!(cur.step(Move::NextLine, &doc), MoveOutcome::Moved);
        assert_eq!(cur.cy, 2);
        assert_eq!(cur.step(Move::NextLine, &doc), MoveOutcome::AtBoundary);
    }

    #[test]
    fn prev_line_at_top_is_boundary() {
        let doc = doc(&[b"a"]);
        let mut cur = Cursor::new();
        assert_eq!(cur.step(Move::PrevLine, &doc), MoveOutcome::AtBoundary);
    }

    #[test]
    fn vertical_move_snaps_cx_to_shorter_row() {
        let doc = doc(&[b"longline", b"ab"]);
        let mut cur = Cursor { cx: 8, cy: 0, rx: 0 };
        cur.step(Move::NextLine, &doc);
        assert_eq!((cur.cx, cur.cy), (2, 1));
    }

    #[test]
    fn line_end_moves_to_row_len() {
        let doc = doc(&[b"hello"]);
        let mut cur = Cursor::new();
        cur.line_end(&doc);
        assert_eq!(cur.cx, 5);
        cur.line_start();
        assert_eq!(cur.cx, 0);
    }

    #[test]
    fn line_end_on_sentinel_row_is_zero() {
        let doc = doc(&[b"hello"]);
        let mut cur = Cursor { cx: 0, cy: 1, rx: 0 };
        cur.line_end(&doc);
        assert_eq!(cur.cx, 0);
    }

    #[test]
    fn buffer_jumps() {
        let doc = doc(&[b"a", b"b", b"c"]);
        let mut cur = Cursor { cx: 1, cy: 1, rx: 0 };
        cur.buffer_end(&doc);
        assert_eq!((cur.cx, cur.cy), (0, 3));
        cur.buffer_start();
        assert_eq!((cur.cx, cur.cy), (0, 0));
    }

    #[test]
    fn movement_on_empty_document() {
        let doc = Document::new();
        let mut cur = Cursor::new();
        assert_eq!(cur.step(Move::ForwardChar, &doc), MoveOutcome::AtBoundary);
        assert_eq!(cur.step(Move::NextLine, &doc), MoveOutcome::AtBoundary);
        assert_eq!(cur.step(Move::BackwardChar, &doc), MoveOutcome::AtBoundary);
        assert_eq!(cur.step(Move::PrevLine, &doc), MoveOutcome::AtBoundary);
        assert_eq!(cur, Cursor::new());
    }
}
