// SPDX-License-Identifier: MIT
//
// A single document row: raw stored bytes plus the tab-expanded
// render form.
//
// The two representations must never disagree. `rendered` is computed
// once at construction (rows are immutable in a viewer), and
// `cx_to_rx` replays the exact same expansion arithmetic, so a cursor
// column in raw space always lands on the screen column the renderer
// put that byte at.

/// Tab stop width in rendered columns. A tab advances to the next
/// multiple of this, so it expands to 1..=4 spaces, never 0.
pub const TAB_STOP: usize = 4;

/// One line of text: the exact stored bytes (no trailing newline) and
/// their display form with tabs expanded to spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    raw: Vec<u8>,
    rendered: Vec<u8>,
}

impl Row {
    /// Build a row, expanding each tab to the next tab stop.
    #[must_use]
    pub fn new(raw: Vec<u8>) -> Self {
        let mut rendered = Vec::with_capacity(raw.len());
        for &byte in &raw {
            if byte == b'\t' {
                rendered.push(b' ');
                while rendered.len() % TAB_STOP != 0 {
                    rendered.push(b' ');
                }
            } else {
                rendered.push(byte);
            }
        }
        Self { raw, rendered }
    }

    /// The stored bytes.
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The display bytes, tabs expanded.
    #[inline]
    #[must_use]
    pub fn rendered(&self) -> &[u8] {
        &self.rendered
    }

    /// Length of the stored bytes — the valid cursor columns are
    /// `0..=len()`, one-past-end included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// True if the row has no content.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Map a cursor column in raw bytes to its rendered column.
    ///
    /// Walks the raw bytes before `cx`, advancing one column per
    /// ordinary byte and to the next tab stop per tab. Matches the
    /// expansion performed at construction exactly:
    /// `cx_to_rx(len()) == rendered().len()` for every row.
    #[must_use]
    pub fn cx_to_rx(&self, cx: usize) -> usize {
        let mut rx = 0;
        for &byte in &self.raw[..cx] {
            if byte == b'\t' {
                rx += TAB_STOP - rx % TAB_STOP;
            } else {
                rx += 1;
            }
        }
        rx
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
