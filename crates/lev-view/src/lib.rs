// SPDX-License-Identifier: MIT
//
// lev-view — Document model and viewport logic for lev.
//
// The text side of the viewer, deliberately byte-oriented: a row is a
// byte sequence plus its tab-expanded render form, a document is an
// ordered sequence of rows, and the cursor/viewport pair decides which
// rectangle of rendered bytes is visible. Nothing in this crate touches
// the terminal; lev-term does the talking, this crate does the math.

pub mod cursor;
pub mod document;
pub mod row;
pub mod status;
pub mod view;

pub use document::{Document, DocumentError};
