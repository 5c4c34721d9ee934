//! Table Engine - Grid geometry and structural editing for document tables
//!
//! A table is stored as rows of cells with `colspan`/`rowspan` attributes; the
//! grid those spans describe is never cached. [`TableWalker`] derives it on
//! demand, and every structural operation (row/column insertion and removal,
//! splitting, merging, heading boundaries, column widths, copy and paste) is
//! written against the walker and a [`doc_model::Writer`]. [`TableEditor`] runs
//! edits as batches and repairs the result with post-fixers before committing.

mod clipboard;
mod column_widths;
mod commands;
mod common;
mod config;
mod editor;
mod error;
mod geometry;
mod heading_refresh;
mod headings;
mod merge;
mod post_fixers;
mod split;
mod structure;
mod walker;

pub use clipboard::*;
pub use column_widths::*;
pub use commands::*;
pub use config::*;
pub use editor::*;
pub use error::*;
pub use geometry::*;
pub use heading_refresh::*;
pub use headings::*;
pub use merge::*;
pub use post_fixers::*;
pub use split::*;
pub use structure::*;
pub use walker::*;
