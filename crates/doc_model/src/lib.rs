//! Document Model - Core document tree structure and types
//!
//! This crate provides the tree the table engine edits: typed node storage with
//! stable ids, structural attributes with canonical defaults, owned fragments
//! for copy and paste, and a [`Writer`] that records every edit as a [`Change`].

mod attribute;
mod differ;
mod document;
mod error;
mod fragment;
mod node;
mod paragraph;
mod run;
pub mod table;
mod tree;
mod writer;

pub use attribute::*;
pub use differ::*;
pub use document::*;
pub use error::*;
pub use fragment::*;
pub use node::*;
pub use paragraph::*;
pub use run::*;
pub use table::*;
pub use tree::*;
pub use writer::*;
