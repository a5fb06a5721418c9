#![forbid(unsafe_code)]

//! Document tree collaborator for the domedit editing commands.
//!
//! This crate provides the pieces the command layer treats as external:
//!
//! - [`Document`] - generational node arena with atomic tree primitives
//! - [`Selection`] / [`Position`] - caret and range snapshots
//! - boundary-point utilities (`compare_positions`, `contained_nodes`,
//!   `previous_leaf`)
//! - HTML fragment parsing and serialization for paste
//! - [`NodeSnapshot`] for structural equality checks
//!
//! # Role in domedit
//! `domedit-editing` sequences and reverses the primitives exposed here.
//! Nothing in this crate knows about commands or undo.

pub mod document;
pub mod error;
pub mod fragment;
pub mod node;
pub mod range;
pub mod selection;
pub mod snapshot;

pub use document::{Document, ROOT_TAG};
pub use error::{DomError, DomResult};
pub use fragment::{RAW_TEXT_ELEMENTS, VOID_ELEMENTS, is_raw_text_element, is_void_element};
pub use node::{DocumentId, NodeId, NodeKind, byte_offset, char_len};
pub use selection::{Position, Selection};
pub use snapshot::NodeSnapshot;
