//! Tolerant HTML document model used by doc-toc.
//!
//! Pages are parsed into an arena of nodes addressed by [`NodeId`]. The tree
//! keeps text and comments verbatim so that serialising an untouched document
//! reproduces its markup, while still allowing the handful of edits the TOC
//! builder needs (insert before, append, wrap).

mod node;
mod parse;
mod selector;
mod serialize;
mod tokenizer;

pub use node::{Attribute, Descendants, Document, NodeId, NodeKind};
pub use selector::{Selector, SelectorError};
