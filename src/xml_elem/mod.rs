//! The XML document model: names, attributes, elements, and the structural events that a streaming parser produces.
//!
//! Documents can be fully materialized ([`Document`]) or consumed as a stream of [`XmlEvent`]s from an
//! [`EventSource`]. [`XmlReaderEvents`] is the built-in source, backed by quick-xml.
mod events;
mod reader;
mod tree;

pub use events::*;
pub use reader::*;
pub use tree::*;

#[cfg(test)]
mod tree_test_utils;
#[cfg(test)]
pub(crate) use tree_test_utils::*;
