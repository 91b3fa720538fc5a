//! Selectors and the searches that run them.
//!
//! A [`Selector`] is a chain of [`Step`]s, parsed from text like `service[name=S] operation > input`. It can search
//! a materialized tree ([`Elements::find`], also available as [`crate::xml_elem::Element::find`] and
//! [`crate::xml_elem::Document::find`]) or a stream of events ([`Selector::stream`]). Both searches find the same
//! elements, in the same order.
mod namespaces;
mod path;
pub mod path_matcher;
mod selector;
mod single;
mod stream_search;
mod tree_search;

pub use crate::query::ParseError;
pub use crate::xml_elem::EventSource;
pub use namespaces::*;
pub use path::*;
pub use selector::*;
pub use single::*;
pub use stream_search::*;
pub use tree_search::*;
