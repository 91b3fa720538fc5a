//! Selector text parsing.
//!
//! The grammar lives in `grammar.pest`; this module turns its parse tree into a [`crate::select::Selector`].
mod error;
mod query;
mod selector_try_from;

pub use error::*;
pub use query::Error;
pub(crate) use query::{Pair, Query};
