//! Writers for matched elements.
//!
//! [`SerializableXml`] and [`SerializableElement`] give a serde view of elements. [`ElementWriter`] implementations
//! write matches one at a time, which lets a streaming search print results as it finds them.
mod serializable;
mod writers;

pub use serializable::*;
pub use writers::*;
