//! Select elements from XML documents, using CSS-like selectors.
//!
//! The crate is split into a few modules:
//!
//! - [`xml_elem`] is the document model: [`xml_elem::Document`], [`xml_elem::Element`], and the [`xml_elem::XmlEvent`]s
//!   that a streaming parser produces.
//! - [`select`] holds [`select::Selector`] and the two ways of running one: over a tree, or over a stream of events.
//! - [`output`] writes matched elements as JSON or plain text.
//! - [`run`] puts them all together, the way the `xmq` CLI does.
//!
//! ```
//! use xmq::select::Selector;
//! use xmq::xml_elem::{Document, XmlReaderEvents};
//!
//! let xml = r#"
//!   <definitions>
//!     <message name="GetUserRequest"><part name="id"/></message>
//!     <message name="GetUserResponse"><part name="user"/></message>
//!   </definitions>"#;
//! let selector = Selector::parse("message[name=GetUserRequest] part").unwrap();
//!
//! // over a tree
//! let doc = Document::parse(xml).unwrap();
//! let part = doc.find(&selector).single().unwrap();
//! assert_eq!(part.get_attr("name"), Some("id"));
//!
//! // over a stream
//! let streamed: Vec<_> = selector.stream(XmlReaderEvents::from_str(xml)).collect::<Result<_, _>>().unwrap();
//! assert_eq!(streamed, vec![part.clone()]);
//! ```
pub mod output;
pub mod query;
pub mod run;
pub mod select;
mod util;
pub mod xml_elem;
