use crate::select::{Elements, Selector};
use crate::xml_elem::events::{EventSource, MalformedStreamError, XmlEvent};
use crate::xml_elem::reader::XmlReaderEvents;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::io::BufRead;

/// An element or attribute name, resolved against its namespace.
///
/// Two names are equal when both their namespace URIs and their local names are equal. The prefix that the document
/// happened to use is not kept: `<soap:Body>` and `<env:Body>` are the same name if both prefixes are bound to the
/// same URI.
///
/// The `Display` form is Clark notation: `{http://example.com/ns}local`, or just `local` for names in no namespace.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QualifiedName {
    namespace: Option<String>,
    local_name: String,
}

impl QualifiedName {
    /// A name in no namespace.
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_name: local_name.into(),
        }
    }

    pub fn with_namespace(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local_name: local_name.into(),
        }
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

impl Display for QualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            None => f.write_str(&self.local_name),
            Some(ns) => write!(f, "{{{ns}}}{}", self.local_name),
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(local_name: &str) -> Self {
        Self::new(local_name)
    }
}

/// An element's attributes.
///
/// Keys are unique. The attributes keep the order in which they were first inserted, which is the document order for
/// parsed elements; that order is only used for output, never for matching.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Attributes {
    entries: Vec<(QualifiedName, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute, replacing (in place) any previous value for the same name.
    pub fn insert(&mut self, name: QualifiedName, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| existing == &name) {
            Some((_, existing_value)) => *existing_value = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &QualifiedName) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QualifiedName, &str)> {
        self.entries.iter().map(|(name, value)| (name, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<QualifiedName>, V: Into<String>> FromIterator<(N, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut attrs = Self::new();
        for (name, value) in iter {
            attrs.insert(name.into(), value);
        }
        attrs
    }
}

/// A single element of an XML document, with its attributes and child elements.
///
/// `text` holds only the element's own character data (not its descendants'), with each run of text trimmed and
/// whitespace-only runs dropped. For example, in `<a> hello <b>there</b> world </a>`, element `a` has text
/// `"helloworld"` and one child, `b`, whose text is `"there"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Element {
    name: QualifiedName,
    attributes: Attributes,
    children: Vec<Element>,
    text: String,
}

impl Element {
    pub fn new(name: impl Into<QualifiedName>) -> Self {
        Self::with_attributes(name.into(), Attributes::new())
    }

    pub fn with_attributes(name: QualifiedName, attributes: Attributes) -> Self {
        Self {
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// Builder-style: sets an attribute in no namespace.
    pub fn attr(mut self, local_name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(QualifiedName::new(local_name), value);
        self
    }

    /// Builder-style: appends a child.
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Builder-style: appends text.
    pub fn text(mut self, text: &str) -> Self {
        self.text.push_str(text);
        self
    }

    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn text_content(&self) -> &str {
        &self.text
    }

    /// Looks up an attribute in no namespace.
    pub fn get_attr(&self, local_name: &str) -> Option<&str> {
        self.attributes.get(&QualifiedName::new(local_name))
    }

    /// Searches this element and its descendants. See [`Elements::find`].
    pub fn find(&self, selector: &Selector) -> Elements<'_> {
        Elements::of(self).find(selector)
    }

    /// Serializes this element's subtree into the events that a streaming parser would produce for it.
    pub fn to_events(&self) -> Vec<XmlEvent> {
        enum Todo<'e> {
            Open(&'e Element),
            Close,
        }
        let mut out = Vec::new();
        let mut todo = vec![Todo::Open(self)];
        while let Some(next) = todo.pop() {
            let elem = match next {
                Todo::Open(elem) => elem,
                Todo::Close => {
                    out.push(XmlEvent::End);
                    continue;
                }
            };
            out.push(XmlEvent::Start {
                name: elem.name.clone(),
                attributes: elem.attributes.clone(),
            });
            if !elem.text.is_empty() {
                out.push(XmlEvent::Text(elem.text.clone()));
            }
            todo.push(Todo::Close);
            todo.extend(elem.children.iter().rev().map(Todo::Open));
        }
        out
    }

    pub(crate) fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        // Unnest before dropping, so that a deep tree doesn't mean deep recursion.
        let mut descendants = std::mem::take(&mut self.children);
        while let Some(mut elem) = descendants.pop() {
            descendants.append(&mut elem.children);
        }
    }
}

/// A fully parsed XML document.
///
/// Building, searching, serializing to events and dropping a document all work without recursion, so they handle any
/// depth. The derived `Clone`, `PartialEq`, `Hash` and `Debug` impls on [`Element`] do recurse once per level, and can
/// overflow the stack on documents nested tens of thousands of levels deep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    /// Parses a complete XML document from a string.
    pub fn parse(text: &str) -> Result<Self, InvalidXml> {
        Self::from_events(XmlReaderEvents::from_str(text))
    }

    /// Parses a complete XML document from a reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, InvalidXml> {
        Self::from_events(XmlReaderEvents::from_reader(reader))
    }

    /// Builds a document by draining an event source.
    ///
    /// The source must produce exactly one root element.
    pub fn from_events<S>(mut source: S) -> Result<Self, InvalidXml>
    where
        S: EventSource,
        S::Error: Into<InvalidXml>,
    {
        let mut open: Vec<Element> = Vec::new();
        let mut root = None;
        while let Some(event) = source.next_event().map_err(Into::into)? {
            match event {
                XmlEvent::Start { name, attributes } => {
                    if open.is_empty() && root.is_some() {
                        return Err(InvalidXml::MultipleRoots);
                    }
                    open.push(Element::with_attributes(name, attributes));
                }
                XmlEvent::Text(text) => {
                    if let Some(current) = open.last_mut() {
                        current.push_text(&text);
                    }
                }
                XmlEvent::End => {
                    let Some(closed) = open.pop() else {
                        return Err(InvalidXml::Structure(MalformedStreamError::UnmatchedEnd));
                    };
                    match open.last_mut() {
                        Some(parent) => parent.push_child(closed),
                        None => root = Some(closed),
                    }
                }
            }
        }
        if !open.is_empty() {
            return Err(InvalidXml::Structure(MalformedStreamError::Unclosed(open.len())));
        }
        root.map(|root| Self { root }).ok_or(InvalidXml::NoRootElement)
    }

    /// Searches the whole document, starting at (and including) its root element.
    pub fn find(&self, selector: &Selector) -> Elements<'_> {
        self.root.find(selector)
    }
}

/// Various error conditions that can come from trying to read XML.
#[derive(Debug)]
pub enum InvalidXml {
    /// The underlying tokenizer failed.
    Read(quick_xml::Error),
    /// An element or attribute used a namespace prefix that was never declared.
    UnknownPrefix(String),
    /// The events didn't nest properly.
    Structure(MalformedStreamError),
    /// The document didn't contain any elements.
    NoRootElement,
    /// The document had more than one top-level element.
    MultipleRoots,
}

impl std::error::Error for InvalidXml {}

impl Display for InvalidXml {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidXml::Read(err) => write!(f, "{err}"),
            InvalidXml::UnknownPrefix(prefix) => write!(f, "unknown namespace prefix {prefix:?}"),
            InvalidXml::Structure(err) => write!(f, "{err}"),
            InvalidXml::NoRootElement => f.write_str("document has no root element"),
            InvalidXml::MultipleRoots => f.write_str("document has more than one root element"),
        }
    }
}

impl From<quick_xml::Error> for InvalidXml {
    fn from(err: quick_xml::Error) -> Self {
        Self::Read(err)
    }
}

impl From<quick_xml::events::attributes::AttrError> for InvalidXml {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::Read(quick_xml::Error::InvalidAttr(err))
    }
}

impl From<Infallible> for InvalidXml {
    fn from(value: Infallible) -> Self {
        match value {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml_elem::IterSource;
    use indoc::indoc;

    #[test]
    fn qualified_name_equality_ignores_nothing_but_prefix() {
        assert_eq!(QualifiedName::new("a"), QualifiedName::new("a"));
        assert_ne!(QualifiedName::new("a"), QualifiedName::with_namespace("urn:x", "a"));
        assert_eq!(
            QualifiedName::with_namespace("urn:x", "a"),
            QualifiedName::with_namespace("urn:x", "a")
        );
    }

    #[test]
    fn qualified_name_display() {
        assert_eq!(QualifiedName::new("a").to_string(), "a");
        assert_eq!(QualifiedName::with_namespace("urn:x", "a").to_string(), "{urn:x}a");
    }

    #[test]
    fn attributes_replace_in_place() {
        let mut attrs: Attributes = [("a", "1"), ("b", "2")].into_iter().collect();
        attrs.insert(QualifiedName::new("a"), "3");
        let entries: Vec<_> = attrs.iter().map(|(k, v)| (k.to_string(), v)).collect();
        assert_eq!(entries, vec![("a".to_string(), "3"), ("b".to_string(), "2")]);
    }

    #[test]
    fn parse_simple_document() {
        let doc = Document::parse(indoc! {r#"
            <?xml version="1.0"?>
            <!-- a comment -->
            <service name="S">
              <operation name="Get"> hello <input/> world </operation>
            </service>
        "#})
        .unwrap();
        let expected = Element::new("service").attr("name", "S").child(
            Element::new("operation")
                .attr("name", "Get")
                .text("helloworld")
                .child(Element::new("input")),
        );
        assert_eq!(doc.root, expected);
    }

    #[test]
    fn parse_namespaces() {
        let doc = Document::parse(indoc! {r#"
            <wsdl:definitions xmlns:wsdl="urn:wsdl" xmlns="urn:default" xmlns:x="urn:x">
              <types x:id="1" plain="2"/>
            </wsdl:definitions>
        "#})
        .unwrap();
        assert_eq!(doc.root.name(), &QualifiedName::with_namespace("urn:wsdl", "definitions"));
        assert!(doc.root.attributes().is_empty());
        let types = &doc.root.children()[0];
        assert_eq!(types.name(), &QualifiedName::with_namespace("urn:default", "types"));
        assert_eq!(types.attributes().get(&QualifiedName::with_namespace("urn:x", "id")), Some("1"));
        // unprefixed attributes are in no namespace, even with a default namespace in scope
        assert_eq!(types.get_attr("plain"), Some("2"));
    }

    #[test]
    fn parse_entities_and_cdata() {
        let doc = Document::parse(r#"<a v="x &amp; y">1 &lt; 2<![CDATA[<raw>]]></a>"#).unwrap();
        assert_eq!(doc.root.get_attr("v"), Some("x & y"));
        assert_eq!(doc.root.text_content(), "1 < 2<raw>");
    }

    #[test]
    fn parse_unknown_prefix() {
        let err = Document::parse("<x:a/>").unwrap_err();
        assert!(matches!(err, InvalidXml::UnknownPrefix(ref p) if p == "x"), "{err:?}");
    }

    #[test]
    fn parse_mismatched_tags() {
        let err = Document::parse("<a><b></a>").unwrap_err();
        assert!(matches!(err, InvalidXml::Read(_)), "{err:?}");
    }

    #[test]
    fn parse_empty_document() {
        let err = Document::parse("  <!-- nothing -->  ").unwrap_err();
        assert!(matches!(err, InvalidXml::NoRootElement), "{err:?}");
    }

    #[test]
    fn from_events_rejects_multiple_roots() {
        let mut events = Element::new("a").to_events();
        events.extend(Element::new("b").to_events());
        let err = Document::from_events(IterSource::new(events)).unwrap_err();
        assert!(matches!(err, InvalidXml::MultipleRoots), "{err:?}");
    }

    #[test]
    fn from_events_rejects_bad_nesting() {
        let err = Document::from_events(IterSource::new([XmlEvent::End])).unwrap_err();
        assert!(
            matches!(err, InvalidXml::Structure(MalformedStreamError::UnmatchedEnd)),
            "{err:?}"
        );

        let mut events = Element::new("a").to_events();
        events.pop();
        let err = Document::from_events(IterSource::new(events)).unwrap_err();
        assert!(
            matches!(err, InvalidXml::Structure(MalformedStreamError::Unclosed(1))),
            "{err:?}"
        );
    }

    #[test]
    fn to_events_then_from_events() {
        let elem = Element::new("a")
            .attr("k", "v")
            .text("t")
            .child(Element::new("b").child(Element::new("c")))
            .child(Element::new("d"));
        let doc = Document::from_events(IterSource::new(elem.to_events())).unwrap();
        assert_eq!(doc.root, elem);
    }
}
