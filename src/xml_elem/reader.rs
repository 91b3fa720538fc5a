use crate::xml_elem::events::{EventSource, XmlEvent};
use crate::xml_elem::{Attributes, InvalidXml, QualifiedName};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::io::BufRead;

/// An [`EventSource`] that tokenizes XML text with quick-xml.
///
/// Names are resolved against the document's own `xmlns` declarations, which are not themselves reported as
/// attributes. Empty elements (`<a/>`) are reported as a start immediately followed by an end. Comments, processing
/// instructions, and declarations are skipped.
///
/// Each call to [`EventSource::next_event`] reads only as far as the next event, so a caller that stops pulling never
/// causes the rest of the input to be read.
pub struct XmlReaderEvents<R> {
    reader: NsReader<R>,
    buf: Vec<u8>,
}

impl<'a> XmlReaderEvents<&'a [u8]> {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &'a str) -> Self {
        Self::new(NsReader::from_str(text))
    }
}

impl<R: BufRead> XmlReaderEvents<R> {
    pub fn from_reader(reader: R) -> Self {
        Self::new(NsReader::from_reader(reader))
    }

    fn new(mut reader: NsReader<R>) -> Self {
        let config = reader.config_mut();
        config.trim_text(true);
        config.expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::with_capacity(256),
        }
    }
}

impl<R: BufRead> EventSource for XmlReaderEvents<R> {
    type Error = InvalidXml;

    fn next_event(&mut self) -> Result<Option<XmlEvent>, Self::Error> {
        loop {
            self.buf.clear();
            let (resolved, event) = self.reader.read_resolved_event_into(&mut self.buf)?;
            let element_ns = owned_namespace(resolved);
            match event {
                Event::Start(start) => return start_event(&self.reader, element_ns?, &start).map(Some),
                Event::End(_) => return Ok(Some(XmlEvent::End)),
                Event::Text(text) => {
                    let text = text.unescape()?;
                    if !text.is_empty() {
                        return Ok(Some(XmlEvent::Text(text.into_owned())));
                    }
                }
                Event::CData(cdata) => {
                    let bytes = cdata.into_inner();
                    if !bytes.is_empty() {
                        return Ok(Some(XmlEvent::Text(String::from_utf8_lossy(&bytes).into_owned())));
                    }
                }
                Event::Eof => return Ok(None),
                // comments, declarations, processing instructions, doctypes
                _ => {}
            }
        }
    }
}

fn start_event<R>(
    reader: &NsReader<R>,
    namespace: Option<String>,
    start: &BytesStart,
) -> Result<XmlEvent, InvalidXml> {
    let name = qualified(namespace, start.local_name().as_ref());
    let mut attributes = Attributes::new();
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local_name) = reader.resolve_attribute(attr.key);
        let attr_name = qualified(owned_namespace(resolved)?, local_name.as_ref());
        attributes.insert(attr_name, attr.unescape_value()?.into_owned());
    }
    Ok(XmlEvent::Start { name, attributes })
}

fn owned_namespace(resolved: ResolveResult) -> Result<Option<String>, InvalidXml> {
    match resolved {
        ResolveResult::Bound(Namespace(ns)) => Ok(Some(String::from_utf8_lossy(ns).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(InvalidXml::UnknownPrefix(String::from_utf8_lossy(&prefix).into_owned())),
    }
}

fn qualified(namespace: Option<String>, local_name: &[u8]) -> QualifiedName {
    let local_name = String::from_utf8_lossy(local_name).into_owned();
    match namespace {
        Some(ns) => QualifiedName::with_namespace(ns, local_name),
        None => QualifiedName::new(local_name),
    }
}
