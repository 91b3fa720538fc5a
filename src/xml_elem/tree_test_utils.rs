#[cfg(test)]
pub(crate) use test_utils::*;

#[cfg(test)]
mod test_utils {
    use crate::xml_elem::{Document, Element};

    pub(crate) fn parse_doc(xml: &str) -> Document {
        Document::parse(xml).unwrap_or_else(|err| panic!("bad test xml: {err}\n{xml}"))
    }

    /// A short, stable description of an element for assertions: `name[attr=value][...]`.
    pub(crate) fn tag(elem: &Element) -> String {
        let mut out = elem.name().to_string();
        for (name, value) in elem.attributes().iter() {
            out.push_str(&format!("[{name}={value}]"));
        }
        out
    }

    pub(crate) fn tags<'a, I: IntoIterator<Item = &'a Element>>(elems: I) -> Vec<String> {
        elems.into_iter().map(tag).collect()
    }
}
