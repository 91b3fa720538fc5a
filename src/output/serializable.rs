use crate::xml_elem::{Attributes, Element};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// A wrapper around a list of [`Element`]s that implements [`Serialize`] as `{"items": [...]}`.
#[derive(Clone, Default, Debug, Serialize)]
pub struct SerializableXml<'x> {
    items: Vec<SerializableElement<'x>>,
}

impl<'x> SerializableXml<'x> {
    pub fn new<I: IntoIterator<Item = &'x Element>>(elems: I) -> Self {
        Self {
            items: elems.into_iter().map(SerializableElement::from).collect(),
        }
    }
}

/// One element, with its attributes and descendants.
///
/// Fields that would be empty (no namespace, no attributes, no text, no children) are left out.
#[derive(Clone, Debug, Serialize)]
pub struct SerializableElement<'x> {
    name: &'x str,

    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'x str>,

    #[serde(skip_serializing_if = "Attributes::is_empty", serialize_with = "serialize_attributes")]
    attributes: &'x Attributes,

    #[serde(skip_serializing_if = "str::is_empty")]
    text: &'x str,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<SerializableElement<'x>>,
}

impl<'x> From<&'x Element> for SerializableElement<'x> {
    fn from(elem: &'x Element) -> Self {
        Self {
            name: elem.name().local_name(),
            namespace: elem.name().namespace(),
            attributes: elem.attributes(),
            text: elem.text_content(),
            children: elem.children().iter().map(Self::from).collect(),
        }
    }
}

/// Attributes as a JSON object in document order, keyed by their Clark-notation names.
fn serialize_attributes<S: Serializer>(attributes: &&Attributes, ser: S) -> Result<S::Ok, S::Error> {
    let mut map = ser.serialize_map(Some(attributes.len()))?;
    for (name, value) in attributes.iter() {
        map.serialize_entry(&name.to_string(), value)?;
    }
    map.end()
}
