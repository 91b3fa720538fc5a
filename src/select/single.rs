use crate::select::Elements;
use crate::xml_elem::Element;
use std::fmt::{Display, Formatter};

/// A result set didn't have the number of elements a caller required.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SelectError {
    /// Nothing matched, but at least one element was required.
    NoMatch { query: String },
    /// More than one element matched, but exactly one was required.
    Ambiguous { query: String, count: usize },
}

impl std::error::Error for SelectError {}

impl Display for SelectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectError::NoMatch { query } => write!(f, "no elements matched {query:?}"),
            SelectError::Ambiguous { query, count } => {
                write!(f, "expected exactly one element matching {query:?}, but found {count}")
            }
        }
    }
}

impl<'a> Elements<'a> {
    /// The only element in this set.
    pub fn single(&self) -> Result<&'a Element, SelectError> {
        let mut iter = self.elements();
        match (iter.next(), iter.next()) {
            (Some(only), None) => Ok(only),
            (None, _) => Err(SelectError::NoMatch { query: self.query_text() }),
            (Some(_), Some(_)) => Err(SelectError::Ambiguous {
                query: self.query_text(),
                count: self.len(),
            }),
        }
    }

    /// The first element in document order. Fails only if the set is empty.
    pub fn first(&self) -> Result<&'a Element, SelectError> {
        self.first_or_none()
            .ok_or_else(|| SelectError::NoMatch { query: self.query_text() })
    }

    pub fn first_or_none(&self) -> Option<&'a Element> {
        self.elements().next()
    }

    pub fn is_present(&self) -> bool {
        !self.is_empty()
    }

    fn query_text(&self) -> String {
        self.query().unwrap_or_default().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::Selector;
    use crate::xml_elem::{parse_doc, tag};

    const XML: &str = r#"<service><operation name="Get"/><operation name="Set"/></service>"#;

    fn find<'a>(doc: &'a crate::xml_elem::Document, text: &str) -> Elements<'a> {
        doc.find(&Selector::parse(text).unwrap())
    }

    #[test]
    fn single_of_one() {
        let doc = parse_doc(XML);
        let op = find(&doc, "operation[name=Set]").single().unwrap();
        assert_eq!(tag(op), "operation[name=Set]");
    }

    #[test]
    fn single_of_none() {
        let doc = parse_doc(XML);
        let err = find(&doc, "input").single().unwrap_err();
        assert_eq!(err, SelectError::NoMatch { query: "input".to_string() });
        assert_eq!(err.to_string(), r#"no elements matched "input""#);
    }

    #[test]
    fn single_of_many() {
        let doc = parse_doc(XML);
        let err = find(&doc, "operation").single().unwrap_err();
        assert_eq!(
            err,
            SelectError::Ambiguous {
                query: "operation".to_string(),
                count: 2
            }
        );
        assert_eq!(
            err.to_string(),
            r#"expected exactly one element matching "operation", but found 2"#
        );
    }

    #[test]
    fn first_and_presence() {
        let doc = parse_doc(XML);
        let ops = find(&doc, "operation");
        assert_eq!(tag(ops.first().unwrap()), "operation[name=Get]");
        assert!(ops.is_present());

        let none = find(&doc, "input");
        assert!(none.first().is_err());
        assert!(none.first_or_none().is_none());
        assert!(!none.is_present());
    }

    #[test]
    fn query_text_is_canonical() {
        let doc = parse_doc(XML);
        let err = find(&doc, "service,  input").single().unwrap_err();
        assert_eq!(err, SelectError::NoMatch { query: "service input".to_string() });
    }
}
