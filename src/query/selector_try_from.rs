use crate::query::query::Rule;
use crate::query::{Pair, ParseError, Query};
use crate::select::{AttrPredicate, Combinator, NameTest, NamespaceLookup, Selector, Step};
use crate::xml_elem::QualifiedName;

impl Selector {
    pub(crate) fn try_parse<N: NamespaceLookup + ?Sized>(value: &str, namespaces: &N) -> Result<Self, ParseError> {
        let parsed = Query::parse(value)?;
        let Some(selector_pair) = parsed
            .flat_map(|top| top.into_inner())
            .find(|pair| pair.as_rule() == Rule::selector)
        else {
            return Err(ParseError::unplaced("expected a selector"));
        };

        let mut steps = Vec::new();
        let mut combinator = Combinator::Descendant;
        for pair in selector_pair.into_inner() {
            match pair.as_rule() {
                Rule::step => {
                    steps.push(Self::find_step(pair, combinator, namespaces)?);
                    combinator = Combinator::Descendant;
                }
                Rule::child_combinator => combinator = Combinator::Child,
                Rule::descendant_combinator => combinator = Combinator::Descendant,
                _ => return Err(unexpected(&pair)),
            }
        }
        Selector::new(steps)
    }

    fn find_step<N: NamespaceLookup + ?Sized>(
        root: Pair,
        combinator: Combinator,
        namespaces: &N,
    ) -> Result<Step, ParseError> {
        let mut name = NameTest::Any;
        let mut predicates = Vec::new();
        for pair in root.into_inner() {
            match pair.as_rule() {
                Rule::any_name => name = NameTest::Any,
                Rule::element_name => {
                    name = match ParsedName::from_wrapper(pair, namespaces)? {
                        ParsedName::Local(local_name) => NameTest::Local(local_name),
                        ParsedName::Qualified(qname) => NameTest::Exact(qname),
                    }
                }
                Rule::predicate => predicates.push(Self::find_predicate(pair, namespaces)?),
                _ => return Err(unexpected(&pair)),
            }
        }
        Ok(Step::new(name, predicates, combinator))
    }

    fn find_predicate<N: NamespaceLookup + ?Sized>(root: Pair, namespaces: &N) -> Result<AttrPredicate, ParseError> {
        let span = root.as_span();
        let mut name = None;
        let mut value = None;
        for pair in root.into_inner() {
            match pair.as_rule() {
                Rule::attr_name => {
                    // Attributes don't inherit the element's namespace: an unprefixed name is in no namespace.
                    name = Some(match ParsedName::from_wrapper(pair, namespaces)? {
                        ParsedName::Local(local_name) => QualifiedName::new(local_name),
                        ParsedName::Qualified(qname) => qname,
                    });
                }
                Rule::unquoted_value => value = Some(pair.as_str().to_string()),
                Rule::quoted_value => {
                    let text = pair.into_inner().next().map(|inner| inner.as_str()).unwrap_or_default();
                    value = Some(unescape(text));
                }
                _ => return Err(unexpected(&pair)),
            }
        }
        match (name, value) {
            (Some(name), Some(value)) => Ok(AttrPredicate { name, value }),
            _ => Err(ParseError::at(span, "attribute predicate must be [name=value]")),
        }
    }
}

enum ParsedName {
    Local(String),
    Qualified(QualifiedName),
}

impl ParsedName {
    /// Reads an `element_name` or `attr_name`, each of which wraps exactly one name form.
    fn from_wrapper<N: NamespaceLookup + ?Sized>(wrapper: Pair, namespaces: &N) -> Result<Self, ParseError> {
        let span = wrapper.as_span();
        let Some(pair) = wrapper.into_inner().next() else {
            return Err(ParseError::at(span, "expected a name"));
        };
        match pair.as_rule() {
            Rule::local_name => Ok(Self::Local(pair.as_str().to_string())),
            Rule::clark_name => {
                let (uri, local_name) = Self::two_parts(pair)?;
                Ok(Self::Qualified(if uri.is_empty() {
                    QualifiedName::new(local_name)
                } else {
                    QualifiedName::with_namespace(uri, local_name)
                }))
            }
            Rule::prefixed_name => {
                let (prefix, local_name) = Self::two_parts(pair.clone())?;
                let Some(uri) = namespaces.namespace_uri(prefix) else {
                    return Err(ParseError::at(
                        pair.as_span(),
                        format!("unknown namespace prefix {prefix:?}"),
                    ));
                };
                Ok(Self::Qualified(QualifiedName::with_namespace(uri, local_name)))
            }
            _ => Err(unexpected(&pair)),
        }
    }

    fn two_parts(pair: Pair) -> Result<(&str, &str), ParseError> {
        let span = pair.as_span();
        let mut inner = pair.into_inner();
        match (inner.next(), inner.next()) {
            (Some(first), Some(second)) => Ok((first.as_str(), second.as_str())),
            _ => Err(ParseError::at(span, "malformed qualified name")),
        }
    }
}

fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => result.extend(chars.next()),
            _ => result.push(ch),
        }
    }
    result
}

fn unexpected(pair: &Pair) -> ParseError {
    ParseError::at(pair.as_span(), format!("unexpected {:?}", pair.as_rule()))
}
