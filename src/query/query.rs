use pest::Parser;
use pest_derive::Parser;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

#[derive(Parser)]
#[grammar = "query/grammar.pest"] // relative to src
struct QueryPairs;

pub struct Query {
    _private: (),
}

pub(crate) type Pair<'a> = pest::iterators::Pair<'a, Rule>;
pub(crate) type Pairs<'a> = pest::iterators::Pairs<'a, Rule>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Error {
    pub(crate) pest_error: Rc<pest::error::Error<Rule>>,
}

impl Error {
    pub(crate) fn new_from_span(span: pest::Span, message: String) -> Self {
        Self {
            pest_error: Rc::new(pest::error::Error::new_from_span(
                pest::error::ErrorVariant::CustomError { message },
                span,
            )),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.pest_error, f)
    }
}

impl std::error::Error for Error {}

impl From<pest::error::Error<Rule>> for Error {
    fn from(value: pest::error::Error<Rule>) -> Self {
        Self {
            pest_error: Rc::new(value),
        }
    }
}

impl Query {
    pub fn parse(query_text: &str) -> Result<Pairs, Error> {
        QueryPairs::parse(Rule::top, query_text).map_err(Self::format_err)
    }

    // The catch-all arm covers silent rules, which may or may not show up in Rule.
    #[allow(unreachable_patterns)]
    fn format_err(err: pest::error::Error<Rule>) -> Error {
        let renamed = err.renamed_rules(|rule| {
            match rule {
                Rule::EOI => "end of input",
                Rule::top => "valid selector",
                Rule::selector => "one or more steps",
                Rule::step => "step",
                Rule::child_combinator => "_>_",
                Rule::descendant_combinator => "space or _,_",
                Rule::any_name => "_*_",
                Rule::element_name | Rule::clark_name | Rule::prefixed_name | Rule::local_name => "element name",
                Rule::namespace_uri => "namespace URI",
                Rule::prefix => "namespace prefix",
                Rule::predicate => "_[_",
                Rule::attr_name => "attribute name",
                Rule::quoted_value | Rule::unquoted_value => "attribute value",
                Rule::double_quoted_text | Rule::single_quoted_text => "character in quoted string",
                _ => "selector",
            }
            .to_string()
            .replace('_', "\"")
        });
        Error {
            pest_error: Rc::new(renamed),
        }
    }
}
