use std::fmt::{Display, Formatter};
use std::ops::Range;

/// A syntax error in a selector string.
///
/// Selector errors are always reported when the selector is parsed, never while it's being matched. There are two
/// kinds: text that doesn't fit the grammar at all, and text that does but still can't become a selector (for example,
/// because it uses a namespace prefix nobody bound).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParseError {
    problem: Problem,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Problem {
    Grammar(crate::query::Error),
    Invalid {
        /// Byte offsets into the selector text. `None` for selectors that were built without any text.
        span: Option<Range<usize>>,
        message: String,
    },
}

impl ParseError {
    /// An error about the part of the selector text that `span` covers.
    pub(crate) fn at(span: pest::Span<'_>, message: impl Into<String>) -> Self {
        Self::invalid(Some(span.start()..span.end()), message)
    }

    /// An error about a selector that has no text to point at.
    pub(crate) fn unplaced(message: impl Into<String>) -> Self {
        Self::invalid(None, message)
    }

    fn invalid(span: Option<Range<usize>>, message: impl Into<String>) -> Self {
        Self {
            problem: Problem::Invalid {
                span,
                message: message.into(),
            },
        }
    }

    /// The byte range of the selector text this error is about, if it's about a specific part of it.
    pub fn span(&self) -> Option<Range<usize>> {
        match &self.problem {
            Problem::Grammar(err) => match err.pest_error.location {
                pest::error::InputLocation::Pos(pos) => Some(pos..pos),
                pest::error::InputLocation::Span((start, end)) => Some(start..end),
            },
            Problem::Invalid { span, .. } => span.clone(),
        }
    }

    /// Renders this error against the selector text it came from, pointing at the offending part where possible.
    pub fn render(&self, selector_text: &str) -> String {
        match &self.problem {
            Problem::Grammar(err) => err.to_string(),
            Problem::Invalid { span, message } => {
                let pointed = span
                    .as_ref()
                    .and_then(|range| pest::Span::new(selector_text, range.start, range.end))
                    .map(|span| crate::query::Error::new_from_span(span, message.clone()));
                match pointed {
                    Some(err) => err.to_string(),
                    None => message.clone(),
                }
            }
        }
    }
}

impl std::error::Error for ParseError {}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.problem {
            Problem::Grammar(err) => Display::fmt(err, f),
            Problem::Invalid { message, .. } => f.write_str(message),
        }
    }
}

impl From<crate::query::Error> for ParseError {
    fn from(err: crate::query::Error) -> Self {
        Self {
            problem: Problem::Grammar(err),
        }
    }
}
