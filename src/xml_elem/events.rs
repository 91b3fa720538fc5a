use crate::xml_elem::{Attributes, QualifiedName};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};

/// A structural event, as produced by a streaming XML tokenizer.
///
/// A well-formed stream nests its events: every `Start` is eventually followed by exactly one matching `End`, and
/// `Text` belongs to the innermost open element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XmlEvent {
    Start {
        name: QualifiedName,
        attributes: Attributes,
    },
    Text(String),
    End,
}

/// A pull-based producer of [`XmlEvent`]s.
///
/// `Ok(None)` means the source is exhausted. Callers may stop pulling at any time; a source must not depend on being
/// drained.
pub trait EventSource {
    type Error;

    fn next_event(&mut self) -> Result<Option<XmlEvent>, Self::Error>;
}

impl<S: EventSource + ?Sized> EventSource for &mut S {
    type Error = S::Error;

    fn next_event(&mut self) -> Result<Option<XmlEvent>, Self::Error> {
        (**self).next_event()
    }
}

/// An [`EventSource`] over any in-memory iterator of events. It never fails.
#[derive(Clone, Debug)]
pub struct IterSource<I> {
    events: I,
}

impl<I: Iterator<Item = XmlEvent>> IterSource<I> {
    pub fn new<T: IntoIterator<IntoIter = I>>(events: T) -> Self {
        Self {
            events: events.into_iter(),
        }
    }
}

impl<I: Iterator<Item = XmlEvent>> EventSource for IterSource<I> {
    type Error = Infallible;

    fn next_event(&mut self) -> Result<Option<XmlEvent>, Self::Error> {
        Ok(self.events.next())
    }
}

/// The events didn't nest properly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MalformedStreamError {
    /// An `End` event arrived when no element was open.
    UnmatchedEnd,
    /// The source ended while this many elements were still open.
    Unclosed(usize),
}

impl std::error::Error for MalformedStreamError {}

impl Display for MalformedStreamError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MalformedStreamError::UnmatchedEnd => f.write_str("element end without a matching element start"),
            MalformedStreamError::Unclosed(1) => f.write_str("input ended with 1 unclosed element"),
            MalformedStreamError::Unclosed(n) => write!(f, "input ended with {n} unclosed elements"),
        }
    }
}
