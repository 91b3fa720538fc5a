use crate::select::{path_matcher, PathStack, Selector};
use crate::xml_elem::{Attributes, Element, EventSource, InvalidXml, MalformedStreamError, QualifiedName, XmlEvent};
use std::collections::VecDeque;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

/// A lazy search over a stream of [`XmlEvent`]s.
///
/// Each call to [`Iterator::next`] pulls only as many events as it needs to produce the next match. A matched element
/// is yielded once its end event arrives, complete with its attributes, text and descendants. Matches come out in
/// document order (by start event), which means a match that's nested inside another one is held back until the outer
/// match closes.
///
/// Only the subtrees of matched elements are kept in memory. Everything else is dropped as soon as it's been looked at.
///
/// To stop early, just stop iterating. The query never reads past the event it needed for the last match it returned.
/// After an error, the iterator yields nothing more.
pub struct StreamQuery<'s, S: EventSource> {
    source: S,
    selector: &'s Selector,
    /// The currently open elements, without their children.
    path: Option<PathStack<Rc<Element>>>,
    frames: Vec<Frame>,
    /// Matches in start order. `None` until the match's end event arrives.
    pending: VecDeque<Option<Element>>,
    /// The slot id of `pending`'s front.
    pending_base: usize,
    finished: bool,
    events_read: usize,
    matched: usize,
}

struct Frame {
    /// This element's subtree so far, if it's a match or inside one.
    buffer: Option<Element>,
    /// The `pending` slot this element fills when it closes, if it's a match.
    slot: Option<usize>,
    /// How many of the selector's leading steps can be matched along the path down to and including this element.
    /// Only tracked for descendant-only selectors.
    progress: usize,
}

impl<'s, S: EventSource> StreamQuery<'s, S> {
    pub fn new(source: S, selector: &'s Selector) -> Self {
        Self {
            source,
            selector,
            path: None,
            frames: Vec::new(),
            pending: VecDeque::new(),
            pending_base: 0,
            finished: false,
            events_read: 0,
            matched: 0,
        }
    }

    /// Gives back the underlying source. Any events it hasn't produced yet are still there to read.
    pub fn into_source(self) -> S {
        self.source
    }

    fn advance(&mut self) -> Result<(), StreamError<S::Error>> {
        let Some(event) = self.source.next_event().map_err(StreamError::Source)? else {
            self.finished = true;
            log::debug!(
                "stream search for {} read {} event(s), matched {}",
                self.selector,
                self.events_read,
                self.matched
            );
            return match self.frames.len() {
                0 => Ok(()),
                open => Err(StreamError::Malformed(MalformedStreamError::Unclosed(open))),
            };
        };
        self.events_read += 1;
        match event {
            XmlEvent::Start { name, attributes } => self.start(name, attributes),
            XmlEvent::Text(text) => {
                if let Some(buffer) = self.frames.last_mut().and_then(|frame| frame.buffer.as_mut()) {
                    buffer.push_text(&text);
                }
            }
            XmlEvent::End => self.end()?,
        }
        Ok(())
    }

    fn start(&mut self, name: QualifiedName, attributes: Attributes) {
        let head = Rc::new(Element::with_attributes(name, attributes));
        let path = match &self.path {
            Some(parent) => parent.push(Rc::clone(&head)),
            None => PathStack::root(Rc::clone(&head)),
        };
        let parent = self.frames.last();
        let (is_match, progress) = if self.selector.is_descendant_only() {
            self.check_prefix(parent.map_or(0, |frame| frame.progress), &head)
        } else {
            (path_matcher::matches(&path.to_vec(), self.selector), 0)
        };
        self.path = Some(path);

        let collecting = is_match || parent.is_some_and(|frame| frame.buffer.is_some());
        let slot = is_match.then(|| {
            self.pending.push_back(None);
            self.pending_base + self.pending.len() - 1
        });
        if is_match {
            self.matched += 1;
            log::trace!("{} matched at depth {}", head.name(), self.frames.len() + 1);
        }
        self.frames.push(Frame {
            buffer: collecting.then(|| Element::clone(&head)),
            slot,
            progress,
        });
    }

    /// For descendant-only selectors, decides whether `elem` matches from its parent's progress alone. Returns that
    /// decision, plus `elem`'s own progress.
    ///
    /// Matching the leading steps greedily, top-down, finds a match whenever one exists: taking the first ancestor
    /// that fits a step never leaves fewer candidates for the steps after it.
    fn check_prefix(&self, parent_progress: usize, elem: &Element) -> (bool, usize) {
        let Some((last, leading)) = self.selector.steps().split_last() else {
            return (false, 0);
        };
        let is_match = parent_progress == leading.len() && last.matches(elem);
        let progress = match leading.get(parent_progress) {
            Some(step) if step.matches(elem) => parent_progress + 1,
            _ => parent_progress,
        };
        (is_match, progress)
    }

    fn end(&mut self) -> Result<(), StreamError<S::Error>> {
        let Some(frame) = self.frames.pop() else {
            return Err(StreamError::Malformed(MalformedStreamError::UnmatchedEnd));
        };
        self.path = self.path.as_ref().and_then(PathStack::parent);
        let Some(elem) = frame.buffer else {
            return Ok(());
        };
        let parent_buffer = self.frames.last_mut().and_then(|parent| parent.buffer.as_mut());
        match (frame.slot, parent_buffer) {
            (None, Some(parent)) => parent.push_child(elem),
            (None, None) => {}
            (Some(slot), Some(parent)) => {
                parent.push_child(elem.clone());
                self.pending[slot - self.pending_base] = Some(elem);
            }
            (Some(slot), None) => self.pending[slot - self.pending_base] = Some(elem),
        }
        Ok(())
    }

    fn fail(&mut self) {
        self.finished = true;
        self.frames.clear();
        self.pending.clear();
        self.path = None;
    }
}

impl<S: EventSource> Iterator for StreamQuery<'_, S> {
    type Item = Result<Element, StreamError<S::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if matches!(self.pending.front(), Some(Some(_))) {
                self.pending_base += 1;
                return self.pending.pop_front().flatten().map(Ok);
            }
            if self.finished {
                return None;
            }
            if let Err(err) = self.advance() {
                self.fail();
                return Some(Err(err));
            }
        }
    }
}

impl<S: EventSource> std::iter::FusedIterator for StreamQuery<'_, S> {}

/// Reasons a [`StreamQuery`] can fail.
#[derive(Debug, PartialEq, Eq)]
pub enum StreamError<E> {
    /// The event source itself failed.
    Source(E),
    /// The event source's events didn't nest properly.
    Malformed(MalformedStreamError),
}

impl<E: Debug + Display> std::error::Error for StreamError<E> {}

impl<E: Display> Display for StreamError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::Source(err) => write!(f, "{err}"),
            StreamError::Malformed(err) => write!(f, "{err}"),
        }
    }
}

impl<E: Into<InvalidXml>> From<StreamError<E>> for InvalidXml {
    fn from(err: StreamError<E>) -> Self {
        match err {
            StreamError::Source(err) => err.into(),
            StreamError::Malformed(err) => InvalidXml::Structure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml_elem::{parse_doc, tags, Document, IterSource, XmlReaderEvents};
    use indoc::indoc;
    use std::convert::Infallible;

    const WSDL: &str = indoc! {r#"
        <definitions xmlns:x="urn:x">
          <message name="Req"><part name="body"/></message>
          <service name="S">
            <operation name="Get">
              <input/>
              <operation name="Nested"><input x:id="1">deep</input></operation>
            </operation>
            <operation name="Set"> text <input/> more </operation>
          </service>
          <x:service/>
        </definitions>
    "#};

    fn sel(text: &str) -> Selector {
        Selector::parse(text).unwrap()
    }

    fn stream_all(xml: &str, selector: &Selector) -> Vec<Element> {
        selector
            .stream(XmlReaderEvents::from_str(xml))
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn tree_all(doc: &Document, selector: &Selector) -> Vec<Element> {
        doc.find(selector).elements().cloned().collect()
    }

    #[test]
    fn same_results_as_tree_search() {
        let doc = parse_doc(WSDL);
        for text in [
            "operation",
            "input",
            "operation input",
            "operation operation input",
            "operation[name=Set] input",
            "*[name=Get]",
            "[name=body]",
            "service",
            "{urn:x}service",
            "definitions",
            "definitions *",
            "operation > input",
            "service > operation > operation > input",
            "service > * input",
            "nothing",
        ] {
            let selector = sel(text);
            let from_events = StreamQuery::new(IterSource::new(doc.root.to_events()), &selector)
                .collect::<Result<Vec<_>, _>>()
                .unwrap();
            assert_eq!(from_events, tree_all(&doc, &selector), "events for {text}");
            assert_eq!(stream_all(WSDL, &selector), tree_all(&doc, &selector), "xml for {text}");
        }
    }

    #[test]
    fn matched_elements_are_complete() {
        let found = stream_all(WSDL, &sel("operation[name=Set]"));
        let expected = Element::new("operation")
            .attr("name", "Set")
            .text("textmore")
            .child(Element::new("input"));
        assert_eq!(found, vec![expected]);
    }

    #[test]
    fn nested_matches_in_document_order() {
        let found = stream_all(WSDL, &sel("operation"));
        assert_eq!(tags(&found), vec!["operation[name=Get]", "operation[name=Nested]", "operation[name=Set]"]);
        assert_eq!(found[0].children().len(), 2);
        assert_eq!(found[0].children()[1], found[1]);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        assert!(stream_all(WSDL, &sel("binding")).is_empty());
    }

    struct Counting<S> {
        inner: S,
        pulled: usize,
    }

    impl<S: EventSource> EventSource for Counting<S> {
        type Error = S::Error;

        fn next_event(&mut self) -> Result<Option<XmlEvent>, Self::Error> {
            self.pulled += 1;
            self.inner.next_event()
        }
    }

    #[test]
    fn stops_reading_after_first_match() {
        let endless = std::iter::once(XmlEvent::Start {
            name: QualifiedName::new("root"),
            attributes: Attributes::new(),
        })
        .chain(
            std::iter::repeat_with(|| {
                [
                    XmlEvent::Start {
                        name: QualifiedName::new("item"),
                        attributes: Attributes::new(),
                    },
                    XmlEvent::End,
                ]
            })
            .flatten(),
        );
        let mut source = Counting {
            inner: IterSource::new(endless),
            pulled: 0,
        };
        let selector = sel("item");
        let first: Vec<_> = StreamQuery::new(&mut source, &selector).take(1).collect();
        assert_eq!(first, vec![Ok(Element::new("item"))]);
        assert_eq!(source.pulled, 3);
    }

    #[test]
    fn reader_left_where_query_stopped() {
        let selector = sel("b");
        let mut query = selector.stream(XmlReaderEvents::from_str("<a><b>1</b><b>2</b><c/></a>"));
        assert_eq!(query.next().unwrap().unwrap(), Element::new("b").text("1"));
        let mut rest = query.into_source();
        assert_eq!(
            rest.next_event().unwrap(),
            Some(XmlEvent::Start {
                name: QualifiedName::new("b"),
                attributes: Attributes::new(),
            })
        );
    }

    #[test]
    fn unmatched_end_is_fatal() {
        let selector = sel("a");
        let events = vec![
            XmlEvent::Start {
                name: QualifiedName::new("a"),
                attributes: Attributes::new(),
            },
            XmlEvent::End,
            XmlEvent::End,
            XmlEvent::Start {
                name: QualifiedName::new("a"),
                attributes: Attributes::new(),
            },
            XmlEvent::End,
        ];
        let results: Vec<Result<Element, StreamError<Infallible>>> =
            StreamQuery::new(IterSource::new(events), &selector).collect();
        assert_eq!(
            results,
            vec![
                Ok(Element::new("a")),
                Err(StreamError::Malformed(MalformedStreamError::UnmatchedEnd)),
            ]
        );
    }

    #[test]
    fn unclosed_elements_are_fatal() {
        let selector = sel("b");
        let mut events = Element::new("a").child(Element::new("b")).to_events();
        events.pop();
        let mut query = StreamQuery::new(IterSource::new(events), &selector);
        assert_eq!(query.next(), Some(Ok(Element::new("b"))));
        assert_eq!(
            query.next(),
            Some(Err(StreamError::Malformed(MalformedStreamError::Unclosed(1))))
        );
        assert_eq!(query.next(), None);
    }

    #[test]
    fn pending_matches_dropped_on_error() {
        // the outer match never closes, so the inner one is never released
        let selector = sel("a");
        let mut events = Element::new("a").child(Element::new("a")).to_events();
        events.pop();
        let results: Vec<_> = StreamQuery::new(IterSource::new(events), &selector).collect();
        assert_eq!(results, vec![Err(StreamError::Malformed(MalformedStreamError::Unclosed(1)))]);
    }

    #[test]
    fn tokenizer_errors_surface() {
        let selector = sel("b");
        let mut query = selector.stream(XmlReaderEvents::from_str("<a><b/><c></a>"));
        assert_eq!(query.next().unwrap().unwrap(), Element::new("b"));
        let err = query.next().unwrap().unwrap_err();
        assert!(matches!(err, StreamError::Source(InvalidXml::Read(_))), "{err:?}");
        assert!(query.next().is_none());
    }

    #[test]
    fn prefix_progress_agrees_with_path_matcher() {
        // the nearest "b" isn't below an "a", but a farther one is
        let xml = "<r><a><b><x><b><c/></b></x></b></a><b><c/></b></r>";
        let doc = parse_doc(xml);
        for text in ["a b c", "b c", "a c", "r a b b c", "a b b b c", "r c"] {
            let selector = sel(text);
            assert!(selector.is_descendant_only());
            assert_eq!(stream_all(xml, &selector), tree_all(&doc, &selector), "{text}");
        }
    }
}
