use crate::select::{path_matcher, PathStack, Selector};
use crate::xml_elem::Element;
use std::collections::HashSet;

/// One element of a result set, along with the path from the document root down to it.
#[derive(Clone, Debug)]
pub struct Found<'a> {
    element: &'a Element,
    path: PathStack<&'a Element>,
}

impl<'a> Found<'a> {
    pub fn element(&self) -> &'a Element {
        self.element
    }

    /// The elements from the document root down to (and including) this one.
    pub fn path(&self) -> Vec<&'a Element> {
        self.path.to_vec()
    }

    pub fn path_stack(&self) -> &PathStack<&'a Element> {
        &self.path
    }
}

/// An ordered, duplicate-free set of elements found in a tree.
///
/// Results are in document order. Each result keeps its path from the document root, so a result set can be searched
/// again with [`Elements::find`] to narrow it down further:
///
/// ```
/// use xmq::select::Selector;
/// use xmq::xml_elem::Document;
///
/// let doc = Document::parse(r#"
///   <service>
///     <operation name="Get"><input/></operation>
///     <operation name="Set"><input/></operation>
///   </service>"#).unwrap();
/// let set_op = Selector::parse("operation[name=Set]").unwrap();
/// let inputs = doc.find(&set_op).find(&Selector::parse("input").unwrap());
/// assert_eq!(inputs.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct Elements<'a> {
    found: Vec<Found<'a>>,
    query: Option<String>,
}

impl<'a> Elements<'a> {
    /// A result set holding just `root`, as the starting point for a search.
    pub fn of(root: &'a Element) -> Self {
        Self {
            found: vec![Found {
                element: root,
                path: PathStack::root(root),
            }],
            query: None,
        }
    }

    /// Searches each member of this set, and all of its descendants, for elements that `selector` matches.
    ///
    /// The selector is matched relative to each member: its first step may match the member itself or any descendant
    /// of it, but never the member's own ancestors. Results keep their full path from the document root. An element
    /// that's reachable from more than one member (because one member contains another) is only reported once.
    pub fn find(&self, selector: &Selector) -> Elements<'a> {
        let mut search = TreeSearch {
            selector,
            relative_path: Vec::new(),
            seen: HashSet::new(),
            found: Vec::new(),
        };
        for member in &self.found {
            search.search_from(member.element, member.path.clone());
        }
        log::debug!(
            "{selector} matched {} element(s) under {} root(s)",
            search.found.len(),
            self.found.len()
        );
        Elements {
            found: search.found,
            query: Some(selector.to_string()),
        }
    }

    pub fn len(&self) -> usize {
        self.found.len()
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Found<'a>> {
        self.found.iter()
    }

    /// The matched elements, without their paths.
    pub fn elements(&self) -> impl Iterator<Item = &'a Element> + '_ {
        self.found.iter().map(|found| found.element)
    }

    /// The text of the last selector applied, if any.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}

impl<'a> IntoIterator for Elements<'a> {
    type Item = Found<'a>;
    type IntoIter = std::vec::IntoIter<Found<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.found.into_iter()
    }
}

impl<'a, 'b> IntoIterator for &'b Elements<'a> {
    type Item = &'b Found<'a>;
    type IntoIter = std::slice::Iter<'b, Found<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.found.iter()
    }
}

struct TreeSearch<'a, 's> {
    selector: &'s Selector,
    /// From the current search root down to the element being visited.
    relative_path: Vec<&'a Element>,
    seen: HashSet<*const Element>,
    found: Vec<Found<'a>>,
}

impl<'a> TreeSearch<'a, '_> {
    /// Depth-first, pre-order, with an explicit stack so that deep documents can't overflow the call stack.
    fn search_from(&mut self, root: &'a Element, root_path: PathStack<&'a Element>) {
        // each entry also carries its depth below `root`, which is where it goes in `relative_path`
        let mut to_visit = vec![(root, root_path, 0)];
        while let Some((elem, path, depth)) = to_visit.pop() {
            self.relative_path.truncate(depth);
            self.relative_path.push(elem);
            if path_matcher::matches(&self.relative_path, self.selector) && self.seen.insert(elem as *const Element) {
                log::trace!("{} matched at depth {}", elem.name(), path.depth());
                self.found.push(Found {
                    element: elem,
                    path: path.clone(),
                });
            }
            for child in elem.children().iter().rev() {
                to_visit.push((child, path.push(child), depth + 1));
            }
        }
        self.relative_path.clear();
    }
}
