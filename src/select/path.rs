use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// The chain of elements from a search's root down to one element.
///
/// A `PathStack` is immutable. [`PathStack::push`] makes a new path that shares every ancestor with the old one, so a
/// depth-first walk can hand out a path for each element it visits without copying. Use [`PathStack::to_vec`] when you
/// need the whole path as a root-first sequence.
pub struct PathStack<E> {
    head: Rc<PathNode<E>>,
}

struct PathNode<E> {
    parent: Option<Rc<PathNode<E>>>,
    element: E,
    depth: usize,
}

impl<E> Drop for PathNode<E> {
    fn drop(&mut self) {
        // Release ancestors one at a time, stopping at the first one another path still shares.
        let mut parent = self.parent.take();
        while let Some(node) = parent {
            parent = match Rc::try_unwrap(node) {
                Ok(mut node) => node.parent.take(),
                Err(_) => None,
            };
        }
    }
}

impl<E> PathStack<E> {
    /// A path of just one element.
    pub fn root(element: E) -> Self {
        Self {
            head: Rc::new(PathNode {
                parent: None,
                element,
                depth: 1,
            }),
        }
    }

    /// A new path: this one, plus `element` as the new leaf.
    pub fn push(&self, element: E) -> Self {
        Self {
            head: Rc::new(PathNode {
                parent: Some(Rc::clone(&self.head)),
                element,
                depth: self.head.depth + 1,
            }),
        }
    }

    /// The path without its leaf, or `None` if the leaf is the root.
    pub fn parent(&self) -> Option<Self> {
        self.head.parent.as_ref().map(|parent| Self {
            head: Rc::clone(parent),
        })
    }

    pub fn leaf(&self) -> &E {
        &self.head.element
    }

    /// The number of elements in the path, including the leaf. Never 0.
    pub fn depth(&self) -> usize {
        self.head.depth
    }

    /// Iterates from the leaf up to the root.
    pub fn iter_up(&self) -> impl Iterator<Item = &E> {
        let mut current = Some(self.head.as_ref());
        std::iter::from_fn(move || {
            let node = current?;
            current = node.parent.as_deref();
            Some(&node.element)
        })
    }

    /// The path as a root-first sequence.
    pub fn to_vec(&self) -> Vec<E>
    where
        E: Clone,
    {
        let mut result: Vec<E> = self.iter_up().cloned().collect();
        result.reverse();
        result
    }
}

impl<E> Clone for PathStack<E> {
    fn clone(&self) -> Self {
        Self {
            head: Rc::clone(&self.head),
        }
    }
}

impl<E: Debug> Debug for PathStack<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut elems: Vec<&E> = self.iter_up().collect();
        elems.reverse();
        f.debug_list().entries(elems).finish()
    }
}
