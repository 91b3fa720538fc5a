use crate::select::{Combinator, Selector, Step};
use crate::xml_elem::Element;
use std::borrow::Borrow;

/// Whether the path's leaf is selected by `selector`.
///
/// `path` runs from the search's root down to the candidate element. The selector is anchored on the right: its last
/// step must match the leaf itself. Then, walking right to left, each earlier step must match an ancestor that comes
/// before the element matched by the step after it (its immediate parent, for [`Combinator::Child`] steps).
///
/// When several ancestors could satisfy a step, the nearest one is tried first. For descendant-only selectors that
/// choice is final, since a nearer ancestor always leaves at least as many candidates for the remaining steps. With
/// child steps in the mix, a failure further left backtracks to the next-nearest candidate.
pub fn matches<E: Borrow<Element>>(path: &[E], selector: &Selector) -> bool {
    let Some((leaf, ancestors)) = path.split_last() else {
        return false;
    };
    let Some((last, earlier)) = selector.steps().split_last() else {
        return false;
    };
    if !last.matches(leaf.borrow()) {
        return false;
    }
    PathMatcher {
        backtrack: !selector.is_descendant_only(),
    }
    .match_ancestors(earlier, last.combinator(), ancestors)
}

struct PathMatcher {
    backtrack: bool,
}

impl PathMatcher {
    /// `steps` still need to match within `ancestors`. `link` is how the most recently matched step relates to the last
    /// of `steps`.
    fn match_ancestors<E: Borrow<Element>>(&self, steps: &[Step], link: Combinator, ancestors: &[E]) -> bool {
        let Some((step, earlier)) = steps.split_last() else {
            return true;
        };
        match link {
            Combinator::Child => match ancestors.split_last() {
                Some((parent, rest)) => {
                    step.matches(parent.borrow()) && self.match_ancestors(earlier, step.combinator(), rest)
                }
                None => false,
            },
            Combinator::Descendant => {
                for idx in (0..ancestors.len()).rev() {
                    if step.matches(ancestors[idx].borrow()) {
                        if self.match_ancestors(earlier, step.combinator(), &ancestors[..idx]) {
                            return true;
                        }
                        if !self.backtrack {
                            return false;
                        }
                    }
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(tags: &[&str]) -> Vec<Element> {
        tags.iter()
            .map(|tag| match tag.split_once('=') {
                Some((name, value)) => Element::new(name).attr("name", value),
                None => Element::new(*tag),
            })
            .collect()
    }

    fn check(selector: &str, tags: &[&str], expect: bool) {
        let selector = Selector::parse(selector).unwrap();
        assert_eq!(matches(&path(tags), &selector), expect, "{selector} on {tags:?}");
    }

    #[test]
    fn single_step_matches_leaf_at_any_depth() {
        check("input", &["input"], true);
        check("input", &["service", "operation", "input"], true);
        check("input", &["service", "input", "operation"], false);
    }

    #[test]
    fn leaf_must_match_last_step() {
        check("service operation", &["service", "operation", "input"], false);
    }

    #[test]
    fn ancestors_need_not_be_immediate() {
        check("service input", &["service", "operation", "input"], true);
        check("operation input", &["operation", "x", "y", "input"], true);
    }

    #[test]
    fn steps_must_appear_in_order() {
        check("a b c", &["a", "b", "c"], true);
        check("a b c", &["b", "a", "c"], false);
        check("a b c", &["a", "x", "b", "y", "c"], true);
    }

    #[test]
    fn leaf_cannot_double_as_ancestor() {
        check("a a", &["a"], false);
        check("a a", &["a", "a"], true);
    }

    #[test]
    fn predicates_on_ancestors() {
        check("operation[name=Set] input", &["service", "operation=Get", "input"], false);
        check("operation[name=Set] input", &["service", "operation=Set", "input"], true);
    }

    #[test]
    fn nearest_ancestor_failing_is_final_without_child_steps() {
        // nearest "b" is at index 3; "a" is still found before it
        check("a b c", &["a", "b", "x", "b", "c"], true);
    }

    #[test]
    fn child_steps() {
        check("a > b", &["a", "b"], true);
        check("a > b", &["a", "x", "b"], false);
        check("a > b > c", &["a", "b", "c"], true);
        check("a > b c", &["a", "b", "x", "c"], true);
    }

    #[test]
    fn child_steps_backtrack_past_nearest_candidate() {
        // nearest "b" has parent "x"; the farther "b" has parent "a"
        check("a > b c", &["a", "b", "x", "b", "c"], true);
        check("a > b c", &["z", "b", "x", "b", "c"], false);
    }

    #[test]
    fn wildcard_and_predicate_only_steps() {
        check("*", &["anything"], true);
        check("*[name=Get]", &["service", "operation=Get"], true);
        check("[name=Get]", &["service", "operation=Set"], false);
        check("service *", &["service"], false);
    }

    #[test]
    fn empty_path_never_matches() {
        let selector = Selector::parse("a").unwrap();
        assert!(!matches::<Element>(&[], &selector));
    }

    #[test]
    fn borrowed_elements() {
        let owned = path(&["a", "b"]);
        let borrowed: Vec<&Element> = owned.iter().collect();
        assert!(matches(&borrowed, &Selector::parse("a b").unwrap()));
    }
}
