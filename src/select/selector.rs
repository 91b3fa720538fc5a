use crate::query::ParseError;
use crate::select::{EventSource, NamespaceLookup, Namespaces, StreamQuery};
use crate::xml_elem::{Element, QualifiedName};
use std::fmt::{Display, Formatter, Write};

/// The name half of a [`Step`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NameTest {
    /// `*`, or a step with only predicates: any element.
    Any,
    /// `name`: any element with this local name, in any namespace.
    Local(String),
    /// `prefix:name` or `{uri}name`: an element with exactly this namespace and local name.
    Exact(QualifiedName),
}

impl NameTest {
    pub fn matches(&self, name: &QualifiedName) -> bool {
        match self {
            NameTest::Any => true,
            NameTest::Local(local_name) => name.local_name() == local_name,
            NameTest::Exact(expected) => name == expected,
        }
    }
}

/// `[name=value]`: the element must have this attribute, with exactly this value.
///
/// The attribute name is matched exactly, namespace included: an unprefixed name only matches an attribute in no
/// namespace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttrPredicate {
    pub name: QualifiedName,
    pub value: String,
}

impl AttrPredicate {
    pub fn matches(&self, elem: &Element) -> bool {
        elem.attributes().get(&self.name) == Some(self.value.as_str())
    }
}

/// How a step relates to the step before it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// `a b`: any descendant of the previous step's element.
    #[default]
    Descendant,
    /// `a > b`: an immediate child of the previous step's element.
    Child,
}

/// One atomic name-and-predicates test within a [`Selector`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Step {
    name: NameTest,
    predicates: Vec<AttrPredicate>,
    combinator: Combinator,
}

impl Step {
    pub fn new(name: NameTest, predicates: Vec<AttrPredicate>, combinator: Combinator) -> Self {
        Self {
            name,
            predicates,
            combinator,
        }
    }

    /// `*`
    pub fn any() -> Self {
        Self::new(NameTest::Any, Vec::new(), Combinator::Descendant)
    }

    /// A step matching this local name in any namespace.
    pub fn local(local_name: impl Into<String>) -> Self {
        Self::new(NameTest::Local(local_name.into()), Vec::new(), Combinator::Descendant)
    }

    /// A step matching exactly this name.
    pub fn exact(name: QualifiedName) -> Self {
        Self::new(NameTest::Exact(name), Vec::new(), Combinator::Descendant)
    }

    /// Adds an attribute predicate.
    pub fn with_attr(mut self, name: impl Into<QualifiedName>, value: impl Into<String>) -> Self {
        self.predicates.push(AttrPredicate {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Requires this step's element to be an immediate child of the previous step's.
    pub fn child(mut self) -> Self {
        self.combinator = Combinator::Child;
        self
    }

    pub fn name(&self) -> &NameTest {
        &self.name
    }

    pub fn predicates(&self) -> &[AttrPredicate] {
        &self.predicates
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn matches(&self, elem: &Element) -> bool {
        self.name.matches(elem.name()) && self.predicates.iter().all(|p| p.matches(elem))
    }
}

/// The in-memory form of a selector string: a non-empty chain of [`Step`]s.
///
/// The last step must match the selected element itself; each earlier step must match one of its ancestors, in order.
/// Selectors are immutable once built, and can be shared freely between searches.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Selector {
    steps: Vec<Step>,
    descendant_only: bool,
}

impl Selector {
    /// Builds a selector from steps. Fails if `steps` is empty.
    ///
    /// The first step's combinator has nothing to relate to, and is always treated as [`Combinator::Descendant`].
    pub fn new(mut steps: Vec<Step>) -> Result<Self, ParseError> {
        let Some(first) = steps.first_mut() else {
            return Err(ParseError::unplaced("selector must have at least one step"));
        };
        first.combinator = Combinator::Descendant;
        let descendant_only = steps.iter().all(|s| s.combinator == Combinator::Descendant);
        Ok(Self { steps, descendant_only })
    }

    /// Parses selector text that doesn't use any namespace prefixes.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Self::parse_with(text, &Namespaces::new())
    }

    /// Parses selector text, resolving its namespace prefixes with the given lookup.
    pub fn parse_with<N: NamespaceLookup + ?Sized>(text: &str, namespaces: &N) -> Result<Self, ParseError> {
        Self::try_parse(text, namespaces)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Whether every step is a descendant (not immediate-child) step.
    pub fn is_descendant_only(&self) -> bool {
        self.descendant_only
    }

    /// Lazily searches a stream of events. See [`StreamQuery`].
    pub fn stream<S: EventSource>(&self, source: S) -> StreamQuery<'_, S> {
        StreamQuery::new(source, self)
    }
}

impl TryFrom<&'_ str> for Selector {
    type Error = ParseError;

    fn try_from(value: &'_ str) -> Result<Self, Self::Error> {
        Selector::parse(value)
    }
}

impl TryFrom<&'_ String> for Selector {
    type Error = ParseError;

    fn try_from(value: &'_ String) -> Result<Self, Self::Error> {
        Selector::try_from(value.as_str())
    }
}

/// Writes the canonical selector text, which parses back to an equal selector. Values are always double-quoted.
impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (idx, step) in self.steps.iter().enumerate() {
            if idx > 0 {
                match step.combinator {
                    Combinator::Descendant => f.write_char(' ')?,
                    Combinator::Child => f.write_str(" > ")?,
                }
            }
            match &step.name {
                NameTest::Any => f.write_char('*')?,
                NameTest::Local(local_name) => f.write_str(local_name)?,
                NameTest::Exact(name) => write_exact_name(f, name)?,
            }
            for predicate in &step.predicates {
                f.write_char('[')?;
                match predicate.name.namespace() {
                    None => f.write_str(predicate.name.local_name())?,
                    Some(_) => write_exact_name(f, &predicate.name)?,
                }
                f.write_str("=\"")?;
                for ch in predicate.value.chars() {
                    if matches!(ch, '"' | '\\') {
                        f.write_char('\\')?;
                    }
                    f.write_char(ch)?;
                }
                f.write_str("\"]")?;
            }
        }
        Ok(())
    }
}

fn write_exact_name(f: &mut Formatter<'_>, name: &QualifiedName) -> std::fmt::Result {
    write!(f, "{{{}}}{}", name.namespace().unwrap_or_default(), name.local_name())
}
