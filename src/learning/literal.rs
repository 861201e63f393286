use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use itertools::Itertools;

use crate::pddl::Predicate;

/// A predicate schema bound to objects (or to another schema's parameter names) with a polarity.
///
/// Equality, hashing and ordering only look at the predicate name, the bindings and the
/// polarity. The schema is carried along so arguments can be listed in declaration order.
#[derive(Clone, Debug)]
pub struct GroundedPredicate {
    predicate: Rc<Predicate>,
    bindings: BTreeMap<String, String>,
    positive: bool,
}

impl GroundedPredicate {
    pub fn new(predicate: Rc<Predicate>, bindings: BTreeMap<String, String>, positive: bool) -> Self {
        Self { predicate, bindings, positive }
    }

    /// Binds `arguments` positionally to the schema parameters.
    pub fn from_arguments<I, S>(predicate: Rc<Predicate>, arguments: I, positive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let bindings = predicate.parameters.iter()
            .map(|p| p.name.clone())
            .zip(arguments.into_iter().map(Into::into))
            .collect();
        Self { predicate, bindings, positive }
    }

    pub fn name(&self) -> &str {
        &self.predicate.name
    }

    pub fn predicate(&self) -> &Rc<Predicate> {
        &self.predicate
    }

    pub fn bindings(&self) -> &BTreeMap<String, String> {
        &self.bindings
    }

    pub fn is_positive(&self) -> bool {
        self.positive
    }

    /// Bound values in the schema's declaration order.
    pub fn arguments(&self) -> impl Iterator<Item = &str> {
        self.predicate.parameters.iter()
            .filter_map(|p| self.bindings.get(&p.name).map(String::as_str))
    }

    pub fn negated(&self) -> Self {
        Self { positive: !self.positive, ..self.clone() }
    }

    /// Maps every bound value through `f`. Returns `None` as soon as one value has no image.
    pub fn rebind<'a, F>(&'a self, f: F) -> Option<Self>
    where
        F: Fn(&'a str) -> Option<&'a str>,
    {
        let bindings = self.bindings.iter()
            .map(|(param, value)| f(value).map(|image| (param.clone(), image.to_string())))
            .collect::<Option<_>>()?;
        Some(Self { predicate: self.predicate.clone(), bindings, positive: self.positive })
    }

    fn key(&self) -> (&str, &BTreeMap<String, String>, bool) {
        (self.name(), &self.bindings, self.positive)
    }
}

impl PartialEq for GroundedPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for GroundedPredicate {}

impl Hash for GroundedPredicate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for GroundedPredicate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GroundedPredicate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for GroundedPredicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let atom = if self.bindings.is_empty() {
            format!("({})", self.name())
        } else {
            format!("({} {})", self.name(), self.arguments().join(" "))
        };
        if self.positive {
            write!(f, "{}", atom)
        } else {
            write!(f, "(not {})", atom)
        }
    }
}
