use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::pddl::Domain;

use super::literal::GroundedPredicate;
use super::projection::Combine;

/// Literals grouped by predicate name.
///
/// A predicate can be present with an empty set: spaces and logged states declare every
/// domain predicate even when none of its literals apply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct State {
    predicates: BTreeMap<String, BTreeSet<GroundedPredicate>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty state with one (empty) entry per domain predicate.
    pub fn for_domain(domain: &Domain) -> Self {
        let predicates = domain.predicates().iter()
            .map(|p| (p.name.clone(), BTreeSet::new()))
            .collect();
        Self { predicates }
    }

    pub fn declare(&mut self, name: &str) {
        self.predicates.entry(name.to_string()).or_default();
    }

    pub fn insert(&mut self, literal: GroundedPredicate) -> bool {
        self.predicates.entry(literal.name().to_string()).or_default().insert(literal)
    }

    pub fn get(&self, name: &str) -> Option<&BTreeSet<GroundedPredicate>> {
        self.predicates.get(name)
    }

    pub fn contains(&self, literal: &GroundedPredicate) -> bool {
        self.get(literal.name()).is_some_and(|set| set.contains(literal))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.predicates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<GroundedPredicate>)> {
        self.predicates.iter().map(|(name, set)| (name.as_str(), set))
    }

    pub fn literals(&self) -> impl Iterator<Item = &GroundedPredicate> {
        self.predicates.values().flatten()
    }

    /// Total number of literals over all predicates.
    pub fn len(&self) -> usize {
        self.predicates.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keeps the literals matching `keep`. Every predicate name survives, possibly empty.
    pub fn retain_into<F>(&self, keep: F) -> State
    where
        F: Fn(&GroundedPredicate) -> bool,
    {
        let predicates = self.predicates.iter()
            .map(|(name, set)| (name.clone(), set.iter().filter(|l| keep(*l)).cloned().collect()))
            .collect();
        State { predicates }
    }

    /// Combines every predicate of `self` with the same predicate of `other`.
    /// Predicates missing from `other` count as empty.
    pub fn combine(&self, other: &State, combine: Combine) -> State {
        let empty = BTreeSet::new();
        let predicates = self.predicates.iter()
            .map(|(name, set)| {
                let rhs = other.predicates.get(name).unwrap_or(&empty);
                (name.clone(), combine.apply(set, rhs))
            })
            .collect();
        State { predicates }
    }

    pub fn intersection(&self, other: &State) -> State {
        self.combine(other, Combine::Intersect)
    }

    pub fn difference(&self, other: &State) -> State {
        self.combine(other, Combine::Difference)
    }

    pub fn union(&self, other: &State) -> State {
        let mut result = self.clone();
        for (name, set) in &other.predicates {
            result.predicates.entry(name.clone()).or_default().extend(set.iter().cloned());
        }
        result
    }

    pub fn is_subset(&self, other: &State) -> bool {
        self.literals().all(|l| other.contains(l))
    }
}

impl FromIterator<GroundedPredicate> for State {
    fn from_iter<I: IntoIterator<Item = GroundedPredicate>>(iter: I) -> Self {
        let mut state = State::new();
        for literal in iter {
            state.insert(literal);
        }
        state
    }
}

/// One block per predicate, literals sorted by their textual form.
impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, set) in &self.predicates {
            writeln!(f, "{}:", name)?;
            let mut rendered: Vec<String> = set.iter().map(|l| l.to_string()).collect();
            rendered.sort();
            for literal in rendered {
                writeln!(f, "- {}", literal)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
