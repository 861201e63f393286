use std::collections::BTreeSet;

use crate::pddl::Action;

use super::literal::GroundedPredicate;
use super::state::State;
use super::LearningError;

/// How a symbolized substate is folded into an action space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Combine {
    /// Keep the action-space literals the substate asserts.
    Intersect,
    /// Keep the action-space literals the substate does not assert.
    Difference,
}

impl Combine {
    pub fn apply(self, space: &BTreeSet<GroundedPredicate>, other: &BTreeSet<GroundedPredicate>) -> BTreeSet<GroundedPredicate> {
        match self {
            Combine::Intersect => space.intersection(other).cloned().collect(),
            Combine::Difference => space.difference(other).cloned().collect(),
        }
    }
}

/// Positional bijection between the objects an action was applied to and its formal parameters.
#[derive(Clone, Debug)]
pub struct Pairing<'a> {
    pairs: Vec<(&'a str, &'a str)>,
}

impl<'a> Pairing<'a> {
    pub fn new<S: AsRef<str>>(action: &'a Action, concrete_params: &'a [S]) -> Result<Self, LearningError> {
        if concrete_params.len() != action.arity() {
            return Err(LearningError::ArityMismatch {
                action: action.name.clone(),
                expected: action.arity(),
                found: concrete_params.len(),
            });
        }
        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(concrete_params.len());
        for (object, formal) in concrete_params.iter().map(AsRef::as_ref).zip(action.parameter_names()) {
            if pairs.iter().any(|(seen, _)| *seen == object) {
                return Err(LearningError::AmbiguousBinding { action: action.name.clone(), object: object.to_string() });
            }
            pairs.push((object, formal));
        }
        Ok(Self { pairs })
    }

    fn symbol(&self, object: &str) -> Option<&'a str> {
        self.pairs.iter().find(|(o, _)| *o == object).map(|(_, formal)| *formal)
    }

    fn object(&self, formal: &str) -> Option<&'a str> {
        self.pairs.iter().find(|(_, f)| *f == formal).map(|(object, _)| *object)
    }

    /// Rewrites object names into formal parameter names. Literals over unpaired objects are dropped.
    pub fn symbolize(&self, state: &State) -> State {
        self.remap(state, |value| self.symbol(value))
    }

    /// Inverse of [`Pairing::symbolize`].
    pub fn concretize(&self, state: &State) -> State {
        self.remap(state, |value| self.object(value))
    }

    fn remap<F>(&self, state: &State, f: F) -> State
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let mut result = State::new();
        for (name, literals) in state.iter() {
            result.declare(name);
            for literal in literals {
                if let Some(image) = literal.rebind(|value| f(value)) {
                    result.insert(image);
                }
            }
        }
        result
    }
}

/// Literals whose every bound value is one of `concrete_params`. Nullary literals always pass.
pub fn filter<S: AsRef<str>>(state: &State, concrete_params: &[S]) -> State {
    state.retain_into(|literal| {
        literal.bindings().values().all(|value| concrete_params.iter().any(|p| p.as_ref() == value))
    })
}

/// Projects a concrete state onto `action`'s symbolic space and folds it into `action_space`.
///
/// The state is first restricted to literals over `concrete_params`, then renamed through
/// the positional [`Pairing`], and finally intersected with or subtracted from
/// `action_space` predicate by predicate.
pub fn project<S: AsRef<str>>(
    state: &State,
    action: &Action,
    concrete_params: &[S],
    action_space: &State,
    combine: Combine,
) -> Result<State, LearningError> {
    let pairing = Pairing::new(action, concrete_params)?;
    let substate = pairing.symbolize(&filter(state, concrete_params));
    tracing::trace!(action = %action.name, substate = substate.len(), ?combine, "projected state");
    Ok(action_space.combine(&substate, combine))
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::{filter, project, Combine, Pairing};
    use crate::learning::{ground_action_space, GroundedPredicate, LearningError, State};
    use crate::pddl::{Domain, Predicate};

    const DOMAIN: &str = "(define (domain blocksworld) (:types block)
        (:predicates (on ?x - block ?y - block) (clear ?x - block) (holding ?x - block) (handempty))
        (:action stack :parameters (?x - block ?y - block)
            :precondition (and (holding ?x) (clear ?y))
            :effect (and (on ?x ?y) (clear ?x) (handempty) (not (holding ?x)) (not (clear ?y)))))";

    fn literal(domain: &Domain, name: &str, arguments: &[&str], positive: bool) -> GroundedPredicate {
        let schema: Predicate = domain.predicate(name).unwrap().clone();
        GroundedPredicate::from_arguments(Rc::new(schema), arguments.iter().copied(), positive)
    }

    fn state(domain: &Domain) -> State {
        let mut state = State::for_domain(domain);
        state.insert(literal(domain, "on", &["a", "b"], true));
        state.insert(literal(domain, "on", &["b", "c"], true));
        state.insert(literal(domain, "clear", &["a"], true));
        state.insert(literal(domain, "clear", &["c"], false));
        state.insert(literal(domain, "handempty", &[], true));
        state
    }

    #[test]
    fn test_blocksworld_projection() {
        let domain = Domain::parse(DOMAIN).unwrap();
        let stack = domain.action("stack").unwrap();
        let space = ground_action_space(&domain, "stack").unwrap();
        let projected = project(&state(&domain), stack, &["a", "b"], &space, Combine::Intersect).unwrap();
        let on: Vec<String> = projected.get("on").unwrap().iter().map(|l| l.to_string()).collect();
        assert_eq!(on, vec!["(on x y)"]);
        assert!(!projected.contains(&literal(&domain, "on", &["y", "x"], true)));
        assert!(projected.contains(&literal(&domain, "clear", &["x"], true)));
        assert!(projected.contains(&literal(&domain, "handempty", &[], true)));
        assert_eq!(projected.get("holding").map(|s| s.len()), Some(0));
        assert_eq!(projected.len(), 3);
    }

    #[test]
    fn test_intersection_is_idempotent() {
        let domain = Domain::parse(DOMAIN).unwrap();
        let stack = domain.action("stack").unwrap();
        let space = ground_action_space(&domain, "stack").unwrap();
        let state = state(&domain);
        let once = project(&state, stack, &["a", "b"], &space, Combine::Intersect).unwrap();
        let twice = project(&state, stack, &["a", "b"], &once, Combine::Intersect).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_difference_and_intersection_partition_space() {
        let domain = Domain::parse(DOMAIN).unwrap();
        let stack = domain.action("stack").unwrap();
        let space = ground_action_space(&domain, "stack").unwrap();
        let state = state(&domain);
        let kept = project(&state, stack, &["b", "c"], &space, Combine::Intersect).unwrap();
        let removed = project(&state, stack, &["b", "c"], &space, Combine::Difference).unwrap();
        assert_eq!(kept.union(&removed), space);
        assert!(kept.intersection(&removed).is_empty());
        assert!(!removed.contains(&literal(&domain, "on", &["x", "y"], true)));
    }

    #[test]
    fn test_filter_drops_foreign_objects() {
        let domain = Domain::parse(DOMAIN).unwrap();
        let filtered = filter(&state(&domain), &["a", "b"]);
        assert!(filtered.literals().all(|l| l.bindings().values().all(|v| v == "a" || v == "b")));
        assert!(!filtered.contains(&literal(&domain, "on", &["b", "c"], true)));
        assert!(filtered.contains(&literal(&domain, "handempty", &[], true)));
        assert_eq!(filtered.names().count(), 4);
    }

    #[test]
    fn test_concretize_inverts_symbolize() {
        let domain = Domain::parse(DOMAIN).unwrap();
        let stack = domain.action("stack").unwrap();
        let params = ["b", "c"];
        let pairing = Pairing::new(stack, &params).unwrap();
        let filtered = filter(&state(&domain), &params);
        let symbolic = pairing.symbolize(&filtered);
        assert!(symbolic.contains(&literal(&domain, "on", &["x", "y"], true)));
        assert!(symbolic.contains(&literal(&domain, "clear", &["y"], false)));
        assert_eq!(pairing.concretize(&symbolic), filtered);
    }

    #[test]
    fn test_pairing_errors() {
        let domain = Domain::parse(DOMAIN).unwrap();
        let stack = domain.action("stack").unwrap();
        let space = ground_action_space(&domain, "stack").unwrap();
        assert_eq!(
            project(&state(&domain), stack, &["a"], &space, Combine::Intersect),
            Err(LearningError::ArityMismatch { action: "stack".to_string(), expected: 2, found: 1 })
        );
        assert_eq!(
            Pairing::new(stack, &["a", "a"]).map(|_| ()),
            Err(LearningError::AmbiguousBinding { action: "stack".to_string(), object: "a".to_string() })
        );
    }
}
