use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use itertools::Itertools;

use crate::pddl::{Domain, Predicate, Problem};

use super::literal::GroundedPredicate;
use super::state::State;
use super::LearningError;

/// Shared handles on the domain's predicate schemas, keyed by lowercased name.
pub fn schemas(domain: &Domain) -> HashMap<String, Rc<Predicate>> {
    domain.predicates().iter()
        .map(|p| (p.name.to_ascii_lowercase(), Rc::new(p.clone())))
        .collect()
}

/// Objects (domain constants first, then problem objects) usable where `kind` is expected.
pub fn compatible_objects<'a>(domain: &'a Domain, problem: &'a Problem, kind: &str) -> Vec<&'a str> {
    domain.constants.iter()
        .chain(&problem.objects)
        .filter(|o| domain.types.is_subtype_of(&o.kind, kind))
        .map(|o| o.name.as_str())
        .collect()
}

/// Both polarities of `schema` for every tuple drawn from the per-parameter candidates.
fn ground_predicate(schema: &Rc<Predicate>, slots: &[Vec<&str>]) -> BTreeSet<GroundedPredicate> {
    let tuples: Vec<Vec<&str>> = if slots.is_empty() {
        vec![Vec::new()]
    } else {
        slots.iter().map(|slot| slot.iter().copied()).multi_cartesian_product().collect()
    };
    tuples.into_iter()
        .flat_map(|tuple| {
            let literal = GroundedPredicate::from_arguments(schema.clone(), tuple, true);
            [literal.negated(), literal]
        })
        .collect()
}

fn collect_space<'a, F>(domain: &'a Domain, slots_for: F) -> State
where
    F: Fn(&'a Predicate) -> Vec<Vec<&'a str>>,
{
    let mut space = State::new();
    for predicate in domain.predicates() {
        let schema = Rc::new(predicate.clone());
        let literals = ground_predicate(&schema, &slots_for(predicate));
        tracing::trace!(predicate = %predicate.name, literals = literals.len());
        space.declare(&predicate.name);
        for literal in literals {
            space.insert(literal);
        }
    }
    space
}

/// Every type-compatible grounding of every predicate, in both polarities.
pub fn ground_literal_space(domain: &Domain, problem: &Problem) -> State {
    let _span = tracing::span!(tracing::Level::DEBUG, "literal space", problem = %problem.name).entered();
    let space = collect_space(domain, |predicate| {
        predicate.parameters.iter()
            .map(|p| compatible_objects(domain, problem, &p.kind))
            .collect()
    });
    tracing::debug!(literals = space.len(), "grounded literal space");
    space
}

/// Every predicate grounded over the action's own parameter names, repetition allowed.
pub fn ground_action_space(domain: &Domain, action_name: &str) -> Result<State, LearningError> {
    let _span = tracing::span!(tracing::Level::DEBUG, "action space", action = action_name).entered();
    let action = domain.action(action_name)
        .ok_or_else(|| LearningError::UnknownAction(action_name.to_string()))?;
    let names: Vec<&str> = action.parameter_names().collect();
    let space = collect_space(domain, |predicate| itertools::repeat_n(names.clone(), predicate.arity()).collect());
    tracing::debug!(literals = space.len(), "grounded action space");
    Ok(space)
}

/// The problem's `:init` section as a state. Unlisted facts are absent, not false.
pub fn initial_state(domain: &Domain, problem: &Problem) -> State {
    let schemas = schemas(domain);
    let mut state = State::for_domain(domain);
    for fact in &problem.init {
        if let Some(schema) = schemas.get(&fact.predicate.to_ascii_lowercase()) {
            state.insert(GroundedPredicate::from_arguments(schema.clone(), fact.arguments.iter().cloned(), fact.positive));
        }
    }
    state
}
