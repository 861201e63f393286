use std::collections::HashMap;
use std::fmt;

use enumset::EnumSet;
use itertools::Itertools;

use super::ast::{self, Requirements, Stmt, TypedList};
use super::parser::Parser;
use super::types::TypeHierarchy;
use super::{read_source, DomainError};

/// Formal parameter of a predicate or action schema.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub name: String,
    pub kind: String,
}

impl Parameter {
    pub fn new(name: &str, kind: &str) -> Self {
        Self { name: name.to_string(), kind: kind.to_string() }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "?{} - {}", self.name, self.kind)
    }
}

/// Flattens typed lists into parameters, keeping declaration order.
pub(crate) fn flatten(lists: &[TypedList], types: &TypeHierarchy) -> Result<Vec<Parameter>, DomainError> {
    let mut parameters = Vec::new();
    for TypedList { identifiers, kind } in lists {
        if !types.contains(kind) {
            return Err(DomainError::UnknownType(kind.to_string()));
        }
        parameters.extend(identifiers.iter().map(|name| Parameter::new(name, kind)));
    }
    Ok(parameters)
}

/// Predicate schema. `parameters` is in declaration order.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    pub name: String,
    pub parameters: Vec<Parameter>,
}

impl Predicate {
    pub fn new(name: &str, parameters: Vec<Parameter>) -> Self {
        Self { name: name.to_string(), parameters }
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.parameters.is_empty() {
            write!(f, "({})", self.name)
        } else {
            write!(f, "({} {})", self.name, self.parameters.iter().join(" "))
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Object {
    pub name: String,
    pub kind: String,
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} - {}", self.name, self.kind)
    }
}

pub(crate) fn objects(lists: &[TypedList], types: &TypeHierarchy) -> Result<Vec<Object>, DomainError> {
    Ok(flatten(lists, types)?
        .into_iter()
        .map(|Parameter { name, kind }| Object { name, kind })
        .collect())
}

#[derive(Clone, Debug, PartialEq)]
pub enum Term {
    Variable(String),
    Constant(String),
}

impl From<&ast::Term<'_>> for Term {
    fn from(term: &ast::Term) -> Self {
        match term {
            ast::Term::Variable(v) => Term::Variable(v.to_string()),
            ast::Term::Constant(c) => Term::Constant(c.to_string()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Term::Variable(v) => write!(f, "?{}", v),
            Term::Constant(c) => write!(f, "{}", c),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Formula {
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Not(Box<Formula>),
    Equals(Term, Term),
    Atom { predicate: String, arguments: Vec<Term> },
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Formula::And(v) => write!(f, "(and {})", v.iter().join(" ")),
            Formula::Or(v) => write!(f, "(or {})", v.iter().join(" ")),
            Formula::Not(item) => write!(f, "(not {})", item),
            Formula::Equals(a, b) => write!(f, "(= {} {})", a, b),
            Formula::Atom { predicate, arguments } if arguments.is_empty() => write!(f, "({})", predicate),
            Formula::Atom { predicate, arguments } => write!(f, "({} {})", predicate, arguments.iter().join(" ")),
        }
    }
}

/// Action schema. Only the ordered parameter list takes part in grounding.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub precondition: Option<Formula>,
    pub effect: Option<Formula>,
}

impl Action {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> + Clone {
        self.parameters.iter().map(|p| p.name.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(:action {} :parameters ({})", self.name, self.parameters.iter().join(" "))?;
        if let Some(precondition) = &self.precondition {
            write!(f, " :precondition {}", precondition)?;
        }
        if let Some(effect) = &self.effect {
            write!(f, " :effect {}", effect)?;
        }
        write!(f, ")")
    }
}

/// Lowered domain. Immutable once built.
#[derive(Clone, Debug)]
pub struct Domain {
    pub name: String,
    pub requirements: EnumSet<Requirements>,
    pub types: TypeHierarchy,
    pub constants: Vec<Object>,
    predicates: Vec<Predicate>,
    actions: Vec<Action>,
    /// Map of lowercased predicate name to its index in `predicates`.
    predicate_index: HashMap<String, usize>,
    /// Map of lowercased action name to its index in `actions`.
    action_index: HashMap<String, usize>,
}

impl Domain {
    pub fn parse(code: &str) -> Result<Self, DomainError> {
        match Parser::new(code).next() {
            Some(Ok(Stmt::Domain(domain))) => Self::from_ast(domain),
            Some(Ok(Stmt::Problem(_))) | None => Err(DomainError::ExpectedDomain),
            Some(Err(e)) => Err(e.into()),
        }
    }

    pub fn from_file(path: &str) -> Result<Self, DomainError> {
        let code = read_source(path)?;
        Self::parse(&code).map_err(|e| e.in_file(path, &code))
    }

    pub fn from_ast(domain: ast::Domain) -> Result<Self, DomainError> {
        let types = TypeHierarchy::from_ast(&domain.types)?;
        let constants = objects(&domain.constants, &types)?;
        let mut result = Self {
            name: domain.name.to_string(),
            requirements: domain.requirements,
            types,
            constants,
            predicates: Vec::new(),
            actions: Vec::new(),
            predicate_index: HashMap::new(),
            action_index: HashMap::new(),
        };
        for ast::Predicate { name, variables } in &domain.predicates {
            if result.predicate(name).is_some() {
                return Err(DomainError::DuplicatePredicate(name.to_string()));
            }
            let parameters = flatten(variables, &result.types)?;
            result.predicate_index.insert(name.to_ascii_lowercase(), result.predicates.len());
            result.predicates.push(Predicate::new(name, parameters));
        }
        for action in &domain.actions {
            if result.action(action.name).is_some() {
                return Err(DomainError::DuplicateAction(action.name.to_string()));
            }
            let lowered = Action {
                name: action.name.to_string(),
                parameters: flatten(&action.parameters, &result.types)?,
                precondition: action.precondition.as_ref().map(|e| result.lower(e)).transpose()?,
                effect: action.effect.as_ref().map(|e| result.lower(e)).transpose()?,
            };
            result.action_index.insert(lowered.name.to_ascii_lowercase(), result.actions.len());
            result.actions.push(lowered);
        }
        Ok(result)
    }

    /// Lowers an expression, checking every atom against the declared predicates.
    pub(crate) fn lower(&self, expr: &ast::Expr) -> Result<Formula, DomainError> {
        Ok(match expr {
            ast::Expr::And(v) => Formula::And(v.iter().map(|e| self.lower(e)).collect::<Result<_, _>>()?),
            ast::Expr::Or(v) => Formula::Or(v.iter().map(|e| self.lower(e)).collect::<Result<_, _>>()?),
            ast::Expr::Not(e) => Formula::Not(Box::new(self.lower(e)?)),
            ast::Expr::Equals(a, b) => Formula::Equals(a.into(), b.into()),
            ast::Expr::Literal { name, arguments } => {
                self.check_arity(name, arguments.len())?;
                Formula::Atom { predicate: name.to_string(), arguments: arguments.iter().map(Term::from).collect() }
            }
        })
    }

    pub(crate) fn check_arity(&self, name: &str, found: usize) -> Result<&Predicate, DomainError> {
        let predicate = self.predicate(name).ok_or_else(|| DomainError::UnknownPredicate(name.to_string()))?;
        if predicate.arity() != found {
            return Err(DomainError::PredicateArity { name: name.to_string(), expected: predicate.arity(), found });
        }
        Ok(predicate)
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Case-insensitive, like PDDL names.
    pub fn predicate(&self, name: &str) -> Option<&Predicate> {
        self.predicate_index.get(&name.to_ascii_lowercase()).map(|idx| &self.predicates[*idx])
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Case-insensitive, like PDDL names.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.action_index.get(&name.to_ascii_lowercase()).map(|idx| &self.actions[*idx])
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "(define (domain {})", self.name)?;
        writeln!(f, " (:types {})", self.types)?;
        if !self.constants.is_empty() {
            writeln!(f, " (:constants {})", self.constants.iter().join(" "))?;
        }
        writeln!(f, " (:predicates {})", self.predicates.iter().join(" "))?;
        for action in &self.actions {
            writeln!(f, " {}", action)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::{Domain, Formula, Parameter, Term};
    use crate::pddl::DomainError;

    const BLOCKSWORLD: &str = "
        (define (domain blocksworld)
          (:requirements :strips :typing)
          (:types block)
          (:predicates (on ?x - block ?y - block) (ontable ?x - block) (clear ?x - block)
                       (handempty) (holding ?x - block))
          (:action stack
            :parameters (?x - block ?y - block)
            :precondition (and (holding ?x) (clear ?y))
            :effect (and (not (holding ?x)) (not (clear ?y)) (clear ?x) (handempty) (on ?x ?y))))";

    #[test]
    fn test_lowering_keeps_declaration_order() {
        let domain = Domain::parse(BLOCKSWORLD).unwrap();
        assert_eq!(domain.name, "blocksworld");
        let names: Vec<_> = domain.predicates().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["on", "ontable", "clear", "handempty", "holding"]);
        assert_eq!(domain.predicate("on").unwrap().parameters, vec![Parameter::new("x", "block"), Parameter::new("y", "block")]);
        let stack = domain.action("stack").unwrap();
        assert_eq!(stack.parameter_names().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(stack.precondition, Some(Formula::And(vec![
            Formula::Atom { predicate: "holding".to_string(), arguments: vec![Term::Variable("x".to_string())] },
            Formula::Atom { predicate: "clear".to_string(), arguments: vec![Term::Variable("y".to_string())] },
        ])));
        assert!(domain.action("unstack").is_none());
    }

    #[test]
    fn test_display_round_trips() {
        let domain = Domain::parse(BLOCKSWORLD).unwrap();
        let reparsed = Domain::parse(&domain.to_string()).unwrap();
        assert_eq!(reparsed.predicates(), domain.predicates());
        assert_eq!(reparsed.actions(), domain.actions());
    }

    #[test]
    fn test_unknown_type() {
        let code = "(define (domain d) (:predicates (at ?t - truck)))";
        assert!(matches!(Domain::parse(code), Err(DomainError::UnknownType(t)) if t == "truck"));
    }

    #[test]
    fn test_precondition_arity_is_checked() {
        let code = "(define (domain d) (:predicates (clear ?x)) (:action a :parameters (?x) :precondition (clear ?x ?x)))";
        assert!(matches!(Domain::parse(code), Err(DomainError::PredicateArity { expected: 1, found: 2, .. })));
    }

    #[test]
    fn test_problem_is_not_a_domain() {
        let code = "(define (problem p) (:domain d) (:objects a))";
        assert!(matches!(Domain::parse(code), Err(DomainError::ExpectedDomain)));
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let domain = Domain::parse(BLOCKSWORLD).unwrap();
        assert_eq!(domain.action("STACK").map(|a| a.name.as_str()), Some("stack"));
        assert_eq!(domain.predicate("OnTable").map(|p| p.name.as_str()), Some("ontable"));
        let code = "(define (domain d) (:predicates (clear ?x) (CLEAR ?y)))";
        assert!(matches!(Domain::parse(code), Err(DomainError::DuplicatePredicate(p)) if p == "CLEAR"));
    }
}
