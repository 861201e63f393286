use std::fmt;

use enumset::EnumSet;
use itertools::Itertools;

use super::ast::{self, Requirements, Stmt};
use super::domain::{objects, Domain, Formula, Object};
use super::parser::Parser;
use super::{read_source, DomainError};

/// Ground atom from the `:init` section.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Fact {
    pub predicate: String,
    pub arguments: Vec<String>,
    pub positive: bool,
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let atom = if self.arguments.is_empty() {
            format!("({})", self.predicate)
        } else {
            format!("({} {})", self.predicate, self.arguments.iter().join(" "))
        };
        if self.positive {
            write!(f, "{}", atom)
        } else {
            write!(f, "(not {})", atom)
        }
    }
}

#[derive(Clone, Debug)]
pub struct Problem {
    pub name: String,
    pub domain: String,
    pub requirements: EnumSet<Requirements>,
    pub objects: Vec<Object>,
    pub init: Vec<Fact>,
    pub goal: Formula,
}

impl Problem {
    pub fn parse(code: &str, domain: &Domain) -> Result<Self, DomainError> {
        match Parser::new(code).next() {
            Some(Ok(Stmt::Problem(problem))) => Self::from_ast(problem, domain),
            Some(Ok(Stmt::Domain(_))) | None => Err(DomainError::ExpectedProblem),
            Some(Err(e)) => Err(e.into()),
        }
    }

    pub fn from_file(path: &str, domain: &Domain) -> Result<Self, DomainError> {
        let code = read_source(path)?;
        Self::parse(&code, domain).map_err(|e| e.in_file(path, &code))
    }

    pub fn from_ast(problem: ast::Problem, domain: &Domain) -> Result<Self, DomainError> {
        if !problem.domain.eq_ignore_ascii_case(&domain.name) {
            return Err(DomainError::DomainMismatch { expected: domain.name.clone(), found: problem.domain.to_string() });
        }
        let mut result = Self {
            name: problem.name.to_string(),
            domain: problem.domain.to_string(),
            requirements: problem.requirements,
            objects: objects(&problem.objects, &domain.types)?,
            init: Vec::new(),
            goal: domain.lower(&problem.goal)?,
        };
        for expr in &problem.init {
            let fact = result.fact(expr, domain)?;
            result.init.push(fact);
        }
        Ok(result)
    }

    fn fact(&self, expr: &ast::Expr, domain: &Domain) -> Result<Fact, DomainError> {
        let (name, arguments, positive) = match expr {
            ast::Expr::Literal { name, arguments } => (name, arguments, true),
            ast::Expr::Not(inner) => match inner.as_ref() {
                ast::Expr::Literal { name, arguments } => (name, arguments, false),
                _ => return Err(DomainError::UnknownPredicate(format!("{:?}", inner))),
            },
            _ => return Err(DomainError::UnknownPredicate(format!("{:?}", expr))),
        };
        domain.check_arity(name, arguments.len())?;
        let arguments = arguments.iter()
            .map(|term| match term {
                ast::Term::Constant(c) if self.object(c, domain).is_some() => Ok(c.to_string()),
                ast::Term::Constant(c) => Err(DomainError::UnknownObject(c.to_string())),
                ast::Term::Variable(v) => Err(DomainError::UnknownObject(format!("?{}", v))),
            })
            .collect::<Result<_, _>>()?;
        Ok(Fact { predicate: name.to_string(), arguments, positive })
    }

    /// Looks up a problem object or, failing that, a domain constant.
    pub fn object<'a>(&'a self, name: &str, domain: &'a Domain) -> Option<&'a Object> {
        self.objects.iter().chain(&domain.constants).find(|o| o.name == name)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "(define (problem {})", self.name)?;
        writeln!(f, " (:domain {})", self.domain)?;
        writeln!(f, " (:objects {})", self.objects.iter().join(" "))?;
        writeln!(f, " (:init {})", self.init.iter().join(" "))?;
        writeln!(f, " (:goal {})", self.goal)?;
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::{Fact, Problem};
    use crate::pddl::{Domain, DomainError};

    const DOMAIN: &str = "(define (domain blocksworld) (:types block)
        (:constants table - object)
        (:predicates (on ?x - block ?y - block) (clear ?x - block) (handempty)))";

    fn domain() -> Domain {
        Domain::parse(DOMAIN).unwrap()
    }

    #[test]
    fn test_objects_and_init() {
        let code = "(define (problem p1) (:domain blocksworld) (:objects a b - block)
            (:init (on a b) (clear a) (handempty) (not (clear b))) (:goal (and (on b a))))";
        let problem = Problem::parse(code, &domain()).unwrap();
        assert_eq!(problem.objects.iter().map(|o| o.to_string()).collect::<Vec<_>>(), vec!["a - block", "b - block"]);
        assert_eq!(problem.init[0], Fact { predicate: "on".to_string(), arguments: vec!["a".to_string(), "b".to_string()], positive: true });
        assert_eq!(problem.init[2].to_string(), "(handempty)");
        assert_eq!(problem.init[3].to_string(), "(not (clear b))");
        assert_eq!(problem.goal.to_string(), "(and (on b a))");
    }

    #[test]
    fn test_constants_are_known_objects() {
        let code = "(define (problem p1) (:domain blocksworld) (:objects a - block) (:init (clear table)) (:goal ()))";
        let domain = domain();
        let problem = Problem::parse(code, &domain).unwrap();
        assert_eq!(problem.object("table", &domain).map(|o| o.kind.as_str()), Some("object"));
    }

    #[test]
    fn test_init_errors() {
        let domain = domain();
        let unknown_object = "(define (problem p) (:domain blocksworld) (:objects a - block) (:init (clear z)))";
        assert!(matches!(Problem::parse(unknown_object, &domain), Err(DomainError::UnknownObject(o)) if o == "z"));
        let unknown_predicate = "(define (problem p) (:domain blocksworld) (:objects a - block) (:init (holding a)))";
        assert!(matches!(Problem::parse(unknown_predicate, &domain), Err(DomainError::UnknownPredicate(p)) if p == "holding"));
        let mismatch = "(define (problem p) (:domain logistics) (:objects a - block))";
        assert!(matches!(Problem::parse(mismatch, &domain), Err(DomainError::DomainMismatch { .. })));
    }
}
