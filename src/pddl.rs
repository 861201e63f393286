pub mod ast;
pub mod domain;
pub mod lexer;
pub mod parser;
pub mod problem;
pub mod tokens;
pub mod types;

use std::fmt;
use thiserror::Error;

pub use domain::{Action, Domain, Formula, Object, Parameter, Predicate, Term};
pub use problem::{Fact, Problem};
pub use types::{TypeHierarchy, ROOT_TYPE};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Position {
    Span(tokens::Span),
    EOF,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Span(span) => write!(f, "{}", span),
            Position::EOF => write!(f, "end of file"),
        }
    }
}

/// Lexing or parsing failure.
#[derive(Error, Clone, Debug, PartialEq)]
#[error("{pos} {message}")]
pub struct Error {
    pub pos: Position,
    pub message: String,
}

impl Error {
    pub fn new(pos: Position, message: &str) -> Self {
        Self { pos, message: String::from(message) }
    }

    /// Renders the offending source line with a caret under the reported column.
    pub fn annotate(&self, source: &str) -> String {
        let Position::Span(span) = self.pos else {
            return format!("{}", self);
        };
        match source.lines().nth(span.line.saturating_sub(1)) {
            Some(line) => {
                let prefix = format!("{}: ", span.line);
                format!("{}{}\n{:->width$} {}", prefix, line, '^', self.message, width = prefix.len() + span.col)
            }
            None => format!("{}", self),
        }
    }
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{0}")]
    Parse(#[from] Error),
    #[error("unable to read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("in {path}:\n{source}")]
    InFile { path: String, source: Box<DomainError> },
    #[error("expected a domain definition")]
    ExpectedDomain,
    #[error("expected a problem definition")]
    ExpectedProblem,
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("type `{0}` is its own ancestor")]
    CyclicType(String),
    #[error("duplicate predicate `{0}`")]
    DuplicatePredicate(String),
    #[error("duplicate action `{0}`")]
    DuplicateAction(String),
    #[error("unknown predicate `{0}`")]
    UnknownPredicate(String),
    #[error("unknown object `{0}`")]
    UnknownObject(String),
    #[error("predicate `{name}` expects {expected} arguments, got {found}")]
    PredicateArity { name: String, expected: usize, found: usize },
    #[error("problem targets domain `{found}` but `{expected}` was loaded")]
    DomainMismatch { expected: String, found: String },
}

impl DomainError {
    /// Attaches the file path, annotating syntax errors with the offending line.
    pub(crate) fn in_file(self, path: &str, source: &str) -> Self {
        let inner = match self {
            DomainError::Parse(e) => DomainError::Parse(Error { pos: e.pos, message: e.annotate(source) }),
            other => other,
        };
        DomainError::InFile { path: path.to_string(), source: Box::new(inner) }
    }
}

pub(crate) fn read_source(path: &str) -> Result<String, DomainError> {
    std::fs::read_to_string(path).map_err(|source| DomainError::Io { path: path.to_string(), source })
}
