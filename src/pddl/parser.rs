use enumset::EnumSet;

use super::ast::{self, Stmt, Term, TypedList};
use super::lexer::Lexer;
use super::tokens::{Token, TokenKind, KeywordToken, BinOpToken};
use super::{Error, Position};

/// Parses the STRIPS/typing subset of PDDL used by action model learning.
/// Based on https://github.com/jan-dolejsi/pddl-reference/blob/master/_citedpapers/pddl3bnf.pdf
pub struct Parser<'a> {
    lexer: std::iter::Peekable<Lexer<'a>>,
}

impl<'a> Iterator for Parser<'a> {
    type Item = Result<Stmt<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lexer.peek()?;
        let r = self.root();
        if r.is_err() {
            self.error_recover();
        }
        Some(r)
    }
}

const EXPECTED_IDENTIFIER: &str = "Expected identifier.";
const EXPECTED_COLON: &str = "Expected ':'.";
const EXPECTED_OPEN_PARENTHESIS: &str = "Expected '('.";
const EXPECTED_CLOSE_PARENTHESIS: &str = "Expected matched ')'.";

macro_rules! expect {
    ($input:expr, {$($p:pat => $b:expr$(,)?)+}, $err:expr) => {
        match $input {
            $($p => $b,)+
            Some(Ok(Token{span,..})) => Err(Error { pos: Position::Span(span), message:String::from($err) }),
            Some(Err(e)) => Err(e),
            None => Err(Error { pos: Position::EOF, message:String::from($err) })
        }
    };
}

impl<'a> Parser<'a> {
    pub fn new(code: &'a str) -> Self {
        let lexer = Lexer::new(code).peekable();
        Self { lexer }
    }

    /// Statements after a syntax error are not reliable, so the rest of the input is dropped.
    fn error_recover(&mut self) {
        for _ in self.lexer.by_ref() {}
    }

    fn here(&mut self) -> Position {
        match self.lexer.peek() {
            Some(Ok(Token { span, .. })) => Position::Span(*span),
            Some(Err(e)) => e.pos,
            None => Position::EOF,
        }
    }

    /// Next token, read as a keyword when its word is one. PDDL keywords are only
    /// reserved after `:` and in the `define` header, so names like `goal` stay usable.
    fn keyword(&mut self) -> Option<Result<Token<'a>, Error>> {
        self.lexer.next().map(|token| token.map(|token| match token.kind {
            TokenKind::Identifier(word) => match KeywordToken::from_word(word) {
                Some(keyword) => Token { span: token.span, kind: TokenKind::Keyword(keyword) },
                None => token,
            },
            _ => token,
        }))
    }

    fn close(&mut self) -> Result<(), Error> {
        use TokenKind::CloseParenthesis;
        expect!(self.lexer.next(), {Some(Ok(Token{kind:CloseParenthesis,..})) => Ok(())}, EXPECTED_CLOSE_PARENTHESIS)
    }

    fn identifier(&mut self) -> Result<&'a str, Error> {
        use TokenKind::Identifier;
        expect!(self.lexer.next(), {Some(Ok(Token{kind:Identifier(s),..})) => Ok(s)}, EXPECTED_IDENTIFIER)
    }

    fn root(&mut self) -> Result<Stmt<'a>, Error> {
        use KeywordToken::*;
        use TokenKind::*;

        expect!(self.lexer.next(), {Some(Ok(Token{kind:OpenParenthesis,..})) => Ok(())}, EXPECTED_OPEN_PARENTHESIS)?;
        expect!(self.keyword(), {Some(Ok(Token{kind:Keyword(Define),..})) => Ok(())}, "Expected 'define'.")?;
        expect!(self.lexer.next(), {Some(Ok(Token{kind:OpenParenthesis,..})) => Ok(())}, EXPECTED_OPEN_PARENTHESIS)?;
        let body = expect!(self.keyword(), {
            Some(Ok(Token{kind:Keyword(Domain),..})) => self.domain(),
            Some(Ok(Token{kind:Keyword(Problem),..})) => self.problem()
        }, "Expected 'domain' or 'problem'.")?;
        self.close()?;
        Ok(body)
    }

    fn domain(&mut self) -> Result<Stmt<'a>, Error> {
        use TokenKind::{Keyword, Colon, OpenParenthesis};
        use KeywordToken::*;
        let name = self.identifier()?;
        self.close()?;
        let mut requirements = EnumSet::empty();
        let mut types = Vec::new();
        let mut constants = Vec::new();
        let mut predicates = Vec::new();
        let mut actions = Vec::new();
        while self.lexer.next_if(|r| matches!(r, Ok(Token{kind:OpenParenthesis,..}))).is_some() {
            expect!(self.lexer.next(), {Some(Ok(Token{kind:Colon,..})) => Ok(())}, EXPECTED_COLON)?;
            expect!(self.keyword(), {
                Some(Ok(Token{kind:Keyword(Requirements),..})) => Ok(requirements = self.requirements()?),
                Some(Ok(Token{kind:Keyword(Types),..})) => Ok(types = self.typed_list(false)?),
                Some(Ok(Token{kind:Keyword(Constants),..})) => Ok(constants = self.typed_list(false)?),
                Some(Ok(Token{kind:Keyword(Predicates),..})) => Ok(predicates = self.predicates()?),
                Some(Ok(Token{kind:Keyword(Action),..})) => Ok(actions.push(self.action()?)),
            }, "Expected :requirements, :types, :constants, :predicates, or :action.")?;
            self.close()?;
        }
        Ok(Stmt::Domain(ast::Domain { name, requirements, types, constants, predicates, actions }))
    }

    fn problem(&mut self) -> Result<Stmt<'a>, Error> {
        use TokenKind::{Keyword, Colon, OpenParenthesis};
        use KeywordToken::*;
        let name = self.identifier()?;
        self.close()?;
        let mut domain = None;
        let mut requirements = EnumSet::empty();
        let mut objects = Vec::new();
        let mut init = Vec::new();
        let mut goal = None;
        while self.lexer.next_if(|r| matches!(r, Ok(Token{kind:OpenParenthesis,..}))).is_some() {
            expect!(self.lexer.next(), {Some(Ok(Token{kind:Colon,..})) => Ok(())}, EXPECTED_COLON)?;
            expect!(self.keyword(), {
                Some(Ok(Token{kind:Keyword(Domain),..})) => Ok(domain = Some(self.identifier()?)),
                Some(Ok(Token{kind:Keyword(Requirements),..})) => Ok(requirements = self.requirements()?),
                Some(Ok(Token{kind:Keyword(Objects),..})) => Ok(objects = self.typed_list(false)?),
                Some(Ok(Token{kind:Keyword(Init),..})) => Ok(init = self.expressions()?),
                Some(Ok(Token{kind:Keyword(Goal),..})) => Ok(goal = Some(self.expr()?)),
            }, "Expected :domain, :requirements, :objects, :init, or :goal.")?;
            self.close()?;
        }
        let domain = match domain {
            Some(domain) => domain,
            None => return Err(Error::new(self.here(), "Expected (:domain ...) in problem.")),
        };
        let goal = goal.unwrap_or(ast::Expr::And(Vec::new()));
        Ok(Stmt::Problem(ast::Problem { name, domain, requirements, objects, init, goal }))
    }

    fn requirements(&mut self) -> Result<EnumSet<ast::Requirements>, Error> {
        use TokenKind::{Keyword, Colon};
        use KeywordToken::*;
        let mut r = EnumSet::empty();
        while self.lexer.next_if(|t| matches!(t, Ok(Token{kind:Colon,..}))).is_some() {
            expect!(self.keyword(), {
                Some(Ok(Token{kind:Keyword(Strips),..})) => Ok(r.insert(ast::Requirements::Strips)),
                Some(Ok(Token{kind:Keyword(Typing),..})) => Ok(r.insert(ast::Requirements::Typing)),
                Some(Ok(Token{kind:Keyword(ActionCosts),..})) => Ok(r.insert(ast::Requirements::ActionCosts)),
                Some(Ok(Token{kind:Keyword(NegativePreconditions),..})) => Ok(r.insert(ast::Requirements::NegativePreconditions)),
                Some(Ok(Token{kind:Keyword(DisjunctivePreconditions),..})) => Ok(r.insert(ast::Requirements::DisjunctivePreconditions)),
                Some(Ok(Token{kind:Keyword(Equality),..})) => Ok(r.insert(ast::Requirements::Equality)),
                Some(Ok(Token{kind:Keyword(ExistentialPreconditions),..})) => Ok(r.insert(ast::Requirements::ExistentialPreconditions)),
                Some(Ok(Token{kind:Keyword(UniversalPreconditions),..})) => Ok(r.insert(ast::Requirements::UniversalPreconditions)),
                Some(Ok(Token{kind:Keyword(QuantifiedPreconditions),..})) => Ok(r.insert(ast::Requirements::QuantifiedPreconditions)),
                Some(Ok(Token{kind:Keyword(ConditionalEffects),..})) => Ok(r.insert(ast::Requirements::ConditionalEffects)),
                Some(Ok(Token{kind:Keyword(Fluents),..})) => Ok(r.insert(ast::Requirements::Fluents)),
                Some(Ok(Token{kind:Keyword(ADL),..})) => Ok(r.insert(ast::Requirements::ADL)),
                Some(Ok(Token{kind:Keyword(DurativeActions),..})) => Ok(r.insert(ast::Requirements::DurativeActions)),
                Some(Ok(Token{kind:Keyword(DerivedPredicates),..})) => Ok(r.insert(ast::Requirements::DerivedPredicates)),
                Some(Ok(Token{kind:Keyword(TimedInitialLiterals),..})) => Ok(r.insert(ast::Requirements::TimedInitialLiterals)),
                Some(Ok(Token{kind:Keyword(Preferences),..})) => Ok(r.insert(ast::Requirements::Preferences)),
                Some(Ok(Token{kind:Keyword(Constraints),..})) => Ok(r.insert(ast::Requirements::Constraints)),
            }, "Expected requirements.")?;
        }
        Ok(r)
    }

    /// `a b - t c` or `?a ?b - t ?c`. Trailing names without a type are `object`s.
    fn typed_list(&mut self, variables: bool) -> Result<Vec<TypedList<'a>>, Error> {
        use TokenKind::{BinOp, QuestionMark, Identifier};
        use BinOpToken::Minus;
        let mut lists = Vec::new();
        let mut identifiers = Vec::new();
        loop {
            if variables {
                if self.lexer.next_if(|t| matches!(t, Ok(Token{kind:QuestionMark,..}))).is_none() {
                    break;
                }
                identifiers.push(self.identifier()?);
            } else if let Some(Ok(Token{kind:Identifier(s),..})) = self.lexer.next_if(|t| matches!(t, Ok(Token{kind:Identifier(_),..}))) {
                identifiers.push(s);
            } else {
                break;
            }
            if self.lexer.next_if(|t| matches!(t, Ok(Token{kind:BinOp(Minus),..}))).is_some() {
                let kind = self.identifier()?;
                lists.push(TypedList { identifiers: std::mem::take(&mut identifiers), kind });
            }
        }
        if !identifiers.is_empty() {
            lists.push(TypedList { identifiers, kind: super::types::ROOT_TYPE });
        }
        Ok(lists)
    }

    fn predicates(&mut self) -> Result<Vec<ast::Predicate<'a>>, Error> {
        use TokenKind::OpenParenthesis;
        let mut predicates = Vec::new();
        while self.lexer.next_if(|t| matches!(t, Ok(Token{kind:OpenParenthesis,..}))).is_some() {
            let name = self.identifier()?;
            let variables = self.typed_list(true)?;
            predicates.push(ast::Predicate { name, variables });
            self.close()?;
        }
        Ok(predicates)
    }

    fn action(&mut self) -> Result<ast::Action<'a>, Error> {
        use TokenKind::{Keyword, Colon, OpenParenthesis};
        use KeywordToken::{Parameters, Precondition, Effect};
        let name = self.identifier()?;
        let mut parameters = Vec::new();
        let mut precondition = None;
        let mut effect = None;
        while self.lexer.next_if(|t| matches!(t, Ok(Token{kind:Colon,..}))).is_some() {
            expect!(self.keyword(), {
                Some(Ok(Token{kind:Keyword(Parameters),..})) => {
                    expect!(self.lexer.next(), {Some(Ok(Token{kind:OpenParenthesis,..})) => Ok(())}, EXPECTED_OPEN_PARENTHESIS)?;
                    parameters = self.typed_list(true)?;
                    self.close()
                },
                Some(Ok(Token{kind:Keyword(Precondition),..})) => Ok(precondition = Some(self.expr()?)),
                Some(Ok(Token{kind:Keyword(Effect),..})) => Ok(effect = Some(self.expr()?)),
            }, "Expected :parameters, :precondition, or :effect.")?;
        }
        Ok(ast::Action { name, parameters, precondition, effect })
    }

    fn expressions(&mut self) -> Result<Vec<ast::Expr<'a>>, Error> {
        use TokenKind::OpenParenthesis;
        let mut group = Vec::new();
        while matches!(self.lexer.peek(), Some(Ok(Token{kind:OpenParenthesis,..}))) {
            group.push(self.expr()?)
        }
        Ok(group)
    }

    fn term(&mut self) -> Result<Term<'a>, Error> {
        use TokenKind::{Identifier, QuestionMark};
        expect!(self.lexer.next(), {
            Some(Ok(Token{kind:QuestionMark,..})) => Ok(Term::Variable(self.identifier()?)),
            Some(Ok(Token{kind:Identifier(s),..})) => Ok(Term::Constant(s)),
        }, "Expected variable or constant.")
    }

    fn literal(&mut self, name: &'a str) -> Result<ast::Expr<'a>, Error> {
        use TokenKind::{Identifier, QuestionMark};
        let mut arguments = Vec::new();
        while matches!(self.lexer.peek(), Some(Ok(Token{kind:QuestionMark | Identifier(_),..}))) {
            arguments.push(self.term()?);
        }
        Ok(ast::Expr::Literal { name, arguments })
    }

    fn expr(&mut self) -> Result<ast::Expr<'a>, Error> {
        use TokenKind::{BinOp, Identifier, OpenParenthesis, CloseParenthesis};
        use BinOpToken::{And, Or, Not, Equals};
        expect!(self.lexer.next(), {Some(Ok(Token{kind:OpenParenthesis,..})) => Ok(())}, EXPECTED_OPEN_PARENTHESIS)?;
        // `()` is the empty conjunction.
        if matches!(self.lexer.peek(), Some(Ok(Token{kind:CloseParenthesis,..}))) {
            self.close()?;
            return Ok(ast::Expr::And(Vec::new()));
        }
        let result = expect!(self.lexer.next(), {
            Some(Ok(Token{kind:BinOp(And),..})) => Ok(ast::Expr::And(self.expressions()?)),
            Some(Ok(Token{kind:BinOp(Or),..})) => Ok(ast::Expr::Or(self.expressions()?)),
            Some(Ok(Token{kind:BinOp(Not),..})) => Ok(ast::Expr::Not(Box::new(self.expr()?))),
            Some(Ok(Token{kind:BinOp(Equals),..})) => Ok(ast::Expr::Equals(self.term()?, self.term()?)),
            Some(Ok(Token{kind:Identifier(s),..})) => self.literal(s),
        }, "Expected expression.")?;
        self.close()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use enumset::{EnumSet, enum_set};

    use super::Parser;
    use super::super::Position;
    use super::super::ast::{Stmt, Domain, Problem, Requirements, TypedList, Predicate, Action, Expr, Term};

    #[test]
    fn test_domain() {
        let code = "(define (domain test) (:requirements :strips :typing) (:types hand - object water - beverage) (:predicates (warm ?o - object) (handempty)) (:action test :parameters (?h - hand ?b - beverage) :precondition (and (cold ?h) (not (handempty))) :effect (warm ?b)))";
        let mut parser = Parser::new(code);
        assert_eq!(parser.next(), Some(Ok(Stmt::Domain(Domain{
            name:"test",
            requirements:enum_set!(Requirements::Strips | Requirements::Typing),
            types:vec![TypedList{identifiers:vec!["hand"], kind:"object"},
                       TypedList{identifiers:vec!["water"], kind:"beverage"}],
            constants:vec![],
            predicates:vec![Predicate{name:"warm", variables:vec![TypedList{identifiers:vec!["o"], kind:"object"}]},
                            Predicate{name:"handempty", variables:vec![]}],
            actions:vec![Action{
                name:"test",
                parameters:vec![TypedList{identifiers:vec!["h"], kind:"hand"}, TypedList{identifiers:vec!["b"], kind:"beverage"}],
                precondition:Some(Expr::And(vec![
                    Expr::Literal { name: "cold", arguments: vec![Term::Variable("h")] },
                    Expr::Not(Box::new(Expr::Literal { name: "handempty", arguments: vec![] })),
                ])),
                effect:Some(Expr::Literal { name: "warm", arguments: vec![Term::Variable("b")] })
            }]
        }))));
        assert_eq!(parser.next(), None);
    }

    #[test]
    fn test_untyped_parameters() {
        let code = "(define (domain untyped) (:predicates (on ?x ?y)) (:action stack :parameters (?x ?y) :effect ()))";
        let stmt = Parser::new(code).next().unwrap().unwrap();
        let Stmt::Domain(domain) = stmt else { panic!("expected a domain") };
        assert_eq!(domain.predicates[0].variables, vec![TypedList{identifiers:vec!["x", "y"], kind:"object"}]);
        assert_eq!(domain.actions[0].parameters, vec![TypedList{identifiers:vec!["x", "y"], kind:"object"}]);
        assert_eq!(domain.actions[0].precondition, None);
        assert_eq!(domain.actions[0].effect, Some(Expr::And(vec![])));
    }

    #[test]
    fn test_problem() {
        let code = "(define (problem test) (:domain barman) (:objects shaker1 - shaker cup) (:init (ontable shaker1)) (:goal (and (contains shot1 cocktail1))))";
        let mut parser = Parser::new(code);
        assert_eq!(parser.next(), Some(Ok(Stmt::Problem(Problem{
            name:"test",
            domain:"barman",
            requirements: EnumSet::empty(),
            objects:vec![TypedList{identifiers:vec!["shaker1"], kind:"shaker"}, TypedList{identifiers:vec!["cup"], kind:"object"}],
            init: vec![Expr::Literal { name: "ontable", arguments: vec![Term::Constant("shaker1")] }],
            goal: Expr::And(vec![Expr::Literal { name: "contains", arguments: vec![Term::Constant("shot1"), Term::Constant("cocktail1")] }])
        }))))
    }

    #[test]
    fn test_missing_parenthesis() {
        let code = "(define (domain broken) (:predicates (on ?x ?y)";
        let mut parser = Parser::new(code);
        let err = parser.next().unwrap().unwrap_err();
        assert_eq!(err.pos, Position::EOF);
        assert_eq!(parser.next(), None);
    }

    #[test]
    fn test_keyword_words_as_names() {
        let code = "(define (domain routes) (:types goal) (:predicates (at ?x - goal ?init - goal) (types))
            (:action init :parameters (?x ?init - goal) :precondition (at ?x ?init) :effect (not (at ?x ?init))))";
        let Stmt::Domain(domain) = Parser::new(code).next().unwrap().unwrap() else { panic!("expected a domain") };
        assert_eq!(domain.types, vec![TypedList{identifiers:vec!["goal"], kind:"object"}]);
        assert_eq!(domain.predicates[0], Predicate{name:"at", variables:vec![TypedList{identifiers:vec!["x", "init"], kind:"goal"}]});
        assert_eq!(domain.predicates[1], Predicate{name:"types", variables:vec![]});
        assert_eq!(domain.actions[0].name, "init");
        let at = Expr::Literal { name: "at", arguments: vec![Term::Variable("x"), Term::Variable("init")] };
        assert_eq!(domain.actions[0].precondition, Some(at));

        let code = "(define (problem p) (:domain routes) (:objects start goal) (:init (at start goal)) (:goal (at goal start)))";
        let Stmt::Problem(problem) = Parser::new(code).next().unwrap().unwrap() else { panic!("expected a problem") };
        assert_eq!(problem.objects, vec![TypedList{identifiers:vec!["start", "goal"], kind:"object"}]);
        assert_eq!(problem.init, vec![Expr::Literal { name: "at", arguments: vec![Term::Constant("start"), Term::Constant("goal")] }]);
        assert_eq!(problem.goal, Expr::Literal { name: "at", arguments: vec![Term::Constant("goal"), Term::Constant("start")] });
    }

    #[test]
    fn test_keyword_required_after_colon() {
        let err = Parser::new("(define (domain d) (:goal))").next().unwrap().unwrap_err();
        assert_eq!(err.message, "Expected :requirements, :types, :constants, :predicates, or :action.");
    }
}
