use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
    pub len: usize,
}

impl Span {
    pub fn new(line: usize, col: usize, len: usize) -> Self {
        Self { line, col, len }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line:{} col:{}", self.line, self.col)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Literal {
    I(i64),
    F(f64),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::I(i) => write!(f, "{}", i),
            Literal::F(fv) => write!(f, "{}", fv),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BinOpToken {
    And,
    Or,
    Not,
    Minus,
    Equals,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum KeywordToken {
    Define,
    Domain,
    Problem,
    Requirements,
    Types,
    Constants,
    Predicates,
    Action,
    Parameters,
    Precondition,
    Effect,
    Objects,
    Init,
    Goal,
    Strips,
    Typing,
    NegativePreconditions,
    DisjunctivePreconditions,
    Equality,
    ExistentialPreconditions,
    UniversalPreconditions,
    QuantifiedPreconditions,
    ConditionalEffects,
    Fluents,
    ADL,
    ActionCosts,
    DurativeActions,
    DerivedPredicates,
    TimedInitialLiterals,
    Preferences,
    Constraints,
}

impl KeywordToken {
    /// Keywords are case-insensitive in PDDL.
    pub fn from_word(word: &str) -> Option<Self> {
        use KeywordToken::*;
        let keyword = match word.to_ascii_lowercase().as_str() {
            "define" => Define,
            "domain" => Domain,
            "problem" => Problem,
            "requirements" => Requirements,
            "types" => Types,
            "constants" => Constants,
            "predicates" => Predicates,
            "action" => Action,
            "parameters" => Parameters,
            "precondition" => Precondition,
            "effect" => Effect,
            "objects" => Objects,
            "init" => Init,
            "goal" => Goal,
            "strips" => Strips,
            "typing" => Typing,
            "negative-preconditions" => NegativePreconditions,
            "disjunctive-preconditions" => DisjunctivePreconditions,
            "equality" => Equality,
            "existential-preconditions" => ExistentialPreconditions,
            "universal-preconditions" => UniversalPreconditions,
            "quantified-preconditions" => QuantifiedPreconditions,
            "conditional-effects" => ConditionalEffects,
            "fluents" => Fluents,
            "adl" => ADL,
            "action-costs" => ActionCosts,
            "durative-actions" => DurativeActions,
            "derived-predicates" => DerivedPredicates,
            "timed-initial-literals" => TimedInitialLiterals,
            "preferences" => Preferences,
            "constraints" => Constraints,
            _ => return None,
        };
        Some(keyword)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokenKind<'a> {
    OpenParenthesis,
    CloseParenthesis,
    Colon,
    QuestionMark,
    BinOp(BinOpToken),
    Keyword(KeywordToken),
    Identifier(&'a str),
    Literal(Literal),
}

impl fmt::Display for TokenKind<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        match self {
            OpenParenthesis => write!(f, "("),
            CloseParenthesis => write!(f, ")"),
            Colon => write!(f, ":"),
            QuestionMark => write!(f, "?"),
            BinOp(BinOpToken::And) => write!(f, "and"),
            BinOp(BinOpToken::Or) => write!(f, "or"),
            BinOp(BinOpToken::Not) => write!(f, "not"),
            BinOp(BinOpToken::Minus) => write!(f, "-"),
            BinOp(BinOpToken::Equals) => write!(f, "="),
            Keyword(k) => write!(f, "{:?}", k),
            Identifier(s) => write!(f, "{}", s),
            Literal(l) => write!(f, "{}", l),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Token<'a> {
    pub span: Span,
    pub kind: TokenKind<'a>,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}
