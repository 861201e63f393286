use enumset::{EnumSet, EnumSetType};

#[derive(PartialEq, Debug)]
pub enum Stmt<'a> {
    Domain(Domain<'a>),
    Problem(Problem<'a>)
}

#[derive(PartialEq, Debug)]
pub struct Problem<'a> {
    pub name: &'a str,
    pub domain: &'a str,
    pub requirements: EnumSet<Requirements>,
    pub objects: Vec<TypedList<'a>>,
    pub init: Vec<Expr<'a>>,
    pub goal: Expr<'a>,
}

#[derive(PartialEq, Debug)]
pub struct Domain<'a> {
    pub name: &'a str,
    pub requirements: EnumSet<Requirements>,
    pub types: Vec<TypedList<'a>>,
    pub constants: Vec<TypedList<'a>>,
    pub predicates: Vec<Predicate<'a>>,
    pub actions: Vec<Action<'a>>,
}

#[derive(EnumSetType, Debug)]
pub enum Requirements {
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
    Constraints
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Term<'a> {
    Variable(&'a str),
    Constant(&'a str),
}

#[derive(PartialEq, Debug)]
pub enum Expr<'a> {
    And(Vec<Expr<'a>>),
    Or(Vec<Expr<'a>>),
    Not(Box<Expr<'a>>),
    Equals(Term<'a>, Term<'a>),
    Literal{name:&'a str, arguments:Vec<Term<'a>>}
}

#[derive(PartialEq, Debug)]
pub struct Action<'a> {
    pub name: &'a str,
    pub parameters: Vec<TypedList<'a>>,
    pub precondition: Option<Expr<'a>>,
    pub effect: Option<Expr<'a>>
}

#[derive(PartialEq, Debug)]
pub struct Predicate<'a> {
    pub name: &'a str,
    pub variables: Vec<TypedList<'a>>
}

/// `a b c - kind`; names declared without a trailing type get `object`.
#[derive(PartialEq, Debug)]
pub struct TypedList<'a> {
    pub identifiers: Vec<&'a str>,
    pub kind: &'a str,
}
