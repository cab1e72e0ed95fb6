// SPDX: CC0-1.0

use crate::{
    lex::{Lexer, SubStr},
    parse::{self, ParseErr},
    stdlib, Number,
};
use core::fmt;
use std::{collections::HashMap, sync::Arc};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl OperatorTyp {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Pow => "^",
        }
    }

    pub fn apply(&self, lhs: Number, rhs: Number) -> Number {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
            // truncated remainder, sign follows the dividend
            Self::Rem => lhs % rhs,
            Self::Pow => lhs.powf(rhs),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparison {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl Comparison {
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
        }
    }

    /// NaN never satisfies a comparison.
    pub fn holds(&self, lhs: Number, rhs: Number) -> bool {
        match self {
            Self::Less => lhs < rhs,
            Self::LessEqual => lhs <= rhs,
            Self::Greater => lhs > rhs,
            Self::GreaterEqual => lhs >= rhs,
        }
    }
}

#[derive(Clone, Debug)]
pub enum ExprTyp {
    Val(Number),
    Ident,
    Neg(Box<Expr>),
    Binary {
        op: OperatorTyp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: SubStr,
        args: Vec<Expr>,
    },
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub typ: ExprTyp,
    pub loc: SubStr,
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            ExprTyp::Val(val) => write!(f, "{val}"),
            ExprTyp::Ident => write!(f, "{}", self.loc),
            ExprTyp::Neg(arg) => write!(f, "(-{arg})"),
            ExprTyp::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            ExprTyp::Call { name, args } => {
                write!(f, "{name}(")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A `{lhs cmp rhs}` restriction on where the formula is defined.
#[derive(Clone, Debug)]
pub struct Constraint {
    pub lhs: Expr,
    pub cmp: Comparison,
    pub rhs: Expr,
    pub loc: SubStr,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{} {} {}}}", self.lhs, self.cmp.symbol(), self.rhs)
    }
}

#[derive(Clone, Debug)]
pub struct Program {
    pub(crate) body: Expr,
    pub(crate) constraints: Vec<Constraint>,
}

impl Program {
    #[inline]
    pub const fn new(body: Expr, constraints: Vec<Constraint>) -> Self {
        Self { body, constraints }
    }

    #[inline]
    pub const fn body(&self) -> &Expr {
        &self.body
    }

    #[inline]
    pub fn constraints(&self) -> core::slice::Iter<'_, Constraint> {
        self.constraints.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub const fn accepts(&self, n: usize) -> bool {
        match *self {
            Self::Exact(arity) => n == arity,
            Self::AtLeast(min) => n >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (prefix, n) = match *self {
            Self::Exact(n) => ("", n),
            Self::AtLeast(n) => ("at least ", n),
        };
        write!(
            f,
            "{prefix}{n} argument{s}",
            s = if n == 1 { "" } else { "s" }
        )
    }
}

#[derive(Debug)]
pub struct Fun {
    pub arity: Arity,
    pub fun: fn(&[Number]) -> Number,
}

impl Fun {
    pub const fn new(arity: usize, fun: fn(&[Number]) -> Number) -> Self {
        Self {
            arity: Arity::Exact(arity),
            fun,
        }
    }

    pub const fn variadic(min: usize, fun: fn(&[Number]) -> Number) -> Self {
        Self {
            arity: Arity::AtLeast(min),
            fun,
        }
    }
}

#[derive(Debug)]
pub enum Ident {
    Const(Number),
    Fun(Fun),
}

impl Ident {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Const(_) => "constant",
            Self::Fun(_) => "function",
        }
    }
}

pub type Idents = HashMap<&'static str, Ident>;

#[derive(Debug)]
pub enum EvalErrTyp {
    UndefinedIdent { text: SubStr },
    NotAFunction { text: SubStr },
    NotAValue { text: SubStr },
    ArgCount { name: SubStr, arity: Arity, found: usize },
    Excluded,
}

#[derive(Debug)]
pub struct EvalErr {
    pub typ: EvalErrTyp,
    pub loc: SubStr,
}

impl fmt::Display for EvalErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            EvalErrTyp::UndefinedIdent { text } => {
                write!(f, "undefined identifier '{text}'")
            }
            EvalErrTyp::NotAFunction { text } => write!(f, "'{text}' is not a function"),
            EvalErrTyp::NotAValue { text } => {
                write!(f, "function '{text}' is used without being called")
            }
            EvalErrTyp::ArgCount { name, arity, found } => {
                write!(f, "function '{name}' requires {arity}, but found {found}")
            }
            EvalErrTyp::Excluded => write!(f, "point is outside the restricted domain"),
        }
    }
}

/// Value a name resolves to inside a [`Scope`].
#[derive(Clone, Copy, Debug)]
pub enum Binding<'a> {
    Var(Number),
    Ident(&'a Ident),
}

/// Everything a formula can see: the sample point and the math namespace.
///
/// `y` is only bound while checking restrictions, once the body has a value.
#[derive(Clone, Copy, Debug)]
pub struct Scope<'a> {
    pub x: Number,
    pub y: Option<Number>,
    pub math: &'a Idents,
}

impl<'a> Scope<'a> {
    pub fn lookup(&self, name: &str) -> Option<Binding<'a>> {
        if name == stdlib::X {
            return Some(Binding::Var(self.x));
        }
        if let (stdlib::Y, Some(y)) = (name, self.y) {
            return Some(Binding::Var(y));
        }
        let name = name
            .strip_prefix(stdlib::NAMESPACE)
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(name);
        self.math.get(name).map(Binding::Ident)
    }
}

pub fn eval(prog: &Program, scope: &Scope<'_>, stack: &mut Vec<Number>) -> Result<Number, EvalErr> {
    stack.clear();
    let y = eval_expr(&prog.body, scope, stack)?;

    let scope = Scope {
        y: Some(y),
        ..*scope
    };
    for constraint in &prog.constraints {
        let lhs = eval_expr(&constraint.lhs, &scope, stack)?;
        let rhs = eval_expr(&constraint.rhs, &scope, stack)?;
        if !constraint.cmp.holds(lhs, rhs) {
            return Err(EvalErr {
                typ: EvalErrTyp::Excluded,
                loc: constraint.loc.clone(),
            });
        }
    }

    Ok(y)
}

fn eval_expr(expr: &Expr, scope: &Scope<'_>, stack: &mut Vec<Number>) -> Result<Number, EvalErr> {
    match &expr.typ {
        ExprTyp::Val(val) => Ok(*val),

        ExprTyp::Ident => match scope.lookup(expr.loc.get()) {
            Some(Binding::Var(val)) | Some(Binding::Ident(&Ident::Const(val))) => Ok(val),
            Some(Binding::Ident(Ident::Fun(_))) => Err(EvalErr {
                typ: EvalErrTyp::NotAValue {
                    text: expr.loc.clone(),
                },
                loc: expr.loc.clone(),
            }),
            None => Err(EvalErr {
                typ: EvalErrTyp::UndefinedIdent {
                    text: expr.loc.clone(),
                },
                loc: expr.loc.clone(),
            }),
        },

        ExprTyp::Neg(arg) => Ok(-eval_expr(arg, scope, stack)?),

        ExprTyp::Binary { op, lhs, rhs } => {
            let lhs = eval_expr(lhs, scope, stack)?;
            let rhs = eval_expr(rhs, scope, stack)?;
            Ok(op.apply(lhs, rhs))
        }

        ExprTyp::Call { name, args } => {
            let fun = match scope.lookup(name.get()) {
                Some(Binding::Ident(Ident::Fun(fun))) => fun,
                Some(_) => {
                    return Err(EvalErr {
                        typ: EvalErrTyp::NotAFunction { text: name.clone() },
                        loc: name.clone(),
                    })
                }
                None => {
                    return Err(EvalErr {
                        typ: EvalErrTyp::UndefinedIdent { text: name.clone() },
                        loc: name.clone(),
                    })
                }
            };
            if !fun.arity.accepts(args.len()) {
                return Err(EvalErr {
                    typ: EvalErrTyp::ArgCount {
                        name: name.clone(),
                        arity: fun.arity,
                        found: args.len(),
                    },
                    loc: expr.loc.clone(),
                });
            }

            // stack: ...outer args, a, b
            //                       ^^^^ this call's args
            let base = stack.len();
            for arg in args {
                let val = eval_expr(arg, scope, stack)?;
                stack.push(val);
            }
            let val = (fun.fun)(&stack[base..]);
            stack.truncate(base);
            Ok(val)
        }
    }
}

#[derive(Debug)]
pub enum FormulaErr {
    Parse(ParseErr),
    Eval(EvalErr),
}

impl FormulaErr {
    pub fn loc(&self) -> &SubStr {
        match self {
            Self::Parse(err) => &err.loc,
            Self::Eval(err) => &err.loc,
        }
    }
}

impl fmt::Display for FormulaErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "parse error: {}", err.typ),
            Self::Eval(err) => write!(f, "evaluation error: {err}"),
        }
    }
}

impl From<ParseErr> for FormulaErr {
    fn from(err: ParseErr) -> Self {
        Self::Parse(err)
    }
}

impl From<EvalErr> for FormulaErr {
    fn from(err: EvalErr) -> Self {
        Self::Eval(err)
    }
}

/// Evaluates formulas in `x` against a fixed math namespace.
#[derive(Debug)]
pub struct Evaluator {
    math: Idents,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            math: stdlib::math_namespace(),
        }
    }

    pub const fn math(&self) -> &Idents {
        &self.math
    }

    pub fn compile(&self, formula: &str) -> Result<Program, ParseErr> {
        let src = Arc::new(String::from(formula));
        parse::parse(Lexer::new(&src))
    }

    pub fn run(&self, prog: &Program, x: Number, stack: &mut Vec<Number>) -> Result<Number, EvalErr> {
        let scope = Scope {
            x,
            y: None,
            math: &self.math,
        };
        eval(prog, &scope, stack)
    }

    pub fn try_evaluate(&self, formula: &str, x: Number) -> Result<Number, FormulaErr> {
        let prog = self.compile(formula)?;
        Ok(self.run(&prog, x, &mut Vec::new())?)
    }

    /// Evaluates `formula` at `x`, folding every failure into NaN.
    pub fn evaluate(&self, formula: &str, x: Number) -> Number {
        self.try_evaluate(formula, x).unwrap_or(Number::NAN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Number, b: Number) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn arithmetic() {
        let ev = Evaluator::new();
        assert_eq!(ev.evaluate("1 + 2 * 3", 0.0), 7.0);
        assert_eq!(ev.evaluate("(1 + 2) * 3", 0.0), 9.0);
        assert_eq!(ev.evaluate("x*x", 3.0), 9.0);
        assert_eq!(ev.evaluate("x - 1", 3.0), 2.0);
        assert_eq!(ev.evaluate("x-1", 3.0), 2.0);
        assert_eq!(ev.evaluate("7 % 4", 0.0), 3.0);
        assert_eq!(ev.evaluate("-7 % 4", 0.0), -3.0);
    }

    #[test]
    fn powers_and_negation() {
        let ev = Evaluator::new();
        assert_eq!(ev.evaluate("-2^2", 0.0), -4.0);
        assert_eq!(ev.evaluate("2^-1", 0.0), 0.5);
        assert_eq!(ev.evaluate("2^3^2", 0.0), 512.0);
        assert_eq!(ev.evaluate("2**3", 0.0), 8.0);
        assert_eq!(ev.evaluate("--x", 4.0), 4.0);
    }

    #[test]
    fn implicit_multiplication() {
        let ev = Evaluator::new();
        assert_eq!(ev.evaluate("2x", 3.0), 6.0);
        assert_eq!(ev.evaluate("2x^2", 3.0), 18.0);
        assert_eq!(ev.evaluate("2(x + 1)", 3.0), 8.0);
        assert!(close(ev.evaluate("3sin(x)", 1.0), 3.0 * 1.0_f64.sin()));
        assert!(close(ev.evaluate("(x+1)(x-1)", 3.0), 8.0));
        assert_eq!(ev.evaluate("x(x + 1)", 3.0), 12.0);
    }

    #[test]
    fn namespace_is_reachable_bare_and_qualified() {
        let ev = Evaluator::new();
        assert!(close(ev.evaluate("Math.sin(x)", 0.5), 0.5_f64.sin()));
        assert!(close(ev.evaluate("sin(x)", 0.5), 0.5_f64.sin()));
        assert!(close(ev.evaluate("Math.PI", 0.0), core::f64::consts::PI));
        assert!(close(ev.evaluate("pi", 0.0), core::f64::consts::PI));
        assert!(close(ev.evaluate("Math.pow(x, 2)", 3.0), 9.0));
        assert!(close(ev.evaluate("max(1, x, 3)", 7.0), 7.0));
    }

    #[test]
    fn y_prefix_is_ignored() {
        let ev = Evaluator::new();
        assert_eq!(ev.evaluate("y = 2x + 1", 1.0), 3.0);
    }

    #[test]
    fn failures_become_nan() {
        let ev = Evaluator::new();
        assert!(ev.evaluate("foo(x)", 1.0).is_nan());
        assert!(ev.evaluate("x +", 1.0).is_nan());
        assert!(ev.evaluate("", 1.0).is_nan());
        assert!(ev.evaluate("sin", 1.0).is_nan());
        assert!(ev.evaluate("sin(1, 2)", 1.0).is_nan());
        assert!(ev.evaluate("pi(2)", 1.0).is_nan());
        assert!(ev.evaluate("window", 1.0).is_nan());
        assert!(ev.evaluate("sqrt(-1)", 1.0).is_nan());
    }

    #[test]
    fn division_by_zero_is_infinite() {
        let ev = Evaluator::new();
        assert_eq!(ev.evaluate("1/x", 0.0), Number::INFINITY);
    }

    #[test]
    fn restrictions_mask_the_domain() {
        let ev = Evaluator::new();
        assert_eq!(ev.evaluate("x {x < 3}", 2.0), 2.0);
        assert!(ev.evaluate("x {x < 3}", 3.0).is_nan());
        assert_eq!(ev.evaluate("x {x <= 3} {x > 0}", 3.0), 3.0);
        assert!(ev.evaluate("x {x <= 3} {x > 0}", 0.0).is_nan());
        assert!(matches!(
            ev.try_evaluate("x {x > 0}", -1.0),
            Err(FormulaErr::Eval(EvalErr {
                typ: EvalErrTyp::Excluded,
                ..
            }))
        ));
    }

    #[test]
    fn restrictions_can_use_the_result() {
        let ev = Evaluator::new();
        assert_eq!(ev.evaluate("x^2 {y < 3}", 1.0), 1.0);
        assert!(ev.evaluate("x^2 {y < 3}", 2.0).is_nan());
        assert_eq!(ev.evaluate("y = x^2 {y >= 1} {x < 0}", -2.0), 4.0);
        assert!(ev.evaluate("y = x^2 {y >= 1} {x < 0}", 2.0).is_nan());
        // only restrictions see `y`
        assert!(matches!(
            ev.try_evaluate("y + 1", 1.0),
            Err(FormulaErr::Eval(EvalErr {
                typ: EvalErrTyp::UndefinedIdent { .. },
                ..
            }))
        ));
    }

    #[test]
    fn long_chains_fail_cleanly() {
        let ev = Evaluator::new();
        assert!(ev.evaluate(&vec!["x"; 10_000].join("+"), 1.0).is_nan());
        assert!(ev.evaluate(&vec!["x"; 10_000].join("*"), 1.0).is_nan());
        assert_eq!(ev.evaluate(&vec!["x"; 200].join("+"), 1.0), 200.0);
    }

    #[test]
    fn exponent_notation() {
        let ev = Evaluator::new();
        assert_eq!(ev.evaluate("1e3", 0.0), 1000.0);
        assert_eq!(ev.evaluate("2.5e-1*x", 4.0), 1.0);
        assert_eq!(ev.evaluate("1E+2x", 2.0), 200.0);
        // no digits after `e`, so this is 2 times Euler's number
        assert!(close(ev.evaluate("2e", 0.0), 2.0 * core::f64::consts::E));
    }

    #[test]
    fn undefined_name_is_reported_with_location() {
        let ev = Evaluator::new();
        match ev.try_evaluate("2 * sinn(x)", 1.0) {
            Err(FormulaErr::Eval(err)) => {
                assert!(matches!(err.typ, EvalErrTyp::UndefinedIdent { .. }));
                assert_eq!(err.loc.get(), "sinn");
                assert_eq!(err.loc.start(), 4);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn compiled_program_is_reusable() {
        let ev = Evaluator::new();
        let prog = ev.compile("x^2 + 1").unwrap();
        let mut stack = Vec::new();
        for x in [-2.0, 0.0, 3.0] {
            assert_eq!(ev.run(&prog, x, &mut stack).unwrap(), x * x + 1.0);
        }
    }

    #[test]
    fn display_shows_grouping() {
        let ev = Evaluator::new();
        let prog = ev.compile("2x^2 - sin(x)").unwrap();
        assert_eq!(prog.body().to_string(), "((2 * (x ^ 2)) - sin(x))");
    }
}
