// SPDX: CC0-1.0

// recursive descent, one function per precedence level:
//
//   formula := [ "y" "=" ] expr { "{" expr cmp expr "}" }
//   expr    := term { ("+" | "-") term }
//   term    := unary { ("*" | "/" | "%") unary | power }
//   unary   := ("-" | "+") unary | power
//   power   := primary [ "^" unary ]
//   primary := number | name [ "(" args ")" ] | "(" expr ")"

use crate::{
    eval::{Constraint, Expr, ExprTyp, OperatorTyp, Program},
    lex::{LexErr, LexErrTyp, Lexer, SubStr, Tok, TokTyp},
    stdlib, Number,
};
use core::{fmt, num::ParseFloatError};
use std::sync::Arc;

/// Deepest nesting accepted before giving up, so hostile input can't overflow the stack.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug)]
pub enum ParseErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    ParenMismatch,
    Empty,
    Unexpected {
        expected: &'static str,
        found: TokTyp,
    },
    UnexpectedEnd {
        expected: &'static str,
    },
    TooDeep,
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
            Self::Empty => write!(f, "empty formula"),
            Self::Unexpected { expected, found } => {
                write!(f, "expected {expected} but found {}", found.describe())
            }
            Self::UnexpectedEnd { expected } => {
                write!(f, "expected {expected} but the formula ended")
            }
            Self::TooDeep => write!(f, "formula nests more than {MAX_DEPTH} operations deep"),
        }
    }
}

#[derive(Debug)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

pub fn parse(lex: Lexer<'_>) -> Result<Program, ParseErr> {
    let src = Arc::clone(lex.src());
    let toks = lex.collect::<Result<Vec<Tok>, LexErr>>()?;
    let mut parser = Parser {
        toks,
        pos: 0,
        src,
        depth: 0,
    };
    parser.formula()
}

struct Parser {
    toks: Vec<Tok>,
    pos: usize,
    src: Arc<String>,
    depth: usize,
}

fn binary(op: OperatorTyp, lhs: Expr, rhs: Expr) -> Expr {
    let loc = lhs.loc.join(&rhs.loc);
    Expr {
        typ: ExprTyp::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        loc,
    }
}

impl Parser {
    fn peek(&self) -> Option<TokTyp> {
        self.toks.get(self.pos).map(|tok| tok.typ)
    }

    fn next(&mut self) -> Option<Tok> {
        let tok = self.toks.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn end(&self) -> SubStr {
        SubStr::end_of(Arc::clone(&self.src))
    }

    fn unexpected(&self, tok: Option<Tok>, expected: &'static str) -> ParseErr {
        match tok {
            Some(tok) if tok.typ == TokTyp::CloseParen => ParseErr {
                typ: ParseErrTyp::ParenMismatch,
                loc: tok.loc,
            },
            Some(tok) => ParseErr {
                typ: ParseErrTyp::Unexpected {
                    expected,
                    found: tok.typ,
                },
                loc: tok.loc,
            },
            None => ParseErr {
                typ: ParseErrTyp::UnexpectedEnd { expected },
                loc: self.end(),
            },
        }
    }

    fn formula(&mut self) -> Result<Program, ParseErr> {
        if self.toks.is_empty() {
            return Err(ParseErr {
                typ: ParseErrTyp::Empty,
                loc: self.end(),
            });
        }

        // `y = ...` is how people write equations; the left-hand side carries no information
        if let [first, second, ..] = self.toks.as_slice() {
            if first.typ == TokTyp::Ident
                && first.loc.get() == stdlib::Y
                && second.typ == TokTyp::Equal
            {
                self.pos = 2;
            }
        }

        let body = self.expr()?;
        let mut constraints = Vec::new();
        while self.peek() == Some(TokTyp::OpenCurly) {
            constraints.push(self.constraint()?);
        }

        if let Some(tok) = self.next() {
            return Err(self.unexpected(Some(tok), "an operator"));
        }

        Ok(Program::new(body, constraints))
    }

    fn constraint(&mut self) -> Result<Constraint, ParseErr> {
        let open = self.next().map(|tok| tok.loc).unwrap_or_else(|| self.end());
        let lhs = self.expr()?;
        let cmp = match self.next() {
            Some(Tok {
                typ: TokTyp::Cmp(cmp),
                ..
            }) => cmp,
            other => return Err(self.unexpected(other, "a comparison")),
        };
        let rhs = self.expr()?;
        match self.next() {
            Some(
                close @ Tok {
                    typ: TokTyp::CloseCurly,
                    ..
                },
            ) => Ok(Constraint {
                lhs,
                cmp,
                rhs,
                loc: open.join(&close.loc),
            }),
            other => Err(self.unexpected(other, "'}'")),
        }
    }

    /// Counts one more level of tree depth, failing once it passes [`MAX_DEPTH`].
    fn descend(&mut self) -> Result<(), ParseErr> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            let tok = self.toks.get(self.pos).cloned();
            return Err(ParseErr {
                typ: ParseErrTyp::TooDeep,
                loc: tok.map(|tok| tok.loc).unwrap_or_else(|| self.end()),
            });
        }
        Ok(())
    }

    // each operator in a chain like `x+x+x` nests the tree one level deeper on the left,
    // so chains count against the depth limit just like parentheses do
    fn expr(&mut self) -> Result<Expr, ParseErr> {
        let depth = self.depth;
        let mut lhs = self.term()?;
        while let Some(TokTyp::Op(op @ (OperatorTyp::Add | OperatorTyp::Sub))) = self.peek() {
            self.pos += 1;
            self.descend()?;
            let rhs = self.term()?;
            lhs = binary(op, lhs, rhs);
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, ParseErr> {
        let depth = self.depth;
        let mut lhs = self.unary()?;
        loop {
            let (op, rhs) = match self.peek() {
                Some(TokTyp::Op(op @ (OperatorTyp::Mul | OperatorTyp::Div | OperatorTyp::Rem))) => {
                    self.pos += 1;
                    self.descend()?;
                    (op, self.unary()?)
                }
                // implicit multiplication: `2x`, `3sin(x)`, `(x+1)(x-1)`
                Some(TokTyp::Ident | TokTyp::OpenParen) => {
                    self.descend()?;
                    (OperatorTyp::Mul, self.power()?)
                }
                _ => break,
            };
            lhs = binary(op, lhs, rhs);
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseErr> {
        let depth = self.depth;
        // every recursive path runs through here
        self.descend()?;
        let ret = match self.peek() {
            Some(TokTyp::Op(OperatorTyp::Sub)) => {
                let minus = self.next().map(|tok| tok.loc).unwrap_or_else(|| self.end());
                self.unary().map(|arg| Expr {
                    loc: minus.join(&arg.loc),
                    typ: ExprTyp::Neg(Box::new(arg)),
                })
            }
            Some(TokTyp::Op(OperatorTyp::Add)) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        };
        self.depth = depth;
        ret
    }

    fn power(&mut self) -> Result<Expr, ParseErr> {
        let base = self.primary()?;
        if self.peek() == Some(TokTyp::Op(OperatorTyp::Pow)) {
            self.pos += 1;
            let exp = self.unary()?;
            Ok(binary(OperatorTyp::Pow, base, exp))
        } else {
            Ok(base)
        }
    }

    fn primary(&mut self) -> Result<Expr, ParseErr> {
        let tok = match self.next() {
            Some(tok) => tok,
            None => return Err(self.unexpected(None, "an expression")),
        };
        match tok.typ {
            TokTyp::Number => {
                let num: Number = tok.loc.get().parse().map_err(|err| ParseErr {
                    typ: ParseErrTyp::ParseNum(err),
                    loc: tok.loc.clone(),
                })?;
                Ok(Expr {
                    typ: ExprTyp::Val(num),
                    loc: tok.loc,
                })
            }

            // `x(...)` multiplies since the variable is never callable
            TokTyp::Ident
                if self.peek() == Some(TokTyp::OpenParen) && tok.loc.get() != stdlib::X =>
            {
                let open = self.next().map(|tok| tok.loc).unwrap_or_else(|| self.end());
                let mut args = Vec::new();
                let close = if self.peek() == Some(TokTyp::CloseParen) {
                    self.next()
                } else {
                    loop {
                        args.push(self.expr()?);
                        match self.next() {
                            Some(Tok {
                                typ: TokTyp::Comma,
                                ..
                            }) => continue,
                            Some(
                                close @ Tok {
                                    typ: TokTyp::CloseParen,
                                    ..
                                },
                            ) => break Some(close),
                            Some(other) => return Err(self.unexpected(Some(other), "',' or ')'")),
                            None => {
                                return Err(ParseErr {
                                    typ: ParseErrTyp::ParenMismatch,
                                    loc: open,
                                })
                            }
                        }
                    }
                };
                let loc = close
                    .map(|close| tok.loc.join(&close.loc))
                    .unwrap_or_else(|| tok.loc.join(&open));
                Ok(Expr {
                    typ: ExprTyp::Call {
                        name: tok.loc,
                        args,
                    },
                    loc,
                })
            }

            TokTyp::Ident => Ok(Expr {
                typ: ExprTyp::Ident,
                loc: tok.loc,
            }),

            TokTyp::OpenParen => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Tok {
                        typ: TokTyp::CloseParen,
                        ..
                    }) => Ok(inner),
                    None => Err(ParseErr {
                        typ: ParseErrTyp::ParenMismatch,
                        loc: tok.loc,
                    }),
                    other => Err(self.unexpected(other, "')'")),
                }
            }

            _ => Err(self.unexpected(Some(tok), "an expression")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(src: &str) -> Result<Program, ParseErr> {
        let src = Arc::new(String::from(src));
        parse(Lexer::new(&src))
    }

    fn shape(src: &str) -> String {
        parse_str(src).unwrap().body().to_string()
    }

    #[test]
    fn precedence() {
        assert_eq!(shape("1 + 2 * 3"), "(1 + (2 * 3))");
        assert_eq!(shape("1 - 2 - 3"), "((1 - 2) - 3)");
        assert_eq!(shape("2 ^ 3 ^ 2"), "(2 ^ (3 ^ 2))");
        assert_eq!(shape("-x ^ 2"), "(-(x ^ 2))");
        assert_eq!(shape("x / 2x"), "((x / 2) * x)");
        assert_eq!(shape("atan2(x, 1)"), "atan2(x, 1)");
        assert_eq!(shape("random()"), "random()");
        assert_eq!(shape("x(x + 1)"), "(x * (x + 1))");
    }

    #[test]
    fn y_prefix_and_constraints() {
        let prog = parse_str("y = x {x < 2} {x >= -1}").unwrap();
        assert_eq!(prog.body().to_string(), "x");
        let constraints: Vec<String> = prog.constraints().map(|c| c.to_string()).collect();
        assert_eq!(constraints, ["{x < 2}", "{x >= (-1)}"]);
    }

    #[test]
    fn paren_mismatch() {
        for src in ["(x + 1", "x + 1)", "sin(x", "())"] {
            let err = parse_str(src).unwrap_err();
            assert!(
                matches!(err.typ, ParseErrTyp::ParenMismatch),
                "{src}: {:?}",
                err.typ
            );
        }
    }

    #[test]
    fn stray_equals_is_unexpected() {
        let err = parse_str("x = 2").unwrap_err();
        assert!(matches!(
            err.typ,
            ParseErrTyp::Unexpected {
                found: TokTyp::Equal,
                ..
            }
        ));
        assert_eq!(err.loc.start(), 2);
    }

    #[test]
    fn empty_and_truncated() {
        assert!(matches!(parse_str("   ").unwrap_err().typ, ParseErrTyp::Empty));
        let err = parse_str("x *").unwrap_err();
        assert!(matches!(err.typ, ParseErrTyp::UnexpectedEnd { .. }));
        assert_eq!(err.loc.start(), 3);
    }

    #[test]
    fn bad_number() {
        let err = parse_str("1.2.3 + x").unwrap_err();
        assert!(matches!(err.typ, ParseErrTyp::ParseNum(_)));
        assert_eq!(err.loc.get(), "1.2.3");
    }

    #[test]
    fn lex_errors_surface() {
        let err = parse_str("|x|").unwrap_err();
        assert!(matches!(
            err.typ,
            ParseErrTyp::LexErr(LexErrTyp::Unsupported(TokTyp::XPipe))
        ));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let deep = format!("{}x{}", "(".repeat(MAX_DEPTH + 10), ")".repeat(MAX_DEPTH + 10));
        assert!(matches!(parse_str(&deep).unwrap_err().typ, ParseErrTyp::TooDeep));
        let negs = format!("{}x", "-".repeat(MAX_DEPTH * 4));
        assert!(matches!(parse_str(&negs).unwrap_err().typ, ParseErrTyp::TooDeep));

        let fine = format!("{}x{}", "(".repeat(50), ")".repeat(50));
        assert!(parse_str(&fine).is_ok());
    }

    #[test]
    fn long_chains_are_rejected() {
        for op in ["+", "*", " "] {
            let chain = vec!["x"; 10_000].join(op);
            let err = parse_str(&chain).unwrap_err();
            assert!(matches!(err.typ, ParseErrTyp::TooDeep), "{op:?}: {:?}", err.typ);
        }

        let sum = vec!["x"; 100].join(" + ");
        assert!(parse_str(&sum).is_ok());
        // the budget is per chain, not per formula
        let wide = format!("{} + ({})", vec!["x"; 100].join(" * "), vec!["x"; 100].join(" * "));
        assert!(parse_str(&wide).is_ok());
    }
}
