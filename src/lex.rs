// SPDX: CC0-1.0

use crate::eval::{Comparison, OperatorTyp};
use core::{fmt, iter::Peekable, str::CharIndices};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    // shared so every token and tree node can point back into the formula
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    /// Zero-width span just past the end of the source, used for "unexpected end" errors.
    pub fn end_of(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, len, 0)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }

    pub fn shift_right(&mut self, by: usize) {
        self.len += by;
    }

    /// Smallest span covering both `self` and `other` (which must share a source).
    pub fn join(&self, other: &Self) -> Self {
        debug_assert!(Arc::ptr_eq(&self.src, &other.src));
        let start = self.start.min(other.start);
        let end = (self.start + self.len).max(other.start + other.len);
        Self::new(self.src(), start, end - start)
    }
}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokTyp {
    Ident,
    Number,
    Op(OperatorTyp),
    Cmp(Comparison),
    Equal,
    Comma,
    OpenParen,
    CloseParen,
    OpenCurly,
    CloseCurly,

    // unsupported tokens
    XPipe,
    XOpenSquareBracket,
    XCloseSquareBracket,
}

impl TokTyp {
    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Ident
            | Self::Number
            | Self::Op(_)
            | Self::Cmp(_)
            | Self::Equal
            | Self::Comma
            | Self::OpenParen
            | Self::CloseParen
            | Self::OpenCurly
            | Self::CloseCurly => false,

            // unsupported tokens
            Self::XPipe | Self::XOpenSquareBracket | Self::XCloseSquareBracket => true,
        }
    }

    pub const fn describe(&self) -> &'static str {
        match self {
            Self::Ident => "a name",
            Self::Number => "a number",
            Self::Op(_) => "an operator",
            Self::Cmp(_) => "a comparison",
            Self::Equal => "'='",
            Self::Comma => "','",
            Self::OpenParen => "'('",
            Self::CloseParen => "')'",
            Self::OpenCurly => "'{'",
            Self::CloseCurly => "'}'",
            Self::XPipe => "'|'",
            Self::XOpenSquareBracket => "'['",
            Self::XCloseSquareBracket => "']'",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LexErrTyp {
    InvalidChar,
    Unsupported(TokTyp),
}

impl fmt::Display for LexErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar => write!(f, "invalid character"),
            Self::Unsupported(_) => write!(f, "unsupported character"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexErr {
    pub typ: LexErrTyp,
    pub loc: SubStr,
}

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    cur: Peekable<CharIndices<'src>>,
    has_errored: bool, // tells iter to yield None after error
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            cur: src.char_indices().peekable(),
            has_errored: false,
        }
    }

    pub const fn src(&self) -> &'src Arc<String> {
        self.src
    }

    pub fn trim_whitespace(&mut self) {
        while let Some((_, chr)) = self.cur.peek() {
            if chr.is_whitespace() {
                self.cur.next();
            } else {
                break;
            }
        }
    }

    fn tok(&self, typ: TokTyp, start: usize, len: usize) -> Tok {
        Tok {
            typ,
            loc: SubStr::new(Arc::clone(self.src), start, len),
        }
    }

    /// Consumes `second` if it comes next, picking between a one- and two-character token.
    fn one_or_two(&mut self, idx: usize, second: char, one: TokTyp, two: TokTyp) -> Tok {
        if let Some((_, chr)) = self.cur.peek() {
            if *chr == second {
                self.cur.next();
                return self.tok(two, idx, 2);
            }
        }
        self.tok(one, idx, 1)
    }

    pub fn consume_unambiguous(&mut self) -> Option<Tok> {
        let (idx, chr) = self.cur.peek().copied()?;
        let typ = match chr {
            '+' => TokTyp::Op(OperatorTyp::Add),
            '-' => TokTyp::Op(OperatorTyp::Sub),
            '/' => TokTyp::Op(OperatorTyp::Div),
            '%' => TokTyp::Op(OperatorTyp::Rem),
            '^' => TokTyp::Op(OperatorTyp::Pow),
            '=' => TokTyp::Equal,
            ',' => TokTyp::Comma,
            '(' => TokTyp::OpenParen,
            ')' => TokTyp::CloseParen,
            '{' => TokTyp::OpenCurly,
            '}' => TokTyp::CloseCurly,

            '|' => TokTyp::XPipe,
            '[' => TokTyp::XOpenSquareBracket,
            ']' => TokTyp::XCloseSquareBracket,

            // possibly two characters long
            '*' | '<' | '>' => {
                self.cur.next();
                return Some(match chr {
                    '*' => self.one_or_two(
                        idx,
                        '*',
                        TokTyp::Op(OperatorTyp::Mul),
                        TokTyp::Op(OperatorTyp::Pow),
                    ),
                    '<' => self.one_or_two(
                        idx,
                        '=',
                        TokTyp::Cmp(Comparison::Less),
                        TokTyp::Cmp(Comparison::LessEqual),
                    ),
                    _ => self.one_or_two(
                        idx,
                        '=',
                        TokTyp::Cmp(Comparison::Greater),
                        TokTyp::Cmp(Comparison::GreaterEqual),
                    ),
                });
            }
            _ => return None,
        };
        self.cur.next();
        Some(self.tok(typ, idx, 1))
    }

    pub fn consume_by<P>(&mut self, next_idx: usize, typ: TokTyp, predicate: P) -> Option<Tok>
    where
        P: Fn(char) -> bool,
    {
        let mut tok = self.tok(typ, next_idx, 0);
        while let Some((_, chr)) = self.cur.peek().copied() {
            if predicate(chr) {
                // all accepted characters are ascii
                tok.loc.shift_right(1);
                self.cur.next();
            } else {
                break;
            }
        }
        if tok.loc.is_empty() {
            None
        } else {
            Some(tok)
        }
    }
}

impl Lexer<'_> {
    /// Extends a number with an exponent like `e-3`, if one follows.
    ///
    /// A bare `e` with no digits is left alone, so `2e` still reads as `2 * e`.
    fn consume_exponent(&mut self, tok: &mut Tok) {
        let src = self.src;
        let rest = &src.as_bytes()[tok.loc.start() + tok.loc.len()..];
        let sign = usize::from(matches!(rest.get(1), Some(b'+' | b'-')));
        if !matches!(rest.first(), Some(b'e' | b'E'))
            || !rest.get(1 + sign).is_some_and(u8::is_ascii_digit)
        {
            return;
        }
        let digits = rest[1 + sign..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        let len = 1 + sign + digits;
        for _ in 0..len {
            self.cur.next();
        }
        tok.loc.shift_right(len);
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_errored {
            return None;
        }

        self.trim_whitespace();

        let (next_idx, next_chr) = self.cur.peek().copied()?;
        let tok = if let Some(tok) = self.consume_unambiguous() {
            Some(tok)
        } else if next_chr.is_ascii_digit() || next_chr == '.' {
            let mut tok = self.consume_by(next_idx, TokTyp::Number, |chr| {
                chr.is_ascii_digit() || chr == '.'
            });
            if let Some(tok) = &mut tok {
                self.consume_exponent(tok);
            }
            tok
        } else if next_chr.is_ascii_alphabetic() {
            // names may be qualified, as in `Math.sin`
            self.consume_by(next_idx, TokTyp::Ident, |chr| {
                chr.is_ascii_alphanumeric() || chr == '_' || chr == '.'
            })
        } else {
            None
        };

        match tok {
            Some(tok) if tok.typ.is_unsupported() => {
                self.has_errored = true;
                Some(Err(LexErr {
                    typ: LexErrTyp::Unsupported(tok.typ),
                    loc: tok.loc,
                }))
            }
            Some(tok) => Some(Ok(tok)),
            None => {
                self.has_errored = true;
                Some(Err(LexErr {
                    typ: LexErrTyp::InvalidChar,
                    loc: SubStr::new(Arc::clone(self.src), next_idx, next_chr.len_utf8()),
                }))
            }
        }
    }
}
