// SPDX: CC0-1.0

use crate::{eval::*, Number};
use core::f64::consts;
use std::collections::HashMap; // assumes Number = f64

/// The free variable.
pub const X: &str = "x";
/// Result of the formula, visible only inside restrictions.
pub const Y: &str = "y";
/// Qualifier for namespace members, as in `Math.sin`.
pub const NAMESPACE: &str = "Math";

pub fn math_namespace() -> Idents {
    let mut ret = HashMap::new();

    ret.insert("abs", Ident::Fun(Fun::new(1, abs)));
    ret.insert("sign", Ident::Fun(Fun::new(1, sign)));
    ret.insert("sqrt", Ident::Fun(Fun::new(1, sqrt)));
    ret.insert("cbrt", Ident::Fun(Fun::new(1, cbrt)));
    ret.insert("pow", Ident::Fun(Fun::new(2, pow)));
    ret.insert("hypot", Ident::Fun(Fun::variadic(1, hypot)));
    ret.insert("min", Ident::Fun(Fun::variadic(1, min)));
    ret.insert("max", Ident::Fun(Fun::variadic(1, max)));

    // exponential and logarithmic
    ret.insert("exp", Ident::Fun(Fun::new(1, exp)));
    ret.insert("expm1", Ident::Fun(Fun::new(1, expm1)));
    ret.insert("ln", Ident::Fun(Fun::new(1, ln)));
    ret.insert("log", Ident::Fun(Fun::new(1, ln)));
    ret.insert("log10", Ident::Fun(Fun::new(1, log10)));
    ret.insert("log2", Ident::Fun(Fun::new(1, log2)));
    ret.insert("log1p", Ident::Fun(Fun::new(1, log1p)));

    // trig
    ret.insert("sin", Ident::Fun(Fun::new(1, sin)));
    ret.insert("cos", Ident::Fun(Fun::new(1, cos)));
    ret.insert("tan", Ident::Fun(Fun::new(1, tan)));
    ret.insert("sec", Ident::Fun(Fun::new(1, sec)));
    ret.insert("csc", Ident::Fun(Fun::new(1, csc)));
    ret.insert("cot", Ident::Fun(Fun::new(1, cot)));
    ret.insert("asin", Ident::Fun(Fun::new(1, arcsin)));
    ret.insert("acos", Ident::Fun(Fun::new(1, arccos)));
    ret.insert("atan", Ident::Fun(Fun::new(1, arctan)));
    ret.insert("arcsin", Ident::Fun(Fun::new(1, arcsin)));
    ret.insert("arccos", Ident::Fun(Fun::new(1, arccos)));
    ret.insert("arctan", Ident::Fun(Fun::new(1, arctan)));
    ret.insert("atan2", Ident::Fun(Fun::new(2, atan2)));

    // hyperbolic
    ret.insert("sinh", Ident::Fun(Fun::new(1, sinh)));
    ret.insert("cosh", Ident::Fun(Fun::new(1, cosh)));
    ret.insert("tanh", Ident::Fun(Fun::new(1, tanh)));
    ret.insert("asinh", Ident::Fun(Fun::new(1, asinh)));
    ret.insert("acosh", Ident::Fun(Fun::new(1, acosh)));
    ret.insert("atanh", Ident::Fun(Fun::new(1, atanh)));

    // rounding
    ret.insert("floor", Ident::Fun(Fun::new(1, floor)));
    ret.insert("ceil", Ident::Fun(Fun::new(1, ceil)));
    ret.insert("round", Ident::Fun(Fun::new(1, round)));
    ret.insert("trunc", Ident::Fun(Fun::new(1, trunc)));

    ret.insert("pi", Ident::Const(consts::PI));
    ret.insert("tau", Ident::Const(consts::TAU));
    ret.insert("e", Ident::Const(consts::E));
    ret.insert("PI", Ident::Const(consts::PI));
    ret.insert("E", Ident::Const(consts::E));
    ret.insert("LN2", Ident::Const(consts::LN_2));
    ret.insert("LN10", Ident::Const(consts::LN_10));
    ret.insert("LOG2E", Ident::Const(consts::LOG2_E));
    ret.insert("LOG10E", Ident::Const(consts::LOG10_E));
    ret.insert("SQRT2", Ident::Const(consts::SQRT_2));
    ret.insert("SQRT1_2", Ident::Const(consts::FRAC_1_SQRT_2));
    ret
}

// arity is checked by the evaluator before any of these run
#[track_caller]
fn expect_n<const N: usize>(args: &[Number]) -> [Number; N] {
    assert_eq!(args.len(), N);
    let mut ret = [0.0; N];
    ret.copy_from_slice(args);
    ret
}

pub fn abs(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.abs()
}

pub fn sign(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    // signum() maps 0 to 1; keep zero (and its sign) like the usual `sign`
    if x == 0.0 || x.is_nan() {
        x
    } else {
        x.signum()
    }
}

pub fn sqrt(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sqrt()
}

pub fn cbrt(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.cbrt()
}

pub fn pow(args: &[Number]) -> Number {
    let [x, exp] = expect_n::<2>(args);
    x.powf(exp)
}

pub fn hypot(args: &[Number]) -> Number {
    args.iter().map(|x| x * x).sum::<Number>().sqrt()
}

pub fn min(args: &[Number]) -> Number {
    args.iter().copied().fold(Number::INFINITY, |acc, x| {
        if x.is_nan() || acc.is_nan() {
            Number::NAN
        } else {
            acc.min(x)
        }
    })
}

pub fn max(args: &[Number]) -> Number {
    args.iter().copied().fold(Number::NEG_INFINITY, |acc, x| {
        if x.is_nan() || acc.is_nan() {
            Number::NAN
        } else {
            acc.max(x)
        }
    })
}

pub fn exp(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.exp()
}

pub fn expm1(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.exp_m1()
}

pub fn ln(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.ln()
}

pub fn log10(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.log10()
}

pub fn log2(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.log2()
}

pub fn log1p(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.ln_1p()
}

pub fn sin(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sin()
}

pub fn cos(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.cos()
}

pub fn tan(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.tan()
}

pub fn sec(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.cos().recip()
}

pub fn csc(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sin().recip()
}

pub fn cot(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.tan().recip()
}

pub fn arcsin(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.asin()
}

pub fn arccos(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.acos()
}

pub fn arctan(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.atan()
}

pub fn atan2(args: &[Number]) -> Number {
    let [y, x] = expect_n::<2>(args);
    y.atan2(x)
}

pub fn sinh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.sinh()
}

pub fn cosh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.cosh()
}

pub fn tanh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.tanh()
}

pub fn asinh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.asinh()
}

pub fn acosh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.acosh()
}

pub fn atanh(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.atanh()
}

pub fn floor(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.floor()
}

pub fn ceil(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.ceil()
}

pub fn round(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    // halves round up, so round(-2.5) is -2
    (x + 0.5).floor()
}

pub fn trunc(args: &[Number]) -> Number {
    let [x] = expect_n::<1>(args);
    x.trunc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_has_no_variables() {
        let math = math_namespace();
        assert!(!math.contains_key(X));
        assert!(!math.contains_key("y"));
    }

    #[test]
    fn rounding_and_sign() {
        assert_eq!(round(&[2.5]), 3.0);
        assert_eq!(round(&[-2.5]), -2.0);
        assert_eq!(sign(&[-3.0]), -1.0);
        assert_eq!(sign(&[0.0]), 0.0);
        assert!(sign(&[Number::NAN]).is_nan());
    }

    #[test]
    fn variadics() {
        assert_eq!(min(&[3.0, -1.0, 2.0]), -1.0);
        assert_eq!(max(&[3.0, -1.0, 2.0]), 3.0);
        assert!(max(&[1.0, Number::NAN]).is_nan());
        assert_eq!(hypot(&[3.0, 4.0]), 5.0);
    }
}
