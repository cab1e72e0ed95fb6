// SPDX: CC0-1.0

pub mod config;
pub mod eval;
pub mod lex;
pub mod parse;
pub mod plotter;
pub mod registry;
pub mod render;
pub mod shell;
pub mod stdlib;
pub mod svg;
pub mod trace;
pub mod viewport;

use core::fmt;

pub type Number = f64;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    #[inline]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: fmt::Display> fmt::Display for Point<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
