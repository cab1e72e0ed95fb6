// SPDX: CC0-1.0

use core::{fmt, num::ParseIntError, str::FromStr};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EquationId(pub u32);

impl fmt::Display for EquationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EquationId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const PALETTE: [Color; 5] = [
    Color::rgb(0x2d, 0x70, 0xb3), // blue
    Color::rgb(0x38, 0x8c, 0x46), // green
    Color::rgb(0xfa, 0x7e, 0x19), // orange
    Color::rgb(0xcf, 0x25, 0x6d), // magenta
    Color::rgb(0x60, 0x42, 0xa6), // purple
];

/// Stable color for an equation, cycling through [`PALETTE`].
pub const fn color_of(id: EquationId) -> Color {
    PALETTE[id.0 as usize % PALETTE.len()]
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Equation {
    pub id: EquationId,
    pub formula: Arc<String>,
}

/// Equations in insertion order, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    entries: Vec<Equation>,
}

impl Registry {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn position(&self, id: EquationId) -> Option<usize> {
        self.entries.iter().position(|eq| eq.id == id)
    }

    /// Inserts `formula` under `id`, returning the formula it replaced.
    ///
    /// A replaced equation keeps its place in the drawing order.
    pub fn add(&mut self, id: EquationId, formula: impl Into<String>) -> Option<Arc<String>> {
        let formula = Arc::new(formula.into());
        match self.position(id) {
            Some(idx) => Some(core::mem::replace(&mut self.entries[idx].formula, formula)),
            None => {
                self.entries.push(Equation { id, formula });
                None
            }
        }
    }

    /// Removes the equation under `id`; an unknown id is not an error.
    pub fn remove(&mut self, id: EquationId) -> Option<Equation> {
        self.position(id).map(|idx| self.entries.remove(idx))
    }

    pub fn get(&self, id: EquationId) -> Option<&Equation> {
        self.entries.iter().find(|eq| eq.id == id)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Equation> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Smallest id above every id in use.
    pub fn next_id(&self) -> EquationId {
        EquationId(
            self.entries
                .iter()
                .map(|eq| eq.id.0.saturating_add(1))
                .max()
                .unwrap_or(0),
        )
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Equation;
    type IntoIter = core::slice::Iter<'a, Equation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
