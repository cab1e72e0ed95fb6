// SPDX: CC0-1.0

use crate::Number;
use core::{fmt, num::NonZeroU16, str::FromStr};

/// A finite number greater than zero.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Positive(Number);

impl Positive {
    pub fn new(val: Number) -> Option<Self> {
        (val.is_finite() && val > 0.0).then_some(Self(val))
    }

    #[inline]
    pub const fn get(self) -> Number {
        self.0
    }
}

impl fmt::Display for Positive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PositiveErr {
    NotANumber,
    NotPositive,
}

impl fmt::Display for PositiveErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber => write!(f, "not a number"),
            Self::NotPositive => write!(f, "must be a finite number greater than zero"),
        }
    }
}

impl FromStr for Positive {
    type Err = PositiveErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val: Number = s.parse().map_err(|_| PositiveErr::NotANumber)?;
        Self::new(val).ok_or(PositiveErr::NotPositive)
    }
}

/// Tunables for tracing and drawing.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotConfig {
    /// Screen-Y jump (px) above which consecutive samples are not connected.
    pub break_threshold: Positive,
    /// Screen-X distance (px) between samples, never below `trace::MIN_SAMPLE_SPACING`.
    pub sample_spacing: Positive,
    /// Grid lines per world unit, before thinning.
    pub grid_divisions: NonZeroU16,
    /// Grid spacing (px) below which the grid is thinned out, never below
    /// `render::MIN_GRID_SPACING`.
    pub min_grid_spacing: Positive,
    pub zoom_in: Positive,
    pub zoom_out: Positive,
    /// Surface size (px) used by the shell when rendering.
    pub surface: [NonZeroU16; 2],
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            break_threshold: Positive(1000.0),
            sample_spacing: Positive(1.0),
            grid_divisions: NonZeroU16::MIN.saturating_add(4),
            min_grid_spacing: Positive(4.0),
            zoom_in: Positive(1.1),
            zoom_out: Positive(0.9),
            surface: [
                NonZeroU16::MIN.saturating_add(799),
                NonZeroU16::MIN.saturating_add(599),
            ],
        }
    }
}

impl PlotConfig {
    pub fn surface_size(&self) -> [Number; 2] {
        let [w, h] = self.surface;
        [Number::from(w.get()), Number::from(h.get())]
    }
}

impl fmt::Display for PlotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlotConfig")
            .field("break threshold", &self.break_threshold.get())
            .field("sample spacing", &self.sample_spacing.get())
            .field("grid divisions", &self.grid_divisions)
            .field("min grid spacing", &self.min_grid_spacing.get())
            .field("zoom in", &self.zoom_in.get())
            .field("zoom out", &self.zoom_out.get())
            .field("surface", &format_args!("{}x{}", self.surface[0], self.surface[1]))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PlotConfig::default();
        assert_eq!(config.break_threshold.get(), 1000.0);
        assert_eq!(config.grid_divisions.get(), 5);
        assert_eq!(config.surface_size(), [800.0, 600.0]);
    }

    #[test]
    fn positive_parsing() {
        assert_eq!("2.5".parse::<Positive>().map(Positive::get), Ok(2.5));
        assert_eq!("0".parse::<Positive>(), Err(PositiveErr::NotPositive));
        assert_eq!("-1".parse::<Positive>(), Err(PositiveErr::NotPositive));
        assert_eq!("inf".parse::<Positive>(), Err(PositiveErr::NotPositive));
        assert_eq!("abc".parse::<Positive>(), Err(PositiveErr::NotANumber));
    }
}
