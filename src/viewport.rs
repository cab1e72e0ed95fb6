// SPDX: CC0-1.0

use crate::{Number, Point};
use core::{fmt, ops::Range};
use tracing::warn;

/// Pan/zoom state mapping world coordinates onto the drawing surface.
///
/// Screen Y grows downward while world Y grows upward, so the Y axis is flipped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Screen units per world unit, always within `MIN_SCALE..=MAX_SCALE`.
    scale: Number,
    /// Screen position of the world origin.
    offset: Point<Number>,
}

impl Viewport {
    pub const DEFAULT_SCALE: Number = 50.0;
    pub const MIN_SCALE: Number = 1e-9;
    pub const MAX_SCALE: Number = 1e12;

    pub fn new(scale: Number, offset: Point<Number>) -> Self {
        let scale = if scale.is_finite() {
            scale.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
        } else {
            Self::DEFAULT_SCALE
        };
        Self { scale, offset }
    }

    /// Origin in the middle of a `width` x `height` surface.
    pub fn centered(width: Number, height: Number) -> Self {
        Self::new(
            Self::DEFAULT_SCALE,
            Point {
                x: width / 2.0,
                y: height / 2.0,
            },
        )
    }

    #[inline]
    pub const fn scale(&self) -> Number {
        self.scale
    }

    #[inline]
    pub const fn offset(&self) -> Point<Number> {
        self.offset
    }

    pub fn world_to_screen(&self, world: Point<Number>) -> Point<Number> {
        Point {
            x: world.x * self.scale + self.offset.x,
            y: -world.y * self.scale + self.offset.y,
        }
    }

    pub fn screen_to_world_x(&self, screen_x: Number) -> Number {
        (screen_x - self.offset.x) / self.scale
    }

    pub fn screen_to_world(&self, screen: Point<Number>) -> Point<Number> {
        Point {
            x: self.screen_to_world_x(screen.x),
            y: -(screen.y - self.offset.y) / self.scale,
        }
    }

    /// World-X interval covered by a surface `width` screen units wide.
    pub fn visible_x(&self, width: Number) -> Range<Number> {
        self.screen_to_world_x(0.0)..self.screen_to_world_x(width)
    }

    pub fn pan(&mut self, dx: Number, dy: Number) {
        if !(dx.is_finite() && dy.is_finite()) {
            warn!(dx, dy, "ignoring non-finite pan");
            return;
        }
        self.offset.x += dx;
        self.offset.y += dy;
    }

    /// Multiplies the scale by `factor`: below 1 zooms out, above 1 zooms in.
    pub fn zoom(&mut self, factor: Number) {
        if !(factor.is_finite() && factor > 0.0) {
            warn!(factor, "ignoring zoom by a non-positive factor");
            return;
        }
        self.scale = (self.scale * factor).clamp(Self::MIN_SCALE, Self::MAX_SCALE);
    }

    /// Zooms while keeping the world point under `anchor` in place.
    pub fn zoom_at(&mut self, factor: Number, anchor: Point<Number>) {
        if !(anchor.x.is_finite() && anchor.y.is_finite()) {
            warn!(%anchor, "ignoring zoom about a non-finite anchor");
            return;
        }
        let world = self.screen_to_world(anchor);
        self.zoom(factor);
        // solve world_to_screen(world) == anchor for the offset
        self.offset = Point {
            x: anchor.x - world.x * self.scale,
            y: anchor.y + world.y * self.scale,
        };
    }
}

impl fmt::Display for Viewport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewport")
            .field("scale", &self.scale)
            .field("offset", &format_args!("{}", self.offset))
            .finish()
    }
}
