// SPDX: CC0-1.0

use crate::{
    config::PlotConfig,
    eval::Evaluator,
    registry::{color_of, Color, Equation, EquationId},
    trace::{self, Segment, TraceOpts},
    viewport::Viewport,
    Number, Point,
};
use tracing::debug;

pub const GRID_PEN: Pen = Pen {
    color: Color::rgb(0xee, 0xee, 0xee),
    width: 0.5,
};
pub const AXIS_PEN: Pen = Pen {
    color: Color::rgb(0x00, 0x00, 0x00),
    width: 1.0,
};
pub const CURVE_WIDTH: Number = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pen {
    pub color: Color,
    pub width: Number,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCmd {
    /// Wipe the whole surface.
    Clear,
    Line {
        from: Point<Number>,
        to: Point<Number>,
        pen: Pen,
    },
    /// One stroke per segment, all with the same pen.
    Curve {
        id: EquationId,
        pen: Pen,
        segments: Vec<Segment>,
    },
}

/// Everything needed to draw one frame, in painting order.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawInstructions {
    pub width: Number,
    pub height: Number,
    pub cmds: Vec<DrawCmd>,
}

impl DrawInstructions {
    pub fn curves(&self) -> impl Iterator<Item = (EquationId, &[Segment])> {
        self.cmds.iter().filter_map(|cmd| match cmd {
            DrawCmd::Curve { id, segments, .. } => Some((*id, segments.as_slice())),
            _ => None,
        })
    }
}

/// Draws grid, axes, then every equation, from a snapshot of the view.
pub fn render<'a, I>(
    viewport: Viewport,
    equations: I,
    evaluator: &Evaluator,
    config: &PlotConfig,
    width: Number,
    height: Number,
) -> DrawInstructions
where
    I: IntoIterator<Item = &'a Equation>,
{
    let mut cmds = vec![DrawCmd::Clear];
    grid(&mut cmds, &viewport, config, width, height);
    axes(&mut cmds, &viewport, width, height);

    let opts = TraceOpts {
        break_threshold: config.break_threshold.get(),
        sample_spacing: config.sample_spacing.get(),
    };
    let mut stack = Vec::new();
    let mut count = 0;
    for eq in equations {
        count += 1;
        // compiled once per frame; a formula that doesn't parse draws nothing
        let segments = match evaluator.compile(&eq.formula) {
            Ok(prog) => {
                trace::trace(
                    |x| evaluator.run(&prog, x, &mut stack),
                    &viewport,
                    width,
                    &opts,
                )
                .segments
            }
            Err(err) => {
                tracing::trace!(id = %eq.id, error = %err.typ, "equation does not parse");
                Vec::new()
            }
        };
        cmds.push(DrawCmd::Curve {
            id: eq.id,
            pen: Pen {
                color: color_of(eq.id),
                width: CURVE_WIDTH,
            },
            segments,
        });
    }

    debug!(
        equations = count,
        cmds = cmds.len(),
        scale = viewport.scale(),
        "rendered frame"
    );
    DrawInstructions {
        width,
        height,
        cmds,
    }
}

/// Closest grid lines are ever drawn, in screen units.
pub const MIN_GRID_SPACING: Number = 1.0;

/// Screen distance between grid lines, widened until lines are at least `min` apart.
///
/// `min` itself never drops below [`MIN_GRID_SPACING`].
pub fn grid_spacing(scale: Number, divisions: Number, min: Number) -> Number {
    let min = min.max(MIN_GRID_SPACING);
    let mut spacing = scale / divisions;
    while spacing < min {
        spacing *= 2.0;
    }
    spacing
}

fn grid(
    cmds: &mut Vec<DrawCmd>,
    viewport: &Viewport,
    config: &PlotConfig,
    width: Number,
    height: Number,
) {
    let spacing = grid_spacing(
        viewport.scale(),
        Number::from(config.grid_divisions.get()),
        config.min_grid_spacing.get(),
    );
    let offset = viewport.offset();

    // vertical lines, aligned so one passes through the origin
    let mut x = offset.x.rem_euclid(spacing);
    while x < width {
        cmds.push(DrawCmd::Line {
            from: Point { x, y: 0.0 },
            to: Point { x, y: height },
            pen: GRID_PEN,
        });
        x += spacing;
    }

    // horizontal lines
    let mut y = offset.y.rem_euclid(spacing);
    while y < height {
        cmds.push(DrawCmd::Line {
            from: Point { x: 0.0, y },
            to: Point { x: width, y },
            pen: GRID_PEN,
        });
        y += spacing;
    }
}

fn axes(cmds: &mut Vec<DrawCmd>, viewport: &Viewport, width: Number, height: Number) {
    let origin = viewport.offset();
    // x axis
    cmds.push(DrawCmd::Line {
        from: Point { x: 0.0, y: origin.y },
        to: Point {
            x: width,
            y: origin.y,
        },
        pen: AXIS_PEN,
    });
    // y axis
    cmds.push(DrawCmd::Line {
        from: Point { x: origin.x, y: 0.0 },
        to: Point {
            x: origin.x,
            y: height,
        },
        pen: AXIS_PEN,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Positive, registry::Registry};

    fn lines(frame: &DrawInstructions, pen: Pen) -> Vec<(Point<Number>, Point<Number>)> {
        frame
            .cmds
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCmd::Line { from, to, pen: p } if *p == pen => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn grid_spacing_is_thinned() {
        assert_eq!(grid_spacing(50.0, 5.0, 4.0), 10.0);
        assert_eq!(grid_spacing(10.0, 5.0, 4.0), 4.0);
        assert_eq!(grid_spacing(5.0, 5.0, 4.0), 4.0);
        assert!(grid_spacing(1e-9, 5.0, 4.0) >= 4.0);
        assert_eq!(grid_spacing(50.0, 5.0, 1e-300), 10.0);
        assert_eq!(grid_spacing(2.0, 5.0, 1e-300), 1.6);
    }

    #[test]
    fn tiny_min_grid_spacing_stays_bounded() {
        let config = PlotConfig {
            min_grid_spacing: Positive::new(1e-300).unwrap(),
            ..PlotConfig::default()
        };
        let frame = render(
            Viewport::new(1e-9, Point { x: 0.0, y: 0.0 }),
            &Registry::new(),
            &Evaluator::new(),
            &config,
            400.0,
            300.0,
        );
        // at most one line per screen unit in each direction
        let grid = lines(&frame, GRID_PEN).len();
        assert!(grid > 0 && grid <= 700, "{grid}");
    }

    #[test]
    fn frame_layout() {
        let mut reg = Registry::new();
        reg.add(EquationId(0), "x*x");
        reg.add(EquationId(1), "oops(");
        let viewport = Viewport::new(50.0, Point { x: 200.0, y: 200.0 });
        let frame = render(
            viewport,
            &reg,
            &Evaluator::new(),
            &PlotConfig::default(),
            400.0,
            400.0,
        );

        assert_eq!(frame.cmds.first(), Some(&DrawCmd::Clear));

        // 10 px grid on a 400 px surface starting at 0
        let grid = lines(&frame, GRID_PEN);
        assert_eq!(grid.len(), 80);

        let axes = lines(&frame, AXIS_PEN);
        assert_eq!(
            axes,
            [
                (Point { x: 0.0, y: 200.0 }, Point { x: 400.0, y: 200.0 }),
                (Point { x: 200.0, y: 0.0 }, Point { x: 200.0, y: 400.0 }),
            ]
        );

        let curves: Vec<(EquationId, usize)> =
            frame.curves().map(|(id, segs)| (id, segs.len())).collect();
        assert_eq!(curves, [(EquationId(0), 1), (EquationId(1), 0)]);

        match frame.cmds.last() {
            Some(DrawCmd::Curve { pen, .. }) => assert_eq!(pen.color, color_of(EquationId(1))),
            other => panic!("unexpected last command: {other:?}"),
        }
    }

    #[test]
    fn grid_follows_pan() {
        let viewport = Viewport::new(50.0, Point { x: 203.0, y: -7.0 });
        let frame = render(
            viewport,
            &Registry::new(),
            &Evaluator::new(),
            &PlotConfig::default(),
            100.0,
            100.0,
        );
        let grid = lines(&frame, GRID_PEN);
        assert_eq!(grid[0].0.x, 3.0);
        assert!(grid.iter().any(|(from, _)| from.y == 3.0));
    }
}
