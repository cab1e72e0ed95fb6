// SPDX: CC0-1.0

use crate::{viewport::Viewport, Number, Point};

/// Consecutive screen points drawn as one connected stroke.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Segment {
    pub points: Vec<Point<Number>>,
}

impl Segment {
    pub fn first(&self) -> Option<Point<Number>> {
        self.points.first().copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trace {
    pub segments: Vec<Segment>,
    pub samples: usize,
    pub failures: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraceOpts {
    /// Screen-Y jump above which the stroke is broken.
    pub break_threshold: Number,
    /// Screen-X distance between samples.
    pub sample_spacing: Number,
}

/// Densest sampling honored, in screen units between samples.
pub const MIN_SAMPLE_SPACING: Number = 0.01;
/// Upper bound on samples per trace; wider surfaces are sampled more sparsely.
pub const MAX_SAMPLES: usize = 1 << 20;

/// Samples `f` across the visible width and splits the result where it must not be connected.
///
/// A sample breaks the stroke when it is the first, when the previous sample failed, or when
/// its screen Y is more than `break_threshold` away from the previous plotted point. Failed
/// samples (errors, NaN, infinities) draw nothing.
pub fn trace<F, E>(mut f: F, viewport: &Viewport, width: Number, opts: &TraceOpts) -> Trace
where
    F: FnMut(Number) -> Result<Number, E>,
{
    let mut out = Trace::default();
    let range = viewport.visible_x(width);
    // one sample every `sample_spacing` screen units, whatever the zoom
    let mut step = opts.sample_spacing.max(MIN_SAMPLE_SPACING) / viewport.scale();
    if !(range.start.is_finite() && range.end.is_finite() && step > 0.0 && step.is_finite()) {
        return out;
    }
    let span = (range.end - range.start).max(0.0);
    // indexed rather than accumulated, so the last sample lands on the right edge
    let mut count = (span / step).ceil();
    if count > MAX_SAMPLES as Number {
        count = MAX_SAMPLES as Number;
        step = span / count;
    }
    let count = count as usize;

    let mut current = Segment::default();
    let mut last_y: Option<Number> = None;

    for idx in 0..=count {
        let x = (range.start + idx as Number * step).min(range.end);
        out.samples += 1;

        let screen = match f(x) {
            Ok(y) if y.is_finite() => viewport.world_to_screen(Point { x, y }),
            _ => {
                out.failures += 1;
                last_y = None;
                continue;
            }
        };

        let connects = match last_y {
            Some(prev) => (screen.y - prev).abs() <= opts.break_threshold,
            None => false,
        };
        if !connects {
            finish(&mut out.segments, &mut current);
        }
        current.points.push(screen);
        last_y = Some(screen.y);
    }
    finish(&mut out.segments, &mut current);

    tracing::debug!(
        samples = out.samples,
        failures = out.failures,
        segments = out.segments.len(),
        "traced curve"
    );
    out
}

/// Moves `current` into `segments` if it can be stroked; a lone point draws nothing.
fn finish(segments: &mut Vec<Segment>, current: &mut Segment) {
    if current.len() >= 2 {
        segments.push(core::mem::take(current));
    } else {
        current.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Evaluator;
    use core::convert::Infallible;

    const OPTS: TraceOpts = TraceOpts {
        break_threshold: 1000.0,
        sample_spacing: 1.0,
    };

    fn view() -> Viewport {
        Viewport::new(50.0, Point { x: 200.0, y: 200.0 })
    }

    fn trace_formula(formula: &str, viewport: &Viewport, width: Number) -> Trace {
        let ev = Evaluator::new();
        let prog = ev.compile(formula);
        let mut stack = Vec::new();
        trace(
            |x| match &prog {
                Ok(prog) => ev.run(prog, x, &mut stack).map_err(|_| ()),
                Err(_) => Err(()),
            },
            viewport,
            width,
            &OPTS,
        )
    }

    #[test]
    fn samples_every_pixel_inclusive() {
        let mut xs = Vec::new();
        let out = trace(
            |x| {
                xs.push(x);
                Ok::<_, Infallible>(0.0)
            },
            &view(),
            400.0,
            &OPTS,
        );
        assert_eq!(out.samples, 401);
        assert_eq!(xs.first().copied(), Some(-4.0));
        assert_eq!(xs.last().copied(), Some(4.0));
        assert_eq!(out.segments.len(), 1);
        assert_eq!(out.segments[0].len(), 401);
    }

    #[test]
    fn smooth_curve_is_one_segment() {
        let out = trace_formula("x*x", &view(), 400.0);
        assert_eq!(out.failures, 0);
        assert_eq!(out.segments.len(), 1);
    }

    #[test]
    fn pole_splits_the_curve() {
        // offset by half a pixel so no sample lands on x = 0
        let viewport = Viewport::new(50.0, Point { x: 200.5, y: 200.0 });
        let out = trace_formula("1/x", &viewport, 400.0);
        assert!(out.segments.len() >= 2, "{:?}", out.segments.len());
        for segment in &out.segments {
            for pair in segment.points.windows(2) {
                assert!((pair[1].y - pair[0].y).abs() <= OPTS.break_threshold);
            }
        }
    }

    #[test]
    fn failing_formula_draws_nothing() {
        let out = trace_formula("nope(x)", &view(), 400.0);
        assert!(out.segments.is_empty());
        assert_eq!(out.failures, out.samples);

        let out = trace_formula("x +", &view(), 400.0);
        assert!(out.segments.is_empty());
    }

    #[test]
    fn domain_gap_breaks_the_stroke() {
        // sqrt is undefined left of the origin
        let out = trace_formula("sqrt(x)", &view(), 400.0);
        assert_eq!(out.segments.len(), 1);
        assert!(out.segments[0].first().map(|p| p.x >= 200.0).unwrap_or(false));

        let out = trace_formula("x {x < -1} {x > -3}", &view(), 400.0);
        assert_eq!(out.segments.len(), 1);
        let out = trace_formula("sqrt(1 - x^2) {x < 2}", &view(), 400.0);
        assert_eq!(out.segments.len(), 1);
    }

    #[test]
    fn jump_at_threshold_connects() {
        let mut flip = false;
        let viewport = Viewport::new(1.0, Point { x: 0.0, y: 0.0 });
        // alternates between screen y 0 and -1000
        let out = trace(
            |_| {
                flip = !flip;
                Ok::<_, Infallible>(if flip { 0.0 } else { 1000.0 })
            },
            &viewport,
            10.0,
            &OPTS,
        );
        assert_eq!(out.segments.len(), 1);

        let out = trace(
            |_| {
                flip = !flip;
                Ok::<_, Infallible>(if flip { 0.0 } else { 1000.5 })
            },
            &viewport,
            10.0,
            &OPTS,
        );
        assert!(out.segments.is_empty());
    }

    #[test]
    fn isolated_failure_splits_in_two() {
        let viewport = Viewport::new(1.0, Point { x: 0.0, y: 0.0 });
        let out = trace(
            |x| if x == 5.0 { Err(()) } else { Ok(x) },
            &viewport,
            10.0,
            &OPTS,
        );
        assert_eq!(out.failures, 1);
        assert_eq!(out.segments.len(), 2);
        assert_eq!(out.segments[0].len(), 5);
        assert_eq!(out.segments[1].len(), 5);
    }

    #[test]
    fn zero_width_surface() {
        let out = trace(|x| Ok::<_, Infallible>(x), &view(), 0.0, &OPTS);
        assert_eq!(out.samples, 1);
        assert!(out.segments.is_empty());
    }

    #[test]
    fn sample_count_is_bounded() {
        let tiny = TraceOpts {
            sample_spacing: 1e-300,
            ..OPTS
        };
        let out = trace(|_| Ok::<_, Infallible>(0.0), &view(), 400.0, &tiny);
        // clamped to MIN_SAMPLE_SPACING: 100 samples per screen unit
        assert!((40_001..=40_002).contains(&out.samples), "{}", out.samples);

        let out = trace(|_| Ok::<_, Infallible>(0.0), &view(), 1e9, &OPTS);
        assert_eq!(out.samples, MAX_SAMPLES + 1);
        assert_eq!(out.segments.len(), 1);
        let last = out.segments[0].points.last().copied();
        assert!(last.is_some_and(|p| (p.x - 1e9).abs() < 1e-3));
    }
}
