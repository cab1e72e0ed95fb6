// SPDX: CC0-1.0

use crate::{
    config::PlotConfig,
    eval::Evaluator,
    registry::{EquationId, Registry},
    render::{self, DrawInstructions},
    viewport::Viewport,
    Number, Point,
};
use tracing::debug;

/// Equations plus the view they are drawn through.
///
/// Every mutation raises a redraw request which the caller collects with
/// [`Plotter::take_redraw`]; rendering itself never changes any state.
#[derive(Debug)]
pub struct Plotter {
    viewport: Viewport,
    registry: Registry,
    evaluator: Evaluator,
    config: PlotConfig,
    redraw: bool,
}

impl Default for Plotter {
    fn default() -> Self {
        Self::new(PlotConfig::default())
    }
}

impl Plotter {
    pub fn new(config: PlotConfig) -> Self {
        let [width, height] = config.surface_size();
        Self {
            viewport: Viewport::centered(width, height),
            registry: Registry::new(),
            evaluator: Evaluator::new(),
            config,
            redraw: true,
        }
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub const fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    pub const fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub const fn config(&self) -> &PlotConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: PlotConfig) {
        self.config = config;
        self.redraw = true;
    }

    pub fn add_equation(&mut self, id: EquationId, formula: impl Into<String>) {
        let formula = formula.into();
        debug!(%id, %formula, "adding equation");
        self.registry.add(id, formula);
        self.redraw = true;
    }

    pub fn remove_equation(&mut self, id: EquationId) -> bool {
        let removed = self.registry.remove(id).is_some();
        debug!(%id, removed, "removing equation");
        self.redraw = true;
        removed
    }

    pub fn pan(&mut self, dx: Number, dy: Number) {
        self.viewport.pan(dx, dy);
        self.redraw = true;
    }

    pub fn zoom(&mut self, factor: Number) {
        self.viewport.zoom(factor);
        self.redraw = true;
    }

    pub fn zoom_at(&mut self, factor: Number, anchor: Point<Number>) {
        self.viewport.zoom_at(factor, anchor);
        self.redraw = true;
    }

    /// Origin back in the middle of the configured surface at the default scale.
    pub fn reset_view(&mut self) {
        let [width, height] = self.config.surface_size();
        self.viewport = Viewport::centered(width, height);
        self.redraw = true;
    }

    /// Whether anything changed since the last call.
    pub fn take_redraw(&mut self) -> bool {
        core::mem::take(&mut self.redraw)
    }

    pub fn render_frame(&self, width: Number, height: Number) -> DrawInstructions {
        render::render(
            self.viewport,
            &self.registry,
            &self.evaluator,
            &self.config,
            width,
            height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mutations_request_redraw() {
        let mut plotter = Plotter::default();
        assert!(plotter.take_redraw());
        assert!(!plotter.take_redraw());

        plotter.add_equation(EquationId(0), "x");
        assert!(plotter.take_redraw());

        // removing an unknown id is a no-op but still asks for a redraw
        assert!(!plotter.remove_equation(EquationId(9)));
        assert!(plotter.take_redraw());
        assert_eq!(plotter.registry().len(), 1);

        assert!(plotter.remove_equation(EquationId(0)));
        assert!(plotter.take_redraw());

        plotter.pan(1.0, 1.0);
        assert!(plotter.take_redraw());
        plotter.zoom(1.1);
        assert!(plotter.take_redraw());
    }

    #[test]
    fn render_does_not_touch_state() {
        let mut plotter = Plotter::default();
        plotter.add_equation(EquationId(0), "sin(x)");
        plotter.take_redraw();
        let view = *plotter.viewport();
        let a = plotter.render_frame(800.0, 600.0);
        let b = plotter.render_frame(800.0, 600.0);
        assert_eq!(a, b);
        assert_eq!(*plotter.viewport(), view);
        assert!(!plotter.take_redraw());
    }

    #[test]
    fn reset_view_recenters() {
        let mut plotter = Plotter::default();
        plotter.pan(40.0, -3.0);
        plotter.zoom(0.5);
        plotter.reset_view();
        assert_eq!(plotter.viewport().offset(), Point { x: 400.0, y: 300.0 });
        assert_eq!(plotter.viewport().scale(), Viewport::DEFAULT_SCALE);
    }
}
