// SPDX: CC0-1.0

use crate::{
    render::{DrawCmd, DrawInstructions, Pen},
    Number, Point,
};
use core::fmt;
use plotters::{prelude::*, style::RGBAColor};
use std::io::{self, Write};

fn style(pen: &Pen) -> ShapeStyle {
    let color = pen.color;
    ShapeStyle {
        color: RGBAColor(color.r, color.g, color.b, 1.0),
        filled: false,
        // backend strokes are whole units
        stroke_width: pen.width.round().max(1.0) as u32,
    }
}

/// Backend coordinates are integers; far off-surface points saturate.
fn coord(point: Point<Number>) -> (i32, i32) {
    (point.x.round() as i32, point.y.round() as i32)
}

fn draw_err(err: impl fmt::Display) -> io::Error {
    io::Error::other(format!("svg backend: {err}"))
}

/// Executes `frame` against an SVG document and writes it to `out`.
pub fn write_svg<W: Write>(mut out: W, frame: &DrawInstructions) -> io::Result<()> {
    let size = (
        frame.width.max(1.0) as u32,
        frame.height.max(1.0) as u32,
    );
    let mut doc = String::new();
    {
        let root = SVGBackend::with_string(&mut doc, size).into_drawing_area();
        for cmd in &frame.cmds {
            match cmd {
                DrawCmd::Clear => root.fill(&WHITE).map_err(draw_err)?,

                DrawCmd::Line { from, to, pen } => root
                    .draw(&PathElement::new(vec![coord(*from), coord(*to)], style(pen)))
                    .map_err(draw_err)?,

                // one polyline per segment, so gaps stay open
                DrawCmd::Curve { pen, segments, .. } => {
                    for segment in segments {
                        let points: Vec<(i32, i32)> =
                            segment.points.iter().copied().map(coord).collect();
                        root.draw(&PathElement::new(points, style(pen)))
                            .map_err(draw_err)?;
                    }
                }
            }
        }
        root.present().map_err(draw_err)?;
    }
    out.write_all(doc.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        registry::{Color, EquationId},
        trace::Segment,
    };

    #[test]
    fn writes_one_polyline_per_segment() {
        let pen = Pen {
            color: Color::rgb(0x2d, 0x70, 0xb3),
            width: 2.0,
        };
        let frame = DrawInstructions {
            width: 100.0,
            height: 50.0,
            cmds: vec![
                DrawCmd::Clear,
                DrawCmd::Curve {
                    id: EquationId(3),
                    pen,
                    segments: vec![
                        Segment {
                            points: vec![Point::new(0.0, 1.0), Point::new(1.0, 2.0)],
                        },
                        Segment {
                            points: vec![Point::new(5.0, 1.0), Point::new(6.0, 0.5)],
                        },
                    ],
                },
                DrawCmd::Curve {
                    id: EquationId(4),
                    pen: Pen {
                        color: Color::rgb(0xcf, 0x25, 0x6d),
                        width: 2.0,
                    },
                    segments: Vec::new(),
                },
            ],
        };

        let mut buf = Vec::new();
        write_svg(&mut buf, &frame).unwrap();
        let svg = String::from_utf8(buf).unwrap().to_ascii_lowercase();

        assert!(svg.contains("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<polyline").count(), 2);
        assert!(svg.contains("#2d70b3"));
        assert!(!svg.contains("#cf256d"));
    }

    #[test]
    fn coords_round_and_saturate() {
        assert_eq!(coord(Point::new(1.4, 2.6)), (1, 3));
        assert_eq!(coord(Point::new(-1e30, 1e30)), (i32::MIN, i32::MAX));
    }
}
