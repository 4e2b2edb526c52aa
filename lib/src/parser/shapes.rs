use lyon_geom::{point, Point};
use roxmltree::Node;
use svgtypes::PointsParser;

use super::path::{parse_path_data, PathCommand};

/// A primitive shape rewritten into the canonical path representation.
///
/// `label` overrides the default "Polyline consisting of N segments."
/// description when the shape has a more specific one (circles and
/// ellipses).
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub commands: Vec<PathCommand>,
    pub label: Option<String>,
}

impl Shape {
    fn polyline(commands: Vec<PathCommand>) -> Self {
        Self {
            commands,
            label: None,
        }
    }
}

fn attr_f64(node: &Node, name: &str) -> Option<f64> {
    node.attribute(name).and_then(|v| v.trim().parse().ok())
}

fn attr_or_zero(node: &Node, name: &str) -> f64 {
    attr_f64(node, name).unwrap_or(0.0)
}

/// `<path d="...">`. Empty or missing path data yields no shape.
pub fn path(node: &Node) -> Option<Shape> {
    let commands = parse_path_data(node.attribute("d")?)?;
    Some(Shape::polyline(commands))
}

/// `<rect>` as a closed four-corner path. Degenerate dimensions yield no
/// shape.
pub fn rectangle(node: &Node) -> Option<Shape> {
    let x = attr_or_zero(node, "x");
    let y = attr_or_zero(node, "y");
    let w = attr_f64(node, "width")?;
    let h = attr_f64(node, "height")?;
    if w <= 0.0 || h <= 0.0 {
        return None;
    }

    Some(Shape::polyline(vec![
        PathCommand::MoveTo(point(x, y)),
        PathCommand::LineTo(point(x + w, y)),
        PathCommand::LineTo(point(x + w, y + h)),
        PathCommand::LineTo(point(x, y + h)),
        PathCommand::Close,
    ]))
}

/// `<line>` as a two-point open path. Missing coordinates default to 0.
pub fn line(node: &Node) -> Option<Shape> {
    let from = point(attr_or_zero(node, "x1"), attr_or_zero(node, "y1"));
    let to = point(attr_or_zero(node, "x2"), attr_or_zero(node, "y2"));

    Some(Shape::polyline(vec![
        PathCommand::MoveTo(from),
        PathCommand::LineTo(to),
    ]))
}

/// `<polyline>` or `<polygon>` through the literal point list. Fewer than
/// two points yields no shape.
pub fn polyline(node: &Node, close: bool) -> Option<Shape> {
    let points: Vec<Point<f64>> = PointsParser::from(node.attribute("points")?)
        .map(|(x, y)| point(x, y))
        .collect();
    if points.len() < 2 {
        return None;
    }

    let mut commands = vec![PathCommand::MoveTo(points[0])];
    commands.extend(points[1..].iter().map(|p| PathCommand::LineTo(*p)));
    if close {
        commands.push(PathCommand::Close);
    }
    Some(Shape::polyline(commands))
}

/// `<circle>` as two semicircular arcs. Zero radius yields no shape.
pub fn circle(node: &Node) -> Option<Shape> {
    let r = attr_or_zero(node, "r");
    let cx = attr_or_zero(node, "cx");
    let cy = attr_or_zero(node, "cy");

    let mut shape = ellipse_arcs(cx, cy, r, r)?;
    shape.label = Some(format!(
        "Circle at [{:.2}, {:.2}] with radius {:.2}",
        cx, cy, r
    ));
    Some(shape)
}

/// `<ellipse>` as two semielliptical arcs. A zero radius yields no shape.
pub fn ellipse(node: &Node) -> Option<Shape> {
    let rx = attr_or_zero(node, "rx");
    let ry = attr_or_zero(node, "ry");
    let cx = attr_or_zero(node, "cx");
    let cy = attr_or_zero(node, "cy");

    let mut shape = ellipse_arcs(cx, cy, rx, ry)?;
    shape.label = Some(format!(
        "Ellipse at [{:.2}, {:.2}] with radii [{:.2}, {:.2}]",
        cx, cy, rx, ry
    ));
    Some(shape)
}

/// Full ellipse from `(cx - rx, cy)` to `(cx + rx, cy)` and back, so the
/// flattener and arc-aware emission treat it like any other path.
fn ellipse_arcs(cx: f64, cy: f64, rx: f64, ry: f64) -> Option<Shape> {
    if rx <= 0.0 || ry <= 0.0 {
        return None;
    }

    let west = point(cx - rx, cy);
    let east = point(cx + rx, cy);
    Some(Shape::polyline(vec![
        PathCommand::MoveTo(west),
        PathCommand::Arc {
            rx,
            ry,
            large_arc: true,
            sweep: false,
            to: east,
        },
        PathCommand::Arc {
            rx,
            ry,
            large_arc: true,
            sweep: false,
            to: west,
        },
    ]))
}
