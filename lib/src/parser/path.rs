use lyon_geom::euclid::default::Transform2D;
use lyon_geom::{point, vector, Angle, ArcFlags, CubicBezierSegment, Point, SvgArc};
use svgtypes::{PathParser, PathSegment};

use crate::entity::{ArcStep, DrawStep, Segment};
use crate::flatten::flatten_cubic_into;

/// A canonical path command with absolute coordinates.
///
/// Every primitive shape is rewritten into this representation before
/// flattening; shorthand path commands (relative, smooth, horizontal and
/// vertical lines, quadratics) are normalized away during parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo(Point<f64>),
    LineTo(Point<f64>),
    CurveTo {
        ctrl1: Point<f64>,
        ctrl2: Point<f64>,
        to: Point<f64>,
    },
    /// Endpoint-form elliptical arc, as written in path data
    Arc {
        rx: f64,
        ry: f64,
        large_arc: bool,
        sweep: bool,
        to: Point<f64>,
    },
    Close,
}

/// Parse a `d` attribute into canonical commands.
///
/// Returns `None` when the attribute holds no commands at all; parsing stops
/// at the first syntax error, keeping whatever was valid up to that point.
pub fn parse_path_data(d: &str) -> Option<Vec<PathCommand>> {
    let mut commands = Vec::new();
    // Current point, subpath start, and the control points needed to
    // reflect smooth shorthands
    let mut cur = point(0.0, 0.0);
    let mut subpath_start = point(0.0, 0.0);
    let mut prev_cubic_ctrl: Option<Point<f64>> = None;
    let mut prev_quad_ctrl: Option<Point<f64>> = None;

    for segment in PathParser::from(d) {
        let segment = match segment {
            Ok(segment) => segment,
            Err(_) => break,
        };

        let abs = |x: f64, y: f64, abs: bool| {
            if abs {
                point(x, y)
            } else {
                cur + vector(x, y)
            }
        };

        match segment {
            PathSegment::MoveTo { abs: a, x, y } => {
                let to = abs(x, y, a);
                commands.push(PathCommand::MoveTo(to));
                cur = to;
                subpath_start = to;
                prev_cubic_ctrl = None;
                prev_quad_ctrl = None;
            }
            PathSegment::LineTo { abs: a, x, y } => {
                let to = abs(x, y, a);
                commands.push(PathCommand::LineTo(to));
                cur = to;
                prev_cubic_ctrl = None;
                prev_quad_ctrl = None;
            }
            PathSegment::HorizontalLineTo { abs: a, x } => {
                let to = if a { point(x, cur.y) } else { point(cur.x + x, cur.y) };
                commands.push(PathCommand::LineTo(to));
                cur = to;
                prev_cubic_ctrl = None;
                prev_quad_ctrl = None;
            }
            PathSegment::VerticalLineTo { abs: a, y } => {
                let to = if a { point(cur.x, y) } else { point(cur.x, cur.y + y) };
                commands.push(PathCommand::LineTo(to));
                cur = to;
                prev_cubic_ctrl = None;
                prev_quad_ctrl = None;
            }
            PathSegment::CurveTo {
                abs: a,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let ctrl1 = abs(x1, y1, a);
                let ctrl2 = abs(x2, y2, a);
                let to = abs(x, y, a);
                commands.push(PathCommand::CurveTo { ctrl1, ctrl2, to });
                cur = to;
                prev_cubic_ctrl = Some(ctrl2);
                prev_quad_ctrl = None;
            }
            PathSegment::SmoothCurveTo { abs: a, x2, y2, x, y } => {
                // Reflect the previous cubic control point about the
                // current point; a lone S behaves like C with ctrl1 = cur
                let ctrl1 = prev_cubic_ctrl
                    .map(|c| cur + (cur - c))
                    .unwrap_or(cur);
                let ctrl2 = abs(x2, y2, a);
                let to = abs(x, y, a);
                commands.push(PathCommand::CurveTo { ctrl1, ctrl2, to });
                cur = to;
                prev_cubic_ctrl = Some(ctrl2);
                prev_quad_ctrl = None;
            }
            PathSegment::Quadratic { abs: a, x1, y1, x, y } => {
                let ctrl = abs(x1, y1, a);
                let to = abs(x, y, a);
                commands.push(raise_quadratic(cur, ctrl, to));
                cur = to;
                prev_cubic_ctrl = None;
                prev_quad_ctrl = Some(ctrl);
            }
            PathSegment::SmoothQuadratic { abs: a, x, y } => {
                let ctrl = prev_quad_ctrl.map(|c| cur + (cur - c)).unwrap_or(cur);
                let to = abs(x, y, a);
                commands.push(raise_quadratic(cur, ctrl, to));
                cur = to;
                prev_cubic_ctrl = None;
                prev_quad_ctrl = Some(ctrl);
            }
            PathSegment::EllipticalArc {
                abs: a,
                rx,
                ry,
                x_axis_rotation: _,
                large_arc,
                sweep,
                x,
                y,
            } => {
                let to = abs(x, y, a);
                commands.push(PathCommand::Arc {
                    rx: rx.abs(),
                    ry: ry.abs(),
                    large_arc,
                    sweep,
                    to,
                });
                cur = to;
                prev_cubic_ctrl = None;
                prev_quad_ctrl = None;
            }
            PathSegment::ClosePath { .. } => {
                commands.push(PathCommand::Close);
                cur = subpath_start;
                prev_cubic_ctrl = None;
                prev_quad_ctrl = None;
            }
        }
    }

    if commands.is_empty() {
        None
    } else {
        Some(commands)
    }
}

/// Raise a quadratic Bézier to the equivalent cubic.
fn raise_quadratic(from: Point<f64>, ctrl: Point<f64>, to: Point<f64>) -> PathCommand {
    PathCommand::CurveTo {
        ctrl1: from + (ctrl - from) * (2.0 / 3.0),
        ctrl2: to + (ctrl - to) * (2.0 / 3.0),
        to,
    }
}

/// Flatten canonical commands into device-space segments.
///
/// The composed node transform is applied to every control point first, so
/// the flattening tolerance is honored in device space. Each `MoveTo` opens
/// a new segment; segments that end up with no draw steps (degenerate
/// geometry) are collapsed and never reach the toolpath state machine.
pub fn to_segments(
    commands: &[PathCommand],
    transform: &Transform2D<f64>,
    tolerance: f64,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current: Option<(Point<f64>, Vec<DrawStep>)> = None;
    let mut cur = point(0.0, 0.0);
    let mut subpath_start = cur;

    let flush = |open: &mut Option<(Point<f64>, Vec<DrawStep>)>,
                     segments: &mut Vec<Segment>| {
        if let Some((start, steps)) = open.take() {
            segments.extend(Segment::new(start, steps));
        }
    };

    for command in commands {
        // Commands before any MoveTo draw from the origin
        if current.is_none() && !matches!(command, PathCommand::MoveTo(_)) {
            current = Some((transform.transform_point(cur), Vec::new()));
        }

        match *command {
            PathCommand::MoveTo(to) => {
                flush(&mut current, &mut segments);
                current = Some((transform.transform_point(to), Vec::new()));
                cur = to;
                subpath_start = to;
            }
            PathCommand::LineTo(to) => {
                push_line(&mut current, transform.transform_point(to));
                cur = to;
            }
            PathCommand::CurveTo { ctrl1, ctrl2, to } => {
                let curve = CubicBezierSegment {
                    from: transform.transform_point(cur),
                    ctrl1: transform.transform_point(ctrl1),
                    ctrl2: transform.transform_point(ctrl2),
                    to: transform.transform_point(to),
                };
                let mut points = Vec::new();
                flatten_cubic_into(curve, tolerance, &mut points);
                for p in points {
                    push_line(&mut current, p);
                }
                cur = to;
            }
            PathCommand::Arc {
                rx,
                ry,
                large_arc,
                sweep,
                to,
            } => {
                let step = arc_step(transform, cur, rx, ry, large_arc, sweep, to);
                if let Some((_, steps)) = current.as_mut() {
                    steps.push(step);
                }
                cur = to;
            }
            PathCommand::Close => {
                if cur != subpath_start {
                    push_line(&mut current, transform.transform_point(subpath_start));
                }
                cur = subpath_start;
            }
        }
    }

    flush(&mut current, &mut segments);
    segments
}

fn push_line(current: &mut Option<(Point<f64>, Vec<DrawStep>)>, to: Point<f64>) {
    if let Some((start, steps)) = current.as_mut() {
        // Collapse zero-length draws here rather than leaving them for the
        // state machine's equality suppression
        let last = steps
            .iter()
            .rev()
            .find_map(|step| match step {
                DrawStep::Line(p) => Some(*p),
                DrawStep::Arc(arc) => Some(arc.to),
                DrawStep::NotImplemented(_) => None,
            })
            .unwrap_or(*start);
        if last != to {
            steps.push(DrawStep::Line(to));
        }
    }
}

/// Convert an endpoint-form arc into a draw step in device space.
///
/// Only circular arcs under a similarity transform survive as arcs; the
/// device has no elliptical interpolation, so anything else degrades to a
/// placeholder comment. A reflecting transform flips the sweep direction.
fn arc_step(
    transform: &Transform2D<f64>,
    from: Point<f64>,
    rx: f64,
    ry: f64,
    large_arc: bool,
    sweep: bool,
    to: Point<f64>,
) -> DrawStep {
    const EPS: f64 = 1e-9;

    let from_device = transform.transform_point(from);
    let to_device = transform.transform_point(to);

    if rx <= EPS || ry <= EPS {
        // SVG treats a zero-radius arc as a straight line
        return DrawStep::Line(to_device);
    }
    if (rx - ry).abs() > EPS {
        return DrawStep::NotImplemented("elliptical arc".into());
    }

    let (m11, m12, m21, m22) = (transform.m11, transform.m12, transform.m21, transform.m22);
    let rotation_scale = (m11 - m22).abs() < EPS && (m12 + m21).abs() < EPS;
    let reflection = (m11 + m22).abs() < EPS && (m12 - m21).abs() < EPS;
    if !rotation_scale && !reflection {
        return DrawStep::NotImplemented("arc under a non-uniform transform".into());
    }

    let determinant = m11 * m22 - m12 * m21;
    let radius = rx * determinant.abs().sqrt();
    let sweep_device = if determinant < 0.0 { !sweep } else { sweep };

    let svg_arc = SvgArc {
        from: from_device,
        to: to_device,
        radii: vector(radius, radius),
        x_rotation: Angle::radians(0.0),
        flags: ArcFlags {
            large_arc,
            sweep: sweep_device,
        },
    };
    if svg_arc.is_straight_line() {
        return DrawStep::Line(to_device);
    }

    DrawStep::Arc(ArcStep {
        to: to_device,
        center: svg_arc.to_arc().center,
        radius,
        ccw: sweep_device,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn identity() -> Transform2D<f64> {
        Transform2D::identity()
    }

    #[test]
    fn empty_path_data_yields_nothing() {
        assert_eq!(parse_path_data(""), None);
        assert_eq!(parse_path_data("   "), None);
    }

    #[test]
    fn relative_commands_are_normalized_to_absolute() {
        let commands = parse_path_data("m 1 2 l 3 0 v 4").unwrap();
        assert_eq!(
            commands,
            vec![
                PathCommand::MoveTo(point(1.0, 2.0)),
                PathCommand::LineTo(point(4.0, 2.0)),
                PathCommand::LineTo(point(4.0, 6.0)),
            ]
        );
    }

    #[test]
    fn close_returns_to_subpath_start() {
        let commands = parse_path_data("M0 0 L10 0 L10 10 Z").unwrap();
        let segments = to_segments(&commands, &identity(), 0.2);
        assert_eq!(segments.len(), 1);
        assert_eq!(
            *segments[0].steps().last().unwrap(),
            DrawStep::Line(point(0.0, 0.0))
        );
    }

    #[test]
    fn straight_line_path_flattens_to_its_points() {
        let commands = parse_path_data("M0 0 L10 0 L10 10").unwrap();
        let segments = to_segments(&commands, &identity(), 0.2);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start(), point(0.0, 0.0));
        assert_eq!(
            segments[0].steps(),
            &[
                DrawStep::Line(point(10.0, 0.0)),
                DrawStep::Line(point(10.0, 10.0)),
            ]
        );
    }

    #[test]
    fn transform_is_applied_before_flattening() {
        let commands = parse_path_data("M1 1 L2 1").unwrap();
        let transform = Transform2D::scale(10.0, 10.0);
        let segments = to_segments(&commands, &transform, 0.2);
        assert_eq!(segments[0].start(), point(10.0, 10.0));
        assert_eq!(segments[0].steps(), &[DrawStep::Line(point(20.0, 10.0))]);
    }

    #[test]
    fn collinear_curve_contributes_only_its_endpoint() {
        let commands = parse_path_data("M0 0 C1 0 2 0 3 0").unwrap();
        let segments = to_segments(&commands, &identity(), 0.2);
        assert_eq!(segments[0].steps(), &[DrawStep::Line(point(3.0, 0.0))]);
    }

    #[test]
    fn moveto_without_draw_is_collapsed() {
        let commands = parse_path_data("M5 5 M6 6 L7 7").unwrap();
        let segments = to_segments(&commands, &identity(), 0.2);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start(), point(6.0, 6.0));
    }

    #[test]
    fn circular_arc_becomes_a_centered_arc_step() {
        let commands = parse_path_data("M3 5 A2 2 0 1 0 7 5").unwrap();
        let segments = to_segments(&commands, &identity(), 0.2);
        match &segments[0].steps()[0] {
            DrawStep::Arc(arc) => {
                assert!((arc.radius - 2.0).abs() < 1e-9);
                assert!((arc.center - point(5.0, 5.0)).length() < 1e-6);
                assert_eq!(arc.to, point(7.0, 5.0));
                assert!(!arc.ccw);
            }
            other => panic!("expected arc step, got {other:?}"),
        }
    }

    #[test]
    fn reflected_transform_flips_arc_direction() {
        let commands = parse_path_data("M3 5 A2 2 0 1 0 7 5").unwrap();
        let flip = Transform2D::scale(1.0, -1.0);
        let segments = to_segments(&commands, &flip, 0.2);
        match &segments[0].steps()[0] {
            DrawStep::Arc(arc) => assert!(arc.ccw),
            other => panic!("expected arc step, got {other:?}"),
        }
    }

    #[test]
    fn elliptical_arc_is_a_placeholder() {
        let commands = parse_path_data("M0 0 A2 1 0 0 0 4 0").unwrap();
        let segments = to_segments(&commands, &identity(), 0.2);
        assert!(matches!(
            segments[0].steps()[0],
            DrawStep::NotImplemented(_)
        ));
    }

    #[test]
    fn quadratic_is_raised_to_cubic() {
        let commands = parse_path_data("M0 0 Q5 10 10 0").unwrap();
        match commands[1] {
            PathCommand::CurveTo { ctrl1, ctrl2, to } => {
                assert!((ctrl1 - point(10.0 / 3.0, 20.0 / 3.0)).length() < 1e-9);
                assert!((ctrl2 - point(20.0 / 3.0, 20.0 / 3.0)).length() < 1e-9);
                assert_eq!(to, point(10.0, 0.0));
            }
            ref other => panic!("expected curve, got {other:?}"),
        }
    }
}
