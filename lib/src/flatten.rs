use lyon_geom::{CubicBezierSegment, Point};

/// Default flattening tolerance in millimeters.
pub const DEFAULT_TOLERANCE: f64 = 0.2;

/// Subdivision gives up once a curve has been halved this many times.
///
/// Pathological input (near-collinear control points nested deeply) can
/// otherwise blow well past any useful resolution; at 24 halvings a curve
/// spanning a full sheet is already subdivided below micrometer scale.
const MAX_SUBDIVISION_DEPTH: u32 = 24;

/// Flatten a cubic Bézier curve into a polyline within `tolerance`.
///
/// Returns the curve's endpoints in order, starting at `curve.from` and
/// ending at `curve.to`. A curve that is already flat (collinear control
/// points) yields exactly those two points.
///
/// Subdivision is iterative with an explicit work list rather than
/// recursive; complicated paths used to overflow the call stack when each
/// split was a nested call.
pub fn flatten_cubic(curve: CubicBezierSegment<f64>, tolerance: f64) -> Vec<Point<f64>> {
    let mut points = vec![curve.from];
    flatten_cubic_into(curve, tolerance, &mut points);
    points
}

/// Like [`flatten_cubic`], but appends only the interior and end points to
/// an existing polyline whose last point is `curve.from`.
pub fn flatten_cubic_into(
    curve: CubicBezierSegment<f64>,
    tolerance: f64,
    points: &mut Vec<Point<f64>>,
) {
    let mut work = vec![(curve, 0u32)];

    while let Some((segment, depth)) = work.pop() {
        if depth >= MAX_SUBDIVISION_DEPTH || flatness(&segment) <= tolerance {
            points.push(segment.to);
        } else {
            let (left, right) = segment.split(0.5);
            // LIFO: push the right half first so the left is processed next
            work.push((right, depth + 1));
            work.push((left, depth + 1));
        }
    }
}

/// Maximum perpendicular distance of the interior control points from the
/// chord between the curve's endpoints.
fn flatness(segment: &CubicBezierSegment<f64>) -> f64 {
    let d1 = chord_distance(segment.ctrl1, segment.from, segment.to);
    let d2 = chord_distance(segment.ctrl2, segment.from, segment.to);
    d1.max(d2)
}

fn chord_distance(p: Point<f64>, from: Point<f64>, to: Point<f64>) -> f64 {
    let chord = to - from;
    let length_squared = chord.square_length();
    if length_squared <= f64::EPSILON {
        // Degenerate chord; fall back to point distance
        return (p - from).length();
    }
    ((p - from).cross(chord)).abs() / length_squared.sqrt()
}
