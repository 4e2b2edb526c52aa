use lyon_geom::Point;

/// A circular arc draw step in device space.
///
/// Stored in center form so emission is a direct translation to a `G2`/`G3`
/// word list; the endpoint-to-center conversion happens once, during path
/// flattening.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcStep {
    /// Arc endpoint
    pub to: Point<f64>,
    /// Arc center
    pub center: Point<f64>,
    /// Arc radius
    pub radius: f64,
    /// Counterclockwise (`G3`) when true, clockwise (`G2`) otherwise
    pub ccw: bool,
}

/// A single pen-down step within a [`Segment`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawStep {
    /// Straight draw move to a point
    Line(Point<f64>),
    /// Circular arc draw move
    Arc(ArcStep),
    /// A step the device cannot express; emitted as a placeholder comment
    /// and skipped, never fatal
    NotImplemented(String),
}

/// One continuous pen-down drawing path.
///
/// `start` is the pen-up travel target; `steps` are the pen-down draw
/// targets in draw order. A segment always has at least one step: a
/// one-point "segment" is a no-op draw and is collapsed by [`Segment::new`]
/// before it can reach the toolpath state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    start: Point<f64>,
    steps: Vec<DrawStep>,
}

impl Segment {
    /// Returns `None` when `steps` is empty.
    pub fn new(start: Point<f64>, steps: Vec<DrawStep>) -> Option<Self> {
        if steps.is_empty() {
            None
        } else {
            Some(Self { start, steps })
        }
    }

    pub fn start(&self) -> Point<f64> {
        self.start
    }

    pub fn steps(&self) -> &[DrawStep] {
        &self.steps
    }
}

/// A drawable produced by document traversal.
///
/// Entities are created once, in document order, and are read-only
/// afterward; the traversal result owns the list.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// A flattened path: one or more segments plus a human-readable
    /// description echoed into the output as a comment
    Path {
        segments: Vec<Segment>,
        description: String,
    },
    /// A labeled layer boundary; whether it pauses the device is decided at
    /// emission time
    LayerChange(String),
    /// Content that will not be rendered
    Ignored { tag: String, reason: String },
}

impl Entity {
    /// Builds a path entity, or `None` when no segment survived
    /// normalization (degenerate geometry).
    pub fn path(segments: Vec<Segment>, description: String) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Entity::Path {
                segments,
                description,
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use lyon_geom::point;

    #[test]
    fn empty_segment_is_rejected() {
        assert_eq!(Segment::new(point(1., 2.), vec![]), None);
    }

    #[test]
    fn path_entity_without_segments_is_rejected() {
        assert_eq!(Entity::path(vec![], "empty".into()), None);
    }
}
