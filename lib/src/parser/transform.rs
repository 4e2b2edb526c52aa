use lyon_geom::euclid::default::Transform2D;
use lyon_geom::euclid::Angle;
use roxmltree::Node;
use svgtypes::{TransformListParser, TransformListToken};

/// Compose two transforms, parent applied after local.
///
/// Local coordinates are mapped into parent space: `apply(compose(p, l), x)
/// == apply(p, apply(l, x))`.
pub fn compose(parent: &Transform2D<f64>, local: &Transform2D<f64>) -> Transform2D<f64> {
    local.then(parent)
}

/// The transform carried by a node's `transform` attribute.
///
/// A missing or unparseable attribute is the identity; transforms never
/// fail traversal.
pub fn node_transform(node: &Node) -> Transform2D<f64> {
    node.attribute("transform")
        .map(parse_transform_list)
        .unwrap_or_else(Transform2D::identity)
}

/// Parse an SVG transform list into a single matrix.
///
/// List entries apply right-to-left, so each successive token is composed
/// as the more local transform.
pub fn parse_transform_list(value: &str) -> Transform2D<f64> {
    let mut combined = Transform2D::identity();
    for token in TransformListParser::from(value) {
        let token = match token {
            Ok(token) => token,
            Err(_) => break,
        };
        let matrix = match token {
            TransformListToken::Matrix { a, b, c, d, e, f } => Transform2D::new(a, b, c, d, e, f),
            TransformListToken::Translate { tx, ty } => Transform2D::translation(tx, ty),
            TransformListToken::Scale { sx, sy } => Transform2D::scale(sx, sy),
            TransformListToken::Rotate { angle } => Transform2D::rotation(Angle::degrees(angle)),
            TransformListToken::SkewX { angle } => {
                Transform2D::new(1.0, 0.0, angle.to_radians().tan(), 1.0, 0.0, 0.0)
            }
            TransformListToken::SkewY { angle } => {
                Transform2D::new(1.0, angle.to_radians().tan(), 0.0, 1.0, 0.0, 0.0)
            }
        };
        combined = compose(&combined, &matrix);
    }
    combined
}
