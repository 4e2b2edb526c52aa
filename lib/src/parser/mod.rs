use log::{debug, warn};
use lyon_geom::euclid::default::Transform2D;
use roxmltree::{Document, Node};

use crate::config::PlotConfig;
use crate::entity::Entity;

mod path;
mod shapes;
mod transform;

/// Fixed pixel-to-millimeter scale, determined by comparing pixels-per-mm
/// in a default Inkscape document.
pub const PX_TO_MM: f64 = 0.28222;

/// Width/height fallback in user units when the root carries neither.
const DEFAULT_DIMENSION_PX: f64 = 354.0;

/// Referenced-node recursion limit; `use` elements can form cycles.
const MAX_REFERENCE_DEPTH: usize = 32;

const INKSCAPE_NS: &str = "http://www.inkscape.org/namespaces/inkscape";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Traverse a parsed document into drawable entities, in document order.
///
/// The root transform maps user units into device millimeters and centers
/// the sheet on the origin: scale by [`PX_TO_MM`] with Y flipped, then
/// translate by half the sheet size.
pub fn parse_document(doc: &Document, config: &PlotConfig) -> Vec<Entity> {
    let root = doc.root_element();
    let width = length_px(&root, "width") * PX_TO_MM;
    let height = length_px(&root, "height") * PX_TO_MM;

    let root_transform = transform::compose(
        &Transform2D::translation(-(width / 2.0), height / 2.0),
        &Transform2D::scale(PX_TO_MM, -PX_TO_MM),
    );

    let mut entities = Vec::new();
    for child in root.children().filter(Node::is_element) {
        visit_node(doc, child, root_transform, config, &mut entities, 0);
    }
    debug!("traversal produced {} entities", entities.len());
    entities
}

/// Parse a width/height attribute with the restricted grammar the plugin
/// historically accepted: a bare number, `px`, or `%` of the default size.
/// Anything else falls back to the default.
fn length_px(node: &Node, name: &str) -> f64 {
    let Some(attr) = node.attribute(name) else {
        return DEFAULT_DIMENSION_PX;
    };
    let attr = attr.trim();

    if let Some(number) = attr.strip_suffix("px") {
        number
            .trim()
            .parse()
            .unwrap_or(DEFAULT_DIMENSION_PX)
    } else if let Some(percent) = attr.strip_suffix('%') {
        percent
            .trim()
            .parse::<f64>()
            .map(|p| DEFAULT_DIMENSION_PX * p / 100.0)
            .unwrap_or(DEFAULT_DIMENSION_PX)
    } else {
        attr.parse().unwrap_or(DEFAULT_DIMENSION_PX)
    }
}

fn visit_node(
    doc: &Document,
    node: Node,
    parent_transform: Transform2D<f64>,
    config: &PlotConfig,
    entities: &mut Vec<Entity>,
    depth: usize,
) {
    if matches!(
        node.attribute("visibility"),
        Some("hidden") | Some("collapse")
    ) {
        return;
    }

    let node_transform =
        transform::compose(&parent_transform, &transform::node_transform(&node));

    match node.tag_name().name() {
        "g" | "svg" => {
            if node.attribute((INKSCAPE_NS, "groupmode")) == Some("layer") {
                let label = node
                    .attribute((INKSCAPE_NS, "label"))
                    .unwrap_or_default()
                    .to_string();
                debug!("entering layer {label:?}");
                entities.push(Entity::LayerChange(label));
            }
            for child in node.children().filter(Node::is_element) {
                visit_node(doc, child, node_transform, config, entities, depth);
            }
        }
        "use" => {
            if depth >= MAX_REFERENCE_DEPTH {
                warn!("reference nesting deeper than {MAX_REFERENCE_DEPTH}, skipping");
                return;
            }
            let href = node
                .attribute((XLINK_NS, "href"))
                .or_else(|| node.attribute("href"));
            let Some(id) = href.and_then(|href| href.strip_prefix('#')) else {
                return;
            };
            let Some(referenced) = doc
                .descendants()
                .find(|candidate| candidate.attribute("id") == Some(id))
            else {
                // Unresolved reference; skip the branch
                return;
            };

            let mut use_transform = node_transform;
            let x = node.attribute("x").and_then(|v| v.parse().ok()).unwrap_or(0.0);
            let y = node.attribute("y").and_then(|v| v.parse().ok()).unwrap_or(0.0);
            if x != 0.0 || y != 0.0 {
                use_transform =
                    transform::compose(&use_transform, &Transform2D::translation(x, y));
            }
            visit_node(doc, referenced, use_transform, config, entities, depth + 1);
        }
        _ => {
            if let Some(entity) = make_entity(&node, &node_transform, config) {
                entities.push(entity);
            }
        }
    }
}

/// Construct an entity for a shape node.
///
/// The tag set is an explicit enumeration; unrecognized tags become
/// `Ignored` entities with a warning rather than an error. Recognized
/// shapes with degenerate geometry yield `None` and are silently skipped.
fn make_entity(node: &Node, transform: &Transform2D<f64>, config: &PlotConfig) -> Option<Entity> {
    let tag = node.tag_name().name();

    let shape = match tag {
        "path" => shapes::path(node),
        "rect" => shapes::rectangle(node),
        "line" => shapes::line(node),
        "polyline" => shapes::polyline(node, false),
        "polygon" => shapes::polyline(node, true),
        "circle" => shapes::circle(node),
        "ellipse" => shapes::ellipse(node),
        "text" => {
            warn!("unable to draw text, please convert it to a path first");
            return Some(Entity::Ignored {
                tag: tag.to_string(),
                reason: "text must be converted to a path".to_string(),
            });
        }
        "pattern" | "metadata" | "defs" | "namedview" | "eggbot" | "style" | "title" | "desc" => {
            return Some(Entity::Ignored {
                tag: tag.to_string(),
                reason: "non-drawable element".to_string(),
            });
        }
        other => {
            warn!("unable to draw <{other}>, please convert it to a path first");
            return Some(Entity::Ignored {
                tag: other.to_string(),
                reason: "unrecognized element".to_string(),
            });
        }
    }?;

    let segments = path::to_segments(&shape.commands, transform, config.tolerance);
    let description = shape
        .label
        .unwrap_or_else(|| format!("Polyline consisting of {} segments.", segments.len()));
    Entity::path(segments, description)
}

#[cfg(test)]
mod test {
    use super::*;
    use lyon_geom::point;

    fn parse(svg: &str) -> Vec<Entity> {
        let doc = Document::parse(svg).unwrap();
        parse_document(&doc, &PlotConfig::default())
    }

    #[test]
    fn root_transform_centers_and_flips() {
        // 100x100 user units; the point (50, 50) is the sheet center
        let entities = parse(r#"<svg width="100" height="100"><path d="M50 50 L60 50"/></svg>"#);
        let Entity::Path { segments, .. } = &entities[0] else {
            panic!("expected a path entity");
        };
        assert!((segments[0].start() - point(0.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn group_transforms_compose_parent_before_local() {
        let entities = parse(
            r#"<svg width="0" height="0">
                 <g transform="translate(10, 0)">
                   <g transform="scale(2)"><path d="M1 0 L2 0"/></g>
                 </g>
               </svg>"#,
        );
        let Entity::Path { segments, .. } = &entities[0] else {
            panic!("expected a path entity");
        };
        // user (1,0) -> local chain (12,0) -> device scale/center
        let expected_x = 12.0 * PX_TO_MM - (0.0 / 2.0);
        assert!((segments[0].start().x - expected_x).abs() < 1e-9);
    }

    #[test]
    fn labeled_layer_emits_layer_change() {
        let entities = parse(
            r#"<svg xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"
                    width="10" height="10">
                 <g inkscape:groupmode="layer" inkscape:label="traces">
                   <path d="M0 0 L1 0"/>
                 </g>
               </svg>"#,
        );
        assert_eq!(entities[0], Entity::LayerChange("traces".to_string()));
        assert!(matches!(entities[1], Entity::Path { .. }));
    }

    #[test]
    fn use_node_applies_additional_translation() {
        let entities = parse(
            r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink" width="0" height="0">
                 <defs><path id="stroke" d="M0 0 L1 0"/></defs>
                 <use xlink:href="#stroke" x="5" y="0"/>
               </svg>"##,
        );
        // defs itself is ignored; the use resolves and draws
        let paths: Vec<_> = entities
            .iter()
            .filter_map(|e| match e {
                Entity::Path { segments, .. } => Some(segments),
                _ => None,
            })
            .collect();
        assert_eq!(paths.len(), 1);
        assert!((paths[0][0].start().x - 5.0 * PX_TO_MM).abs() < 1e-9);
    }

    #[test]
    fn unresolved_reference_is_skipped() {
        let entities = parse(
            r##"<svg xmlns:xlink="http://www.w3.org/1999/xlink" width="10" height="10">
                 <use xlink:href="#missing"/>
               </svg>"##,
        );
        assert!(entities.is_empty());
    }

    #[test]
    fn hidden_nodes_are_skipped() {
        let entities = parse(
            r#"<svg width="10" height="10">
                 <g visibility="hidden"><path d="M0 0 L1 0"/></g>
               </svg>"#,
        );
        assert!(entities.is_empty());
    }

    #[test]
    fn unrecognized_tag_becomes_ignored() {
        let entities = parse(r#"<svg width="10" height="10"><video/></svg>"#);
        assert_eq!(
            entities,
            vec![Entity::Ignored {
                tag: "video".to_string(),
                reason: "unrecognized element".to_string(),
            }]
        );
    }

    #[test]
    fn percentage_dimensions_scale_the_default() {
        let doc = Document::parse(r#"<svg width="50%" height="200px"/>"#).unwrap();
        let root = doc.root_element();
        assert!((length_px(&root, "width") - 177.0).abs() < 1e-9);
        assert!((length_px(&root, "height") - 200.0).abs() < 1e-9);
    }
}
