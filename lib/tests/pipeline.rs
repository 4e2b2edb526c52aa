use roxmltree::Document;
use svg2plot::{svg2program, Device, Entity, FeedDistance, PlotConfig};

fn run(svg: &str, config: &PlotConfig, device: Device) -> String {
    let doc = Document::parse(svg).unwrap();
    svg2program(&doc, config, device)
}

/// Instruction lines between the preamble and the postscript/footer.
fn body(gcode: &str) -> &str {
    let start = gcode.find("(/preamble)").map(|i| i + "(/preamble)".len());
    let start = start
        .or_else(|| gcode.find("(/setup done, can now draw)").map(|i| i + 1))
        .unwrap();
    let end = gcode
        .find("(postscript)")
        .or_else(|| gcode.find("(end of drawing)"))
        .unwrap();
    &gcode[start..end]
}

#[test]
fn open_path_emits_one_pen_pair_and_two_draws() {
    let svg = r#"<svg width="0" height="0"><path d="M0 0 L10 0 L10 10"/></svg>"#;
    let gcode = run(svg, &PlotConfig::default(), Device::Plotter);
    let body = body(&gcode);

    assert_eq!(body.matches("(pen down)").count(), 1);
    assert_eq!(body.matches("(pen up)").count(), 1);

    // Travel to the start, then two draw moves; path coordinates are scaled
    // by the fixed px->mm factor
    let moves: Vec<&str> = body
        .lines()
        .filter(|l| l.starts_with("G1 X"))
        .collect();
    assert_eq!(moves.len(), 3);
    assert!(moves[0].starts_with("G1 X0.00 Y0.00"));
    assert!(moves[2].starts_with("G1 X2.82 Y-2.82"));
}

#[test]
fn multiple_copies_replicate_the_framed_sheet() {
    let svg = r#"<svg width="10" height="10"><path d="M0 0 L10 0"/></svg>"#;
    let config = PlotConfig {
        num_copies: 3,
        register_pen: true,
        ..PlotConfig::default()
    };
    let gcode = run(svg, &config, Device::Plotter);

    assert_eq!(gcode.matches("(preamble)").count(), 1);
    for block in [
        "(sheet header)",
        "(registration)",
        "(segment 1/1)",
        "(sheet footer)",
        "(postscript)",
    ] {
        assert_eq!(gcode.matches(block).count(), 3, "block {block}");
    }

    // Verbatim replication, no reordering across copies
    let start = gcode.find("(sheet header)").unwrap();
    let end = gcode.find("(/postscript)").unwrap() + "(/postscript)".len();
    assert_eq!(gcode.matches(&gcode[start..end]).count(), 3);
}

#[test]
fn circle_emits_arc_instructions_referencing_its_radius() {
    let svg = r#"<svg width="0" height="0"><circle cx="5" cy="5" r="2"/></svg>"#;
    let gcode = run(svg, &PlotConfig::default(), Device::Plotter);
    let body = body(&gcode);

    assert!(body.contains("(Circle at [5.00, 5.00] with radius 2.00)"));
    // Two semicircles in center-offset form; the radius appears as the I
    // offset from each arc's start point
    let arcs: Vec<&str> = body
        .lines()
        .filter(|l| l.starts_with("G2") || l.starts_with("G3"))
        .collect();
    assert_eq!(arcs.len(), 2);
    assert!(arcs.iter().all(|l| l.contains("I0.56") || l.contains("I-0.56")));
    assert_eq!(body.matches("(pen down)").count(), 1);
    assert_eq!(body.matches("(pen up)").count(), 1);
}

#[test]
fn text_is_ignored_without_affecting_the_body() {
    let with_text =
        r#"<svg width="10" height="10"><path d="M0 0 L10 0"/><text>hi</text></svg>"#;
    let without_text = r#"<svg width="10" height="10"><path d="M0 0 L10 0"/></svg>"#;

    let config = PlotConfig::default();
    assert_eq!(
        run(with_text, &config, Device::Plotter),
        run(without_text, &config, Device::Plotter)
    );

    let doc = Document::parse(with_text).unwrap();
    let entities = svg2plot::parse_document(&doc, &config);
    assert!(entities
        .iter()
        .any(|e| matches!(e, Entity::Ignored { tag, .. } if tag == "text")));
}

#[test]
fn layer_pause_is_emitted_only_when_enabled() {
    let svg = r#"<svg xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape"
                      width="10" height="10">
                   <g inkscape:groupmode="layer" inkscape:label="outline">
                     <path d="M0 0 L10 0"/>
                   </g>
                 </svg>"#;

    let silent = run(svg, &PlotConfig::default(), Device::Plotter);
    assert!(!silent.contains("M01 (Plotting layer"));

    let pausing = PlotConfig {
        pause_on_layer_change: true,
        ..PlotConfig::default()
    };
    let paused = run(svg, &pausing, Device::Plotter);
    assert!(paused.contains("M01 (Plotting layer \"outline\")"));
}

#[test]
fn continuous_mode_wraps_the_body_once() {
    let svg = r#"<svg width="10" height="10"><path d="M0 0 L10 0"/></svg>"#;
    let config = PlotConfig {
        continuous: true,
        num_copies: 5,
        ..PlotConfig::default()
    };
    let gcode = run(svg, &config, Device::Plotter);

    assert_eq!(gcode.matches("(postscript)").count(), 1);
    assert!(gcode.trim_end().ends_with("M30 (Plot again?)"));
}

#[test]
fn cutter_profile_frames_with_paper_feed() {
    let svg = r#"<svg width="10" height="10"><path d="M0 0 L10 0"/></svg>"#;
    let config = PlotConfig {
        paper_length: 120.0,
        x_offset: 10.0,
        ..PlotConfig::for_device(Device::Cutter)
    };
    let gcode = run(svg, &config, Device::Cutter);

    assert!(gcode.starts_with("(setup)"));
    assert!(gcode.contains("G28 (home axes)"));
    assert!(gcode.contains("(lower pen)"));
    assert!(gcode.contains("(raise pen)"));
    assert!(gcode.contains("G1 X120.00"));
    // Motion commands carry the absolute X-delta feed word
    assert_eq!(config.feed_distance, FeedDistance::AbsXDelta);
    assert!(gcode
        .lines()
        .filter(|l| l.starts_with("G1 X") && l.contains(" F"))
        .any(|l| l.contains(" E")));
}

#[test]
fn coordinates_and_feedrates_use_two_decimals() {
    let svg = r#"<svg width="0" height="0"><path d="M1.234 0 L5.678 0"/></svg>"#;
    let gcode = run(svg, &PlotConfig::default(), Device::Plotter);

    for line in body(&gcode).lines().filter(|l| l.starts_with("G1 X")) {
        for word in line.split_whitespace().filter(|w| {
            w.starts_with('X') || w.starts_with('Y') || w.starts_with('F')
        }) {
            let digits = word[1..].rsplit('.').next().unwrap();
            assert_eq!(digits.len(), 2, "word {word} in {line}");
        }
    }
}
