use lyon_geom::Point;

use crate::config::{FeedDistance, PlotConfig};
use crate::entity::{ArcStep, DrawStep, Entity, Segment};
use crate::machine::Device;

/// Builds the G-code instruction stream.
///
/// Owns the single tool state for the run: the pen position (unset until the
/// first move) and whether the pen is down. Entities are emitted in document
/// order through [`GCodeBuilder::emit`]; [`GCodeBuilder::build`] then wraps
/// the accumulated body in the device's framing.
#[derive(Debug)]
pub struct GCodeBuilder<'a> {
    config: &'a PlotConfig,
    device: Device,
    codes: Vec<String>,
    position: Option<Point<f64>>,
    pen_down: bool,
}

impl<'a> GCodeBuilder<'a> {
    pub fn new(config: &'a PlotConfig, device: Device) -> Self {
        Self {
            config,
            device,
            codes: Vec::new(),
            position: None,
            pen_down: false,
        }
    }

    /// Write a parenthesized comment into the output.
    pub fn comment(&mut self, text: &str) {
        self.codes.push(format!("({})", text));
    }

    /// Lower the pen and wait for it to settle.
    pub fn start(&mut self) {
        self.codes.extend(self.device.pen_down(self.config));
        self.codes.push(self.device.dwell(self.config.start_delay));
        self.pen_down = true;
    }

    /// Raise the pen and wait for it to settle.
    pub fn stop(&mut self) {
        self.codes.extend(self.device.pen_up(self.config));
        self.codes.push(self.device.dwell(self.config.stop_delay));
        self.pen_down = false;
    }

    /// Travel to `target` with the pen up.
    ///
    /// A move to the current position is suppressed entirely, including the
    /// pen-up transition.
    pub fn go_to_point(&mut self, target: Point<f64>) {
        if self.position == Some(target) {
            return;
        }
        if self.pen_down {
            self.stop();
        }
        self.motion(target);
        self.position = Some(target);
    }

    /// Draw to `target` with the pen down.
    pub fn draw_to_point(&mut self, target: Point<f64>) {
        if self.position == Some(target) {
            return;
        }
        if !self.pen_down {
            self.start();
        }
        self.motion(target);
        self.position = Some(target);
    }

    /// Draw a circular arc to `arc.to`.
    ///
    /// Arcs always emit: a full circle ends where it starts, so the equal-
    /// position suppression used for line moves must not apply here.
    pub fn draw_arc(&mut self, arc: &ArcStep) {
        if !self.pen_down {
            self.start();
        }
        let from = self.position.unwrap_or(arc.to);
        let word = if arc.ccw { "G3" } else { "G2" };
        self.codes.push(format!(
            "{} X{:.2} Y{:.2} I{:.2} J{:.2} F{:.2}",
            word,
            arc.to.x,
            arc.to.y,
            arc.center.x - from.x,
            arc.center.y - from.y,
            self.config.xy_feedrate
        ));
        self.position = Some(arc.to);
    }

    /// Draw one segment, bounded by an explicit pen-down/pen-up pair.
    ///
    /// The pen state is forced at the segment boundaries regardless of point
    /// deduplication, so every segment emits exactly one pen-down and one
    /// pen-up transition.
    pub fn draw_segment(&mut self, segment: &Segment) {
        self.go_to_point(segment.start());
        self.start();

        for step in segment.steps() {
            match step {
                DrawStep::Line(point) => self.draw_to_point(*point),
                DrawStep::Arc(arc) => self.draw_arc(arc),
                DrawStep::NotImplemented(reason) => {
                    self.comment(&format!("not implemented: {}", reason));
                }
            }
        }

        self.stop();
    }

    /// Append an operator pause for a layer change, when enabled.
    ///
    /// Does not touch the tool state.
    pub fn change_layer(&mut self, name: &str) {
        if self.config.pause_on_layer_change {
            self.codes
                .push(format!("M01 (Plotting layer \"{}\")", name));
        }
    }

    /// Emit one entity into the instruction body.
    pub fn emit(&mut self, entity: &Entity) {
        match entity {
            Entity::Path {
                segments,
                description,
            } => {
                let total = segments.len();
                for (i, segment) in segments.iter().enumerate() {
                    self.comment(description);
                    self.comment(&format!("segment {}/{}", i + 1, total));
                    self.draw_segment(segment);
                    self.codes.push(String::new());
                }
            }
            Entity::LayerChange(name) => self.change_layer(name),
            Entity::Ignored { .. } => {}
        }
    }

    fn motion(&mut self, target: Point<f64>) {
        let mut line = format!("G1 X{:.2} Y{:.2}", target.x, target.y);
        if let FeedDistance::AbsXDelta = self.config.feed_distance {
            let feed = self
                .position
                .map(|p| (p.x - target.x).abs())
                .unwrap_or(0.0);
            line.push_str(&format!(" E{:.2}", feed));
        }
        line.push_str(&format!(" F{:.2}", self.config.xy_feedrate));
        self.codes.push(line);
    }

    /// Assemble the final instruction stream.
    ///
    /// A "page" is the per-sheet framing around the body: sheet header and
    /// footer when more than one copy is requested, the registration block
    /// when enabled, and the postscript. Copies are verbatim re-emissions of
    /// the page; `repeat_preamble` additionally replicates the preamble.
    /// Continuous mode emits a single page with a trailing loop marker.
    pub fn build(self) -> String {
        let Self {
            config,
            device,
            codes: body,
            ..
        } = self;

        let multi_copy = config.num_copies > 1;
        let mut page: Vec<String> = Vec::new();
        if multi_copy {
            page.extend(device.sheet_header(config));
        }
        if config.register_pen {
            page.extend(device.registration(config));
        }
        page.extend(body);
        if multi_copy {
            page.extend(device.sheet_footer(config));
        }
        page.extend(device.postscript(config));

        let preamble = device.preamble(config);
        let mut commands: Vec<String> = Vec::new();

        if config.continuous {
            commands.extend(preamble);
            commands.extend(page);
            commands.extend(device.loop_marker());
        } else if multi_copy && config.repeat_preamble {
            for _ in 0..config.num_copies {
                commands.extend(preamble.iter().cloned());
                commands.extend(page.iter().cloned());
            }
        } else if multi_copy {
            commands.extend(preamble);
            for _ in 0..config.num_copies {
                commands.extend(page.iter().cloned());
            }
        } else {
            commands.extend(preamble);
            commands.extend(page);
        }

        let mut out = commands.join("\n");
        out.push('\n');
        out
    }
}
