#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::PlotConfig;

/// Device profile: the fixed set of framing templates for one physical
/// machine.
///
/// Both profiles speak the same motion dialect (`G1` moves, parenthesized
/// comments, 2-decimal words); they differ in setup/teardown framing and in
/// how the pen is actuated. The plotter drives a servo pen with `M300`; the
/// cutter raises and lowers a blade through spindle words and feeds paper
/// out on the `E` axis when a sheet is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Device {
    /// Servo-pen plotter
    #[default]
    Plotter,
    /// Drag-blade paper cutter with a paper-feed axis
    Cutter,
}

impl Device {
    /// Homing, unit/mode setup, and home-coordinate registration. Emitted
    /// before anything else.
    pub fn preamble(&self, c: &PlotConfig) -> Vec<String> {
        match self {
            Device::Plotter => vec![
                "(preamble)".into(),
                format!("(Scribbled @ {:.2})", c.xy_feedrate),
                "G21 (metric ftw)".into(),
                "G90 (absolute mode)".into(),
                format!(
                    "G92 X{:.2} Y{:.2} Z{:.2} (you are here)",
                    c.x_home, c.y_home, c.z_home
                ),
                "(/preamble)".into(),
            ],
            Device::Cutter => vec![
                "(setup)".into(),
                "G28 (home axes)".into(),
                format!("G1 F{:.2}", c.homing_feedrate),
                "M83 (relative E axis - the paper feed return)".into(),
                "G92 X64.0".into(),
                "G1 X0.0 E64.0".into(),
                format!("G1 F{:.2}", c.xy_feedrate),
                format!(
                    "G92 X{:.2} Y{:.2} Z{:.2} (set home coordinates)",
                    c.x_home, c.y_home, c.z_home
                ),
                "G1 X0 Y0 (go to 0 position for drawing)".into(),
                "G92 X0 Y0".into(),
                "(/setup done, can now draw)".into(),
                String::new(),
            ],
        }
    }

    /// Park position and drive disengage. Emitted after the body.
    pub fn postscript(&self, c: &PlotConfig) -> Vec<String> {
        match self {
            Device::Plotter => vec![
                "(postscript)".into(),
                format!("M300 S{:.2} (pen up)", c.pen_up_angle),
                format!("G4 P{:.0} (wait {:.0}ms)", c.stop_delay, c.stop_delay),
                "M300 S255 (turn off servo)".into(),
                format!("G1 X0 Y0 F{:.2}", c.xy_feedrate),
                format!(
                    "G1 Z{:.2} F{:.2} (go up to finished level)",
                    c.finished_height, c.z_feedrate
                ),
                format!(
                    "G1 X{:.2} Y{:.2} F{:.2} (go home)",
                    c.x_home, c.y_home, c.xy_feedrate
                ),
                "M18 (drives off)".into(),
                "(/postscript)".into(),
            ],
            Device::Cutter => vec![
                String::new(),
                "(end of drawing)".into(),
                format!("G1 F{:.2}", c.homing_feedrate),
                "G1 X0.0".into(),
                format!("G1 X{:.2}", c.x_offset),
                "G91".into(),
                format!("G1 X{:.2}", c.paper_length),
                "G90".into(),
                format!("G1 Y{:.2} Z0 (go home and cut paper)", c.y_home),
                format!("G1 Z{:.2}", c.z_home),
                "(/done)".into(),
                String::new(),
            ],
        }
    }

    /// Pen alignment check run before drawing begins.
    pub fn registration(&self, c: &PlotConfig) -> Vec<String> {
        match self {
            Device::Plotter => vec![
                "(registration)".into(),
                format!("M300 S{:.0} (pen down)", c.pen_down_angle),
                format!("G4 P{:.0} (wait {:.0}ms)", c.start_delay, c.start_delay),
                format!("M300 S{:.0} (pen up)", c.pen_up_angle),
                format!("G4 P{:.0} (wait {:.0}ms)", c.stop_delay, c.stop_delay),
                "M18 (disengage drives)".into(),
                "M01 (Was registration test successful?)".into(),
                "M17 (engage drives if YES, and continue)".into(),
                "(/registration)".into(),
            ],
            Device::Cutter => vec![
                String::new(),
                "(registration)".into(),
                "(/registration)".into(),
            ],
        }
    }

    /// Per-sheet header, present only in multi-copy runs.
    pub fn sheet_header(&self, c: &PlotConfig) -> Vec<String> {
        vec![
            "(sheet header)".into(),
            format!(
                "G92 X{:.2} Y{:.2} Z{:.2} (you are here)",
                c.x_home, c.y_home, c.z_home
            ),
            "(/sheet header)".into(),
        ]
    }

    /// Per-sheet footer, present only in multi-copy runs.
    pub fn sheet_footer(&self, c: &PlotConfig) -> Vec<String> {
        match self {
            Device::Plotter => vec![
                "(sheet footer)".into(),
                format!("M300 S{:.0} (pen up)", c.pen_up_angle),
                format!("G4 P{:.0} (wait {:.0}ms)", c.stop_delay, c.stop_delay),
                "G91 (relative mode)".into(),
                format!("G0 Z15 F{:.2}", c.z_feedrate),
                "G90 (absolute mode)".into(),
                format!(
                    "G0 X{:.2} Y{:.2} F{:.2}",
                    c.x_home, c.y_home, c.xy_feedrate
                ),
                "M01 (Have you retrieved the print?)".into(),
                "(machine halts until \"okay\")".into(),
                format!("G4 P{:.0} (wait {:.0}ms)", c.start_delay, c.start_delay),
                "G91 (relative mode)".into(),
                format!(
                    "G0 Z-15 F{:.2} (return to start position of current sheet)",
                    c.z_feedrate
                ),
                format!("G0 Z-0.01 F{:.2} (move down one sheet)", c.z_feedrate),
                "G90 (absolute mode)".into(),
                "M18 (disengage drives)".into(),
                "(/sheet footer)".into(),
            ],
            Device::Cutter => vec![],
        }
    }

    /// Trailing marker for continuous mode.
    pub fn loop_marker(&self) -> Vec<String> {
        vec!["M30 (Plot again?)".into()]
    }

    /// Sequence lowering the pen, without the dwell.
    pub fn pen_down(&self, c: &PlotConfig) -> Vec<String> {
        match self {
            Device::Plotter => vec![format!("M300 S{:.2} (pen down)", c.pen_down_angle)],
            Device::Cutter => vec!["(lower pen)".into(), "M5 M400 M3 S100".into()],
        }
    }

    /// Sequence raising the pen, without the dwell.
    pub fn pen_up(&self, c: &PlotConfig) -> Vec<String> {
        match self {
            Device::Plotter => vec![format!("M300 S{:.2} (pen up)", c.pen_up_angle)],
            Device::Cutter => vec!["(raise pen)".into(), "M3 S100 M400 M5".into()],
        }
    }

    /// Dwell after a pen transition. The plotter's firmware takes whole
    /// milliseconds; the cutter's takes a decimal value.
    pub fn dwell(&self, delay_ms: f64) -> String {
        match self {
            Device::Plotter => format!("G4 P{:.0} (wait {:.0}ms)", delay_ms, delay_ms),
            Device::Cutter => format!("G4 P{:.2}", delay_ms),
        }
    }
}
