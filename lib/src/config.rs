#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::machine::Device;

/// How the paper-feed (`E`) word on motion commands is computed.
///
/// The cutter couples its paper-feed axis to pen travel using only the
/// absolute X delta of each move. Whether that is intentional axis coupling
/// or an accident of the original firmware is unknown, so it is an explicit
/// mode rather than a silent behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FeedDistance {
    /// No feed word on motion commands.
    #[default]
    None,
    /// Append `E<d>` where `d` is the absolute X-axis delta of the move.
    AbsXDelta,
}

/// Frozen configuration consumed by the core.
///
/// All parsing of raw option strings happens upstream in the CLI; the core
/// only ever sees this struct. Feedrates are in millimeters / minute, delays
/// in milliseconds, coordinates in millimeters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlotConfig {
    /// Curve flattening tolerance in millimeters
    pub tolerance: f64,
    /// XY axes feedrate
    pub xy_feedrate: f64,
    /// Z axis feedrate
    pub z_feedrate: f64,
    /// Feedrate used while homing (cutter preamble)
    pub homing_feedrate: f64,
    /// Delay after pen down before movement, in milliseconds
    pub start_delay: f64,
    /// Delay after pen up before movement, in milliseconds
    pub stop_delay: f64,
    /// Servo angle that raises the pen
    pub pen_up_angle: f64,
    /// Servo angle that lowers the pen
    pub pen_down_angle: f64,
    /// Starting X position
    pub x_home: f64,
    /// Starting Y position
    pub y_home: f64,
    /// Z axis drawing height
    pub z_home: f64,
    /// Z axis height after the run finishes
    pub finished_height: f64,
    /// Cutter X offset before the paper feed
    pub x_offset: f64,
    /// Length of paper fed out past the cut position
    pub paper_length: f64,
    /// Emit a pen registration check before drawing
    pub register_pen: bool,
    /// Number of copies of the sheet to emit (>= 1)
    pub num_copies: usize,
    /// Emit an operator pause on layer changes
    pub pause_on_layer_change: bool,
    /// Wrap the program with a loop marker instead of replicating copies
    pub continuous: bool,
    /// Re-emit the full preamble for every copy instead of once up front
    pub repeat_preamble: bool,
    /// Paper-feed word mode for motion commands
    pub feed_distance: FeedDistance,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            tolerance: crate::flatten::DEFAULT_TOLERANCE,
            xy_feedrate: 3500.0,
            z_feedrate: 150.0,
            homing_feedrate: 150.0,
            start_delay: 150.0,
            stop_delay: 150.0,
            pen_up_angle: 50.0,
            pen_down_angle: 30.0,
            x_home: 0.0,
            y_home: 0.0,
            z_home: 0.0,
            finished_height: 0.0,
            x_offset: 0.0,
            paper_length: 0.0,
            register_pen: false,
            num_copies: 1,
            pause_on_layer_change: false,
            continuous: false,
            repeat_preamble: false,
            feed_distance: FeedDistance::None,
        }
    }
}

impl PlotConfig {
    /// Defaults adjusted for a device profile.
    ///
    /// The cutter feeds paper on the `E` axis, so its motion commands carry
    /// the X-delta feed word by default.
    pub fn for_device(device: Device) -> Self {
        match device {
            Device::Plotter => Self::default(),
            Device::Cutter => Self {
                feed_distance: FeedDistance::AbsXDelta,
                ..Self::default()
            },
        }
    }
}
