use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;
use svg2plot::{svg2program, Device, FeedDistance, PlotConfig};

/// Convert an SVG drawing into G-code for a pen plotter or paper cutter.
///
/// The generated program is written to standard output.
#[derive(Debug, Parser)]
#[command(name = "svg2plot", version, author)]
struct Opt {
    /// Input SVG file; standard input when omitted
    file: Option<PathBuf>,

    /// Device profile to generate framing for
    #[arg(long, value_enum, default_value_t = DeviceArg::Plotter)]
    device: DeviceArg,

    /// Load a JSON settings file, overridden by explicit options
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Curve flattening tolerance in millimeters
    #[arg(long)]
    tolerance: Option<f64>,

    /// Pen up angle
    #[arg(long)]
    pen_up_angle: Option<f64>,

    /// Pen down angle
    #[arg(long)]
    pen_down_angle: Option<f64>,

    /// Delay after pen down before movement, in milliseconds
    #[arg(long)]
    start_delay: Option<f64>,

    /// Delay after pen up before movement, in milliseconds
    #[arg(long)]
    stop_delay: Option<f64>,

    /// XY axes feedrate in millimeters per minute
    #[arg(long)]
    xy_feedrate: Option<f64>,

    /// Z axis feedrate in millimeters per minute
    #[arg(long)]
    z_feedrate: Option<f64>,

    /// Homing feedrate in millimeters per minute
    #[arg(long)]
    homing_feedrate: Option<f64>,

    /// Starting X position
    #[arg(long)]
    x_home: Option<f64>,

    /// Starting Y position
    #[arg(long)]
    y_home: Option<f64>,

    /// Z axis drawing height in millimeters
    #[arg(long)]
    z_home: Option<f64>,

    /// Z axis height after the run finishes, in millimeters
    #[arg(long)]
    finished_height: Option<f64>,

    /// Cutter X offset before the paper feed, in millimeters
    #[arg(long)]
    x_offset: Option<f64>,

    /// Length of paper fed out past the cut position, in millimeters
    #[arg(long)]
    paper_length: Option<f64>,

    /// Add a pen registration check before drawing
    #[arg(long)]
    register_pen: bool,

    /// Number of copies of the sheet to emit
    #[arg(long, default_value_t = 1)]
    num_copies: usize,

    /// Re-emit the full preamble for every copy
    #[arg(long)]
    repeat_preamble: bool,

    /// Pause on layer changes
    #[arg(long)]
    pause_on_layer_change: bool,

    /// Plot continuously until stopped
    #[arg(long)]
    continuous: bool,

    /// Append the absolute X delta of each move as an E word (paper feed)
    #[arg(long)]
    feed_distance: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum DeviceArg {
    Plotter,
    Cutter,
}

impl From<DeviceArg> for Device {
    fn from(value: DeviceArg) -> Self {
        match value {
            DeviceArg::Plotter => Device::Plotter,
            DeviceArg::Cutter => Device::Cutter,
        }
    }
}

impl Opt {
    /// Fold the option set over the profile (or settings-file) defaults.
    fn config(&self, mut config: PlotConfig) -> PlotConfig {
        macro_rules! override_with {
            ($($field:ident),+ $(,)?) => {
                $(if let Some(value) = self.$field {
                    config.$field = value;
                })+
            };
        }
        override_with!(
            tolerance,
            pen_up_angle,
            pen_down_angle,
            start_delay,
            stop_delay,
            xy_feedrate,
            z_feedrate,
            homing_feedrate,
            x_home,
            y_home,
            z_home,
            finished_height,
            x_offset,
            paper_length,
        );
        if self.register_pen {
            config.register_pen = true;
        }
        if self.num_copies > 1 {
            config.num_copies = self.num_copies;
        }
        if self.repeat_preamble {
            config.repeat_preamble = true;
        }
        if self.pause_on_layer_change {
            config.pause_on_layer_change = true;
        }
        if self.continuous {
            config.continuous = true;
        }
        if self.feed_distance {
            config.feed_distance = FeedDistance::AbsXDelta;
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::parse();

    let device = Device::from(opt.device);
    let defaults = match &opt.settings {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("could not read settings file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid settings file {}", path.display()))?
        }
        None => PlotConfig::for_device(device),
    };
    let config = opt.config(defaults);

    let input = match &opt.file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?,
        None => {
            info!("reading from standard input");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("could not read standard input")?;
            buffer
        }
    };

    let doc = roxmltree::Document::parse(&input).context("invalid SVG document")?;
    let program = svg2program(&doc, &config, device);

    io::stdout()
        .write_all(program.as_bytes())
        .context("could not write program")?;
    Ok(())
}
