//! CLI entry point (§4.J / §6): parses arguments with `clap`'s derive API,
//! builds a [`PrintConfig`], runs the pipeline over a loaded STL, and writes
//! the resulting G-code and (optionally) SVG preview.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use slice_core::{run, PrintConfig, SliceError};
use slice_geometry::Dim;
use slice_io::{read_stl_file, write_gcode, write_svg};

/// Slice an ASCII STL model into G-code.
#[derive(Parser, Debug)]
#[command(version, about = "STL to G-code slicer", long_about = None)]
struct Cli {
    /// Input ASCII STL file
    stl: PathBuf,

    /// Output G-code file
    #[arg(short = 'o', long, default_value = "out.gcode")]
    output: PathBuf,

    /// Optional SVG preview output
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Layer height in mm
    #[arg(long, default_value_t = 0.2)]
    layer_height: f64,

    /// Extrusion width as a multiple of layer height
    #[arg(long, default_value_t = 2.0)]
    width_ratio: f64,

    /// Z height to start slicing at
    #[arg(long, default_value_t = 0.0)]
    start_z: f64,

    /// Z height to stop slicing at; defaults to the model's own top
    #[arg(long)]
    end_z: Option<f64>,

    /// Perimeter loop count on layer 0
    #[arg(long, default_value_t = 3)]
    skins0: u32,

    /// Perimeter loop count on every other layer
    #[arg(long, default_value_t = 2)]
    skins: u32,

    /// Add one extra perimeter loop on odd layers
    #[arg(long, default_value_t = false)]
    alt_skins: bool,

    /// Consecutive layers of context that must all be solid before an
    /// interior point counts as sparse infill
    #[arg(long, default_value_t = 3)]
    solid_layers: usize,

    /// Sparse infill density, in (0, 1]
    #[arg(long, default_value_t = 0.3)]
    fill_density: f64,

    /// Infill flow multiplier
    #[arg(long, default_value_t = 1.0)]
    fill_flow: f64,

    /// Number of anchor skirt loops (0 disables the anchor)
    #[arg(long, default_value_t = 0)]
    anchor_loops: u32,

    /// Perpendicular gap between the part and the anchor's bonding barbs
    #[arg(long, default_value_t = 1.0)]
    anchor_gap: f64,

    /// Arc-length spacing between anchor bonding barbs
    #[arg(long, default_value_t = 4.0)]
    anchor_step: f64,

    /// Anchor flow multiplier
    #[arg(long, default_value_t = 1.2)]
    anchor_flow: f64,

    /// Filament diameter in mm
    #[arg(long, default_value_t = 1.75)]
    filament_diameter: f64,

    /// Filament packing/flow correction factor
    #[arg(long, default_value_t = 1.0)]
    packing: f64,

    /// Feed rate for layers after the first, in mm/s
    #[arg(long, default_value_t = 60.0)]
    speed: f64,

    /// Feed rate for the first layer, in mm/s
    #[arg(long, default_value_t = 20.0)]
    speed_first_layer: f64,

    /// Maximum Z-axis feed rate, in mm/s (0 disables the cap)
    #[arg(long, default_value_t = 5.0)]
    speed_z_max: f64,

    /// Z hop height for travel moves
    #[arg(long, default_value_t = 0.4)]
    hop: f64,

    /// Retraction length before a travel move
    #[arg(long, default_value_t = 1.0)]
    retract_length: f64,

    /// Decimal places for the G-code E axis
    #[arg(long, default_value_t = 4)]
    extruder_places: u32,

    /// Bed temperature in degrees C
    #[arg(long, default_value_t = 60.0)]
    temp_bed: f64,

    /// Nozzle temperature in degrees C
    #[arg(long, default_value_t = 200.0)]
    temp_nozzle: f64,

    /// Use a faster, coarser clip tolerance for perimeter construction
    #[arg(long, default_value_t = false)]
    fast: bool,

    /// Mirror the model in X
    #[arg(long, default_value_t = false)]
    mirror: bool,

    /// Verbose (debug-level) logging
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Suppress all logging but errors
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

/// Errors surfaced at the CLI boundary: pipeline/geometry failures, I/O
/// failures reading or writing files, and CLI-only argument validation that
/// [`PrintConfig::validate`] can't express because it needs the mesh's own
/// bounding box (e.g. defaulting `end_z`).
#[derive(Debug, thiserror::Error)]
enum PipelineError {
    #[error("failed to read STL: {0}")]
    Slice(#[from] SliceError),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.quiet);

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(debug: bool, quiet: bool) {
    let level = if quiet {
        tracing::Level::ERROR
    } else if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn run_cli(cli: Cli) -> Result<(), PipelineError> {
    let stl = read_stl_file(&cli.stl)?;

    let layer_height = Dim::from_real(cli.layer_height);
    let end_z = cli
        .end_z
        .map(Dim::from_real)
        .unwrap_or(stl.bbox.max.z - stl.bbox.min.z);

    let config = PrintConfig {
        layer_height,
        width_ratio: cli.width_ratio,
        start_z: Dim::from_real(cli.start_z),
        end_z,
        skins0: cli.skins0,
        skins: cli.skins,
        alt_skins: cli.alt_skins,
        solid_layers: cli.solid_layers,
        fill_density: cli.fill_density,
        fill_flow: cli.fill_flow,
        anchor_loops: cli.anchor_loops,
        anchor_gap: Dim::from_real(cli.anchor_gap),
        anchor_step: Dim::from_real(cli.anchor_step),
        anchor_flow: cli.anchor_flow,
        filament_diameter: Dim::from_real(cli.filament_diameter),
        packing: cli.packing,
        speed_normal: cli.speed,
        speed_first_layer: cli.speed_first_layer,
        speed_z_max: cli.speed_z_max,
        hop: Dim::from_real(cli.hop),
        retract_length: Dim::from_real(cli.retract_length),
        extruder_places: cli.extruder_places,
        temp_bed: cli.temp_bed,
        temp_nozzle: cli.temp_nozzle,
        fast: cli.fast,
        mirror: cli.mirror,
    };

    let result = run(stl, &config)?;

    write_gcode(&cli.output, &result, &config)?;
    tracing::info!(path = %cli.output.display(), "wrote G-code");

    if let Some(svg_path) = &cli.svg {
        write_svg(svg_path, &result, config.width())?;
        tracing::info!(path = %svg_path.display(), "wrote SVG preview");
    }

    Ok(())
}
