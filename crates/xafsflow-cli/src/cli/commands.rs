use super::CliError;
use super::helpers::{emit_json, grid_from_range};
use serde::Serialize;
use std::path::{Path, PathBuf};
use xafsflow_core::domain::{ENERGY_COLUMN, SAMPLE_NAME_COLUMN, XafsError};
use xafsflow_core::modules::{
    BoundedDomain, InterpolationOptions, ReaderOptions, bounded_domain, interpolate_table,
    read_spectra,
};
use xafsflow_core::numerics::InterpolationMethod;
use xafsflow_core::workflow::{load_workflow_config, run_workflow};

#[derive(clap::Args)]
pub(super) struct GridArgs {
    /// First grid point
    #[arg(long, allow_negative_numbers = true)]
    start: f64,

    /// Last grid point (inclusive)
    #[arg(long, allow_negative_numbers = true)]
    stop: f64,

    /// Grid spacing
    #[arg(long)]
    step: f64,
}

#[derive(clap::Args)]
pub(super) struct BoundArgs {
    /// Spectrum files
    #[arg(required = true, value_name = "FILES")]
    files: Vec<PathBuf>,

    #[command(flatten)]
    grid: GridArgs,

    /// Column whose values identify one spectrum
    #[arg(long, default_value = SAMPLE_NAME_COLUMN)]
    group: String,

    /// JSON output path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct InterpolateArgs {
    /// Spectrum files
    #[arg(required = true, value_name = "FILES")]
    files: Vec<PathBuf>,

    #[command(flatten)]
    grid: GridArgs,

    /// Interpolation method: index, linear, nearest, previous
    #[arg(long, default_value = "index")]
    method: InterpolationMethod,

    /// Keep grid points outside each spectrum's own range (as missing values)
    #[arg(long)]
    no_clip: bool,

    /// Return measured points as well as grid points
    #[arg(long)]
    all_points: bool,

    /// JSON output path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct DecomposeArgs {
    /// Workflow configuration file
    #[arg(long)]
    config: PathBuf,

    /// Random seed, overriding the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// JSON report output path (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BoundReport {
    domain: BoundedDomain,
    empty: bool,
    grid: Vec<f64>,
}

pub(super) fn run_bound_command(args: BoundArgs) -> Result<i32, CliError> {
    let grid = grid_from_range(args.grid.start, args.grid.stop, args.grid.step)?;
    let table = read_spectra(&args.files, &ReaderOptions::default())?;
    let domain = bounded_domain(&table, ENERGY_COLUMN, &[args.group])?;
    if domain.is_empty() {
        tracing::warn!("spectra do not share a common range; the bounded grid is empty");
    }

    let report = BoundReport {
        domain,
        empty: domain.is_empty(),
        grid: domain.clip(&grid),
    };
    emit_json(&report, args.output.as_deref())?;
    Ok(0)
}

pub(super) fn run_interpolate_command(args: InterpolateArgs) -> Result<i32, CliError> {
    let grid = grid_from_range(args.grid.start, args.grid.stop, args.grid.step)?;
    let table = read_spectra(&args.files, &ReaderOptions::default())?;
    let options = InterpolationOptions::default()
        .grouped_by([SAMPLE_NAME_COLUMN])
        .with_method(args.method)
        .with_clip_to_overlap(!args.no_clip)
        .with_return_all_points(args.all_points);

    let interpolated = interpolate_table(&table, &grid, &options)?;
    emit_json(&interpolated, args.output.as_deref())?;
    Ok(0)
}

pub(super) fn run_decompose_command(args: DecomposeArgs) -> Result<i32, CliError> {
    let mut config = load_workflow_config(&args.config).map_err(XafsError::from)?;
    if let Some(seed) = args.seed {
        config.decomposition.random_seed = Some(seed);
    }
    let base_dir = args
        .config
        .parent()
        .map_or_else(PathBuf::new, Path::to_path_buf);

    let report = run_workflow(&config, &base_dir)?;
    emit_json(&report, args.output.as_deref())?;
    Ok(0)
}
