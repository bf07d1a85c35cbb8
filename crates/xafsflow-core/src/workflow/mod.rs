//! End-to-end decomposition run described by a JSON configuration.
//!
//! Standards and unknowns are read, the grid is bounded to the domain every
//! spectrum covers, each spectrum is interpolated onto the bounded grid and
//! the unknowns are decomposed into the standards.

mod config;

pub use config::{
    GridSpec, WorkflowConfig, WorkflowConfigError, load_workflow_config, resolve_spectrum_paths,
};

use crate::domain::{XafsError, XafsResult};
use crate::modules::decompose::PositiveLassoCv;
use crate::modules::{
    AlignedArray, BoundedDomain, DecompositionResult, bounded_domain, fit_decomposition,
    interpolate_table, read_spectra,
};
use crate::table::SpectralTable;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowReport {
    pub domain: BoundedDomain,
    pub grid: Vec<f64>,
    pub standards: Vec<String>,
    pub unknowns: Vec<String>,
    /// Strength chosen for the last unknown fitted.
    pub selected_alpha: Option<f64>,
    pub result: DecompositionResult,
}

/// Loads `config_path` and runs it with paths resolved against the
/// configuration file's directory.
pub fn run_workflow_file(config_path: impl AsRef<Path>) -> XafsResult<WorkflowReport> {
    let config_path = config_path.as_ref();
    let config = load_workflow_config(config_path)?;
    let base_dir = config_path
        .parent()
        .map_or_else(PathBuf::new, Path::to_path_buf);
    run_workflow(&config, &base_dir)
}

pub fn run_workflow(config: &WorkflowConfig, base_dir: &Path) -> XafsResult<WorkflowReport> {
    let label_column = config.reader.sample_label_column.clone().ok_or_else(|| {
        XafsError::input_validation(
            "INPUT.WORKFLOW_CONFIG",
            "workflow needs reader.sampleLabelColumn to tell spectra apart",
        )
    })?;
    let grid = config.grid.resolve()?;

    let standard_paths = resolve_spectrum_paths(&config.standards, base_dir)?;
    let unknown_paths = resolve_spectrum_paths(&config.unknowns, base_dir)?;
    if standard_paths.is_empty() || unknown_paths.is_empty() {
        return Err(XafsError::input_validation(
            "INPUT.WORKFLOW_CONFIG",
            "workflow needs at least one standard and one unknown spectrum",
        ));
    }
    let standards = read_spectra(&standard_paths, &config.reader)?;
    let unknowns = read_spectra(&unknown_paths, &config.reader)?;
    tracing::debug!(
        standards = standard_paths.len(),
        unknowns = unknown_paths.len(),
        "read workflow spectra"
    );

    let mut interpolation = config.interpolation.clone();
    interpolation.group_keys = vec![label_column.clone()];
    let x_column = interpolation.x_column.clone();

    let combined = SpectralTable::concat([standards.clone(), unknowns.clone()])?;
    let domain = bounded_domain(&combined, &x_column, &interpolation.group_keys)?;
    let grid = domain.clip(&grid);
    if grid.is_empty() {
        return Err(XafsError::input_validation(
            "INPUT.WORKFLOW_GRID",
            format!(
                "no grid point lies inside the {} range shared by every spectrum",
                x_column
            ),
        ));
    }

    let align = |table: &SpectralTable| -> XafsResult<AlignedArray> {
        let interpolated = interpolate_table(table, &grid, &interpolation)?;
        AlignedArray::from_table(&interpolated, &x_column, &label_column, &config.value_column)
    };
    let references = align(&standards)?;
    let samples = align(&unknowns)?;

    let model = PositiveLassoCv::new(config.model.clone());
    let (result, model) =
        fit_decomposition(&references, &samples, model, &config.decomposition)?;

    Ok(WorkflowReport {
        domain,
        grid: references.grid().to_vec(),
        standards: references.labels().to_vec(),
        unknowns: samples.labels().to_vec(),
        selected_alpha: model.selected_alpha(),
        result,
    })
}
