use crate::domain::{FLAT_COLUMN, XafsError, XafsResult};
use crate::modules::decompose::LassoCvSettings;
use crate::modules::{DecompositionOptions, InterpolationOptions, ReaderOptions};
use crate::numerics::{arange_grid, sorted_unique};
use globset::Glob;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowConfig {
    /// Reference spectra: paths or file-name glob patterns, relative to the
    /// configuration file.
    pub standards: Vec<String>,
    pub unknowns: Vec<String>,
    pub grid: GridSpec,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    #[serde(default)]
    pub reader: ReaderOptions,
    #[serde(default)]
    pub interpolation: InterpolationOptions,
    #[serde(default)]
    pub decomposition: DecompositionOptions,
    #[serde(default)]
    pub model: LassoCvSettings,
}

fn default_value_column() -> String {
    FLAT_COLUMN.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridSpec {
    Points { points: Vec<f64> },
    Range { start: f64, stop: f64, step: f64 },
}

impl GridSpec {
    /// Ascending, de-duplicated grid points.
    pub fn resolve(&self) -> XafsResult<Vec<f64>> {
        match self {
            Self::Points { points } => {
                if let Some(value) = points.iter().find(|value| !value.is_finite()) {
                    return Err(XafsError::input_validation(
                        "INPUT.WORKFLOW_GRID",
                        format!("grid point {} is not finite", value),
                    ));
                }
                Ok(sorted_unique(points))
            }
            Self::Range { start, stop, step } => {
                arange_grid(*start, *stop, *step).ok_or_else(|| {
                    XafsError::input_validation(
                        "INPUT.WORKFLOW_GRID",
                        format!(
                            "grid range start={} stop={} step={} needs finite bounds and a positive step",
                            start, stop, step
                        ),
                    )
                })
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowConfigError {
    #[error("failed to read workflow config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse workflow config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<WorkflowConfigError> for XafsError {
    fn from(error: WorkflowConfigError) -> Self {
        match &error {
            WorkflowConfigError::Read { .. } => {
                XafsError::io_system("IO.WORKFLOW_CONFIG", error.to_string())
            }
            WorkflowConfigError::Parse { .. } => {
                XafsError::input_validation("INPUT.WORKFLOW_CONFIG", error.to_string())
            }
        }
    }
}

pub fn load_workflow_config(
    config_path: impl AsRef<Path>,
) -> Result<WorkflowConfig, WorkflowConfigError> {
    let config_path = config_path.as_ref();
    let source = fs::read_to_string(config_path).map_err(|source| WorkflowConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| WorkflowConfigError::Parse {
        path: config_path.to_path_buf(),
        source,
    })
}

/// Expands `patterns` relative to `base_dir`. Plain paths are kept as given;
/// patterns with glob syntax in the file name are matched against the files
/// of their parent directory and must match at least one.
pub fn resolve_spectrum_paths(patterns: &[String], base_dir: &Path) -> XafsResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let candidate = base_dir.join(pattern);
        if !has_glob_syntax(pattern) {
            paths.push(candidate);
            continue;
        }

        let parent = candidate
            .parent()
            .map_or_else(|| base_dir.to_path_buf(), Path::to_path_buf);
        let file_pattern = candidate
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pattern_dir = Path::new(pattern)
            .parent()
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_default();
        if has_glob_syntax(&pattern_dir) {
            return Err(XafsError::input_validation(
                "INPUT.WORKFLOW_GLOB",
                format!(
                    "pattern '{}' may only use glob syntax in its file name",
                    pattern
                ),
            ));
        }

        let matcher = Glob::new(&file_pattern)
            .map_err(|source| {
                XafsError::input_validation(
                    "INPUT.WORKFLOW_GLOB",
                    format!("invalid glob pattern '{}': {}", pattern, source),
                )
            })?
            .compile_matcher();
        let entries = fs::read_dir(&parent).map_err(|source| {
            XafsError::io_system(
                "IO.WORKFLOW_GLOB",
                format!("failed to list '{}': {}", parent.display(), source),
            )
        })?;

        let mut matched: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| matcher.is_match(Path::new(name)))
            })
            .collect();
        if matched.is_empty() {
            return Err(XafsError::input_validation(
                "INPUT.WORKFLOW_GLOB",
                format!("pattern '{}' did not match any file", pattern),
            ));
        }
        matched.sort();
        paths.extend(matched);
    }
    Ok(paths)
}

fn has_glob_syntax(pattern: &str) -> bool {
    pattern.contains(['*', '?', '[', '{'])
}
