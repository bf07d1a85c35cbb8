use super::CliError;
use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::Path;
use xafsflow_core::domain::XafsError;
use xafsflow_core::numerics::arange_grid;

/// Writes `value` as pretty JSON to `output`, or to stdout when unset.
pub(super) fn emit_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(value).context("failed to serialise command output")?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| {
                    XafsError::io_system(
                        "IO.CLI_OUTPUT",
                        format!("failed to create '{}': {}", parent.display(), source),
                    )
                })?;
            }
            fs::write(path, format!("{rendered}\n")).map_err(|source| {
                XafsError::io_system(
                    "IO.CLI_OUTPUT",
                    format!("failed to write '{}': {}", path.display(), source),
                )
            })?;
            println!("Wrote {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

pub(super) fn grid_from_range(start: f64, stop: f64, step: f64) -> Result<Vec<f64>, CliError> {
    arange_grid(start, stop, step).ok_or_else(|| {
        CliError::Usage(format!(
            "invalid grid --start {} --stop {} --step {}; bounds must be finite and the step positive",
            start, stop, step
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::{emit_json, grid_from_range};
    use crate::cli::CliError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn grid_rejects_non_positive_step() {
        assert_eq!(grid_from_range(0.0, 1.0, 0.5).expect("grid"), vec![0.0, 0.5, 1.0]);
        assert!(matches!(
            grid_from_range(0.0, 1.0, 0.0),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn json_output_creates_parent_directories() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("nested/out.json");
        emit_json(&vec![1.0, 2.0], Some(&path)).expect("write json");

        let written = fs::read_to_string(&path).expect("output should exist");
        let parsed: Vec<f64> = serde_json::from_str(&written).expect("valid json");
        assert_eq!(parsed, vec![1.0, 2.0]);
    }
}
